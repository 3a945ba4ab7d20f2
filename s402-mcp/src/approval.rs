//! User approval of payments.
//!
//! Paying for a tool call always requires an explicit human decision. The
//! negotiator only sees [`UserApprovalGate`], a suspension point returning a
//! two-valued [`Decision`]. UI toolkits plug in below it by implementing
//! [`PromptPresenter`] and wrapping it in a [`ForcedChoiceGate`], which keeps
//! re-presenting the prompt until one of the two decision actions is taken.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use s402::BoxFuture;
use s402::amount::format_amount;
use s402::proto::PaymentInfo;

/// Addresses up to this many characters are shown in full.
const MAX_UNTRUNCATED_ADDRESS: usize = 12;

/// Characters kept on each side of a truncated address.
const ADDRESS_EDGE: usize = 4;

/// The outcome of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Pay and run the tool.
    Approve,
    /// Do not pay.
    Decline,
}

/// Suspension point that asks a human whether to pay for a tool call.
///
/// Implementations resolve only through an explicit decision; passive
/// dismissal is never a decision.
pub trait UserApprovalGate: Send + Sync {
    /// Presents the payment for `tool_name` and waits for a decision.
    fn ask<'a>(&'a self, tool_name: &'a str, info: &'a PaymentInfo) -> BoxFuture<'a, Decision>;
}

impl<T: UserApprovalGate + ?Sized> UserApprovalGate for Arc<T> {
    fn ask<'a>(&'a self, tool_name: &'a str, info: &'a PaymentInfo) -> BoxFuture<'a, Decision> {
        (**self).ask(tool_name, info)
    }
}

/// What a presenter should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPrompt {
    /// Tool being paid for.
    pub tool_name: String,
    /// Human-readable payment description.
    pub description: String,
    /// Formatted amount and currency, e.g. `0.05 USDC`.
    pub amount: String,
    /// Truncated recipient address, if the server named one.
    pub recipient: Option<String>,
}

impl ApprovalPrompt {
    /// Builds the display model for a payment.
    ///
    /// The exact [`PaymentInfo::amount`] is shown when present; `price` is
    /// the fallback.
    #[must_use]
    pub fn new(tool_name: &str, info: &PaymentInfo) -> Self {
        let amount = info
            .amount
            .or_else(|| Decimal::from_f64(info.price))
            .map_or_else(
                || format!("{} {}", info.price, info.currency),
                |price| format_amount(price, &info.currency),
            );
        Self {
            tool_name: tool_name.to_owned(),
            description: info.description.clone(),
            amount,
            recipient: info.recipient.as_deref().map(truncate_address),
        }
    }
}

/// Shortens a wallet address for display.
///
/// Addresses of at most 12 characters are returned unchanged; longer ones
/// keep the first and last 4 characters around an ellipsis.
///
/// ```
/// use s402_mcp::approval::truncate_address;
///
/// assert_eq!(truncate_address("AbCdEfGhIjKlMnOpwXyZ"), "AbCd…wXyZ");
/// assert_eq!(truncate_address("short"), "short");
/// ```
#[must_use]
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= MAX_UNTRUNCATED_ADDRESS {
        return address.to_owned();
    }
    let head: String = chars[..ADDRESS_EDGE].iter().collect();
    let tail: String = chars[chars.len() - ADDRESS_EDGE..].iter().collect();
    format!("{head}…{tail}")
}

/// Raw result of presenting a prompt once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptOutcome {
    /// The approve action was taken.
    Approve,
    /// The decline action was taken.
    Decline,
    /// The prompt was dismissed without a decision (back gesture, outside tap).
    Dismissed,
}

/// Renders an [`ApprovalPrompt`] in some UI and reports what happened.
pub trait PromptPresenter: Send + Sync {
    /// Shows the prompt and waits until it closes.
    fn present<'a>(&'a self, prompt: &'a ApprovalPrompt) -> BoxFuture<'a, PromptOutcome>;
}

/// A [`UserApprovalGate`] that only resolves through approve or decline.
///
/// Dismissals re-surface the same prompt.
#[derive(Debug, Clone)]
pub struct ForcedChoiceGate<P> {
    presenter: P,
}

impl<P: PromptPresenter> ForcedChoiceGate<P> {
    /// Wraps a presenter.
    pub const fn new(presenter: P) -> Self {
        Self { presenter }
    }

    /// Returns a reference to the underlying presenter.
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }
}

impl<P: PromptPresenter> UserApprovalGate for ForcedChoiceGate<P> {
    fn ask<'a>(&'a self, tool_name: &'a str, info: &'a PaymentInfo) -> BoxFuture<'a, Decision> {
        Box::pin(async move {
            let prompt = ApprovalPrompt::new(tool_name, info);
            loop {
                match self.presenter.present(&prompt).await {
                    PromptOutcome::Approve => return Decision::Approve,
                    PromptOutcome::Decline => return Decision::Decline,
                    PromptOutcome::Dismissed => {
                        #[cfg(feature = "telemetry")]
                        tracing::debug!(tool = %tool_name, "payment prompt dismissed, presenting again");
                    }
                }
            }
        })
    }
}

/// Gate that approves every payment. For headless agents with their own
/// spending policy.
#[derive(Debug, Clone, Copy)]
pub struct AutoApprove;

impl UserApprovalGate for AutoApprove {
    fn ask<'a>(&'a self, _tool_name: &'a str, _info: &'a PaymentInfo) -> BoxFuture<'a, Decision> {
        Box::pin(async { Decision::Approve })
    }
}

/// Gate that declines every payment.
#[derive(Debug, Clone, Copy)]
pub struct AutoDecline;

impl UserApprovalGate for AutoDecline {
    fn ask<'a>(&'a self, _tool_name: &'a str, _info: &'a PaymentInfo) -> BoxFuture<'a, Decision> {
        Box::pin(async { Decision::Decline })
    }
}
