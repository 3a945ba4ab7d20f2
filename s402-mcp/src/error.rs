//! Error types for payment-gated MCP tool calls.
//!
//! This module defines [`McpPaymentError`] for all failure modes of a
//! negotiated tool call, and the two payment signals exchanged inside the
//! flow: [`PaymentRequiredSignal`] and [`PaymentDeclinedSignal`].

use s402::error::{AmountError, ProofError};
use s402::proto::{PaymentInfo, PaymentRequirements};

use crate::signer::SignerError;

/// Errors that can occur while negotiating a paid MCP tool call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum McpPaymentError {
    /// The transport failed before the tool produced a result.
    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    /// The tool returned an error unrelated to payment.
    #[error("Tool error ({kind}): {message}")]
    ToolError {
        /// Error category reported by the invoker.
        kind: String,
        /// Error message reported by the tool.
        message: String,
    },

    /// The user declined the payment.
    #[error("Payment declined")]
    PaymentDeclined(PaymentDeclinedSignal),

    /// The wallet could not produce a signature.
    #[error("Failed to sign payment: {0}")]
    SigningFailed(#[source] SignerError),

    /// The server demanded payment again after an honored proof.
    #[error("Payment protocol anomaly: {0}")]
    ProtocolAnomaly(String),

    /// The server's payment requirements could not be interpreted.
    #[error("Invalid payment requirements: {0}")]
    InvalidRequirements(#[from] AmountError),

    /// The tool demanded payment but its requirements payload did not parse.
    #[error("Malformed payment requirements: {0}")]
    MalformedRequirements(#[source] serde_json::Error),

    /// The caller's arguments already use the proof argument name.
    #[error("Argument '{0}' is reserved for the payment proof")]
    ProofFieldInUse(String),

    /// A proof could not be built from the signature.
    #[error("Failed to create payment proof: {0}")]
    Proof(#[from] ProofError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpPaymentError {
    /// Returns a short, non-technical explanation suitable for end users.
    ///
    /// A decline reads differently from a payment that could not be
    /// completed, so users can tell their own choice from a failure.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::PaymentDeclined(_) => "You chose not to pay, so the tool was not run.",
            Self::SigningFailed(_)
            | Self::Proof(_)
            | Self::Json(_)
            | Self::ProtocolAnomaly(_)
            | Self::InvalidRequirements(_)
            | Self::MalformedRequirements(_)
            | Self::ProofFieldInUse(_) => {
                "The payment could not be completed, so the tool was not run."
            }
            Self::ToolCallFailed(_) | Self::ToolError { .. } => {
                "The tool could not complete your request."
            }
        }
    }
}

/// A tool's demand for payment before it will run.
///
/// Raised at the tool-invocation boundary and consumed exactly once by the
/// negotiator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequiredSignal {
    /// UI-facing projection of the requirements.
    pub payment_info: PaymentInfo,
    /// The requirements as declared by the server.
    pub requirements: PaymentRequirements,
    /// Optional server message.
    pub message: Option<String>,
}

impl PaymentRequiredSignal {
    /// Creates a signal from server-declared requirements.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if the declared amount cannot be parsed.
    pub fn new(
        requirements: PaymentRequirements,
        message: Option<String>,
    ) -> Result<Self, AmountError> {
        Ok(Self {
            payment_info: PaymentInfo::from_requirements(&requirements)?,
            requirements,
            message,
        })
    }
}

/// The user's refusal to pay. Terminal for the current invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDeclinedSignal {
    /// Optional explanation.
    pub message: Option<String>,
}

impl PaymentDeclinedSignal {
    /// Creates a decline with an explanation.
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl std::fmt::Display for PaymentDeclinedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or("payment declined"))
    }
}
