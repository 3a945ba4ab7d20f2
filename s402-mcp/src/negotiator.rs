//! Client-side negotiation of payment-gated MCP tool calls.
//!
//! This module provides [`PaymentNegotiator`], which drives one tool call
//! through the x402 payment-required handshake to a final result.
//!
//! # Flow
//!
//! 1. Call the tool without payment; a success returns immediately
//! 2. On a payment demand, ask the [`UserApprovalGate`] for a decision
//! 3. On approval, have the [`WalletSigner`] sign the declared requirements
//! 4. Build and encode a [`PaymentProof`], retry the call once with it attached
//!
//! A payment-gated invocation prompts once, signs once and calls the tool at
//! most twice. Dropping the future returned by [`PaymentNegotiator::invoke`]
//! abandons a pending prompt and any proof not yet sent.

use s402::encoding;
use s402::proto::PaymentProof;

use crate::approval::{Decision, UserApprovalGate};
use crate::config::NegotiatorConfig;
use crate::error::{McpPaymentError, PaymentDeclinedSignal, PaymentRequiredSignal};
use crate::extract;
use crate::invoker::{ToolInvoker, ToolResponse};
use crate::signer::WalletSigner;
use crate::types::{CallToolParams, CallToolResult, ToolArguments};

/// Drives tool calls through the payment-required handshake.
///
/// Holds no per-call state: concurrent [`invoke`](Self::invoke) calls share
/// nothing but the collaborators.
pub struct PaymentNegotiator<I: ToolInvoker> {
    invoker: I,
    gate: Box<dyn UserApprovalGate>,
    signer: Box<dyn WalletSigner>,
    config: NegotiatorConfig,
}

impl<I: ToolInvoker> std::fmt::Debug for PaymentNegotiator<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentNegotiator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<I: ToolInvoker> PaymentNegotiator<I> {
    /// Creates a builder from the three collaborators every negotiation needs.
    pub fn builder(
        invoker: I,
        gate: Box<dyn UserApprovalGate>,
        signer: Box<dyn WalletSigner>,
    ) -> PaymentNegotiatorBuilder<I> {
        PaymentNegotiatorBuilder {
            invoker,
            gate,
            signer,
            config: NegotiatorConfig::default(),
        }
    }

    /// Returns a reference to the underlying tool invoker.
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Returns the active configuration.
    pub const fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Calls `tool` with `arguments`, paying for it if the tool demands it
    /// and the user approves.
    ///
    /// # Errors
    ///
    /// - [`McpPaymentError::ToolCallFailed`] for transport failures (either call)
    /// - [`McpPaymentError::ToolError`] when the tool reports a non-payment error
    /// - [`McpPaymentError::PaymentDeclined`] when the user declines, or the
    ///   amount exceeds the configured limit
    /// - [`McpPaymentError::SigningFailed`] when the wallet cannot sign
    /// - [`McpPaymentError::ProtocolAnomaly`] when the retry demands payment again
    /// - [`McpPaymentError::ProofFieldInUse`] when a paid call's `arguments`
    ///   already hold the proof argument; checked before prompting
    pub async fn invoke(
        &self,
        tool: &str,
        arguments: ToolArguments,
    ) -> Result<CallToolResult, McpPaymentError> {
        let first = self
            .invoker
            .call(CallToolParams::new(tool, arguments.clone()))
            .await?;

        let signal = match first {
            ToolResponse::Success(result) => return Ok(result),
            ToolResponse::Error { kind, message } => {
                return Err(McpPaymentError::ToolError { kind, message });
            }
            ToolResponse::PaymentRequired(signal) => signal,
        };

        #[cfg(feature = "telemetry")]
        tracing::info!(
            tool = %tool,
            price = signal.payment_info.price,
            currency = %signal.payment_info.currency,
            "tool requires payment"
        );

        if arguments.contains_key(&self.config.proof_field) {
            return Err(McpPaymentError::ProofFieldInUse(
                self.config.proof_field.clone(),
            ));
        }
        self.check_spending_limit(&signal)?;

        if self.gate.ask(tool, &signal.payment_info).await == Decision::Decline {
            #[cfg(feature = "telemetry")]
            tracing::info!(tool = %tool, "payment declined by user");
            return Err(McpPaymentError::PaymentDeclined(
                PaymentDeclinedSignal::default(),
            ));
        }

        let token = self.pay(&signal).await?;
        let retry_arguments =
            extract::attach_proof_to_arguments(&arguments, &self.config.proof_field, token)
                .ok_or_else(|| McpPaymentError::ProofFieldInUse(self.config.proof_field.clone()))?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(tool = %tool, "retrying tool call with payment proof");

        match self
            .invoker
            .call(CallToolParams::new(tool, retry_arguments))
            .await?
        {
            ToolResponse::Success(result) => Ok(result),
            ToolResponse::Error { kind, message } => {
                Err(McpPaymentError::ToolError { kind, message })
            }
            ToolResponse::PaymentRequired(again) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(tool = %tool, "payment demanded again after proof was sent");
                Err(McpPaymentError::ProtocolAnomaly(again.message.unwrap_or_else(|| {
                    format!("tool '{tool}' demanded payment again after a proof was sent")
                })))
            }
        }
    }

    /// Signs the declared requirements and returns the encoded proof.
    async fn pay(&self, signal: &PaymentRequiredSignal) -> Result<String, McpPaymentError> {
        let signed = self
            .signer
            .sign(&signal.requirements)
            .await
            .map_err(|e| {
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %e, "wallet failed to sign payment");
                McpPaymentError::SigningFailed(e)
            })?;

        let proof = PaymentProof::new(signed.signature, &signal.requirements, signed.payer)?;
        Ok(encoding::encode(&proof)?)
    }

    fn check_spending_limit(&self, signal: &PaymentRequiredSignal) -> Result<(), McpPaymentError> {
        let Some(limit) = self.config.max_amount else {
            return Ok(());
        };
        let amount = signal.requirements.amount()?;
        if amount > limit {
            #[cfg(feature = "telemetry")]
            tracing::info!(%amount, %limit, "payment exceeds spending limit");
            return Err(McpPaymentError::PaymentDeclined(
                PaymentDeclinedSignal::with_message(format!(
                    "amount {amount} exceeds the spending limit of {limit}"
                )),
            ));
        }
        Ok(())
    }
}

/// Builder for configuring a [`PaymentNegotiator`].
pub struct PaymentNegotiatorBuilder<I: ToolInvoker> {
    invoker: I,
    gate: Box<dyn UserApprovalGate>,
    signer: Box<dyn WalletSigner>,
    config: NegotiatorConfig,
}

impl<I: ToolInvoker> std::fmt::Debug for PaymentNegotiatorBuilder<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentNegotiatorBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<I: ToolInvoker> PaymentNegotiatorBuilder<I> {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: NegotiatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the argument name the proof is attached under.
    #[must_use]
    pub fn proof_field(mut self, field: impl Into<String>) -> Self {
        self.config.proof_field = field.into();
        self
    }

    /// Declines demands above `limit` without prompting.
    #[must_use]
    pub fn max_amount(mut self, limit: rust_decimal::Decimal) -> Self {
        self.config.max_amount = Some(limit);
        self
    }

    /// Builds the configured [`PaymentNegotiator`].
    #[must_use]
    pub fn build(self) -> PaymentNegotiator<I> {
        PaymentNegotiator {
            invoker: self.invoker,
            gate: self.gate,
            signer: self.signer,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{AutoApprove, AutoDecline};
    use crate::extract::tests::requirements;
    use crate::signer::{SignedTransfer, SignerError};
    use rust_decimal::Decimal;
    use s402::BoxFuture;
    use s402::proto::{PaymentInfo, PaymentRequirements};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::oneshot;

    const PAYER: &str = "7C4jsPZpht42Tw6MjXWF56Q5RQUocjBBmciEjDa8HRtp";
    const SIGNATURE: &str = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";

    /// Replays scripted responses and records every call.
    struct ScriptedInvoker {
        responses: Mutex<VecDeque<Result<ToolResponse, McpPaymentError>>>,
        calls: Mutex<Vec<CallToolParams>>,
    }

    impl ScriptedInvoker {
        fn new(responses: Vec<Result<ToolResponse, McpPaymentError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<CallToolParams> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolInvoker for ScriptedInvoker {
        fn call(
            &self,
            params: CallToolParams,
        ) -> BoxFuture<'_, Result<ToolResponse, McpPaymentError>> {
            self.calls.lock().unwrap().push(params);
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("invoker called more often than scripted");
            Box::pin(async move { next })
        }
    }

    struct CountingGate<G> {
        inner: G,
        asked: AtomicUsize,
    }

    impl<G: UserApprovalGate> CountingGate<G> {
        fn new(inner: G) -> Arc<Self> {
            Arc::new(Self {
                inner,
                asked: AtomicUsize::new(0),
            })
        }
    }

    impl<G: UserApprovalGate> UserApprovalGate for CountingGate<G> {
        fn ask<'a>(
            &'a self,
            tool_name: &'a str,
            info: &'a PaymentInfo,
        ) -> BoxFuture<'a, Decision> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.inner.ask(tool_name, info)
        }
    }

    struct StubSigner {
        result: Result<SignedTransfer, SignerError>,
        signed: Mutex<Vec<PaymentRequirements>>,
    }

    impl StubSigner {
        fn ok() -> Arc<Self> {
            Self::with(Ok(SignedTransfer {
                signature: SIGNATURE.to_owned(),
                payer: PAYER.to_owned(),
            }))
        }

        fn with(result: Result<SignedTransfer, SignerError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                signed: Mutex::new(Vec::new()),
            })
        }

        fn sign_count(&self) -> usize {
            self.signed.lock().unwrap().len()
        }
    }

    impl WalletSigner for StubSigner {
        fn sign<'a>(
            &'a self,
            requirements: &'a PaymentRequirements,
        ) -> BoxFuture<'a, Result<SignedTransfer, SignerError>> {
            self.signed.lock().unwrap().push(requirements.clone());
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn payment_required() -> ToolResponse {
        ToolResponse::PaymentRequired(
            PaymentRequiredSignal::new(requirements(), Some("Payment required".to_owned()))
                .unwrap(),
        )
    }

    fn args() -> ToolArguments {
        let mut args = ToolArguments::new();
        args.insert("city".to_owned(), serde_json::Value::from("Lisbon"));
        args.insert("units".to_owned(), serde_json::Value::from("metric"));
        args
    }

    fn negotiator(
        invoker: &Arc<ScriptedInvoker>,
        gate: impl UserApprovalGate + 'static,
        signer: &Arc<StubSigner>,
    ) -> PaymentNegotiator<Arc<ScriptedInvoker>> {
        PaymentNegotiator::builder(
            Arc::clone(invoker),
            Box::new(gate),
            Box::new(Arc::clone(signer)),
        )
        .build()
    }

    #[tokio::test]
    async fn test_success_skips_payment() {
        let invoker = ScriptedInvoker::new(vec![Ok(ToolResponse::Success(CallToolResult::text(
            "sunny",
        )))]);
        let gate = CountingGate::new(AutoApprove);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, Arc::clone(&gate), &signer);

        let result = negotiator.invoke("get_weather", args()).await.unwrap();

        assert_eq!(result, CallToolResult::text("sunny"));
        assert_eq!(gate.asked.load(Ordering::SeqCst), 0);
        assert_eq!(signer.sign_count(), 0);
        assert_eq!(invoker.calls().len(), 1);
        assert_eq!(invoker.calls()[0].arguments, args());
    }

    #[tokio::test]
    async fn test_approved_payment_retries_with_proof() {
        let invoker = ScriptedInvoker::new(vec![
            Ok(payment_required()),
            Ok(ToolResponse::Success(CallToolResult::text("paid result"))),
        ]);
        let gate = CountingGate::new(AutoApprove);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, Arc::clone(&gate), &signer);

        let result = negotiator.invoke("get_weather", args()).await.unwrap();
        assert_eq!(result, CallToolResult::text("paid result"));
        assert_eq!(gate.asked.load(Ordering::SeqCst), 1);
        assert_eq!(signer.sign_count(), 1);
        assert_eq!(signer.signed.lock().unwrap()[0], requirements());

        let calls = invoker.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].name, "get_weather");

        let retry = &calls[1].arguments;
        assert_eq!(retry.len(), args().len() + 1);
        for (key, value) in &args() {
            assert_eq!(retry.get(key), Some(value));
        }

        let proof = extract::extract_proof_from_arguments(retry, "x402Payment")
            .unwrap()
            .unwrap();
        assert_eq!(proof.transaction_signature(), SIGNATURE);
        assert_eq!(proof.from(), PAYER);
        assert_eq!(proof.to(), requirements().recipient);
        assert_eq!(proof.amount(), Decimal::new(5, 2));
        assert_eq!(proof.currency(), "USDC");
    }

    #[tokio::test]
    async fn test_custom_proof_field() {
        let invoker = ScriptedInvoker::new(vec![
            Ok(payment_required()),
            Ok(ToolResponse::Success(CallToolResult::text("ok"))),
        ]);
        let signer = StubSigner::ok();
        let negotiator = PaymentNegotiator::builder(
            Arc::clone(&invoker),
            Box::new(AutoApprove),
            Box::new(Arc::clone(&signer)),
        )
        .proof_field("paymentProof")
        .build();

        negotiator.invoke("t", ToolArguments::new()).await.unwrap();

        let retry = &invoker.calls()[1].arguments;
        assert_eq!(retry.len(), 1);
        assert!(retry.contains_key("paymentProof"));
    }

    #[tokio::test]
    async fn test_argument_named_like_proof_field_is_rejected_before_prompt() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required())]);
        let gate = CountingGate::new(AutoApprove);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, Arc::clone(&gate), &signer);

        let mut arguments = args();
        arguments.insert("x402Payment".to_owned(), serde_json::Value::from("mine"));
        let err = negotiator.invoke("get_weather", arguments).await.unwrap_err();

        assert!(matches!(err, McpPaymentError::ProofFieldInUse(ref f) if f == "x402Payment"));
        assert_eq!(gate.asked.load(Ordering::SeqCst), 0);
        assert_eq!(signer.sign_count(), 0);
        assert_eq!(invoker.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_decline_does_not_retry() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required())]);
        let gate = CountingGate::new(AutoDecline);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, Arc::clone(&gate), &signer);

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(err, McpPaymentError::PaymentDeclined(_)));
        assert_eq!(invoker.calls().len(), 1);
        assert_eq!(gate.asked.load(Ordering::SeqCst), 1);
        assert_eq!(signer.sign_count(), 0);
    }

    #[tokio::test]
    async fn test_signing_failure_does_not_retry() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required())]);
        let signer = StubSigner::with(Err(SignerError::Unavailable("no wallet".to_owned())));
        let negotiator = negotiator(&invoker, AutoApprove, &signer);

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(
            err,
            McpPaymentError::SigningFailed(SignerError::Unavailable(_))
        ));
        assert_eq!(invoker.calls().len(), 1);
        assert_eq!(signer.sign_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_signature_is_rejected() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required())]);
        let signer = StubSigner::with(Ok(SignedTransfer {
            signature: String::new(),
            payer: PAYER.to_owned(),
        }));
        let negotiator = negotiator(&invoker, AutoApprove, &signer);

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(err, McpPaymentError::Proof(_)));
        assert_eq!(invoker.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_second_payment_demand_is_anomaly() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required()), Ok(payment_required())]);
        let gate = CountingGate::new(AutoApprove);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, Arc::clone(&gate), &signer);

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(err, McpPaymentError::ProtocolAnomaly(_)));
        assert_eq!(invoker.calls().len(), 2);
        assert_eq!(gate.asked.load(Ordering::SeqCst), 1);
        assert_eq!(signer.sign_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_error_is_passed_through_without_retry() {
        let invoker = ScriptedInvoker::new(vec![Ok(ToolResponse::Error {
            kind: "tool".to_owned(),
            message: "city not found".to_owned(),
        })]);
        let gate = CountingGate::new(AutoApprove);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, Arc::clone(&gate), &signer);

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(
            err,
            McpPaymentError::ToolError { ref kind, ref message } if kind == "tool" && message == "city not found"
        ));
        assert_eq!(invoker.calls().len(), 1);
        assert_eq!(gate.asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_on_retry_is_passed_through() {
        let invoker = ScriptedInvoker::new(vec![
            Ok(payment_required()),
            Err(McpPaymentError::ToolCallFailed("timeout".to_owned())),
        ]);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, AutoApprove, &signer);

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(err, McpPaymentError::ToolCallFailed(ref m) if m == "timeout"));
        assert_eq!(invoker.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_spending_limit_declines_without_prompt() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required())]);
        let gate = CountingGate::new(AutoApprove);
        let signer = StubSigner::ok();
        let counted: Arc<CountingGate<AutoApprove>> = Arc::clone(&gate);
        let negotiator = PaymentNegotiator::builder(
            Arc::clone(&invoker),
            Box::new(counted),
            Box::new(Arc::clone(&signer)),
        )
        .max_amount(Decimal::new(1, 2))
        .build();

        let err = negotiator.invoke("get_weather", args()).await.unwrap_err();

        assert!(matches!(
            err,
            McpPaymentError::PaymentDeclined(PaymentDeclinedSignal { message: Some(_) })
        ));
        assert_eq!(gate.asked.load(Ordering::SeqCst), 0);
        assert_eq!(signer.sign_count(), 0);
    }

    #[tokio::test]
    async fn test_spending_limit_allows_cheaper_calls() {
        let invoker = ScriptedInvoker::new(vec![
            Ok(payment_required()),
            Ok(ToolResponse::Success(CallToolResult::text("ok"))),
        ]);
        let signer = StubSigner::ok();
        let negotiator = PaymentNegotiator::builder(
            Arc::clone(&invoker),
            Box::new(AutoApprove),
            Box::new(Arc::clone(&signer)),
        )
        .max_amount(Decimal::new(5, 2))
        .build();

        assert!(negotiator.invoke("get_weather", args()).await.is_ok());
    }

    /// Gate that parks the request until the test resolves it.
    struct PendingGate {
        pending: Mutex<Option<oneshot::Sender<oneshot::Sender<Decision>>>>,
    }

    impl UserApprovalGate for PendingGate {
        fn ask<'a>(
            &'a self,
            _tool_name: &'a str,
            _info: &'a PaymentInfo,
        ) -> BoxFuture<'a, Decision> {
            let (tx, rx) = oneshot::channel();
            if let Some(notify) = self.pending.lock().unwrap().take() {
                let _ = notify.send(tx);
            }
            Box::pin(async move { rx.await.unwrap_or(Decision::Decline) })
        }
    }

    #[tokio::test]
    async fn test_cancellation_releases_pending_prompt() {
        let invoker = ScriptedInvoker::new(vec![Ok(payment_required())]);
        let (notify_tx, notify_rx) = oneshot::channel();
        let gate = Arc::new(PendingGate {
            pending: Mutex::new(Some(notify_tx)),
        });
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, gate, &signer);

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            negotiator.invoke("get_weather", args()),
        )
        .await;
        assert!(outcome.is_err(), "invoke should still be waiting on the prompt");

        let decision_tx = notify_rx.await.unwrap();
        assert!(decision_tx.is_closed());
        assert_eq!(signer.sign_count(), 0);
        assert_eq!(invoker.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_independent() {
        let invoker = ScriptedInvoker::new(vec![
            Ok(ToolResponse::Success(CallToolResult::text("a"))),
            Ok(ToolResponse::Success(CallToolResult::text("b"))),
        ]);
        let signer = StubSigner::ok();
        let negotiator = negotiator(&invoker, AutoApprove, &signer);

        let (a, b) = tokio::join!(
            negotiator.invoke("tool_a", ToolArguments::new()),
            negotiator.invoke("tool_b", ToolArguments::new())
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(invoker.calls().len(), 2);
    }
}
