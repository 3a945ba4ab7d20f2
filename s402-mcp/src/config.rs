//! Configuration for the payment negotiator.
//!
//! [`NegotiatorConfig`] deserializes from the application's configuration
//! source (camelCase keys); every field has a default.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PAYMENT_PROOF_ARG;

/// Negotiator settings.
///
/// # Example
///
/// ```rust
/// use s402_mcp::config::NegotiatorConfig;
///
/// let config: NegotiatorConfig = serde_json::from_value(serde_json::json!({
///     "proofField": "paymentProof",
///     "maxAmount": "0.50"
/// })).unwrap();
/// assert_eq!(config.proof_field, "paymentProof");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NegotiatorConfig {
    /// Argument name under which the encoded proof is attached to the retry.
    /// Defaults to [`PAYMENT_PROOF_ARG`].
    pub proof_field: String,

    /// Largest token amount that may be put in front of the user. Demands
    /// above it are declined without prompting. `None` disables the limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Decimal>,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            proof_field: PAYMENT_PROOF_ARG.to_owned(),
            max_amount: None,
        }
    }
}
