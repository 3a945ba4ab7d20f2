//! Proof codec and base64 utilities.
//!
//! A [`PaymentProof`] travels as standard base64 of a canonical UTF-8 JSON
//! object, with no line wrapping:
//!
//! ```json
//! {
//!   "x402Version": 1,
//!   "scheme": "exact",
//!   "network": "solana",
//!   "transactionSignature": "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW",
//!   "amount": 0.05,
//!   "currency": "USDC",
//!   "from": "<payer>",
//!   "to": "<recipient>",
//!   "timestamp": 1700000000000
//! }
//! ```
//!
//! `amount` is written with every significant digit of the decimal amount and
//! read back without passing through a float.
//!
//! [`encode`] and [`decode`] are plain functions; the codec holds no state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::proto::{DEFAULT_NETWORK, EXACT_SCHEME, PaymentProof, X402_VERSION};
use crate::timestamp::UnixMillis;

/// A wrapper for base64-encoded byte data.
///
/// This type holds bytes that represent base64-encoded data and provides
/// methods for encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        let encoded = b64.encode(input.as_ref());
        Self(encoded.into_bytes())
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Base64Bytes {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Outgoing wire shape. Field order here is the canonical key order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofWireRef<'a> {
    x402_version: u8,
    scheme: &'a str,
    network: &'a str,
    transaction_signature: &'a str,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    amount: Decimal,
    currency: &'a str,
    from: &'a str,
    to: &'a str,
    timestamp: UnixMillis,
}

/// Incoming wire shape. Every field is optional so that absence can be
/// reported as [`DecodeError::MissingField`]; unknown keys are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofWire {
    x402_version: Option<u8>,
    scheme: Option<String>,
    network: Option<String>,
    transaction_signature: Option<String>,
    amount: Option<serde_json::Number>,
    currency: Option<String>,
    from: Option<String>,
    to: Option<String>,
    timestamp: Option<UnixMillis>,
}

/// Encodes a proof into its transport token.
///
/// # Examples
///
/// ```
/// use s402::encoding::{decode, encode};
/// use s402::proto::{PaymentProof, PaymentRequirements};
///
/// let requirements: PaymentRequirements = serde_json::from_value(serde_json::json!({
///     "price": { "amount": "50000", "asset": { "address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v" } },
///     "recipient": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
///     "currency": "USDC",
///     "network": "solana"
/// })).unwrap();
/// let proof = PaymentProof::new("5sig", &requirements, "payer").unwrap();
///
/// let token = encode(&proof).unwrap();
/// assert_eq!(decode(&token).unwrap(), proof);
/// ```
///
/// # Errors
///
/// Returns `Err` if the proof cannot be serialized.
pub fn encode(proof: &PaymentProof) -> Result<String, serde_json::Error> {
    let wire = ProofWireRef {
        x402_version: proof.protocol_version,
        scheme: &proof.scheme,
        network: &proof.network,
        transaction_signature: &proof.transaction_signature,
        amount: proof.amount,
        currency: &proof.currency,
        from: &proof.from,
        to: &proof.to,
        timestamp: proof.timestamp,
    };
    let json = serde_json::to_vec(&wire)?;
    Ok(b64.encode(json))
}

/// Decodes a transport token back into a proof.
///
/// # Errors
///
/// Returns [`DecodeError`] if the token is not base64, the payload is not a
/// UTF-8 JSON object, a required field is missing, or a field value is
/// unusable (e.g. an empty signature).
pub fn decode(token: &str) -> Result<PaymentProof, DecodeError> {
    let bytes = Base64Bytes::from(token.trim()).decode()?;
    let text = String::from_utf8(bytes)?;
    let wire: ProofWire = serde_json::from_str(&text)?;

    #[cfg(feature = "telemetry")]
    tracing::debug!(
        version = ?wire.x402_version,
        network = ?wire.network,
        "decoding payment proof"
    );

    let transaction_signature = required(wire.transaction_signature, "transactionSignature")?;
    if transaction_signature.trim().is_empty() {
        return Err(DecodeError::InvalidField {
            field: "transactionSignature",
            reason: "empty signature".to_owned(),
        });
    }
    let amount = parse_amount(&required(wire.amount, "amount")?)?;

    Ok(PaymentProof {
        protocol_version: wire.x402_version.unwrap_or(X402_VERSION),
        scheme: wire.scheme.unwrap_or_else(|| EXACT_SCHEME.to_owned()),
        network: wire.network.unwrap_or_else(|| DEFAULT_NETWORK.to_owned()),
        transaction_signature,
        amount,
        currency: required(wire.currency, "currency")?,
        from: required(wire.from, "from")?,
        to: required(wire.to, "to")?,
        timestamp: required(wire.timestamp, "timestamp")?,
    })
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::MissingField(field))
}

fn parse_amount(number: &serde_json::Number) -> Result<Decimal, DecodeError> {
    let text = number.to_string();
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| DecodeError::InvalidField {
            field: "amount",
            reason: e.to_string(),
        })?;
    if amount.is_sign_negative() {
        return Err(DecodeError::InvalidField {
            field: "amount",
            reason: "negative amount".to_owned(),
        });
    }
    Ok(amount)
}
