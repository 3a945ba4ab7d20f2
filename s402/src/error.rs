//! Error types for the x402 payment handshake.
//!
//! Each failure kind gets its own enum so callers can match on exactly the
//! cases an operation can produce.

/// Errors converting an atomic-unit amount into a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AmountError {
    /// The amount string was empty.
    #[error("amount is empty")]
    Empty,

    /// The amount string is not a non-negative integer.
    #[error("invalid atomic amount '{0}'")]
    Invalid(String),

    /// The amount does not fit the decimal representation.
    #[error("amount '{0}' is out of range")]
    OutOfRange(String),
}

/// Errors constructing a [`PaymentProof`](crate::proto::PaymentProof).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProofError {
    /// No transaction signature was supplied.
    #[error("transaction signature is missing")]
    MissingSignature,

    /// The requirement amount could not be converted.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Errors decoding an encoded payment proof.
///
/// Every decoding failure maps to one of these variants; a decode never
/// yields a partially populated proof.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The token is not valid standard base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not UTF-8.
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The decoded text is not a JSON object of the expected shape.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A field is present but its value is unusable.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidField {
        /// The offending wire key.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
