use rust_decimal::Decimal;

use crate::error::ProofError;
use crate::proto::{EXACT_SCHEME, PaymentRequirements, X402_VERSION};
use crate::timestamp::UnixMillis;

/// A signed attestation that an on-chain payment matching the server's
/// requirements has been made.
///
/// A proof can only be built from a non-empty transaction signature and is
/// immutable afterwards; see [`crate::encoding`] for its single textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProof {
    pub(crate) protocol_version: u8,
    pub(crate) scheme: String,
    pub(crate) network: String,
    pub(crate) transaction_signature: String,
    pub(crate) amount: Decimal,
    pub(crate) currency: String,
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) timestamp: UnixMillis,
}

impl PaymentProof {
    /// Builds a proof for `requirements` paid by `payer` in the transaction
    /// identified by `signature`, stamped with the current time.
    ///
    /// Amount, currency, network and recipient are copied from the
    /// requirements.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::MissingSignature`] for an empty signature and
    /// [`ProofError::Amount`] if the declared amount is malformed.
    pub fn new(
        signature: impl Into<String>,
        requirements: &PaymentRequirements,
        payer: impl Into<String>,
    ) -> Result<Self, ProofError> {
        let transaction_signature = signature.into();
        if transaction_signature.trim().is_empty() {
            return Err(ProofError::MissingSignature);
        }
        Ok(Self {
            protocol_version: X402_VERSION,
            scheme: EXACT_SCHEME.to_owned(),
            network: requirements.network().to_owned(),
            transaction_signature,
            amount: requirements.amount()?,
            currency: requirements.currency().to_owned(),
            from: payer.into(),
            to: requirements.recipient.clone(),
            timestamp: UnixMillis::now(),
        })
    }

    /// Replaces the creation timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: UnixMillis) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Protocol version, currently 1.
    #[must_use]
    pub const fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Payment scheme tag, currently `"exact"`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Network the payment was made on.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Signature of the payment transaction.
    #[must_use]
    pub fn transaction_signature(&self) -> &str {
        &self.transaction_signature
    }

    /// Amount paid, in tokens.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Currency ticker.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Payer address.
    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient address.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Creation instant.
    #[must_use]
    pub const fn timestamp(&self) -> UnixMillis {
        self.timestamp
    }
}
