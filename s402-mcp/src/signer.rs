//! Wallet signing capability.
//!
//! A [`WalletSigner`] turns server-declared [`PaymentRequirements`] into a
//! signed (and, depending on the wallet, submitted) payment transaction.
//! The negotiator always hands the signer the requirements exactly as the
//! server declared them, so the signed amount cannot drift from the demand.

use std::sync::Arc;

use s402::BoxFuture;
use s402::proto::PaymentRequirements;

/// A signed payment transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    /// Transaction signature identifying the payment on chain.
    pub signature: String,
    /// Address of the paying wallet.
    pub payer: String,
}

/// Reasons a wallet could not produce a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SignerError {
    /// The user cancelled the request inside the wallet.
    #[error("signing cancelled in wallet")]
    Cancelled,

    /// No wallet is connected or it could not be reached.
    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    /// The transaction was signed but could not be submitted on chain.
    #[error("transaction submission failed: {0}")]
    Submission(String),
}

/// Capability that signs payments for the exact declared requirements.
pub trait WalletSigner: Send + Sync {
    /// Signs a payment of `requirements.price` to `requirements.recipient`.
    fn sign<'a>(
        &'a self,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SignedTransfer, SignerError>>;
}

impl<T: WalletSigner + ?Sized> WalletSigner for Arc<T> {
    fn sign<'a>(
        &'a self,
        requirements: &'a PaymentRequirements,
    ) -> BoxFuture<'a, Result<SignedTransfer, SignerError>> {
        (**self).sign(requirements)
    }
}
