//! Wire format types for the x402 payment handshake.
//!
//! # Key Types
//!
//! - [`PaymentRequirements`] - Payment terms declared by a tool server
//! - [`PaymentInfo`] - Normalized, UI-facing projection of the requirements
//! - [`PricingMode`] - How the server arrived at the price
//! - [`PaymentProof`] - Signed-transaction attestation attached to a retry
//!
//! # Wire Format
//!
//! All types serialize to JSON using camelCase field names.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::amount::{self, USDC_DECIMALS};
use crate::error::AmountError;
use crate::networks;

mod proof;

pub use proof::PaymentProof;

/// Protocol version written into every proof.
pub const X402_VERSION: u8 = 1;

/// The only payment scheme this client produces: pay the exact declared amount.
pub const EXACT_SCHEME: &str = "exact";

/// Network name used when the requirements do not declare one.
pub const DEFAULT_NETWORK: &str = "solana";

/// Token asset a price is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAsset {
    /// Token mint (or contract) address.
    pub address: String,
    /// Decimal places of the token. Defaults to the USDC value.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

const fn default_decimals() -> u32 {
    USDC_DECIMALS
}

/// A price as declared by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Decimal string in the token's smallest unit, e.g. `"50000"` for 0.05 USDC.
    pub amount: String,
    /// The token the amount is denominated in.
    pub asset: PriceAsset,
}

/// How a tool server priced a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PricingMode {
    /// A fixed price per call.
    Static,
    /// A price computed per request.
    Dynamic,
    /// A price that depends on the calling user.
    UserBased,
}

/// Payment terms declared by a tool server in a payment-required response.
///
/// Created by parsing the response payload and consumed once by the
/// negotiation flow. The amount a client pays is always taken from here,
/// never from user input.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Amount and asset.
    pub price: Price,
    /// Wallet address that receives the payment.
    pub recipient: String,
    /// Human-readable description of what is being paid for.
    #[serde(default)]
    pub description: String,
    /// Currency ticker, e.g. `"USDC"`.
    #[serde(default)]
    pub currency: String,
    /// Network name, e.g. `"solana"`.
    #[serde(default)]
    pub network: String,
    /// ISO-8601 instant after which the quote is no longer honored.
    pub expires_at: Option<String>,
    /// Tolerated price movement for dynamically priced calls.
    pub max_slippage: Option<f64>,
    /// How the server arrived at the price.
    pub pricing: Option<PricingMode>,
}

impl PaymentRequirements {
    /// Returns the declared price as a decimal token amount.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if `price.amount` is not a valid atomic amount.
    pub fn amount(&self) -> Result<Decimal, AmountError> {
        amount::from_atomic_units(&self.price.amount, self.price.asset.decimals)
    }

    /// Returns the currency ticker, falling back to the known-asset table and
    /// finally to the raw asset address.
    #[must_use]
    pub fn currency(&self) -> &str {
        if !self.currency.is_empty() {
            return &self.currency;
        }
        networks::currency_for_asset(&self.price.asset.address)
            .unwrap_or(self.price.asset.address.as_str())
    }

    /// Returns the declared network, or [`DEFAULT_NETWORK`] when none was given.
    #[must_use]
    pub fn network(&self) -> &str {
        if self.network.is_empty() {
            DEFAULT_NETWORK
        } else {
            &self.network
        }
    }
}

/// A normalized projection of [`PaymentRequirements`] for presentation.
///
/// `required` is `true` exactly when this value models an actual payment
/// gate; the default instance has `required == false`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    /// Whether a payment gates the call.
    pub required: bool,
    /// Price as a token amount, e.g. `0.05`.
    pub price: f64,
    /// The exact token amount `price` approximates, when derived from
    /// requirements. Not part of the wire shape.
    #[serialize_always]
    #[serde(skip)]
    pub amount: Option<Decimal>,
    /// Currency ticker.
    pub currency: String,
    /// Human-readable description.
    pub description: String,
    /// Recipient wallet address.
    pub recipient: Option<String>,
    /// ISO-8601 expiry of the quote.
    pub expires_at: Option<String>,
    /// Tolerated price movement.
    pub max_slippage: Option<f64>,
    /// Pricing mode tag.
    pub pricing: Option<PricingMode>,
}

impl PaymentInfo {
    /// Projects server-declared requirements into a payment gate.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if the declared amount cannot be parsed.
    pub fn from_requirements(requirements: &PaymentRequirements) -> Result<Self, AmountError> {
        let amount = requirements.amount()?;
        let price = amount
            .to_f64()
            .ok_or_else(|| AmountError::OutOfRange(requirements.price.amount.clone()))?;
        Ok(Self {
            required: true,
            price,
            amount: Some(amount),
            currency: requirements.currency().to_owned(),
            description: requirements.description.clone(),
            recipient: Some(requirements.recipient.clone()).filter(|r| !r.is_empty()),
            expires_at: requirements.expires_at.clone(),
            max_slippage: requirements.max_slippage,
            pricing: requirements.pricing,
        })
    }
}
