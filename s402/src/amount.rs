//! Conversion between atomic token units and human-readable amounts.
//!
//! Servers declare prices as decimal strings in the token's smallest unit
//! (micro-units for USDC). Proofs and prompts work with the decimal token
//! amount instead.

use rust_decimal::Decimal;

use crate::error::AmountError;

/// Number of decimal places of the USDC SPL token.
pub const USDC_DECIMALS: u32 = 6;

/// Converts an atomic-unit amount string into a decimal token amount.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use s402::amount::from_atomic_units;
///
/// let amount = from_atomic_units("50000", 6).unwrap();
/// assert_eq!(amount, Decimal::new(5, 2));
/// ```
///
/// # Errors
///
/// Returns [`AmountError`] if the string is empty, not a non-negative
/// integer, or too large for the decimal representation.
pub fn from_atomic_units(units: &str, decimals: u32) -> Result<Decimal, AmountError> {
    let units = units.trim();
    if units.is_empty() {
        return Err(AmountError::Empty);
    }
    if !units.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(units.to_owned()));
    }
    let raw = units
        .parse::<i128>()
        .map_err(|_| AmountError::OutOfRange(units.to_owned()))?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::OutOfRange(units.to_owned()))
}

/// Formats an amount with its currency, without trailing zeros.
///
/// ```
/// use rust_decimal::Decimal;
/// use s402::amount::format_amount;
///
/// assert_eq!(format_amount(Decimal::new(500, 4), "USDC"), "0.05 USDC");
/// assert_eq!(format_amount(Decimal::new(1, 0), "USDC"), "1 USDC");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let amount = amount.normalize();
    if currency.is_empty() {
        amount.to_string()
    } else {
        format!("{amount} {currency}")
    }
}
