//! Prices
//!
//! Parsing of the `"AMOUNT CURRENCY"` price strings and percentage strings
//! used by the catalog and promo table data files.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::iso::{Currency, EUR, GBP, INR, USD};
use thiserror::Error;

/// Errors raised while parsing price or percentage strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceParseError {
    /// The price was not in the `"AMOUNT CURRENCY"` format.
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// The percentage could not be parsed.
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// The currency code is not one we sell tickets in.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Look up a supported ISO currency by its alpha code.
///
/// # Errors
///
/// Returns [`PriceParseError::UnknownCurrency`] for any other code.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, PriceParseError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "INR" => Ok(INR),
        other => Err(PriceParseError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "49.99 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a non-negative decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), PriceParseError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(PriceParseError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| PriceParseError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(PriceParseError::InvalidPrice(s.to_string()));
    }

    let currency = currency_from_code(currency_code)?;

    let minor_units = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| PriceParseError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// Values are parsed as decimals, so "10%" is exactly one tenth.
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, PriceParseError> {
    let trimmed = s.trim();

    let fraction = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| PriceParseError::InvalidPercentage(s.to_string()))?
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or_else(|| PriceParseError::InvalidPercentage(s.to_string()))?
    } else {
        trimmed
            .parse::<Decimal>()
            .map_err(|_err| PriceParseError::InvalidPercentage(s.to_string()))?
    };

    Ok(Percentage::from(fraction))
}
