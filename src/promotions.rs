//! Promotions
//!
//! Promo codes are validated against a fixed table mapping each code to a
//! discount fraction. Lookups are case-insensitive; nothing is tracked per
//! code (no expiry, no usage counts).

use std::{fs, path::Path, time::Duration};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    discounts::{fraction, is_valid_discount},
    prices::{PriceParseError, parse_percentage},
};

/// Errors returned when a promo code is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoError {
    /// The code was empty once surrounding whitespace was removed.
    #[error("Please enter a promo code")]
    EmptyCode,

    /// The code is not in the promo table.
    #[error("Promo code {0} is not valid")]
    InvalidCode(String),
}

/// Errors raised while loading a promo table.
#[derive(Debug, Error)]
pub enum PromoTableError {
    /// IO error reading the table file
    #[error("Failed to read promo table: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A discount value could not be parsed
    #[error(transparent)]
    Percentage(#[from] PriceParseError),

    /// A discount is outside `[0, 1)`
    #[error("Discount for {code} must be at least 0% and below 100%, got {value}")]
    OutOfRange {
        /// Offending code
        code: String,

        /// Discount fraction as written in the table
        value: Decimal,
    },

    /// The same code appears twice once case is ignored
    #[error("Promo code {0} is defined more than once")]
    Duplicate(String),

    /// A code is blank
    #[error("Promo codes must not be blank")]
    BlankCode,
}

/// Promo table as written in YAML.
#[derive(Debug, Deserialize)]
struct PromoTableFixture {
    /// Code -> discount ("10%" or "0.10")
    codes: FxHashMap<String, String>,
}

/// Fixed lookup table of promo codes.
#[derive(Debug, Clone)]
pub struct PromoTable {
    codes: FxHashMap<String, Percentage>,
}

impl PromoTable {
    /// Build a table from `(code, fraction)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a code is blank or duplicated, or if a fraction
    /// is outside `[0, 1)`.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, PromoTableError>
    where
        I: IntoIterator<Item = (S, Percentage)>,
        S: AsRef<str>,
    {
        let mut codes = FxHashMap::default();

        for (code, discount) in entries {
            let code = normalize_code(code.as_ref()).ok_or(PromoTableError::BlankCode)?;

            if !is_valid_discount(&discount) {
                return Err(PromoTableError::OutOfRange {
                    code,
                    value: fraction(&discount),
                });
            }

            if codes.contains_key(&code) {
                return Err(PromoTableError::Duplicate(code));
            }

            codes.insert(code, discount);
        }

        Ok(Self { codes })
    }

    /// Parse a promo table from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or fails validation.
    pub fn from_yaml(contents: &str) -> Result<Self, PromoTableError> {
        let fixture: PromoTableFixture = serde_norway::from_str(contents)?;

        let entries = fixture
            .codes
            .into_iter()
            .map(|(code, value)| Ok((code, parse_percentage(&value)?)))
            .collect::<Result<Vec<_>, PromoTableError>>()?;

        Self::from_entries(entries)
    }

    /// Load a promo table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PromoTableError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Look up a code, ignoring case and surrounding whitespace.
    pub fn lookup(&self, code: &str) -> Option<Percentage> {
        normalize_code(code).and_then(|code| self.codes.get(&code).copied())
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for PromoTable {
    /// The built-in codes: `WELCOME10`, `SUMMER20` and `FESTIVAL15`.
    fn default() -> Self {
        let codes = [
            ("WELCOME10", Decimal::new(10, 2)),
            ("SUMMER20", Decimal::new(20, 2)),
            ("FESTIVAL15", Decimal::new(15, 2)),
        ]
        .into_iter()
        .map(|(code, value)| (code.to_string(), Percentage::from(value)))
        .collect();

        Self { codes }
    }
}

/// Validates promo codes and hands back the discount they unlock.
#[derive(Debug, Clone, Default)]
pub struct PromoLedger {
    table: PromoTable,
    delay: Duration,
}

impl PromoLedger {
    /// Create a ledger over the given table, with no validation delay.
    pub fn new(table: PromoTable) -> Self {
        Self {
            table,
            delay: Duration::ZERO,
        }
    }

    /// Wait this long before resolving each lookup.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The table codes are checked against.
    pub fn table(&self) -> &PromoTable {
        &self.table
    }

    /// Check a code against the table without waiting.
    ///
    /// # Errors
    ///
    /// - [`PromoError::EmptyCode`]: the code is blank.
    /// - [`PromoError::InvalidCode`]: the code is not in the table.
    pub fn validate(&self, code: &str) -> Result<Percentage, PromoError> {
        let normalized = normalize_code(code).ok_or(PromoError::EmptyCode)?;

        self.table
            .lookup(&normalized)
            .ok_or(PromoError::InvalidCode(normalized))
    }

    /// Validate a code, resolving after the configured delay.
    ///
    /// Blank codes are rejected straight away.
    ///
    /// # Errors
    ///
    /// See [`PromoLedger::validate`].
    pub async fn apply(&self, code: &str) -> Result<Percentage, PromoError> {
        if normalize_code(code).is_none() {
            return Err(PromoError::EmptyCode);
        }

        if !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis(), "validating promo code");
            sleep(self.delay).await;
        }

        let discount = self.validate(code)?;

        info!(discount = %fraction(&discount), "promo code accepted");

        Ok(discount)
    }
}

/// Trim and upper-case a code, returning `None` if nothing is left.
fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}
