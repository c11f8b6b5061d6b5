//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are `rust_decimal::Decimal`, never floating point, so repeated
//! additions and multiplications stay exact to the currency's minor unit.
//! Prices serialize with the amount as a decimal string, matching what the
//! Shopify Storefront API returns for `MoneyV2.amount`.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyCodeError {
    /// The code is not three ASCII letters.
    #[error("currency code must be three letters (got {0:?})")]
    Malformed(String),
}

/// ISO 4217 currency code, stored uppercase (e.g. `EUR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, accepting any letter case.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyCodeError::Malformed`] unless the input is exactly
    /// three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, CurrencyCodeError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(CurrencyCodeError::Malformed(code.to_owned()))
        }
    }

    /// The euro.
    #[must_use]
    pub fn eur() -> Self {
        Self("EUR".to_owned())
    }

    /// The US dollar.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_owned())
    }

    /// The three-letter code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits after the decimal separator in the minor unit.
    #[must_use]
    pub fn minor_units(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }

    /// Display symbol for the currencies the storefront sells in.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" | "CAD" | "AUD" => Some("$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "JPY" => Some("¥"),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// This price multiplied by a whole quantity, `None` if the amount no
    /// longer fits in a `Decimal`.
    #[must_use]
    pub fn checked_times(&self, quantity: u32) -> Option<Self> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code.clone()))
    }

    /// Amount rounded to the currency's minor unit (half away from zero).
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount.round_dp_with_strategy(
            self.currency_code.minor_units(),
            RoundingStrategy::MidpointAwayFromZero,
        )
    }

    /// Format for display, e.g. `€19.90` or `19.90 CHF`.
    #[must_use]
    pub fn display(&self) -> String {
        let mut amount = self.rounded();
        amount.rescale(self.currency_code.minor_units());
        match self.currency_code.symbol() {
            Some(symbol) if amount.is_sign_negative() => format!("-{symbol}{}", amount.abs()),
            Some(symbol) => format!("{symbol}{amount}"),
            None => format!("{amount} {}", self.currency_code),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
