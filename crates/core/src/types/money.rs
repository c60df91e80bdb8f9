//! Currency-aware monetary amounts using decimal arithmetic.
//!
//! Amounts come from Shopify as the `Decimal` scalar, which is a JSON string
//! (`"40.0"`), but fixtures and older API versions send plain numbers. Both
//! deserialize into a [`Money`].
//!
//! Formatting follows the `en-US` locale: currency symbol before the amount,
//! `,` thousands separators and ISO 4217 minor units.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyCodeError {
    /// The code is not exactly three characters.
    #[error("currency code must be 3 letters (got {0:?})")]
    InvalidLength(String),
    /// The code contains something other than ASCII uppercase letters.
    #[error("currency code must be uppercase ASCII letters (got {0:?})")]
    InvalidCharacters(String),
}

/// An ISO 4217 currency code such as `USD` or `EUR`.
///
/// Any well-formed code is accepted; the set of currencies a shop sells in is
/// decided by Shopify, not by this crate.
///
/// ```
/// use merch_cart_core::CurrencyCode;
///
/// assert!(CurrencyCode::parse("USD").is_ok());
/// assert!(CurrencyCode::parse("usd").is_err());
/// assert!(CurrencyCode::parse("DOLLAR").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly three ASCII uppercase
    /// letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        if s.chars().count() != 3 {
            return Err(CurrencyCodeError::InvalidLength(s.to_owned()));
        }
        if !s.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CurrencyCodeError::InvalidCharacters(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits after the decimal point (ISO 4217 minor units).
    #[must_use]
    pub fn minor_units(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }

    /// The `en-US` display symbol, if the locale has one for this currency.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        let symbol = match self.0.as_str() {
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" => "¥",
            "CNY" => "CN¥",
            "CAD" => "CA$",
            "AUD" => "A$",
            "NZD" => "NZ$",
            "HKD" => "HK$",
            "MXN" => "MX$",
            "TWD" => "NT$",
            "BRL" => "R$",
            "INR" => "₹",
            "KRW" => "₩",
            "ILS" => "₪",
            "VND" => "₫",
            "PHP" => "₱",
            _ => return None,
        };
        Some(symbol)
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

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A monetary amount with an explicit currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
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

    /// Format for display, e.g. `$1,234.50`, `¥1,200` or `CHF 40.00`.
    ///
    /// Amounts are rounded half away from zero to the currency's minor units.
    /// Currencies without an `en-US` symbol are prefixed with their code and a
    /// non-breaking space.
    #[must_use]
    pub fn format(&self) -> String {
        let scale = self.currency_code.minor_units();
        let rounded = self
            .amount
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);

        let digits = format!("{:.prec$}", rounded.abs(), prec = scale as usize);
        let number = match digits.split_once('.') {
            Some((whole, fraction)) => format!("{}.{fraction}", group_thousands(whole)),
            None => group_thousands(&digits),
        };

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        match self.currency_code.symbol() {
            Some(symbol) => format!("{sign}{symbol}{number}"),
            None => format!("{sign}{}\u{a0}{number}", self.currency_code),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Insert `,` between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
