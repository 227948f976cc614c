//! Amount type for monetary values as they appear in source tables and reports.
//!
//! Source tables use two number styles: plain (`-1234.5`, as written by the Iv3 analysis files)
//! and Dutch (`-1.234,5`, as found in the Gemeentefonds weight and volume files). `Amount` parses
//! both and prints with Dutch grouping.

use format_num::NumberFormat;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The way numbers are written in a source file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberStyle {
    /// `.` is the decimal separator and `,` (if present) groups thousands.
    #[default]
    Plain,
    /// `,` is the decimal separator and `.` (if present) groups thousands.
    Dutch,
}

/// Represents how amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ euro: true, grouped: true, decimals: 2 }` -> `-€ 60.000,00`
///  - `AmountFormat{ euro: false, grouped: true, decimals: 0 }` -> `-60.000`
///  - `AmountFormat{ euro: false, grouped: false, .. }` -> `-60000.00` (the raw decimal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    euro: bool,
    grouped: bool,
    decimals: u8,
}

impl AmountFormat {
    pub const fn new(euro: bool, grouped: bool, decimals: u8) -> Self {
        Self {
            euro,
            grouped,
            decimals,
        }
    }

    /// Whole units with grouping and no currency sign, used for table columns in € 1.000.
    pub const fn whole() -> Self {
        Self::new(false, true, 0)
    }

    /// Euros and cents, used for per-resident columns.
    pub const fn euros() -> Self {
        Self::new(true, true, 2)
    }
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    euro: false,
    grouped: false,
    decimals: 2,
};

/// Represents a monetary amount.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// ```
/// # use begrotingsanalyse::model::{Amount, NumberStyle};
/// let a = Amount::parse("-1.234,50", NumberStyle::Dutch).unwrap();
/// let b: Amount = "-1234.5".parse().unwrap();
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    pub const fn new_with_format(value: Decimal, format: AmountFormat) -> Self {
        Self { value, format }
    }

    /// Parses `s` written in `style`. Empty strings parse to zero, as pandas writes missing values
    /// as empty cells.
    pub fn parse(s: &str, style: NumberStyle) -> Result<Self, AmountError> {
        let trimmed = s.trim();
        let (euro, rest) = match trimmed.strip_prefix('€') {
            Some(after) => (true, after.trim_start()),
            None => match trimmed.strip_prefix("-€") {
                Some(after) => (true, after.trim_start()),
                None => (false, trimmed),
            },
        };
        let negative_euro = euro && trimmed.starts_with('-');

        if rest.is_empty() {
            return Ok(Amount::default());
        }

        let (group_sep, decimal_sep) = match style {
            NumberStyle::Plain => (',', '.'),
            NumberStyle::Dutch => ('.', ','),
        };
        let without_groups: String = rest.chars().filter(|&c| c != group_sep).collect();
        let grouped = without_groups.len() < rest.len();
        let normalized = if decimal_sep == '.' {
            without_groups
        } else {
            without_groups.replace(decimal_sep, ".")
        };
        let normalized = if negative_euro {
            format!("-{normalized}")
        } else {
            normalized
        };

        let value = parse_decimal(&normalized)?;
        let decimals = u8::try_from(value.scale()).unwrap_or(u8::MAX);
        Ok(Amount {
            value,
            format: AmountFormat {
                euro,
                grouped,
                decimals,
            },
        })
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn format(&self) -> AmountFormat {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }
}

/// Accepts scientific notation too, which pandas emits for very small floats.
fn parse_decimal(s: &str) -> Result<Decimal, AmountError> {
    match Decimal::from_str(s) {
        Ok(d) => Ok(d),
        Err(e) => {
            if s.contains(['e', 'E']) {
                Decimal::from_scientific(s).map_err(AmountError)
            } else {
                Err(AmountError(e))
            }
        }
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s, NumberStyle::Plain)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = u32::from(self.format.decimals);
        let rounded = self.value.round_dp(decimals);
        let (sign, num) = if rounded.is_sign_negative() && !rounded.is_zero() {
            ("-", rounded.abs())
        } else {
            ("", rounded.abs())
        };

        let euro = if self.format.euro { "€ " } else { "" };

        if self.format.grouped {
            let pattern = format!(",.{decimals}f");
            let us = NumberFormat::new().format(&pattern, num.to_f64().unwrap_or_default());
            write!(f, "{sign}{euro}{}", to_dutch_separators(&us))
        } else {
            write!(f, "{sign}{euro}{num}")
        }
    }
}

/// Swaps `,` and `.` so that `1,234.50` becomes `1.234,50`.
fn to_dutch_separators(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect()
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
