use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The currency unit of the values in a table.
///
/// Iv3 figures are published in thousands of euros, fund files are in euros and charts are drawn
/// in millions. Converting between units is exact decimal scaling.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Euro,
    #[default]
    Thousand,
    Million,
}

serde_plain::derive_display_from_serialize!(Unit);
serde_plain::derive_fromstr_from_deserialize!(Unit);

impl Unit {
    /// The number of euros in one of this unit.
    pub fn euros(self) -> Decimal {
        match self {
            Unit::Euro => Decimal::ONE,
            Unit::Thousand => Decimal::from(1_000),
            Unit::Million => Decimal::from(1_000_000),
        }
    }

    /// Converts `value`, expressed in `self`, to `to`.
    pub fn convert(self, value: Decimal, to: Unit) -> Decimal {
        if self == to {
            return value;
        }
        value * self.euros() / to.euros()
    }

    /// A short label for chart axes and table captions.
    pub fn label(self) -> &'static str {
        match self {
            Unit::Euro => "€",
            Unit::Thousand => "€ 1.000",
            Unit::Million => "€ 1 mln.",
        }
    }
}
