//! Gemeentefonds circulars.
//!
//! The fund publishes a May and a September circular each year. The allocation for a budget year
//! is taken from the circulars that apply to it, identified by a fund path such as `S2024_2025`:
//! the September 2024 circular for budget year 2025.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::Res;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Month {
    May,
    September,
}

impl Month {
    pub fn letter(self) -> char {
        match self {
            Month::May => 'M',
            Month::September => 'S',
        }
    }

    /// The Dutch name used in circular labels.
    pub fn label(self) -> &'static str {
        match self {
            Month::May => "Mei",
            Month::September => "September",
        }
    }
}

/// A circular, written as its month letter and year, e.g. `S2024`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Circulaire {
    pub month: Month,
    pub year: i32,
}

impl Circulaire {
    pub fn new(month: Month, year: i32) -> Self {
        Self { month, year }
    }

    /// The option for using this circular for `budget_year`.
    pub fn option_for(self, budget_year: i32) -> CirculaireOption {
        CirculaireOption {
            label: format!("{} {}", self.month.label(), self.year),
            path: format!("{self}_{budget_year}"),
        }
    }
}

impl Display for Circulaire {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.month.letter(), self.year)
    }
}

impl FromStr for Circulaire {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let month = match chars.next() {
            Some('M') | Some('m') => Month::May,
            Some('S') | Some('s') => Month::September,
            _ => bail!("A circular starts with M or S, got '{s}'"),
        };
        let year = chars
            .as_str()
            .parse::<i32>()
            .with_context(|| format!("Invalid year in circular '{s}'"))?;
        Ok(Self { month, year })
    }
}

impl Serialize for Circulaire {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Circulaire {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Circulaire::from_str(&s).map_err(|e| serde::de::Error::custom(format!("{e:#}")))
    }
}

/// A circular that can be selected for a budget year: a label such as `September 2024` and the
/// fund path of its allocation table, such as `S2024_2025`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CirculaireOption {
    pub label: String,
    pub path: String,
}

/// The circulars that apply to budget `year`, given the latest published circular.
///
/// - A year after the latest circular only has the latest circular.
/// - In the year of a May circular there is the May circular and last year's September circular.
/// - In the year of a September circular there is that September circular.
/// - Years before the latest circular have none.
pub fn available_circulaires(year: i32, latest: Circulaire) -> Vec<CirculaireOption> {
    if year > latest.year {
        return vec![latest.option_for(year)];
    }
    if year < latest.year {
        return Vec::new();
    }
    match latest.month {
        Month::May => vec![
            latest.option_for(year),
            Circulaire::new(Month::September, year - 1).option_for(year),
        ],
        Month::September => vec![latest.option_for(year)],
    }
}
