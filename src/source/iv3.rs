//! The Iv3 analysis table: one row per municipality and task field, with the class attributes of
//! the municipality repeated on each row. Values are in € 1.000.

use crate::error::Res;
use crate::model::{
    Amount, DetailTable, Mapping, MunicipalityProfile, NumberStyle, TaskFieldRecord, Unit,
};
use crate::source::{read_table, same_municipality, MUNICIPALITY_COLUMN};
use anyhow::{anyhow, Context};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub const TASK_FIELD_COLUMN: &str = "Taakveld";
pub const BATEN_COLUMN: &str = "Baten";
pub const LASTEN_COLUMN: &str = "Lasten";
pub const SALARIES_COLUMN: &str = "L1.1 Salarissen en sociale lasten";
pub const PROVINCE_COLUMN: &str = "Provincie";
pub const SIZE_CLASS_COLUMN: &str = "Gemeentegrootte";
pub const URBANITY_COLUMN: &str = "Stedelijkheid";
pub const RESIDENTS_COLUMN: &str = "Inwonertal";
pub const STRUCTURE_COLUMN: &str = "Sociaal-economische structuur";
pub const CENTRUM_COLUMN: &str = "Centrumfunctie";

pub(crate) const DELIMITER: u8 = b';';

#[derive(Debug, Clone, Eq, PartialEq)]
struct Iv3Row {
    municipality: String,
    record: TaskFieldRecord,
}

/// A parsed Iv3 analysis table for one year and document.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Iv3Table {
    profiles: Vec<MunicipalityProfile>,
    rows: Vec<Iv3Row>,
}

impl Iv3Table {
    /// Parses the `;` separated analysis table. Every numeric cell is parsed here; a bad cell is an
    /// error that names its line and column.
    pub fn parse(text: &str) -> Res<Self> {
        let (headers, data) = read_table(text, DELIMITER)?;
        let mapping = Mapping::new(&headers)?;
        let municipality_ix = mapping.require(MUNICIPALITY_COLUMN)?;
        let label_ix = mapping.require(TASK_FIELD_COLUMN)?;
        let baten_ix = mapping.require(BATEN_COLUMN)?;
        let lasten_ix = mapping.require(LASTEN_COLUMN)?;
        let salaries_ix = mapping.require(SALARIES_COLUMN)?;

        let mut profiles: Vec<MunicipalityProfile> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut rows = Vec::with_capacity(data.len());
        for (i, cells) in data.iter().enumerate() {
            let line = i + 2;
            let municipality = cells[municipality_ix].trim().to_string();
            let label = cells[label_ix].trim().to_string();
            let number = |ix: usize| -> Res<Decimal> {
                parse_number(&cells[ix], NumberStyle::Plain).with_context(|| {
                    format!(
                        "Bad value in line {line}, column '{}'",
                        mapping.headers()[ix]
                    )
                })
            };
            let record = TaskFieldRecord::new(
                label,
                number(baten_ix)?,
                number(lasten_ix)?,
                number(salaries_ix)?,
            );

            if !seen.contains(&municipality) {
                let profile = parse_profile(&mapping, cells, &municipality)
                    .with_context(|| format!("Bad class data in line {line}"))?;
                profiles.push(profile);
                seen.insert(municipality.clone());
            }
            rows.push(Iv3Row {
                municipality,
                record,
            });
        }
        debug!(
            "Parsed {} Iv3 rows for {} municipalities",
            rows.len(),
            profiles.len()
        );
        Ok(Self { profiles, rows })
    }

    /// The municipalities in the order they first appear.
    pub fn municipalities(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn profiles(&self) -> &[MunicipalityProfile] {
        &self.profiles
    }

    pub fn profile(&self, municipality: &str) -> Option<&MunicipalityProfile> {
        self.profiles
            .iter()
            .find(|p| p.name == municipality)
            .or_else(|| {
                self.profiles
                    .iter()
                    .find(|p| same_municipality(&p.name, municipality))
            })
    }

    /// The distinct task-field labels of the table, sorted.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.record.label()).collect()
    }

    /// The profile and detail table of `municipality`.
    pub fn detail(&self, municipality: &str) -> Res<(MunicipalityProfile, DetailTable)> {
        let profile = self
            .profile(municipality)
            .ok_or_else(|| anyhow!("The municipality '{municipality}' is not in the Iv3 table"))?
            .clone();
        let records = self
            .rows
            .iter()
            .filter(|r| r.municipality == profile.name)
            .map(|r| r.record.clone())
            .collect();
        let detail = DetailTable::new(&profile.name, Unit::Thousand, records);
        Ok((profile, detail))
    }
}

pub(crate) fn parse_number(cell: &str, style: NumberStyle) -> Res<Decimal> {
    Ok(Amount::parse(cell, style)?.value())
}

fn optional_text(mapping: &Mapping, cells: &[String], column: &str) -> Option<String> {
    mapping
        .index(column)
        .map(|ix| cells[ix].trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub(crate) fn parse_residents(cell: &str) -> Res<Option<u64>> {
    if cell.trim().is_empty() {
        return Ok(None);
    }
    let value = parse_number(cell, NumberStyle::Plain)?;
    let residents = value
        .trunc()
        .to_u64()
        .ok_or_else(|| anyhow!("'{cell}' is not a number of residents"))?;
    Ok(Some(residents))
}

/// Reads the class attributes of a municipality from a row that has them.
pub(crate) fn parse_profile(
    mapping: &Mapping,
    cells: &[String],
    name: &str,
) -> Res<MunicipalityProfile> {
    let residents = match mapping.index(RESIDENTS_COLUMN) {
        Some(ix) => parse_residents(&cells[ix])
            .with_context(|| format!("Bad value in column '{RESIDENTS_COLUMN}'"))?,
        None => None,
    };
    Ok(MunicipalityProfile {
        name: name.to_string(),
        province: optional_text(mapping, cells, PROVINCE_COLUMN),
        size_class: optional_text(mapping, cells, SIZE_CLASS_COLUMN),
        urbanity: optional_text(mapping, cells, URBANITY_COLUMN),
        residents,
        structure: optional_text(mapping, cells, STRUCTURE_COLUMN),
        centrum: optional_text(mapping, cells, CENTRUM_COLUMN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Gemeenten;Taakveld;L1.1 Salarissen en sociale lasten;Baten;Lasten;Provincie;Gemeentegrootte;Stedelijkheid;Inwonertal
Utrecht;0.1 Bestuur;400;0;1000;Utrecht;250.000 inwoners of meer;Zeer sterk stedelijk;367984
Utrecht;0.4 Overhead;1000;100;2100.5;Utrecht;250.000 inwoners of meer;Zeer sterk stedelijk;367984
Bergen (NH.);0.1 Bestuur;50;;300;Noord-Holland;20.000 tot 50.000 inwoners;Weinig stedelijk;29770
";

    #[test]
    fn test_parse() {
        let table = Iv3Table::parse(TABLE).unwrap();
        assert_eq!(
            table.municipalities().collect::<Vec<_>>(),
            vec!["Utrecht", "Bergen (NH.)"]
        );
        let (profile, detail) = table.detail("Utrecht").unwrap();
        assert_eq!(profile.residents, Some(367_984));
        assert_eq!(profile.province.as_deref(), Some("Utrecht"));
        assert_eq!(profile.structure, None);
        assert_eq!(detail.records().len(), 2);
        assert_eq!(detail.unit(), Unit::Thousand);
        let overhead = detail.get("0.4 Overhead").unwrap();
        assert_eq!(overhead.lasten(), Decimal::new(21005, 1));
        assert_eq!(overhead.salaries(), Decimal::from(1000));
    }

    #[test]
    fn test_one_profile_per_municipality() {
        let text = "Gemeenten;Taakveld;L1.1 Salarissen en sociale lasten;Baten;Lasten\n\
                    Zeist;0.1 Bestuur;1;2;3\n\
                    Utrecht;0.1 Bestuur;1;2;3\n\
                    Zeist;0.2 Burgerzaken;1;2;3\n\
                    Utrecht;0.2 Burgerzaken;1;2;3\n";
        let table = Iv3Table::parse(text).unwrap();
        assert_eq!(
            table.municipalities().collect::<Vec<_>>(),
            vec!["Zeist", "Utrecht"]
        );
        assert_eq!(table.detail("Zeist").unwrap().1.records().len(), 2);
    }

    #[test]
    fn test_empty_cell_is_zero() {
        let table = Iv3Table::parse(TABLE).unwrap();
        let (_, detail) = table.detail("Bergen (NH.)").unwrap();
        assert_eq!(detail.records()[0].baten(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_municipality() {
        let table = Iv3Table::parse(TABLE).unwrap();
        assert!(table.detail("Zeist").is_err());
    }

    #[test]
    fn test_bad_cell_names_line_and_column() {
        let text = "Gemeenten;Taakveld;L1.1 Salarissen en sociale lasten;Baten;Lasten\n\
                    Utrecht;0.1 Bestuur;1;2;3\n\
                    Utrecht;0.2 Burgerzaken;1;twee;3\n";
        let err = Iv3Table::parse(text).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("'Baten'"), "{message}");
    }

    #[test]
    fn test_missing_column() {
        let text = "Gemeenten;Taakveld;Baten;Lasten\nUtrecht;0.1 Bestuur;1;2\n";
        let err = Iv3Table::parse(text).unwrap_err();
        assert!(format!("{err:#}").contains(SALARIES_COLUMN));
    }

    #[test]
    fn test_labels() {
        let table = Iv3Table::parse(TABLE).unwrap();
        let labels: Vec<&str> = table.labels().into_iter().collect();
        assert_eq!(labels, vec!["0.1 Bestuur", "0.4 Overhead"]);
    }
}
