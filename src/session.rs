//! The per-interaction context: the current selection and the user's override table.
//!
//! The override is the only state that outlives one computation. It is bound to the selection it
//! was made for and is discarded as soon as the year or the municipality changes.

use crate::error::Res;
use crate::model::{DetailTable, TaskFieldRecord};
use crate::utils;
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::{debug, warn};

/// A budget year and a municipality.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub year: i32,
    pub municipality: String,
}

impl Selection {
    pub fn new(year: i32, municipality: impl Into<String>) -> Self {
        Self {
            year,
            municipality: municipality.into(),
        }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.municipality, self.year)
    }
}

/// One edited task field.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OverrideRow {
    pub taakveld: String,
    pub baten: Decimal,
    pub lasten: Decimal,
}

/// A user-edited copy of the `Baten` and `Lasten` of a detail table.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OverrideTable {
    #[serde(flatten)]
    selection: Selection,
    rows: Vec<OverrideRow>,
}

impl OverrideTable {
    pub fn new(selection: Selection, rows: Vec<OverrideRow>) -> Self {
        Self { selection, rows }
    }

    /// An override that starts out equal to `detail`.
    pub fn from_detail(selection: Selection, detail: &DetailTable) -> Self {
        let rows = detail
            .records()
            .iter()
            .map(|r| OverrideRow {
                taakveld: r.label().to_string(),
                baten: r.baten(),
                lasten: r.lasten(),
            })
            .collect();
        Self { selection, rows }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn rows(&self) -> &[OverrideRow] {
        &self.rows
    }

    /// Sets the values of a task field, adding it when it is not present.
    pub fn set(&mut self, taakveld: &str, baten: Decimal, lasten: Decimal) {
        match self.rows.iter_mut().find(|r| r.taakveld == taakveld) {
            Some(row) => {
                row.baten = baten;
                row.lasten = lasten;
            }
            None => self.rows.push(OverrideRow {
                taakveld: taakveld.to_string(),
                baten,
                lasten,
            }),
        }
    }

    /// The rows as task-field records. The override carries no salary column, overhead fractions
    /// always come from the published table.
    pub fn records(&self) -> Vec<TaskFieldRecord> {
        self.rows
            .iter()
            .map(|r| TaskFieldRecord::new(&r.taakveld, r.baten, r.lasten, Decimal::ZERO))
            .collect()
    }

    pub fn from_json(json: &str) -> Res<Self> {
        serde_json::from_str(json).context("Unable to parse the override table")
    }

    pub(crate) async fn load(path: &Path) -> Res<Self> {
        let json = utils::read(path).await?;
        Self::from_json(&json).with_context(|| format!("Invalid override table {}", path.display()))
    }

    pub(crate) async fn save(&self, path: &Path) -> Res<()> {
        let json = serde_json::to_string_pretty(self).context("Unable to serialize the override")?;
        utils::write(path, json).await
    }
}

/// What was thrown away by a change of selection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Invalidation {
    /// The override belonged to another year or municipality.
    StaleOverride { previous: Selection },
}

/// The context owned by the interaction handler.
#[derive(Debug, Default, Clone)]
pub struct Session {
    selection: Option<Selection>,
    override_table: Option<OverrideTable>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Makes `selection` current. An override made for another selection is discarded.
    pub fn select(&mut self, selection: Selection) -> Option<Invalidation> {
        debug!("Selecting {selection}");
        let invalidation = match &self.override_table {
            Some(o) if o.selection != selection => {
                warn!(
                    "Discarding the override for {} because {selection} was selected",
                    o.selection
                );
                Some(Invalidation::StaleOverride {
                    previous: o.selection.clone(),
                })
            }
            _ => None,
        };
        if invalidation.is_some() {
            self.override_table = None;
        }
        self.selection = Some(selection);
        invalidation
    }

    /// Binds `override_table` to the current selection. An override made for another selection
    /// is rejected.
    pub fn set_override(&mut self, override_table: OverrideTable) -> Res<()> {
        match &self.selection {
            None => bail!("Select a year and a municipality before setting an override"),
            Some(current) if *current != override_table.selection => bail!(
                "The override was made for {} and cannot be used for {current}",
                override_table.selection
            ),
            Some(_) => {
                self.override_table = Some(override_table);
                Ok(())
            }
        }
    }

    pub fn clear_override(&mut self) -> Option<OverrideTable> {
        self.override_table.take()
    }

    /// The override, but only when it belongs to the current selection.
    pub fn active_override(&self) -> Option<&OverrideTable> {
        match (&self.selection, &self.override_table) {
            (Some(current), Some(o)) if *current == o.selection => Some(o),
            _ => None,
        }
    }
}
