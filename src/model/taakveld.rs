use crate::model::Unit;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One task field ("taakveld") of one municipality: its income (`Baten`), cost (`Lasten`) and the
/// salary part of the cost (`L1.1 Salarissen en sociale lasten`).
///
/// The label is the dotted code followed by its name, e.g. `0.1 Bestuur`. `Saldo` is always
/// derived as `Lasten - Baten`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskFieldRecord {
    label: String,
    baten: Decimal,
    lasten: Decimal,
    salaries: Decimal,
}

impl TaskFieldRecord {
    pub fn new(
        label: impl Into<String>,
        baten: Decimal,
        lasten: Decimal,
        salaries: Decimal,
    ) -> Self {
        Self {
            label: label.into(),
            baten,
            lasten,
            salaries,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn baten(&self) -> Decimal {
        self.baten
    }

    pub fn lasten(&self) -> Decimal {
        self.lasten
    }

    pub fn salaries(&self) -> Decimal {
        self.salaries
    }

    pub fn saldo(&self) -> Decimal {
        self.lasten - self.baten
    }
}

/// All task-field records of one municipality for one year and document.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DetailTable {
    municipality: String,
    unit: Unit,
    records: Vec<TaskFieldRecord>,
}

impl DetailTable {
    pub fn new(municipality: impl Into<String>, unit: Unit, records: Vec<TaskFieldRecord>) -> Self {
        Self {
            municipality: municipality.into(),
            unit,
            records,
        }
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn records(&self) -> &[TaskFieldRecord] {
        &self.records
    }

    pub fn get(&self, label: &str) -> Option<&TaskFieldRecord> {
        self.records.iter().find(|r| r.label == label)
    }
}

/// The descriptive attributes of a municipality that travel with the Iv3 analysis table.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityProfile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urbanity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residents: Option<u64>,
    /// Sociaal-economische structuur.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    /// Centrumfunctie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centrum: Option<String>,
}

impl MunicipalityProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
