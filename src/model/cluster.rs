use crate::model::Unit;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The aggregated totals of one policy cluster. `Saldo` is derived, so `saldo == lasten - baten`
/// holds after any change.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterRow {
    name: String,
    baten: Decimal,
    lasten: Decimal,
    salaries: Decimal,
}

impl ClusterRow {
    pub fn new(
        name: impl Into<String>,
        baten: Decimal,
        lasten: Decimal,
        salaries: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            baten,
            lasten,
            salaries,
        }
    }

    /// A row with all values zero.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn baten(&self) -> Decimal {
        self.baten
    }

    pub fn lasten(&self) -> Decimal {
        self.lasten
    }

    /// `L1.1 Salarissen en sociale lasten`.
    pub fn salaries(&self) -> Decimal {
        self.salaries
    }

    pub fn saldo(&self) -> Decimal {
        self.lasten - self.baten
    }

    pub(crate) fn add(&mut self, baten: Decimal, lasten: Decimal, salaries: Decimal) {
        self.baten += baten;
        self.lasten += lasten;
        self.salaries += salaries;
    }

    pub(crate) fn add_lasten(&mut self, amount: Decimal) {
        self.lasten += amount;
    }

    pub(crate) fn clear_baten_lasten(&mut self) {
        self.baten = Decimal::ZERO;
        self.lasten = Decimal::ZERO;
    }
}

/// Cluster-level totals in taxonomy order.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterTable {
    unit: Unit,
    rows: Vec<ClusterRow>,
}

impl ClusterTable {
    pub fn new(unit: Unit, rows: Vec<ClusterRow>) -> Self {
        Self { unit, rows }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn rows(&self) -> &[ClusterRow] {
        &self.rows
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.name())
    }

    pub fn get(&self, name: &str) -> Option<&ClusterRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ClusterRow> {
        self.rows.iter_mut().find(|r| r.name == name)
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut ClusterRow> {
        self.rows.iter_mut()
    }

    pub fn total_baten(&self) -> Decimal {
        self.rows.iter().map(|r| r.baten).sum()
    }

    pub fn total_lasten(&self) -> Decimal {
        self.rows.iter().map(|r| r.lasten).sum()
    }

    pub fn total_salaries(&self) -> Decimal {
        self.rows.iter().map(|r| r.salaries).sum()
    }

    /// Reduces the table to its net values (`Saldo`).
    pub fn net_values(&self) -> ClusterValues {
        ClusterValues::new(
            self.unit,
            self.rows
                .iter()
                .map(|r| ClusterValue::new(r.name(), r.saldo()))
                .collect(),
        )
    }
}

/// A single value per cluster.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterValue {
    pub cluster: String,
    pub value: Decimal,
}

impl ClusterValue {
    pub fn new(cluster: impl Into<String>, value: Decimal) -> Self {
        Self {
            cluster: cluster.into(),
            value,
        }
    }
}

/// One value per cluster in a given unit: the net cost of a municipality or the fund allocation.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterValues {
    unit: Unit,
    values: Vec<ClusterValue>,
}

impl ClusterValues {
    pub fn new(unit: Unit, values: Vec<ClusterValue>) -> Self {
        Self { unit, values }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn values(&self) -> &[ClusterValue] {
        &self.values
    }

    pub fn get(&self, cluster: &str) -> Option<Decimal> {
        self.values
            .iter()
            .find(|v| v.cluster == cluster)
            .map(|v| v.value)
    }

    pub fn total(&self) -> Decimal {
        self.values.iter().map(|v| v.value).sum()
    }

    /// Returns a copy expressed in `unit`.
    pub fn to_unit(&self, unit: Unit) -> ClusterValues {
        ClusterValues {
            unit,
            values: self
                .values
                .iter()
                .map(|v| ClusterValue::new(&v.cluster, self.unit.convert(v.value, unit)))
                .collect(),
        }
    }

    /// Returns a copy in which `f` has been applied to the value of every cluster.
    pub(crate) fn map_values<F>(self, mut f: F) -> ClusterValues
    where
        F: FnMut(&str, Decimal) -> Decimal,
    {
        ClusterValues {
            unit: self.unit,
            values: self
                .values
                .into_iter()
                .map(|v| {
                    let value = f(&v.cluster, v.value);
                    ClusterValue::new(v.cluster, value)
                })
                .collect(),
        }
    }
}

/// The Gemeentefonds allocation per cluster for one municipality and one circular.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FundAllocationTable {
    municipality: String,
    circulaire: String,
    allocations: ClusterValues,
}

impl FundAllocationTable {
    pub fn new(
        municipality: impl Into<String>,
        circulaire: impl Into<String>,
        allocations: ClusterValues,
    ) -> Self {
        Self {
            municipality: municipality.into(),
            circulaire: circulaire.into(),
            allocations,
        }
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    /// The fund path of the circular, e.g. `S2024_2025`.
    pub fn circulaire(&self) -> &str {
        &self.circulaire
    }

    pub fn allocations(&self) -> &ClusterValues {
        &self.allocations
    }

    pub(crate) fn map_allocations<F>(self, f: F) -> FundAllocationTable
    where
        F: FnMut(&str, Decimal) -> Decimal,
    {
        FundAllocationTable {
            municipality: self.municipality,
            circulaire: self.circulaire,
            allocations: self.allocations.map_values(f),
        }
    }
}
