//! The dataset behind the cluster bar chart: one bar per cluster and category, where the
//! categories are the selected municipality, its comparison municipalities and the fund.

use crate::error::PipelineError;
use crate::model::{ClusterValues, FundAllocationTable, Unit};
use crate::pipeline::Normalized;
use crate::taxonomy::{ABBREVIATIONS, FUND};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the bars measure.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// The cluster total in € 1 mln.
    #[default]
    Total,
    /// The cluster total in € per resident.
    PerResident,
}

serde_plain::derive_display_from_serialize!(Measure);
serde_plain::derive_fromstr_from_deserialize!(Measure);

impl Measure {
    pub fn axis_label(self) -> &'static str {
        match self {
            Measure::Total => Unit::Million.label(),
            Measure::PerResident => "€ per inwoner",
        }
    }
}

/// The normalized net values of one category.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Series {
    category: String,
    values: ClusterValues,
    residents: u64,
}

impl Series {
    /// The local net cost of `municipality`.
    pub fn local(
        municipality: impl Into<String>,
        net: &Normalized<ClusterValues>,
        residents: u64,
    ) -> Self {
        Self {
            category: municipality.into(),
            values: (**net).clone(),
            residents,
        }
    }

    /// The fund allocation of the selected municipality.
    pub fn fund(fund: &Normalized<FundAllocationTable>, residents: u64) -> Self {
        Self {
            category: FUND.to_string(),
            values: fund.allocations().clone(),
            residents,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

/// One bar.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    #[serde(rename = "Taakveld")]
    pub cluster: String,
    #[serde(rename = "Waarde")]
    pub value: Decimal,
    #[serde(rename = "Categorie")]
    pub category: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub measure: Measure,
    pub axis: String,
    /// The cluster abbreviations in axis order.
    pub clusters: Vec<String>,
    /// The categories in bar order.
    pub categories: Vec<String>,
    pub rows: Vec<ChartRow>,
    pub legend: String,
}

impl ChartDataset {
    pub fn get(&self, cluster: &str, category: &str) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|r| r.cluster == cluster && r.category == category)
            .map(|r| r.value)
    }
}

/// Explains the abbreviations on the cluster axis, e.g. `OZB: Onroerendezaakbelasting, ...`.
pub fn legend() -> String {
    ABBREVIATIONS
        .iter()
        .map(|(name, abbreviation)| format!("{abbreviation}: {name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the chart rows for `series`, in series order and then in abbreviation order. Clusters
/// without an abbreviation are not charted and a cluster missing from a series has no bar.
pub fn chart_dataset(series: &[Series], measure: Measure) -> Result<ChartDataset, PipelineError> {
    let mut rows = Vec::new();
    for s in series {
        let values = match measure {
            Measure::Total => s.values.to_unit(Unit::Million),
            Measure::PerResident => {
                if s.residents == 0 {
                    return Err(PipelineError::DivisionByZero {
                        what: format!("the number of residents of {}", s.category),
                    });
                }
                let residents = Decimal::from(s.residents);
                s.values
                    .to_unit(Unit::Euro)
                    .map_values(|_, v| (v / residents).round_dp(2))
            }
        };
        for (cluster, abbreviation) in ABBREVIATIONS {
            if let Some(value) = values.get(cluster) {
                rows.push(ChartRow {
                    cluster: abbreviation.to_string(),
                    value,
                    category: s.category.clone(),
                });
            }
        }
    }
    Ok(ChartDataset {
        measure,
        axis: measure.axis_label().to_string(),
        clusters: ABBREVIATIONS.iter().map(|(_, a)| a.to_string()).collect(),
        categories: series.iter().map(|s| s.category.clone()).collect(),
        rows,
        legend: legend(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterRow, ClusterTable, ClusterValue};
    use crate::pipeline::{normalize_fund, normalize_local};
    use crate::taxonomy::{OVERHEAD, PROPERTY_TAX};

    fn local() -> Normalized<ClusterValues> {
        normalize_local(&ClusterTable::new(
            Unit::Thousand,
            vec![
                ClusterRow::new(PROPERTY_TAX, 5_000.into(), 200.into(), 0.into()),
                ClusterRow::new("Onderwijs", 50.into(), 3_000.into(), 100.into()),
                ClusterRow::new(OVERHEAD, 100.into(), 2_100.into(), 1_000.into()),
                ClusterRow::new("Overig", 0.into(), 10.into(), 0.into()),
            ],
        ))
    }

    fn fund() -> Normalized<FundAllocationTable> {
        normalize_fund(FundAllocationTable::new(
            "Utrecht",
            "S2024_2024",
            ClusterValues::new(
                Unit::Thousand,
                vec![
                    ClusterValue::new("Onderwijs", 2_000.into()),
                    ClusterValue::new(PROPERTY_TAX, (-4_000).into()),
                ],
            ),
        ))
    }

    #[test]
    fn test_total_in_millions() {
        let series = [Series::local("Utrecht", &local(), 10_000), Series::fund(&fund(), 10_000)];
        let chart = chart_dataset(&series, Measure::Total).unwrap();
        assert_eq!(chart.categories, vec!["Utrecht", FUND]);
        assert_eq!(chart.axis, "€ 1 mln.");
        // OZB is income, shown positive after normalization
        assert_eq!(chart.get("OZB", "Utrecht"), Some(Decimal::new(48, 1)));
        assert_eq!(chart.get("Onderwijs", "Utrecht"), Some(Decimal::new(295, 2)));
        assert_eq!(chart.get("OZB", FUND), Some(Decimal::from(4)));
        // no bar for clusters missing from the fund or without an abbreviation
        assert_eq!(chart.get("Overhead", FUND), None);
        assert!(chart.rows.iter().all(|r| r.cluster != "Overig"));
    }

    #[test]
    fn test_row_order() {
        let series = [Series::local("Utrecht", &local(), 10_000), Series::fund(&fund(), 10_000)];
        let chart = chart_dataset(&series, Measure::Total).unwrap();
        let order: Vec<(&str, &str)> = chart
            .rows
            .iter()
            .map(|r| (r.category.as_str(), r.cluster.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Utrecht", "OZB"),
                ("Utrecht", "Onderwijs"),
                ("Utrecht", "Overhead"),
                (FUND, "OZB"),
                (FUND, "Onderwijs"),
            ]
        );
    }

    #[test]
    fn test_per_resident() {
        let series = [Series::local("Utrecht", &local(), 10_000)];
        let chart = chart_dataset(&series, Measure::PerResident).unwrap();
        assert_eq!(chart.get("Onderwijs", "Utrecht"), Some(Decimal::new(29500, 2)));
    }

    #[test]
    fn test_per_resident_without_residents() {
        let series = [Series::local("Utrecht", &local(), 0)];
        assert!(matches!(
            chart_dataset(&series, Measure::PerResident),
            Err(PipelineError::DivisionByZero { .. })
        ));
        // the total does not need residents
        assert!(chart_dataset(&series, Measure::Total).is_ok());
    }

    #[test]
    fn test_legend() {
        let legend = legend();
        assert!(legend.starts_with("OZB: Onroerendezaakbelasting, OEM: Overige eigen middelen"));
        assert!(legend.ends_with("Overhead: Overhead"));
    }
}
