//! Computes the Gemeentefonds allocation per municipality and cluster from the published weights,
//! volumes and SIUDU figures of a circular.
//!
//! For a measure `m` with a code the contribution to cluster `c` is `uf × weight[m][c] × volume[m]`,
//! where `uf` is the uitkeringsfactor of the circular, or 1 for WOZ measures. Measures without a
//! code are SIUDU measures; their contribution is `weight[s][c] × siudu[s]`.

use crate::error::Res;
use crate::model::{Mapping, NumberStyle};
use crate::source::fund::NATIONAL_ROW;
use crate::source::iv3::parse_number;
use crate::source::{read_table, MUNICIPALITY_COLUMN};
use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const CODE_COLUMN: &str = "Codering maatstaf";
pub const MEASURE_NAME_COLUMN: &str = "Naam maatstaf";
pub const VOLUME_NAME_COLUMN: &str = "Naam";

const SOURCE_DELIMITER: u8 = b'\t';
const FACTOR_DELIMITER: u8 = b',';
const OUTPUT_DELIMITER: u8 = b';';

/// Columns between the municipality name and the first measure in volume and SIUDU files.
const DESCRIPTIVE_COLUMNS: usize = 2;

/// The weights of a circular, per measure and cluster.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Weights {
    clusters: Vec<String>,
    /// Measures with a code, keyed by code.
    measures: Vec<(String, Vec<Decimal>)>,
    /// SIUDU measures, keyed by name.
    siudu: Vec<(String, Vec<Decimal>)>,
}

impl Weights {
    pub fn parse(text: &str) -> Res<Self> {
        let (headers, data) = read_table(text, SOURCE_DELIMITER)?;
        let mapping = Mapping::new(&headers)?;
        let code_ix = mapping.require(CODE_COLUMN)?;
        let name_ix = mapping.require(MEASURE_NAME_COLUMN)?;
        let cluster_columns: Vec<usize> = (0..headers.len())
            .filter(|ix| *ix != code_ix && *ix != name_ix)
            .collect();

        let mut measures = Vec::new();
        let mut siudu = Vec::new();
        for (i, cells) in data.iter().enumerate() {
            let weights = cluster_columns
                .iter()
                .map(|ix| {
                    parse_number(&cells[*ix], NumberStyle::Dutch).with_context(|| {
                        format!("Bad weight in line {}, column '{}'", i + 2, headers[*ix])
                    })
                })
                .collect::<Res<Vec<_>>>()?;
            let code = cells[code_ix].trim();
            if code.is_empty() {
                siudu.push((cells[name_ix].trim().to_string(), weights));
            } else {
                measures.push((code.to_string(), weights));
            }
        }
        Ok(Self {
            clusters: cluster_columns
                .iter()
                .map(|ix| headers[*ix].trim().to_string())
                .collect(),
            measures,
            siudu,
        })
    }

    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }
}

/// A table with one row per municipality and one column per measure, as used for both the volumes
/// and the SIUDU figures.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct MeasureTable {
    measures: Vec<String>,
    rows: Vec<(String, Vec<Decimal>)>,
}

impl MeasureTable {
    pub fn parse(text: &str) -> Res<Self> {
        let (headers, data) = read_table(text, SOURCE_DELIMITER)?;
        let mapping = Mapping::new(&headers)?;
        let name_ix = mapping.require(VOLUME_NAME_COLUMN)?;
        let measure_columns: Vec<usize> = (0..headers.len())
            .filter(|ix| *ix != name_ix)
            .skip(DESCRIPTIVE_COLUMNS)
            .collect();

        let mut rows = Vec::with_capacity(data.len());
        for (i, cells) in data.iter().enumerate() {
            let values = measure_columns
                .iter()
                .map(|ix| {
                    parse_number(&cells[*ix], NumberStyle::Dutch).with_context(|| {
                        format!("Bad value in line {}, column '{}'", i + 2, headers[*ix])
                    })
                })
                .collect::<Res<Vec<_>>>()?;
            rows.push((cells[name_ix].trim().to_string(), values));
        }
        Ok(Self {
            measures: measure_columns
                .iter()
                .map(|ix| headers[*ix].trim().to_string())
                .collect(),
            rows,
        })
    }

    pub fn municipalities(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(name, _)| name.as_str())
    }

    fn row(&self, municipality: &str) -> Option<HashMap<&str, Decimal>> {
        self.rows
            .iter()
            .find(|(name, _)| name == municipality)
            .map(|(_, values)| {
                self.measures
                    .iter()
                    .map(String::as_str)
                    .zip(values.iter().copied())
                    .collect()
            })
    }
}

/// Reads the uitkeringsfactor table. Each row is the circular, the budget year and the factor; the
/// result is keyed by `{circular}_{year}`, e.g. `M2024_2025`.
pub fn uitkeringsfactoren(text: &str) -> Res<HashMap<String, Decimal>> {
    let (_, data) = read_table(text, FACTOR_DELIMITER)?;
    let mut factors = HashMap::new();
    for (i, cells) in data.iter().enumerate() {
        let (factor, key) = cells
            .split_last()
            .ok_or_else(|| anyhow!("Empty uitkeringsfactor in line {}", i + 2))?;
        let key = key
            .iter()
            .map(|s| s.trim())
            .collect::<Vec<_>>()
            .join("_");
        let factor = parse_number(factor, NumberStyle::Plain)
            .with_context(|| format!("Bad uitkeringsfactor in line {}", i + 2))?;
        factors.insert(key, factor);
    }
    Ok(factors)
}

fn is_woz(code: &str) -> bool {
    code.to_lowercase().contains("woz")
}

/// The allocation per municipality (in volume table order) and cluster, in euros.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct FundClusters {
    pub clusters: Vec<String>,
    pub rows: Vec<(String, Vec<Decimal>)>,
}

impl FundClusters {
    /// The column sums over all municipalities.
    pub fn national_total(&self) -> Vec<Decimal> {
        let mut total = vec![Decimal::ZERO; self.clusters.len()];
        for (_, values) in &self.rows {
            for (sum, value) in total.iter_mut().zip(values) {
                *sum += *value;
            }
        }
        total
    }

    /// Writes the `;` separated fund table with a trailing national total row.
    pub fn to_csv(&self) -> Res<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(OUTPUT_DELIMITER)
            .from_writer(Vec::new());
        let mut header = vec![String::new(), MUNICIPALITY_COLUMN.to_string()];
        header.extend(self.clusters.iter().cloned());
        writer.write_record(&header)?;

        let national = (NATIONAL_ROW.to_string(), self.national_total());
        for (ix, (name, values)) in self.rows.iter().chain([&national]).enumerate() {
            let mut record = vec![ix.to_string(), name.clone()];
            record.extend(values.iter().map(|v| v.round_dp(2).normalize().to_string()));
            writer.write_record(&record)?;
        }
        let bytes = writer
            .into_inner()
            .context("Unable to finish the fund table")?;
        String::from_utf8(bytes).context("The fund table is not valid UTF-8")
    }
}

/// Computes the allocation of every municipality in `volumes`.
pub fn fund_clusters(
    weights: &Weights,
    volumes: &MeasureTable,
    siudu: &MeasureTable,
    uitkeringsfactor: Decimal,
) -> Res<FundClusters> {
    let with_measures = weights.measures.len() == volumes.measures.len();
    if !with_measures {
        warn!(
            "Skipping the measures: {} weighted measures but {} volumes",
            weights.measures.len(),
            volumes.measures.len()
        );
    }
    let with_siudu = weights.siudu.len() == siudu.measures.len();
    if !with_siudu {
        warn!(
            "Skipping SIUDU: {} weighted SIUDU measures but {} SIUDU columns",
            weights.siudu.len(),
            siudu.measures.len()
        );
    }

    let mut rows = Vec::with_capacity(volumes.rows.len());
    for municipality in volumes.municipalities() {
        let mut totals = vec![Decimal::ZERO; weights.clusters.len()];
        if with_measures {
            let volume = volumes
                .row(municipality)
                .ok_or_else(|| anyhow!("No volumes for {municipality}"))?;
            for (code, cluster_weights) in &weights.measures {
                let Some(v) = volume.get(code.as_str()) else {
                    continue;
                };
                let factor = if is_woz(code) {
                    Decimal::ONE
                } else {
                    uitkeringsfactor
                };
                for (total, w) in totals.iter_mut().zip(cluster_weights) {
                    *total += factor * *w * *v;
                }
            }
        }
        if with_siudu {
            let figures = siudu
                .row(municipality)
                .ok_or_else(|| anyhow!("No SIUDU figures for {municipality}"))?;
            for (name, cluster_weights) in &weights.siudu {
                let Some(s) = figures.get(name.as_str()) else {
                    continue;
                };
                for (total, w) in totals.iter_mut().zip(cluster_weights) {
                    *total += *w * *s;
                }
            }
        }
        rows.push((municipality.to_string(), totals));
    }
    debug!(
        "Computed {} clusters for {} municipalities",
        weights.clusters.len(),
        rows.len()
    );
    Ok(FundClusters {
        clusters: weights.clusters.clone(),
        rows,
    })
}
