//! The Gemeentefonds allocation table of one circular: one row per municipality, one column per
//! cluster. The published files are in euros; they are scaled to € 1.000 when parsed.

use crate::error::Res;
use crate::model::{ClusterValue, ClusterValues, FundAllocationTable, Mapping, NumberStyle, Unit};
use crate::source::iv3::parse_number;
use crate::source::{read_table, same_municipality, MUNICIPALITY_COLUMN};
use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use tracing::debug;

/// A column with the total over all clusters, not a cluster itself.
pub const TOTAL_COLUMN: &str = "Totaal";
/// The row with the total over all municipalities.
pub const NATIONAL_ROW: &str = "Nederland";

pub(crate) const DELIMITER: u8 = b';';

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct FundTable {
    circulaire: String,
    clusters: Vec<String>,
    rows: Vec<(String, Vec<Decimal>)>,
}

impl FundTable {
    /// Parses the table of the circular with fund path `circulaire`.
    pub fn parse(circulaire: &str, text: &str) -> Res<Self> {
        let (headers, data) = read_table(text, DELIMITER)?;
        let mapping = Mapping::new(&headers)?;
        let name_ix = mapping.require(MUNICIPALITY_COLUMN)?;
        let cluster_columns: Vec<(usize, String)> = mapping
            .headers()
            .iter()
            .enumerate()
            // the unnamed column is the row number written by pandas
            .filter(|(_, h)| !h.is_empty() && *h != MUNICIPALITY_COLUMN && *h != TOTAL_COLUMN)
            .map(|(ix, h)| (ix, h.clone()))
            .collect();

        let mut rows = Vec::with_capacity(data.len());
        for (i, cells) in data.iter().enumerate() {
            let values = cluster_columns
                .iter()
                .map(|(ix, header)| {
                    parse_number(&cells[*ix], NumberStyle::Plain)
                        .map(|euros| Unit::Euro.convert(euros, Unit::Thousand))
                        .with_context(|| {
                            format!("Bad value in line {}, column '{header}'", i + 2)
                        })
                })
                .collect::<Res<Vec<_>>>()?;
            rows.push((cells[name_ix].trim().to_string(), values));
        }
        debug!(
            "Parsed the fund table {circulaire} with {} clusters and {} rows",
            cluster_columns.len(),
            rows.len()
        );
        Ok(Self {
            circulaire: circulaire.to_string(),
            clusters: cluster_columns.into_iter().map(|(_, h)| h).collect(),
            rows,
        })
    }

    pub fn circulaire(&self) -> &str {
        &self.circulaire
    }

    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }

    /// The municipalities in the table, without the national total.
    pub fn municipalities(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| *name != NATIONAL_ROW)
    }

    /// The allocation of `municipality`, in € 1.000.
    pub fn allocation(&self, municipality: &str) -> Res<FundAllocationTable> {
        let (name, values) = self
            .rows
            .iter()
            .find(|(name, _)| name == municipality)
            .or_else(|| {
                self.rows
                    .iter()
                    .find(|(name, _)| same_municipality(name, municipality))
            })
            .ok_or_else(|| {
                anyhow!(
                    "The municipality '{municipality}' is not in the fund table {}",
                    self.circulaire
                )
            })?;
        let values = self
            .clusters
            .iter()
            .zip(values)
            .map(|(cluster, value)| ClusterValue::new(cluster, *value))
            .collect();
        Ok(FundAllocationTable::new(
            name,
            &self.circulaire,
            ClusterValues::new(Unit::Thousand, values),
        ))
    }
}
