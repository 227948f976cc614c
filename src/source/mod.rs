//! Retrieval and typed ingestion of the published tables.
//!
//! A `Source` fetches the text of a table by its path relative to the data repository. The
//! `Catalog` sits on top of a `Source`, parses what it fetches into typed tables and caches both
//! the tables and the per-municipality extracts taken from them.

mod catalog;
mod circulaire;
mod classes;
mod dir;
pub(crate) mod fund;
mod http;
pub(crate) mod iv3;
mod memory;

pub use catalog::Catalog;
pub use circulaire::{available_circulaires, Circulaire, CirculaireOption, Month};
pub use classes::ClassTable;
pub use dir::DirSource;
pub use fund::FundTable;
pub use http::HttpSource;
pub use iv3::Iv3Table;
pub use memory::MemorySource;

use crate::error::Res;
use serde::{Deserialize, Serialize};

/// The public repository the analysis tables are published in.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/michielsd/begrotingsanalysetool/refs/heads/main/";

/// The column that holds the municipality name in every table.
pub const MUNICIPALITY_COLUMN: &str = "Gemeenten";

const MUNICIPALITY_SUFFIX: &str = " (gemeente)";

/// Provides the raw text of a published table.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Fetches the table at `path`, e.g. `Analysedata/Iv3/2024_begroting.csv`.
    async fn fetch(&self, path: &str) -> Res<String>;

    /// Describes where tables come from, for log messages.
    fn describe(&self) -> String;
}

/// The kind of Iv3 document.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Document {
    #[default]
    Begroting,
    Jaarrekening,
}

serde_plain::derive_display_from_serialize!(Document);
serde_plain::derive_fromstr_from_deserialize!(Document);

impl Document {
    /// The documents published for `year`. Accounts ("jaarrekening") are published after the
    /// year has ended, so they exist up to `latest_account_year`.
    pub fn available(year: i32, latest_account_year: i32) -> Vec<Document> {
        if year <= latest_account_year {
            vec![Document::Begroting, Document::Jaarrekening]
        } else {
            vec![Document::Begroting]
        }
    }
}

pub fn iv3_path(year: i32, document: Document) -> String {
    format!("Analysedata/Iv3/{year}_{document}.csv")
}

/// `fund_path` is the path of a circular option, e.g. `S2024_2025`.
pub fn fund_path(fund_path: &str) -> String {
    format!("Analysedata/GF/GF_{fund_path}.csv")
}

pub fn classes_path(year: i32) -> String {
    format!("Brondata/Gemeenteklassen/{year}.csv")
}

/// The municipality name without the ` (gemeente)` suffix that some tables add to names shared
/// with a province.
pub fn base_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_suffix(MUNICIPALITY_SUFFIX).unwrap_or(name)
}

/// Whether two tables refer to the same municipality.
pub fn same_municipality(a: &str, b: &str) -> bool {
    base_name(a) == base_name(b)
}

/// Reads a delimited table into its header row and data rows.
pub(crate) fn read_table(text: &str, delimiter: u8) -> Res<(Vec<String>, Vec<Vec<String>>)> {
    use anyhow::Context;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("Unable to read the header row")?
        .iter()
        .map(String::from)
        .collect();
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // the header is line 1
        let record = record.with_context(|| format!("Unable to read line {}", i + 2))?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok((headers, rows))
}
