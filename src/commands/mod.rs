//! Command handlers for the begroting CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod analyse;
mod browse;
mod export;
mod init;
mod prepare;
mod taxonomy;

use crate::error::{ErrorType, IntoResult, Res};
use crate::source::Document;
use crate::{Config, Result};
use anyhow::ensure;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

pub use analyse::{analyse, AnalysisReport};
pub use browse::{circulaires, compare, municipalities};
pub use export::export_override;
pub use init::init;
pub use prepare::prepare;
pub use taxonomy::{taxonomy, TaxonomyReport};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to stdout and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        println!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Resolves the selected year and checks that it and the document are available.
pub(crate) fn resolve_year(config: &Config, year: Option<i32>, document: Document) -> Result<i32> {
    check_year(config, year, document).pub_result(ErrorType::Input)
}

fn check_year(config: &Config, year: Option<i32>, document: Document) -> Res<i32> {
    let year = year.unwrap_or_else(|| config.default_year());
    config.check_year(year)?;
    ensure!(
        Document::available(year, config.latest_account_year()).contains(&document),
        "There is no {document} for {year}, the latest accounts are of {}",
        config.latest_account_year()
    );
    Ok(year)
}
