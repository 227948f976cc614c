use crate::commands::Out;
use crate::config::SourceConfig;
use crate::error::{ErrorType, IntoResult};
use crate::source::HttpSource;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory and an initial `config.json`.
///
/// # Arguments
/// - `begroting_home` - The directory that will hold the configuration, e.g. `$HOME/begroting`
/// - `base_url` - Fetch tables from this base URL instead of the public repository.
/// - `data_dir` - Read tables from this local checkout of the data repository instead.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(
    begroting_home: &Path,
    base_url: Option<&str>,
    data_dir: Option<&Path>,
) -> Result<Out<()>> {
    let source = match (base_url, data_dir) {
        (_, Some(dir)) => SourceConfig::Dir {
            path: dir.to_path_buf(),
        },
        (Some(url), None) => SourceConfig::Http {
            base_url: url.to_string(),
        },
        (None, None) => SourceConfig::default(),
    };
    if let SourceConfig::Http { base_url } = &source {
        HttpSource::new(base_url)
            .context("The base URL is invalid")
            .pub_result(ErrorType::Config)?;
    }
    let config = Config::create(begroting_home, source).await?;
    Ok(format!(
        "Successfully created the begroting directory and config at {}",
        config.config_path().display()
    )
    .into())
}
