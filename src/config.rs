//! Configuration file handling for begroting.
//!
//! The configuration file is stored at `$BEGROTING_HOME/config.json`. It says where the published
//! tables are fetched from, which years and circulars are available and, optionally, which
//! taxonomy file replaces the built-in cluster taxonomy.

use crate::error::{ErrorType, IntoResult, Res};
use crate::source::{Circulaire, DirSource, HttpSource, Month, Source, DEFAULT_BASE_URL};
use crate::taxonomy::Taxonomy;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "begroting";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const OVERRIDES: &str = "overrides";

const FIRST_YEAR: i32 = 2024;
const LAST_YEAR: i32 = 2024;
const LATEST_ACCOUNT_YEAR: i32 = 2023;
const LATEST_CIRCULAIRE: Circulaire = Circulaire {
    month: Month::September,
    year: 2024,
};

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BEGROTING_HOME` and from there it loads `$BEGROTING_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory and writes an initial `config.json` that reads tables from
    /// `source`, along with the default years and circular.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, source: SourceConfig) -> Result<Self> {
        Self::create_inner(dir.into(), source)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, source: SourceConfig) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the begroting home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;
        utils::make_dir(root.join(OVERRIDES)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            source,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;
        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the home directory and the config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The begroting home directory is missing")?;
        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        debug!("Loaded {}", config_path.display());
        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The default directory for exported override tables.
    pub fn overrides(&self) -> PathBuf {
        self.root.join(OVERRIDES)
    }

    pub fn source_config(&self) -> &SourceConfig {
        &self.config_file.source
    }

    pub fn latest_circulaire(&self) -> Circulaire {
        self.config_file.latest_circulaire
    }

    pub fn latest_account_year(&self) -> i32 {
        self.config_file.latest_account_year
    }

    pub fn first_year(&self) -> i32 {
        self.config_file.first_year
    }

    pub fn last_year(&self) -> i32 {
        self.config_file.last_year
    }

    /// The years that can be selected, oldest first.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.config_file.first_year..=self.config_file.last_year
    }

    /// Checks that `year` is one of the configured years.
    pub(crate) fn check_year(&self, year: i32) -> Res<()> {
        ensure!(
            self.years().contains(&year),
            "The year {year} is not available, choose from {} to {}",
            self.first_year(),
            self.last_year()
        );
        Ok(())
    }

    /// The configured year closest to the current year.
    pub fn default_year(&self) -> i32 {
        use chrono::Datelike;
        let now = chrono::Local::now().year();
        now.clamp(self.first_year(), self.last_year())
    }

    /// Returns the stored `taxonomy_path` resolved against the home directory, if there is one.
    pub fn taxonomy_path(&self) -> Option<PathBuf> {
        self.config_file.taxonomy_path.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.root.join(p)
            }
        })
    }

    /// The configured taxonomy, or the built-in one.
    pub(crate) async fn taxonomy(&self) -> Res<Taxonomy> {
        match self.taxonomy_path() {
            Some(path) => Taxonomy::load(&path).await,
            None => Ok(Taxonomy::default()),
        }
    }

    /// Creates the configured source. A relative directory is resolved against the home directory.
    pub(crate) fn source(&self) -> Res<Box<dyn Source>> {
        match &self.config_file.source {
            SourceConfig::Http { base_url } => Ok(Box::new(HttpSource::new(base_url)?)),
            SourceConfig::Dir { path } => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.root.join(path)
                };
                Ok(Box::new(DirSource::new(path)))
            }
        }
    }
}

/// Where the published tables are read from.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// The raw files of a repository on the web.
    Http { base_url: String },
    /// A local checkout of the data repository.
    Dir { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Http {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "begroting",
///   "config_version": 1,
///   "source": { "type": "dir", "path": "/data/begrotingsanalysetool" },
///   "latest_circulaire": "S2024",
///   "latest_account_year": 2023,
///   "first_year": 2024,
///   "last_year": 2024,
///   "taxonomy_path": "taxonomy.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "begroting"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    #[serde(default)]
    source: SourceConfig,

    /// The most recent published circular
    latest_circulaire: Circulaire,

    /// The most recent year with published accounts
    latest_account_year: i32,

    first_year: i32,

    last_year: i32,

    /// A taxonomy JSON file (optional, relative to config.json or absolute)
    #[serde(skip_serializing_if = "Option::is_none")]
    taxonomy_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            source: SourceConfig::default(),
            latest_circulaire: LATEST_CIRCULAIRE,
            latest_account_year: LATEST_ACCOUNT_YEAR,
            first_year: FIRST_YEAR,
            last_year: LAST_YEAR,
            taxonomy_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and validates it.
    pub async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.first_year <= config.last_year,
            "Invalid years in config file: first_year {} is after last_year {}",
            config.first_year,
            config.last_year
        );
        Ok(config)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("begroting_home");
        let source = SourceConfig::Dir {
            path: PathBuf::from("data"),
        };
        let created = Config::create(&home, source.clone()).await.unwrap();
        assert!(created.overrides().is_dir());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.source_config(), &source);
        assert_eq!(loaded.latest_circulaire().to_string(), "S2024");
        assert_eq!(loaded.years(), 2024..=2024);
        assert_eq!(loaded.default_year(), 2024);
        assert!(loaded.taxonomy_path().is_none());
    }

    #[tokio::test]
    async fn test_config_missing() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("config file is missing"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "kasboek",
            "config_version": 1,
            "latest_circulaire": "S2024",
            "latest_account_year": 2023,
            "first_year": 2024,
            "last_year": 2024
        }"#;
        utils::write(&path, json).await.unwrap();
        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_minimal_uses_http_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "begroting",
            "config_version": 1,
            "latest_circulaire": "M2025",
            "latest_account_year": 2024,
            "first_year": 2024,
            "last_year": 2025,
            "taxonomy_path": "clusters.json"
        }"#;
        utils::write(&path, json).await.unwrap();
        let config_file = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config_file.source, SourceConfig::default());
        assert_eq!(
            config_file.latest_circulaire,
            Circulaire::new(Month::May, 2025)
        );

        let config = Config {
            root: dir.path().to_path_buf(),
            config_path: path,
            config_file,
        };
        assert_eq!(
            config.taxonomy_path(),
            Some(dir.path().join("clusters.json"))
        );
        assert!(config.check_year(2025).is_ok());
        assert!(config.check_year(2023).is_err());
    }

    #[tokio::test]
    async fn test_config_file_bad_years() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config_file = ConfigFile {
            first_year: 2025,
            last_year: 2024,
            ..ConfigFile::default()
        };
        config_file.save(&path).await.unwrap();
        assert!(ConfigFile::load(&path).await.is_err());
    }

    #[test]
    fn test_serialization_omits_taxonomy_path() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("taxonomy_path"));
        assert!(json.contains(r#""type":"http""#));
    }
}
