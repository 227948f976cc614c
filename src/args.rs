//! These structs provide the CLI interface for the begroting CLI.

use crate::report::Measure;
use crate::source::Document;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// begroting: compares the budget of a Dutch municipality with its Gemeentefonds allocation.
///
/// The Iv3 task fields of a municipality's budget or accounts are grouped into the clusters the
/// Gemeentefonds uses, optionally with the cost of overhead allocated to the clusters. The net
/// cost per cluster is then set against the allocation of a fund circular, in total and per
/// resident.
///
/// The published analysis tables are read from the begrotingsanalysetool repository by default.
/// Use `begroting prepare` to build them from the raw data in a local checkout.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and write a default configuration.
    ///
    /// Without options the tables are fetched from the public repository. Pass --data-dir to read
    /// them from a local checkout instead.
    Init(InitArgs),
    /// List the municipalities of a year.
    Municipalities(MunicipalitiesArgs),
    /// List the circulars that can be used for a year.
    Circulaires(CirculairesArgs),
    /// List the municipalities a municipality can be compared with.
    Compare(CompareArgs),
    /// Reconcile the net cost per cluster of a municipality with its fund allocation.
    Analyse(AnalyseArgs),
    /// Write the task fields of a municipality to an override file that can be edited and passed
    /// to `analyse --override`.
    ExportOverride(ExportOverrideArgs),
    /// Build the analysis tables from the raw data in a local checkout.
    Prepare(PrepareArgs),
    /// Print the cluster taxonomy.
    Taxonomy(TaxonomyArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and override files are held. Defaults to ~/begroting
    #[arg(long, env = "BEGROTING_HOME", default_value_t = default_begroting_home())]
    begroting_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, begroting_home: PathBuf) -> Self {
        Self {
            log_level,
            begroting_home: begroting_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn begroting_home(&self) -> &DisplayPath {
        &self.begroting_home
    }
}

/// Args for the `begroting init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Read the tables from this base URL.
    #[arg(long, conflicts_with = "data_dir")]
    base_url: Option<String>,

    /// Read the tables from this local checkout of the data repository.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(base_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        Self { base_url, data_dir }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

/// The year and document of a selection.
#[derive(Debug, Parser, Clone, Default)]
pub struct YearArgs {
    /// The budget year. Defaults to the configured year closest to today.
    #[arg(long)]
    year: Option<i32>,

    /// Budget ("begroting") or accounts ("jaarrekening").
    #[arg(long, default_value_t = Document::Begroting)]
    document: Document,
}

impl YearArgs {
    pub fn new(year: Option<i32>, document: Document) -> Self {
        Self { year, document }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn document(&self) -> Document {
        self.document
    }
}

/// Args for the `begroting municipalities` command.
#[derive(Debug, Parser, Clone)]
pub struct MunicipalitiesArgs {
    #[clap(flatten)]
    year: YearArgs,
}

impl MunicipalitiesArgs {
    pub fn new(year: YearArgs) -> Self {
        Self { year }
    }

    pub fn year(&self) -> &YearArgs {
        &self.year
    }
}

/// Args for the `begroting circulaires` command.
#[derive(Debug, Parser, Clone)]
pub struct CirculairesArgs {
    /// The budget year. Defaults to the configured year closest to today.
    #[arg(long)]
    year: Option<i32>,
}

impl CirculairesArgs {
    pub fn new(year: Option<i32>) -> Self {
        Self { year }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// The comparison toggles.
#[derive(Debug, Parser, Clone, Default)]
pub struct FilterArgs {
    /// Only compare with municipalities with the same socio-economic structure.
    #[arg(long)]
    same_structure: bool,

    /// Only compare with municipalities with the same centrum function.
    #[arg(long)]
    same_centrum: bool,
}

impl FilterArgs {
    pub fn new(same_structure: bool, same_centrum: bool) -> Self {
        Self {
            same_structure,
            same_centrum,
        }
    }

    pub fn same_structure(&self) -> bool {
        self.same_structure
    }

    pub fn same_centrum(&self) -> bool {
        self.same_centrum
    }
}

/// Args for the `begroting compare` command.
#[derive(Debug, Parser, Clone)]
pub struct CompareArgs {
    /// The municipality to compare.
    municipality: String,

    #[clap(flatten)]
    year: YearArgs,

    #[clap(flatten)]
    filter: FilterArgs,
}

impl CompareArgs {
    pub fn new(municipality: impl Into<String>, year: YearArgs, filter: FilterArgs) -> Self {
        Self {
            municipality: municipality.into(),
            year,
            filter,
        }
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn year(&self) -> &YearArgs {
        &self.year
    }

    pub fn filter(&self) -> &FilterArgs {
        &self.filter
    }
}

/// Args for the `begroting analyse` command.
#[derive(Debug, Parser, Clone)]
pub struct AnalyseArgs {
    /// The municipality to analyse.
    municipality: String,

    #[clap(flatten)]
    year: YearArgs,

    /// The fund path of the circular, e.g. S2024_2025. Defaults to the first circular listed by
    /// `begroting circulaires`.
    #[arg(long)]
    circulaire: Option<String>,

    /// Allocate the cost of overhead to the clusters by their share of salaries.
    #[arg(long)]
    overhead: bool,

    /// An override file written by `begroting export-override` and edited since.
    #[arg(long = "override")]
    override_file: Option<PathBuf>,

    /// Add a municipality to the chart. Can be given up to three times.
    #[arg(long = "compare")]
    compare: Vec<String>,

    #[clap(flatten)]
    filter: FilterArgs,

    /// What the chart shows: total or per_resident.
    #[arg(long, default_value_t = Measure::Total)]
    measure: Measure,

    /// Print the results as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

impl AnalyseArgs {
    pub fn new(municipality: impl Into<String>, year: YearArgs) -> Self {
        Self {
            municipality: municipality.into(),
            year,
            circulaire: None,
            overhead: false,
            override_file: None,
            compare: Vec::new(),
            filter: FilterArgs::default(),
            measure: Measure::Total,
            json: false,
        }
    }

    pub fn with_circulaire(mut self, circulaire: impl Into<String>) -> Self {
        self.circulaire = Some(circulaire.into());
        self
    }

    pub fn with_overhead(mut self, overhead: bool) -> Self {
        self.overhead = overhead;
        self
    }

    pub fn with_override_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_file = Some(path.into());
        self
    }

    pub fn with_compare(mut self, municipality: impl Into<String>) -> Self {
        self.compare.push(municipality.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterArgs) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn year(&self) -> &YearArgs {
        &self.year
    }

    pub fn circulaire(&self) -> Option<&str> {
        self.circulaire.as_deref()
    }

    pub fn overhead(&self) -> bool {
        self.overhead
    }

    pub fn override_file(&self) -> Option<&Path> {
        self.override_file.as_deref()
    }

    pub fn compare(&self) -> &[String] {
        &self.compare
    }

    pub fn filter(&self) -> &FilterArgs {
        &self.filter
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn json(&self) -> bool {
        self.json
    }
}

/// Args for the `begroting export-override` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportOverrideArgs {
    /// The municipality whose task fields are exported.
    municipality: String,

    #[clap(flatten)]
    year: YearArgs,

    /// Where to write the file. Defaults to $BEGROTING_HOME/overrides/{municipality}_{year}.json
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportOverrideArgs {
    pub fn new(municipality: impl Into<String>, year: YearArgs, output: Option<PathBuf>) -> Self {
        Self {
            municipality: municipality.into(),
            year,
            output,
        }
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn year(&self) -> &YearArgs {
        &self.year
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Args for the `begroting prepare` command.
#[derive(Debug, Parser, Clone)]
pub struct PrepareArgs {
    #[command(subcommand)]
    step: PrepareStep,

    /// The root of the local checkout of the data repository.
    #[arg(long)]
    root: PathBuf,
}

impl PrepareArgs {
    pub fn new(step: PrepareStep, root: impl Into<PathBuf>) -> Self {
        Self {
            step,
            root: root.into(),
        }
    }

    pub fn step(&self) -> PrepareStep {
        self.step
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[derive(Subcommand, Debug, Clone, Copy, Eq, PartialEq)]
pub enum PrepareStep {
    /// Sum the raw Iv3 exports into task-field totals per municipality.
    Iv3,
    /// Compute the fund allocation per cluster from weights and volumes.
    Gf,
}

/// Args for the `begroting taxonomy` command.
#[derive(Debug, Parser, Clone)]
pub struct TaxonomyArgs {
    /// Report the task fields of a year that match more than one cluster or none.
    #[arg(long)]
    check: bool,

    #[clap(flatten)]
    year: YearArgs,
}

impl TaxonomyArgs {
    pub fn new(check: bool, year: YearArgs) -> Self {
        Self { check, year }
    }

    pub fn check(&self) -> bool {
        self.check
    }

    pub fn year(&self) -> &YearArgs {
        &self.year
    }
}

fn default_begroting_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("begroting"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --begroting-home or BEGROTING_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("begroting")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyse() {
        let args = Args::parse_from([
            "begroting",
            "--begroting-home",
            "/tmp/b",
            "analyse",
            "Utrecht",
            "--year",
            "2024",
            "--document",
            "jaarrekening",
            "--overhead",
            "--compare",
            "Zeist",
            "--compare",
            "Houten",
            "--same-structure",
            "--measure",
            "per_resident",
        ]);
        assert_eq!(args.common().begroting_home().path(), Path::new("/tmp/b"));
        let Command::Analyse(analyse) = args.command() else {
            panic!("expected analyse");
        };
        assert_eq!(analyse.municipality(), "Utrecht");
        assert_eq!(analyse.year().year(), Some(2024));
        assert_eq!(analyse.year().document(), Document::Jaarrekening);
        assert!(analyse.overhead());
        assert_eq!(analyse.compare(), ["Zeist", "Houten"]);
        assert!(analyse.filter().same_structure());
        assert!(!analyse.filter().same_centrum());
        assert_eq!(analyse.measure(), Measure::PerResident);
        assert!(!analyse.json());
    }

    #[test]
    fn test_parse_prepare() {
        let args = Args::parse_from(["begroting", "prepare", "--root", "data", "gf"]);
        let Command::Prepare(prepare) = args.command() else {
            panic!("expected prepare");
        };
        assert_eq!(prepare.step(), PrepareStep::Gf);
        assert_eq!(prepare.root(), Path::new("data"));
    }

    #[test]
    fn test_init_sources_conflict() {
        let res = Args::try_parse_from([
            "begroting",
            "init",
            "--base-url",
            "https://example.com/",
            "--data-dir",
            "data",
        ]);
        assert!(res.is_err());
    }
}
