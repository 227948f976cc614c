//! Error types.
//!
//! Internally the crate uses `anyhow` (`Res<T>`). At the public command boundary errors are wrapped
//! into `Error`, which carries an `ErrorType` so that callers can tell a bad configuration apart
//! from bad source data. Conditions in the analysis pipeline that callers need to match on are
//! expressed as `PipelineError`.

use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};

pub(crate) type Res<T> = anyhow::Result<T>;

pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorType {
    /// The configuration or home directory is missing or invalid.
    Config,
    /// A source table could not be fetched or parsed.
    Source,
    /// The data for the selection cannot be analysed, e.g. a zero salary total.
    Data,
    /// The user asked for something that does not exist or is not allowed.
    Input,
    /// Writing output failed.
    Output,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Config => "configuration error",
            ErrorType::Source => "source data error",
            ErrorType::Data => "data quality error",
            ErrorType::Input => "invalid input",
            ErrorType::Output => "output error",
        };
        f.write_str(s)
    }
}

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Returns the `PipelineError` at the root of this error, if there is one.
    pub fn pipeline_error(&self) -> Option<&PipelineError> {
        self.inner
            .chain()
            .find_map(|e| e.downcast_ref::<PipelineError>())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain.
        write!(f, "{}: {:#}", self.error_type, self.inner)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let inner: &(dyn StdError + 'static) = self.inner.as_ref();
        Some(inner)
    }
}

/// Converts an internal `Res<T>` into the public `Result<T>`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

/// Conditions in the analysis pipeline that make a computation impossible for one
/// municipality/year. These are fatal for that computation and are never swallowed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PipelineError {
    /// A denominator summed to zero, e.g. the total salary cost during overhead allocation or the
    /// resident count during reconciliation.
    DivisionByZero { what: String },
    /// A cluster with a fixed role (such as Overhead) is not present in the table.
    MissingCluster { cluster: String },
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::DivisionByZero { what } => {
                write!(f, "Division by zero: {what} is zero")
            }
            PipelineError::MissingCluster { cluster } => {
                write!(f, "The cluster '{cluster}' is missing from the table")
            }
        }
    }
}

impl StdError for PipelineError {}
