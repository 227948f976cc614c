pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod pipeline;
pub mod prepare;
pub mod report;
pub mod session;
pub mod source;
pub mod taxonomy;
mod utils;


pub use config::{Config, SourceConfig};
pub use error::{Error, ErrorType, PipelineError, Result};
