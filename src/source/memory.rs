//! Implements the `Source` trait with tables held in memory.
//!
//! Note: this is compiled outside of tests too, so that the whole program can be run top to
//! bottom without network access.

use crate::error::Res;
use crate::source::Source;
use anyhow::Context;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A `Source` whose tables are a map from path to text. It counts fetches so that caching can be
/// observed.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new(tables: HashMap<String, String>) -> Self {
        Self {
            tables,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.tables.insert(path.into(), text.into());
    }

    /// The number of successful fetches so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Source for MemorySource {
    async fn fetch(&self, path: &str) -> Res<String> {
        let text = self
            .tables
            .get(path)
            .with_context(|| format!("Table '{path}' not found"))
            .cloned()?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(text)
    }

    fn describe(&self) -> String {
        format!("memory ({} tables)", self.tables.len())
    }
}
