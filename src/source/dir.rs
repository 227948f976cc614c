//! Implements the `Source` trait over a local checkout of the data repository.

use crate::error::Res;
use crate::source::Source;
use crate::utils;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl Source for DirSource {
    async fn fetch(&self, path: &str) -> Res<String> {
        let file = self.root.join(path);
        debug!("Reading {}", file.display());
        utils::read(&file).await
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
