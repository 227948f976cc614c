use crate::args::PrepareStep;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::prepare::{prepare_gf_files, prepare_iv3_files};
use crate::{utils, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs one preparation step against a local checkout of the data repository and returns the
/// paths of the tables it wrote.
pub async fn prepare(step: PrepareStep, root: &Path) -> Result<Out<Vec<PathBuf>>> {
    let root = utils::canonicalize(root)
        .await
        .pub_result(ErrorType::Input)?;
    info!("Preparing {step:?} tables in {}", root.display());
    let written = match step {
        PrepareStep::Iv3 => prepare_iv3_files(&root).await,
        PrepareStep::Gf => prepare_gf_files(&root).await,
    }
    .pub_result(ErrorType::Source)?;

    let message = if written.is_empty() {
        "Nothing to prepare".to_string()
    } else {
        written
            .iter()
            .map(|p| format!("Wrote {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    Ok(Out::new(message, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prepare_nothing() {
        let dir = TempDir::new().unwrap();
        utils::make_dir(dir.path().join(crate::prepare::RAW_IV3_DIR))
            .await
            .unwrap();
        let out = prepare(PrepareStep::Iv3, dir.path()).await.unwrap();
        assert_eq!(out.message(), "Nothing to prepare");
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = prepare(PrepareStep::Gf, &dir.path().join("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
    }

    #[tokio::test]
    async fn test_prepare_gf_without_factors() {
        let dir = TempDir::new().unwrap();
        let err = prepare(PrepareStep::Gf, dir.path()).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Source);
    }
}
