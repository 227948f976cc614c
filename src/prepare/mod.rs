//! Preparation of the analysis tables from the raw published data. Both steps read from and write
//! to a checkout of the data repository, using the same layout as the published tables.

mod gf;
mod iv3;

pub use gf::{fund_clusters, uitkeringsfactoren, FundClusters, MeasureTable, Weights};
pub use iv3::{municipality_names, output_name, prepare_iv3, task_field_totals, TaskFieldTotal};

use crate::error::Res;
use crate::utils;
use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const RAW_IV3_DIR: &str = "Brondata/Iv3";
pub const CLASSES_DIR: &str = "Brondata/Gemeenteklassen";
pub const NAMES_FILE: &str = "Brondata/gemeentenamen.csv";
pub const IV3_OUTPUT_DIR: &str = "Analysedata/Iv3";
pub const GF_SOURCE_DIR: &str = "Brondata/GF/clusterdata";
pub const FACTOR_FILE: &str = "Brondata/GF/uitkeringsfactor.csv";
pub const GF_OUTPUT_DIR: &str = "Analysedata/GF";

const WEIGHTS_SUFFIX: &str = "_gewichten.csv";

/// Prepares an analysis table for every raw Iv3 export under `root` and returns the written paths.
/// Exports without a class table for their year are skipped.
pub(crate) async fn prepare_iv3_files(root: &Path) -> Res<Vec<PathBuf>> {
    let names_path = root.join(NAMES_FILE);
    let names = if names_path.is_file() {
        municipality_names(&utils::read(&names_path).await?)
            .with_context(|| format!("Unable to parse {}", names_path.display()))?
    } else {
        debug!("No municipality names at {}", names_path.display());
        HashMap::new()
    };

    let output_dir = root.join(IV3_OUTPUT_DIR);
    utils::make_dir(&output_dir).await?;
    let mut written = Vec::new();
    for file_name in utils::file_names(root.join(RAW_IV3_DIR)).await? {
        let Some(output) = output_name(&file_name) else {
            debug!("Skipping {file_name}");
            continue;
        };
        let year = &file_name[..4];
        let classes_path = root.join(CLASSES_DIR).join(format!("{year}.csv"));
        if !classes_path.is_file() {
            warn!("Skipping {file_name}: there is no class table for {year}");
            continue;
        }
        let raw = utils::read(&root.join(RAW_IV3_DIR).join(&file_name)).await?;
        let classes = utils::read(&classes_path).await?;
        let table = prepare_iv3(&raw, &classes, &names)
            .with_context(|| format!("Unable to prepare {file_name}"))?;
        let path = output_dir.join(&output);
        utils::write(&path, table).await?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Prepares a fund table for every circular under `root` that has weights, volumes, SIUDU figures
/// and an uitkeringsfactor, and returns the written paths.
pub(crate) async fn prepare_gf_files(root: &Path) -> Res<Vec<PathBuf>> {
    let factor_path = root.join(FACTOR_FILE);
    let factors = uitkeringsfactoren(&utils::read(&factor_path).await?)
        .with_context(|| format!("Unable to parse {}", factor_path.display()))?;

    let source_dir = root.join(GF_SOURCE_DIR);
    let output_dir = root.join(GF_OUTPUT_DIR);
    utils::make_dir(&output_dir).await?;
    let mut written = Vec::new();
    for file_name in utils::file_names(&source_dir).await? {
        if !file_name.to_lowercase().ends_with(WEIGHTS_SUFFIX) {
            continue;
        }
        let prefix = &file_name[..file_name.len() - WEIGHTS_SUFFIX.len()];
        let circulaire = prefix.strip_prefix("GF_").unwrap_or(prefix);
        let Some(factor) = factors.get(circulaire) else {
            warn!("Skipping {circulaire}: there is no uitkeringsfactor");
            continue;
        };
        let volumes_path = source_dir.join(format!("{prefix}_Volumina.csv"));
        let siudu_path = source_dir.join(format!("{prefix}_SIUDU.csv"));
        if !volumes_path.is_file() || !siudu_path.is_file() {
            warn!("Skipping {circulaire}: the volumes or SIUDU figures are missing");
            continue;
        }

        let weights = Weights::parse(&utils::read(&source_dir.join(&file_name)).await?)
            .with_context(|| format!("Unable to parse {file_name}"))?;
        let volumes = MeasureTable::parse(&utils::read(&volumes_path).await?)
            .with_context(|| format!("Unable to parse {}", volumes_path.display()))?;
        let siudu = MeasureTable::parse(&utils::read(&siudu_path).await?)
            .with_context(|| format!("Unable to parse {}", siudu_path.display()))?;
        let clusters = fund_clusters(&weights, &volumes, &siudu, *factor)
            .with_context(|| format!("Unable to compute the fund clusters of {circulaire}"))?;

        let path = output_dir.join(format!("GF_{circulaire}.csv"));
        utils::write(&path, clusters.to_csv()?).await?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FundTable, Iv3Table};
    use tempfile::TempDir;

    async fn put(root: &Path, path: &str, contents: &str) {
        let path = root.join(path);
        utils::make_dir(path.parent().unwrap()).await.unwrap();
        utils::write(path, contents).await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_iv3_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let raw = "Gemeenten,TaakveldBalanspost,Categorie,k_2ePlaatsing_2\n\
                   GM0355,0.1 Bestuur,L1.1 Salarissen en sociale lasten,7\n";
        put(root, "Brondata/Iv3/2024_Iv3_000.csv", raw).await;
        put(root, "Brondata/Iv3/2025_Iv3_000.csv", raw).await;
        put(root, "Brondata/Iv3/notes.txt", "").await;
        put(
            root,
            "Brondata/Gemeenteklassen/2024.csv",
            "Gemeenten\tInwonertal\nGM0355\t65000\n",
        )
        .await;
        put(root, NAMES_FILE, "Code\tNaam\nGM0355\tZeist\n").await;

        let written = prepare_iv3_files(root).await.unwrap();
        // 2025 has no class table
        assert_eq!(written, vec![root.join("Analysedata/Iv3/2024_begroting.csv")]);
        let table = Iv3Table::parse(&utils::read(&written[0]).await.unwrap()).unwrap();
        let (profile, detail) = table.detail("Zeist").unwrap();
        assert_eq!(profile.residents, Some(65_000));
        assert_eq!(detail.records().len(), 1);
    }

    #[tokio::test]
    async fn test_prepare_gf_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        put(root, FACTOR_FILE, "circulaire,jaar,factor\nS2024,2025,1\n").await;
        put(
            root,
            "Brondata/GF/clusterdata/GF_S2024_2025_Gewichten.csv",
            "Codering maatstaf\tNaam maatstaf\tOnderwijs\ninw\tInwoners\t2\n",
        )
        .await;
        put(
            root,
            "Brondata/GF/clusterdata/GF_S2024_2025_Volumina.csv",
            "Naam\tCode\tProvincie\tinw\nZeist\tGM0355\tUtrecht\t65.000\n",
        )
        .await;
        put(
            root,
            "Brondata/GF/clusterdata/GF_S2024_2025_SIUDU.csv",
            "Naam\tCode\tProvincie\nZeist\tGM0355\tUtrecht\n",
        )
        .await;
        // no uitkeringsfactor for this circular
        put(
            root,
            "Brondata/GF/clusterdata/GF_M2024_2025_Gewichten.csv",
            "Codering maatstaf\tNaam maatstaf\tOnderwijs\n",
        )
        .await;

        let written = prepare_gf_files(root).await.unwrap();
        assert_eq!(written, vec![root.join("Analysedata/GF/GF_S2024_2025.csv")]);
        let table =
            FundTable::parse("S2024_2025", &utils::read(&written[0]).await.unwrap()).unwrap();
        let fund = table.allocation("Zeist").unwrap();
        assert_eq!(
            fund.allocations().get("Onderwijs"),
            Some(rust_decimal::Decimal::from(130))
        );
    }
}
