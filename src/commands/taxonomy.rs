use crate::args::TaxonomyArgs;
use crate::commands::{resolve_year, Out};
use crate::error::{ErrorType, IntoResult};
use crate::report::markdown;
use crate::source::Catalog;
use crate::taxonomy::{abbreviation, ClusterDef};
use crate::{Config, Result};
use serde::Serialize;
use tracing::warn;

/// The clusters of the configured taxonomy and, when checked against a year, the task fields that
/// do not map onto exactly one cluster.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaxonomyReport {
    pub clusters: Vec<ClusterDef>,
    /// Task-field labels with the clusters they count in.
    pub ambiguous: Vec<(String, Vec<String>)>,
    /// Task-field labels that count in no cluster.
    pub unmatched: Vec<String>,
    /// Cluster pairs and the prefix they share.
    pub overlapping_prefixes: Vec<(String, String, String)>,
}

/// Shows the configured taxonomy. With `--check` the task fields of the selected year are checked
/// against it.
pub async fn taxonomy(config: Config, args: TaxonomyArgs) -> Result<Out<TaxonomyReport>> {
    let taxonomy = config.taxonomy().await.pub_result(ErrorType::Config)?;
    let mut report = TaxonomyReport {
        clusters: taxonomy.clusters().to_vec(),
        ..Default::default()
    };
    let rows: Vec<Vec<String>> = taxonomy
        .clusters()
        .iter()
        .map(|c| {
            vec![
                c.name().to_string(),
                c.prefixes().join(", "),
                abbreviation(c.name()).unwrap_or_default().to_string(),
            ]
        })
        .collect();
    let mut message = markdown(&["Cluster", "Prefixen", "Afkorting"], &rows);

    if args.check() {
        let document = args.year().document();
        let year = resolve_year(&config, args.year().year(), document)?;
        let mut catalog = Catalog::new(config.source().pub_result(ErrorType::Config)?);
        let table = catalog
            .iv3(year, document)
            .await
            .pub_result(ErrorType::Source)?;
        let labels = table.labels();

        report.ambiguous = taxonomy.ambiguous_labels(labels.iter().copied());
        report.unmatched = labels
            .iter()
            .filter(|label| taxonomy.clusters_for(label).is_empty())
            .map(|label| label.to_string())
            .collect();
        report.overlapping_prefixes = taxonomy.overlapping_prefixes();

        for (label, clusters) in &report.ambiguous {
            warn!("'{label}' counts in {}", clusters.join(", "));
        }
        for label in &report.unmatched {
            warn!("'{label}' counts in no cluster");
        }
        for (a, b, prefix) in &report.overlapping_prefixes {
            warn!("'{a}' and '{b}' overlap on the prefix '{prefix}'");
        }
        message.push_str(&format!(
            "\n\n{year} {document}: {} task fields, {} in more than one cluster, {} in none, {} \
             overlapping prefixes",
            labels.len(),
            report.ambiguous.len(),
            report.unmatched.len(),
            report.overlapping_prefixes.len()
        ));
    }
    Ok(Out::new(message, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::YearArgs;
    use crate::source::Document;
    use crate::taxonomy::OVERHEAD;
    use crate::test::{TestEnv, FIXTURE_YEAR};

    #[tokio::test]
    async fn test_show_default() {
        let env = TestEnv::new().await;
        let out = taxonomy(env.config(), TaxonomyArgs::new(false, YearArgs::default()))
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.clusters.len(), 15);
        assert!(report.unmatched.is_empty());
        assert!(out.message().contains(OVERHEAD));
        assert!(out.message().contains("0.61, 0.62"));
    }

    #[tokio::test]
    async fn test_check_fixture_year() {
        let env = TestEnv::new().await;
        let args = TaxonomyArgs::new(true, YearArgs::new(Some(FIXTURE_YEAR), Document::Begroting));
        let out = taxonomy(env.config(), args).await.unwrap();
        let report = out.structure().unwrap();
        assert!(report.ambiguous.is_empty());
        assert!(report.unmatched.is_empty());
        // 6.82 is listed under both Wmo and Jeugd
        assert!(report
            .overlapping_prefixes
            .iter()
            .any(|(_, _, prefix)| prefix == "6.82"));
        assert!(out.message().contains("6 task fields"));
    }
}
