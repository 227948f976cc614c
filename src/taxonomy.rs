//! The mapping from Gemeentefonds policy clusters to Iv3 task fields.
//!
//! A task field belongs to a cluster when its label starts with one of the cluster's prefixes. The
//! rule does not make clusters mutually exclusive: the published table lists `6.82` under both
//! Wmo and Jeugd. Such overlaps are reported by `Taxonomy::ambiguous_labels` so that they can be
//! reviewed when a taxonomy is authored; at runtime an overlapping task field counts in every
//! cluster it matches.

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Res;

pub const OVERHEAD: &str = "Overhead";
pub const GOVERNANCE: &str = "Bestuur en ondersteuning";
pub const PROPERTY_TAX: &str = "Onroerendezaakbelasting";
pub const OTHER_OWN_MEANS: &str = "Overige eigen middelen";
pub const RESERVE_MUTATION: &str = "Mutatie reserves";
pub const FUND: &str = "Gemeentefonds";

/// Clusters stored with the opposite sign convention on the income side.
pub const INCOME_SIDE: [&str; 2] = [PROPERTY_TAX, OTHER_OWN_MEANS];

/// Clusters reported in the income table of a reconciliation, in order. All other clusters are
/// reported in the expenditure table.
pub const INCOME_GROUP: [&str; 4] = [PROPERTY_TAX, OTHER_OWN_MEANS, RESERVE_MUTATION, FUND];

/// Chart abbreviations, in chart order. Clusters not listed here are not charted.
pub const ABBREVIATIONS: [(&str, &str); 12] = [
    (PROPERTY_TAX, "OZB"),
    (OTHER_OWN_MEANS, "OEM"),
    (GOVERNANCE, "Bestuur"),
    ("Sociale basisvoorzieningen", "SB"),
    ("Participatie", "Participatie"),
    ("Individuele voorzieningen Wmo", "Wmo"),
    ("Individuele voorzieningen Jeugd", "Jeugd"),
    ("Orde en veiligheid", "Orde"),
    ("Onderwijs", "Onderwijs"),
    ("Sport, cultuur en recreatie", "SCR"),
    ("Infrastructuur, ruimte en milieu", "IRM"),
    (OVERHEAD, "Overhead"),
];

pub fn is_income_side(cluster: &str) -> bool {
    INCOME_SIDE.contains(&cluster)
}

pub fn abbreviation(cluster: &str) -> Option<&'static str> {
    ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == cluster)
        .map(|(_, abbr)| *abbr)
}

/// One cluster and the task-field prefixes it aggregates.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClusterDef {
    name: String,
    prefixes: Vec<String>,
}

impl ClusterDef {
    pub fn new<S, I, P>(name: S, prefixes: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            name: name.into(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn matches(&self, label: &str) -> bool {
        self.prefixes.iter().any(|p| label.starts_with(p.as_str()))
    }
}

/// An ordered list of clusters.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    clusters: Vec<ClusterDef>,
}

impl Default for Taxonomy {
    /// The cluster indeling of the Gemeentefonds.
    fn default() -> Self {
        Self {
            clusters: vec![
                ClusterDef::new("Sociale basisvoorzieningen", ["6.1", "6.2", "7.1"]),
                ClusterDef::new("Participatie", ["6.3", "6.4", "6.5"]),
                ClusterDef::new("Individuele voorzieningen Wmo", ["6.6", "6.71", "6.82"]),
                ClusterDef::new(
                    "Individuele voorzieningen Jeugd",
                    ["6.72", "6.73", "6.74", "6.82"],
                ),
                // The trailing space keeps 0.10 and 0.11 out.
                ClusterDef::new(GOVERNANCE, ["0.1 ", "0.2"]),
                ClusterDef::new("Orde en veiligheid", ["1."]),
                ClusterDef::new("Onderwijs", ["4."]),
                ClusterDef::new("Sport, cultuur en recreatie", ["5."]),
                ClusterDef::new(
                    "Infrastructuur, ruimte en milieu",
                    ["0.63", "0.9", "2.", "3.", "7.2", "7.3", "7.4", "8.1", "8.3"],
                ),
                ClusterDef::new("Overig", Vec::<String>::new()),
                ClusterDef::new(OTHER_OWN_MEANS, ["0.11", "0.3", "0.5", "0.64", "0.8", "8.2"]),
                ClusterDef::new(PROPERTY_TAX, ["0.61", "0.62"]),
                ClusterDef::new(OVERHEAD, ["0.4"]),
                ClusterDef::new(FUND, ["0.7"]),
                ClusterDef::new(RESERVE_MUTATION, ["0.10"]),
            ],
        }
    }
}

impl Taxonomy {
    pub fn new(clusters: Vec<ClusterDef>) -> Res<Self> {
        let taxonomy = Self { clusters };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Parses a taxonomy from JSON of the form `[{"name": "...", "prefixes": ["..."]}]`.
    pub fn from_json(json: &str) -> Res<Self> {
        let clusters: Vec<ClusterDef> =
            serde_json::from_str(json).context("Unable to parse the taxonomy JSON")?;
        Self::new(clusters)
    }

    pub(crate) async fn load(path: &Path) -> Res<Self> {
        let json = crate::utils::read(path).await?;
        Self::from_json(&json).with_context(|| format!("Invalid taxonomy in {}", path.display()))
    }

    /// Cluster names must be non-empty and unique.
    pub fn validate(&self) -> Res<()> {
        ensure!(!self.clusters.is_empty(), "A taxonomy needs at least one cluster");
        let mut seen = BTreeSet::new();
        for cluster in &self.clusters {
            if cluster.name.trim().is_empty() {
                bail!("A cluster name must not be empty");
            }
            if !seen.insert(cluster.name.as_str()) {
                bail!("The cluster '{}' is defined twice", cluster.name);
            }
            if cluster.prefixes.iter().any(|p| p.is_empty()) {
                bail!(
                    "The cluster '{}' has an empty prefix, which would match every task field",
                    cluster.name
                );
            }
        }
        Ok(())
    }

    pub fn clusters(&self) -> &[ClusterDef] {
        &self.clusters
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clusters.iter().map(|c| c.name())
    }

    pub fn contains(&self, cluster: &str) -> bool {
        self.clusters.iter().any(|c| c.name == cluster)
    }

    /// Every cluster whose prefixes match `label`, in taxonomy order.
    pub fn clusters_for<'a>(&'a self, label: &str) -> Vec<&'a str> {
        self.clusters
            .iter()
            .filter(|c| c.matches(label))
            .map(|c| c.name())
            .collect()
    }

    /// The labels that match more than one cluster, with the clusters they match.
    pub fn ambiguous_labels<'a, I>(&self, labels: I) -> Vec<(String, Vec<String>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels
            .into_iter()
            .filter_map(|label| {
                let matched = self.clusters_for(label);
                if matched.len() > 1 {
                    Some((
                        label.to_string(),
                        matched.into_iter().map(String::from).collect(),
                    ))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Pairs of clusters that share a prefix, or where one prefix is a prefix of another. These
    /// can double count task fields and should be reviewed.
    pub fn overlapping_prefixes(&self) -> Vec<(String, String, String)> {
        let mut overlaps = Vec::new();
        for (i, a) in self.clusters.iter().enumerate() {
            for b in self.clusters.iter().skip(i + 1) {
                for pa in &a.prefixes {
                    for pb in &b.prefixes {
                        if pa.starts_with(pb.as_str()) || pb.starts_with(pa.as_str()) {
                            overlaps.push((a.name.clone(), b.name.clone(), pa.clone()));
                        }
                    }
                }
            }
        }
        overlaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let t = Taxonomy::default();
        t.validate().unwrap();
        assert_eq!(t.clusters().len(), 15);
        for name in INCOME_GROUP.iter().chain([OVERHEAD, GOVERNANCE].iter()) {
            assert!(t.contains(name), "{name}");
        }
    }

    #[test]
    fn test_governance_prefix_excludes_reserves() {
        let t = Taxonomy::default();
        assert_eq!(t.clusters_for("0.1 Bestuur"), vec![GOVERNANCE]);
        assert_eq!(t.clusters_for("0.10 Mutaties reserves"), vec![RESERVE_MUTATION]);
        assert_eq!(
            t.clusters_for("0.11 Resultaat van de rekening van baten en lasten"),
            vec![OTHER_OWN_MEANS]
        );
    }

    #[test]
    fn test_unmatched_label() {
        let t = Taxonomy::default();
        assert!(t.clusters_for("A1 Immateriele vaste activa").is_empty());
    }

    #[test]
    fn test_ambiguous_labels() {
        let t = Taxonomy::default();
        let labels = ["6.82 Geescaleerde zorg 18-", "6.1 Samenkracht en burgerparticipatie"];
        let ambiguous = t.ambiguous_labels(labels);
        assert_eq!(ambiguous.len(), 1);
        assert_eq!(ambiguous[0].0, "6.82 Geescaleerde zorg 18-");
        assert_eq!(
            ambiguous[0].1,
            vec![
                "Individuele voorzieningen Wmo".to_string(),
                "Individuele voorzieningen Jeugd".to_string()
            ]
        );
    }

    #[test]
    fn test_overlapping_prefixes() {
        let overlaps = Taxonomy::default().overlapping_prefixes();
        assert!(overlaps.iter().any(|(a, b, p)| a == "Individuele voorzieningen Wmo"
            && b == "Individuele voorzieningen Jeugd"
            && p == "6.82"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{"name": "A", "prefixes": ["1."]}, {"name": "B", "prefixes": ["2."]}]"#;
        let t = Taxonomy::from_json(json).unwrap();
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_cluster_rejected() {
        let json = r#"[{"name": "A", "prefixes": ["1."]}, {"name": "A", "prefixes": ["2."]}]"#;
        let err = Taxonomy::from_json(json).unwrap_err();
        assert!(format!("{err:#}").contains("defined twice"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let json = r#"[{"name": "A", "prefixes": [""]}]"#;
        assert!(Taxonomy::from_json(json).is_err());
    }

    #[test]
    fn test_abbreviation() {
        assert_eq!(abbreviation(PROPERTY_TAX), Some("OZB"));
        assert_eq!(abbreviation(FUND), None);
        assert!(is_income_side(OTHER_OWN_MEANS));
        assert!(!is_income_side(FUND));
    }
}
