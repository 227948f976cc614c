//! Selection of comparison municipalities.

use crate::model::MunicipalityProfile;
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Res;

/// The number of municipalities that can be compared with the selected one at the same time.
pub const MAX_COMPARISONS: usize = 3;

/// Which attributes a comparison municipality must share with the reference.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComparisonFilter {
    /// Same sociaal-economische structuur.
    pub same_structure: bool,
    /// Same centrumfunctie.
    pub same_centrum: bool,
}

/// Returns the names of the municipalities in `pool` that pass `filter`, in pool order. The
/// reference itself is never returned. With neither toggle set every other municipality passes.
/// A toggled attribute only matches when both municipalities have a value for it.
pub fn select_comparisons<'a>(
    pool: &'a [MunicipalityProfile],
    reference: &MunicipalityProfile,
    filter: ComparisonFilter,
) -> Vec<&'a str> {
    if filter.same_structure && reference.structure.is_none() {
        warn!("{} has no sociaal-economische structuur", reference.name);
    }
    if filter.same_centrum && reference.centrum.is_none() {
        warn!("{} has no centrumfunctie", reference.name);
    }
    pool.iter()
        .filter(|m| m.name != reference.name)
        .filter(|m| !filter.same_structure || same(&m.structure, &reference.structure))
        .filter(|m| !filter.same_centrum || same(&m.centrum, &reference.centrum))
        .map(|m| m.name.as_str())
        .collect()
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// The municipalities chosen for comparison, at most `MAX_COMPARISONS`.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSet {
    targets: Vec<String>,
}

impl ComparisonSet {
    pub fn new<S, I>(targets: I) -> Res<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let mut set = Self::default();
        for target in targets {
            set.add(target)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, target: impl Into<String>) -> Res<()> {
        let target = target.into();
        if self.targets.contains(&target) {
            return Ok(());
        }
        ensure!(
            self.targets.len() < MAX_COMPARISONS,
            "At most {MAX_COMPARISONS} municipalities can be compared, '{target}' is one too many"
        );
        self.targets.push(target);
        Ok(())
    }

    /// Checks that every target is one of `allowed`.
    pub fn check_allowed(&self, allowed: &[&str]) -> Res<()> {
        for target in &self.targets {
            if !allowed.contains(&target.as_str()) {
                bail!("'{target}' is not a valid comparison municipality for this selection");
            }
        }
        Ok(())
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, structure: &str, centrum: &str) -> MunicipalityProfile {
        MunicipalityProfile {
            structure: Some(structure.to_string()),
            centrum: Some(centrum.to_string()),
            ..MunicipalityProfile::new(name)
        }
    }

    fn pool() -> Vec<MunicipalityProfile> {
        vec![
            profile("Utrecht", "Sterk", "Sterk"),
            profile("Amersfoort", "Sterk", "Redelijk"),
            profile("Zeist", "Midden", "Redelijk"),
            profile("Houten", "Sterk", "Zwak"),
            profile("Nieuwegein", "Midden", "Redelijk"),
        ]
    }

    #[test]
    fn test_structure_toggle() {
        let pool = pool();
        let reference = profile("Utrecht", "Sterk", "Sterk");
        let filter = ComparisonFilter {
            same_structure: true,
            same_centrum: false,
        };
        let selected = select_comparisons(&pool, &reference, filter);
        assert_eq!(selected, vec!["Amersfoort", "Houten"]);
    }

    #[test]
    fn test_both_toggles() {
        let pool = pool();
        let reference = profile("Zeist", "Midden", "Redelijk");
        let filter = ComparisonFilter {
            same_structure: true,
            same_centrum: true,
        };
        assert_eq!(
            select_comparisons(&pool, &reference, filter),
            vec!["Nieuwegein"]
        );
    }

    #[test]
    fn test_no_toggle_returns_pool_without_reference() {
        let pool = pool();
        let reference = profile("Zeist", "Midden", "Redelijk");
        let selected = select_comparisons(&pool, &reference, ComparisonFilter::default());
        assert_eq!(
            selected,
            vec!["Utrecht", "Amersfoort", "Houten", "Nieuwegein"]
        );
    }

    #[test]
    fn test_missing_attributes_never_match() {
        let pool: Vec<_> = ["A", "B", "C"]
            .into_iter()
            .map(MunicipalityProfile::new)
            .collect();
        let reference = MunicipalityProfile::new("A");
        let filter = ComparisonFilter {
            same_structure: true,
            same_centrum: false,
        };
        assert!(select_comparisons(&pool, &reference, filter).is_empty());
        assert_eq!(
            select_comparisons(&pool, &reference, ComparisonFilter::default()),
            vec!["B", "C"]
        );

        // a reference with a value does not match members without one
        let reference = profile("A", "Sterk", "Sterk");
        let filter = ComparisonFilter {
            same_structure: false,
            same_centrum: true,
        };
        assert!(select_comparisons(&pool, &reference, filter).is_empty());
    }

    #[test]
    fn test_comparison_set_limit() {
        let mut set = ComparisonSet::new(["Amersfoort", "Zeist", "Houten"]).unwrap();
        // adding an existing target is a no-op
        set.add("Zeist").unwrap();
        assert_eq!(set.targets().len(), MAX_COMPARISONS);
        assert!(set.add("Nieuwegein").is_err());
    }

    #[test]
    fn test_check_allowed() {
        let set = ComparisonSet::new(["Amersfoort"]).unwrap();
        assert!(set.check_allowed(&["Amersfoort", "Houten"]).is_ok());
        assert!(set.check_allowed(&["Houten"]).is_err());
    }
}
