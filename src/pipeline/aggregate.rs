//! Collapses task-field detail into cluster totals.

use crate::model::{ClusterRow, ClusterTable, DetailTable, TaskFieldRecord, Unit};
use crate::session::OverrideTable;
use crate::taxonomy::Taxonomy;
use tracing::{debug, trace};

/// The result of aggregating the local detail table of one selection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Aggregation {
    /// The aggregate of the published detail table.
    pub computed: ClusterTable,
    /// The table that flows downstream: the override aggregate when an override is active,
    /// otherwise a copy of `computed`.
    pub effective: ClusterTable,
    overridden: bool,
}

impl Aggregation {
    /// Aggregates `detail` and, when given, `override_table` with the same rule.
    pub fn new(
        detail: &DetailTable,
        override_table: Option<&OverrideTable>,
        taxonomy: &Taxonomy,
    ) -> Self {
        debug!(
            "Aggregating {} task fields of {}",
            detail.records().len(),
            detail.municipality()
        );
        let computed = aggregate(detail.records(), taxonomy, detail.unit());
        let effective = match override_table {
            Some(o) => aggregate_override(o, taxonomy, detail.unit()),
            None => computed.clone(),
        };
        Self {
            computed,
            effective,
            overridden: override_table.is_some(),
        }
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }
}

/// Sums every record into each cluster whose prefixes its label matches. Clusters without matching
/// records are present with zero values. `Saldo` is derived from the sums, never summed itself.
pub fn aggregate(records: &[TaskFieldRecord], taxonomy: &Taxonomy, unit: Unit) -> ClusterTable {
    let mut rows: Vec<ClusterRow> = taxonomy.names().map(ClusterRow::empty).collect();
    let mut unmatched = 0usize;

    for record in records {
        let mut matched = false;
        for (def, row) in taxonomy.clusters().iter().zip(rows.iter_mut()) {
            if def.matches(record.label()) {
                row.add(record.baten(), record.lasten(), record.salaries());
                matched = true;
            }
        }
        if !matched {
            trace!("'{}' does not belong to any cluster", record.label());
            unmatched += 1;
        }
    }

    if unmatched > 0 {
        debug!("{unmatched} task fields did not match any cluster");
    }

    ClusterTable::new(unit, rows)
}

/// Aggregates the user's override table with the same rule as `aggregate`.
pub fn aggregate_override(
    override_table: &OverrideTable,
    taxonomy: &Taxonomy,
    unit: Unit,
) -> ClusterTable {
    debug!(
        "Aggregating the override table for {} {}",
        override_table.selection().municipality,
        override_table.selection().year
    );
    aggregate(&override_table.records(), taxonomy, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Selection;
    use crate::taxonomy::ClusterDef;
    use rust_decimal::Decimal;

    fn ab_taxonomy() -> Taxonomy {
        Taxonomy::new(vec![
            ClusterDef::new("A", ["1."]),
            ClusterDef::new("B", ["2."]),
        ])
        .unwrap()
    }

    fn rec(label: &str, baten: i64, lasten: i64, salaries: i64) -> TaskFieldRecord {
        TaskFieldRecord::new(label, baten.into(), lasten.into(), salaries.into())
    }

    #[test]
    fn test_example_scenario() {
        let detail = DetailTable::new(
            "X",
            Unit::Thousand,
            vec![rec("1.1", 10, 30, 5), rec("2.1", 5, 5, 5)],
        );
        let table = aggregate(detail.records(), &ab_taxonomy(), detail.unit());
        let a = table.get("A").unwrap();
        assert_eq!(a.baten(), Decimal::from(10));
        assert_eq!(a.lasten(), Decimal::from(30));
        assert_eq!(a.saldo(), Decimal::from(20));
        let b = table.get("B").unwrap();
        assert_eq!(b.baten(), Decimal::from(5));
        assert_eq!(b.lasten(), Decimal::from(5));
        assert_eq!(b.saldo(), Decimal::ZERO);
    }

    #[test]
    fn test_rows_are_exactly_the_taxonomy() {
        let detail = DetailTable::new("X", Unit::Thousand, vec![rec("1.1", 1, 1, 0)]);
        let taxonomy = Taxonomy::default();
        let table = aggregate(detail.records(), &taxonomy, detail.unit());
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            taxonomy.names().collect::<Vec<_>>()
        );
        // no matching rows aggregates to zero, not absent
        let overig = table.get("Overig").unwrap();
        assert_eq!(overig.lasten(), Decimal::ZERO);
        assert_eq!(overig.saldo(), Decimal::ZERO);
    }

    #[test]
    fn test_no_silent_drops() {
        let detail = DetailTable::new(
            "X",
            Unit::Thousand,
            vec![
                rec("1.1", 1, 2, 0),
                rec("1.2", 3, 4, 0),
                rec("2.1", 5, 6, 0),
                rec("9.9", 100, 100, 100),
            ],
        );
        let table = aggregate(detail.records(), &ab_taxonomy(), detail.unit());
        // every matching record is counted, the unmatched one is not
        assert_eq!(table.total_baten(), Decimal::from(9));
        assert_eq!(table.total_lasten(), Decimal::from(12));
        assert_eq!(table.total_salaries(), Decimal::ZERO);
    }

    #[test]
    fn test_overlap_counts_in_every_matching_cluster() {
        let taxonomy = Taxonomy::default();
        let detail = DetailTable::new(
            "X",
            Unit::Thousand,
            vec![rec("6.82 Geescaleerde zorg 18-", 0, 50, 0)],
        );
        let table = aggregate(detail.records(), &taxonomy, detail.unit());
        assert_eq!(
            table.get("Individuele voorzieningen Wmo").unwrap().lasten(),
            Decimal::from(50)
        );
        assert_eq!(
            table.get("Individuele voorzieningen Jeugd").unwrap().lasten(),
            Decimal::from(50)
        );
    }

    #[test]
    fn test_saldo_not_summed_per_row() {
        let detail = DetailTable::new(
            "X",
            Unit::Thousand,
            vec![rec("1.1", 40, 10, 0), rec("1.2", 0, 50, 0)],
        );
        let table = aggregate(detail.records(), &ab_taxonomy(), detail.unit());
        let a = table.get("A").unwrap();
        assert_eq!(a.saldo(), a.lasten() - a.baten());
        assert_eq!(a.saldo(), Decimal::from(20));
    }

    #[test]
    fn test_override_uses_same_rule() {
        let detail = DetailTable::new("X", Unit::Thousand, vec![rec("1.1", 10, 30, 5)]);
        let selection = Selection::new(2024, "X");
        let mut o = OverrideTable::from_detail(selection, &detail);
        o.set("1.1", Decimal::from(10), Decimal::from(80));
        let aggregation = Aggregation::new(&detail, Some(&o), &ab_taxonomy());
        assert_eq!(
            aggregation.computed.get("A").unwrap().lasten(),
            Decimal::from(30)
        );
        assert!(aggregation.is_overridden());
        let effective = aggregation.effective.get("A").unwrap();
        assert_eq!(effective.lasten(), Decimal::from(80));
        assert_eq!(effective.saldo(), Decimal::from(70));
    }

    #[test]
    fn test_effective_without_override() {
        let detail = DetailTable::new("X", Unit::Thousand, vec![rec("1.1", 10, 30, 5)]);
        let aggregation = Aggregation::new(&detail, None, &ab_taxonomy());
        assert_eq!(aggregation.effective, aggregation.computed);
        assert!(!aggregation.is_overridden());
    }
}
