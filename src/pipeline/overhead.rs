//! Redistributes the Overhead cluster over the other clusters by salary share.

use crate::error::PipelineError;
use crate::model::ClusterTable;
use crate::taxonomy::{GOVERNANCE, OVERHEAD};
use rust_decimal::Decimal;
use tracing::debug;

/// Allocates the overhead of `table` to its own clusters. See `allocate_overhead`.
pub fn allocate_own_overhead(table: &ClusterTable) -> Result<ClusterTable, PipelineError> {
    allocate_overhead(table, table)
}

/// Returns a copy of `target` in which the Overhead cost of `basis` has been distributed.
///
/// Every cluster `c` other than Overhead receives `trunc(Overhead.Lasten × fraction_c)` as extra
/// `Lasten`, where `fraction_c` is the cluster's share of the total `L1.1` salaries of `basis`
/// (Overhead's own salaries included in the total). Overhead's `Baten` and `Lasten` are set to
/// zero and the governance cluster additionally receives `trunc(Overhead.Saldo × fraction_Overhead)`,
/// the part attributed to overhead's own salaries.
///
/// `basis` is the computed table and `target` is the table that flows downstream: they differ only
/// when a user override is active. Amounts are truncated toward zero in the unit of the table.
pub fn allocate_overhead(
    basis: &ClusterTable,
    target: &ClusterTable,
) -> Result<ClusterTable, PipelineError> {
    let overhead = basis
        .get(OVERHEAD)
        .ok_or_else(|| missing(OVERHEAD))?
        .clone();
    for required in [OVERHEAD, GOVERNANCE] {
        if target.get(required).is_none() {
            return Err(missing(required));
        }
    }

    let total_salaries = basis.total_salaries();
    if total_salaries.is_zero() {
        return Err(PipelineError::DivisionByZero {
            what: String::from("the total of L1.1 Salarissen en sociale lasten"),
        });
    }
    // multiply first: 300 × 100 / 300 is exact, 300 × (100 / 300) is not
    let share_of = |amount: Decimal, cluster: &str| -> Decimal {
        basis
            .get(cluster)
            .map(|row| (amount * row.salaries() / total_salaries).trunc())
            .unwrap_or(Decimal::ZERO)
    };

    debug!(
        "Allocating {} of overhead over {} clusters",
        overhead.lasten(),
        target.rows().len() - 1
    );

    let mut allocated = target.clone();
    for row in allocated.rows_mut() {
        if row.name() == OVERHEAD {
            row.clear_baten_lasten();
        } else {
            let share = share_of(overhead.lasten(), row.name());
            row.add_lasten(share);
        }
    }

    let own_share = share_of(overhead.saldo(), OVERHEAD);
    if let Some(governance) = allocated.get_mut(GOVERNANCE) {
        governance.add_lasten(own_share);
    }

    Ok(allocated)
}

fn missing(cluster: &str) -> PipelineError {
    PipelineError::MissingCluster {
        cluster: cluster.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterRow, Unit};

    fn row(name: &str, baten: i64, lasten: i64, salaries: i64) -> ClusterRow {
        ClusterRow::new(name, baten.into(), lasten.into(), salaries.into())
    }

    fn xy_table() -> ClusterTable {
        ClusterTable::new(
            Unit::Thousand,
            vec![
                row("X", 0, 200, 50),
                row("Y", 10, 300, 50),
                row(GOVERNANCE, 0, 0, 0),
                row(OVERHEAD, 0, 100, 0),
            ],
        )
    }

    #[test]
    fn test_equal_salary_shares() {
        let allocated = allocate_own_overhead(&xy_table()).unwrap();
        assert_eq!(allocated.get("X").unwrap().lasten(), Decimal::from(250));
        assert_eq!(allocated.get("Y").unwrap().lasten(), Decimal::from(350));
        assert_eq!(allocated.get("Y").unwrap().saldo(), Decimal::from(340));
        assert_eq!(allocated.get(GOVERNANCE).unwrap().lasten(), Decimal::ZERO);
    }

    #[test]
    fn test_thirds_are_not_truncated_down() {
        let table = ClusterTable::new(
            Unit::Thousand,
            vec![
                row("X", 0, 0, 100),
                row("Y", 0, 0, 200),
                row(GOVERNANCE, 0, 0, 0),
                row(OVERHEAD, 0, 300, 0),
            ],
        );
        let allocated = allocate_own_overhead(&table).unwrap();
        assert_eq!(allocated.get("X").unwrap().lasten(), Decimal::from(100));
        assert_eq!(allocated.get("Y").unwrap().lasten(), Decimal::from(200));
    }

    #[test]
    fn test_overhead_is_neutralized() {
        let mut table = xy_table();
        table.get_mut(OVERHEAD).unwrap().add(7.into(), 0.into(), 0.into());
        let allocated = allocate_own_overhead(&table).unwrap();
        let overhead = allocated.get(OVERHEAD).unwrap();
        assert_eq!(overhead.baten(), Decimal::ZERO);
        assert_eq!(overhead.lasten(), Decimal::ZERO);
        assert_eq!(overhead.saldo(), Decimal::ZERO);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let table = xy_table();
        let before = table.clone();
        let _ = allocate_own_overhead(&table).unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn test_own_share_goes_to_governance() {
        let table = ClusterTable::new(
            Unit::Thousand,
            vec![
                row("X", 0, 100, 30),
                row(GOVERNANCE, 0, 50, 10),
                row(OVERHEAD, 20, 200, 60),
            ],
        );
        let allocated = allocate_own_overhead(&table).unwrap();
        // fractions: X 0.3, governance 0.1, Overhead 0.6
        assert_eq!(allocated.get("X").unwrap().lasten(), Decimal::from(160));
        // 50 + trunc(200 * 0.1) + trunc(180 * 0.6)
        assert_eq!(allocated.get(GOVERNANCE).unwrap().lasten(), Decimal::from(178));
    }

    #[test]
    fn test_conservation_within_residue() {
        let table = ClusterTable::new(
            Unit::Thousand,
            vec![
                row("A", 0, 1_000, 7),
                row("B", 3, 2_000, 11),
                row("C", 0, 500, 13),
                row(GOVERNANCE, 0, 800, 17),
                row(OVERHEAD, 0, 999, 19),
            ],
        );
        let allocated = allocate_own_overhead(&table).unwrap();
        let before = table.total_lasten();
        let after = allocated.total_lasten();
        let residue = before - after;
        assert!(residue >= Decimal::ZERO);
        assert!(residue < Decimal::from(table.rows().len()));
        for r in allocated.rows() {
            assert_eq!(r.saldo(), r.lasten() - r.baten());
        }
    }

    #[test]
    fn test_truncation_toward_zero() {
        let table = ClusterTable::new(
            Unit::Thousand,
            vec![
                row("X", 0, 0, 1),
                row("Y", 0, 0, 2),
                row(GOVERNANCE, 0, 0, 0),
                row(OVERHEAD, 0, -10, 0),
            ],
        );
        let allocated = allocate_own_overhead(&table).unwrap();
        // -10 / 3 = -3.33 and -10 * 2 / 3 = -6.67
        assert_eq!(allocated.get("X").unwrap().lasten(), Decimal::from(-3));
        assert_eq!(allocated.get("Y").unwrap().lasten(), Decimal::from(-6));
    }

    #[test]
    fn test_zero_salaries() {
        let table = ClusterTable::new(
            Unit::Thousand,
            vec![row("X", 0, 10, 0), row(GOVERNANCE, 0, 0, 0), row(OVERHEAD, 0, 100, 0)],
        );
        let err = allocate_own_overhead(&table).unwrap_err();
        assert!(matches!(err, PipelineError::DivisionByZero { .. }));
    }

    #[test]
    fn test_missing_overhead() {
        let table = ClusterTable::new(
            Unit::Thousand,
            vec![row("X", 0, 10, 5), row(GOVERNANCE, 0, 0, 5)],
        );
        let err = allocate_own_overhead(&table).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingCluster {
                cluster: OVERHEAD.to_string()
            }
        );
    }

    #[test]
    fn test_override_target_uses_basis_fractions() {
        let basis = xy_table();
        let target = ClusterTable::new(
            Unit::Thousand,
            vec![
                row("X", 0, 1_000, 0),
                row("Y", 0, 0, 100),
                row(GOVERNANCE, 0, 0, 0),
                row(OVERHEAD, 0, 5, 0),
            ],
        );
        let allocated = allocate_overhead(&basis, &target).unwrap();
        assert_eq!(allocated.get("X").unwrap().lasten(), Decimal::from(1_050));
        assert_eq!(allocated.get("Y").unwrap().lasten(), Decimal::from(50));
        assert_eq!(allocated.get(OVERHEAD).unwrap().lasten(), Decimal::ZERO);
    }
}
