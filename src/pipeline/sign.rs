//! Sign normalization of the income-side clusters.
//!
//! Local cost data and fund allocations store revenue clusters with opposite signs. Flipping the
//! income-side clusters on both sides lets the chart and the reconciliation treat every cluster as
//! a net burden that the fund covers. Flipping twice silently inverts the result again, so the
//! pipeline only ever hands out `Normalized` values, which cannot be normalized a second time.

use crate::model::{ClusterTable, ClusterValues, FundAllocationTable};
use crate::taxonomy::is_income_side;
use std::ops::Deref;

/// Values whose income-side clusters can be negated.
pub trait IncomeSide: Sized {
    fn flip_income_side(self) -> Self;
}

impl IncomeSide for ClusterValues {
    fn flip_income_side(self) -> Self {
        self.map_values(|cluster, value| {
            if is_income_side(cluster) {
                -value
            } else {
                value
            }
        })
    }
}

impl IncomeSide for FundAllocationTable {
    fn flip_income_side(self) -> Self {
        self.map_allocations(|cluster, value| {
            if is_income_side(cluster) {
                -value
            } else {
                value
            }
        })
    }
}

/// Negates the income-side clusters. Applying it twice returns the original values.
pub fn flip_income_side<T: IncomeSide>(values: T) -> T {
    values.flip_income_side()
}

/// Values that have been sign normalized exactly once.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Normalized<T>(T);

impl<T> Normalized<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Normalized<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Reduces the local cluster table to its net values and normalizes them.
pub fn normalize_local(table: &ClusterTable) -> Normalized<ClusterValues> {
    Normalized(table.net_values().flip_income_side())
}

pub fn normalize_fund(table: FundAllocationTable) -> Normalized<FundAllocationTable> {
    Normalized(table.flip_income_side())
}
