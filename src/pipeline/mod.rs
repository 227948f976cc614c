//! The reclassification and reconciliation pipeline.
//!
//! Every stage takes its input by reference and returns a new value:
//! detail table → `aggregate` → `allocate_overhead` (optional) → `normalize_local` /
//! `normalize_fund` → `reconcile`.

mod aggregate;
mod compare;
mod overhead;
mod reconcile;
mod sign;

pub use aggregate::{aggregate, aggregate_override, Aggregation};
pub use compare::{select_comparisons, ComparisonFilter, ComparisonSet, MAX_COMPARISONS};
pub use overhead::{allocate_own_overhead, allocate_overhead};
pub use reconcile::{reconcile, Reconciliation, ReconciliationGroup, ReconciliationRow, TOTAL_ROW};
pub use sign::{flip_income_side, normalize_fund, normalize_local, IncomeSide, Normalized};

use crate::error::PipelineError;
use crate::model::{ClusterTable, ClusterValues, DetailTable, FundAllocationTable};
use crate::session::OverrideTable;
use crate::taxonomy::Taxonomy;
use tracing::debug;

/// The local side of one analysis: the aggregated tables and the normalized net cost.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LocalSide {
    pub aggregation: Aggregation,
    /// The effective table after overhead allocation, when allocation was requested.
    pub allocated: Option<ClusterTable>,
    pub net: Normalized<ClusterValues>,
}

impl LocalSide {
    /// Runs the local half of the pipeline for one municipality.
    pub fn compute(
        detail: &DetailTable,
        override_table: Option<&OverrideTable>,
        taxonomy: &Taxonomy,
        allocate: bool,
    ) -> Result<Self, PipelineError> {
        let aggregation = Aggregation::new(detail, override_table, taxonomy);
        let allocated = if allocate {
            debug!("Allocating overhead for {}", detail.municipality());
            Some(allocate_overhead(
                &aggregation.computed,
                &aggregation.effective,
            )?)
        } else {
            None
        };
        let net = normalize_local(allocated.as_ref().unwrap_or(&aggregation.effective));
        Ok(Self {
            aggregation,
            allocated,
            net,
        })
    }

    /// The cluster table whose net values were normalized.
    pub fn table(&self) -> &ClusterTable {
        self.allocated
            .as_ref()
            .unwrap_or(&self.aggregation.effective)
    }
}

/// A complete analysis of one municipality against one circular.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Analysis {
    pub local: LocalSide,
    pub fund: Normalized<FundAllocationTable>,
    pub reconciliation: Reconciliation,
}

impl Analysis {
    pub fn compute(
        local: LocalSide,
        fund: FundAllocationTable,
        residents: u64,
        taxonomy: &Taxonomy,
    ) -> Result<Self, PipelineError> {
        let fund = normalize_fund(fund);
        let reconciliation = reconcile(&local.net, &fund, residents, taxonomy)?;
        Ok(Self {
            local,
            fund,
            reconciliation,
        })
    }
}
