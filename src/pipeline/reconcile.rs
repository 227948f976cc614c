//! Joins the normalized local net cost with the normalized fund allocation.

use crate::error::PipelineError;
use crate::model::{ClusterValues, FundAllocationTable, Unit};
use crate::pipeline::sign::{flip_income_side, Normalized};
use crate::taxonomy::{Taxonomy, FUND, INCOME_GROUP};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const TOTAL_ROW: &str = "Totaal";

/// One line of a reconciliation table. Money columns are in € 1.000, the per-resident column in €.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "Netto lasten")]
    pub net_cost: Decimal,
    #[serde(rename = "Gemeentefonds")]
    pub fund: Decimal,
    #[serde(rename = "Verschil")]
    pub difference: Decimal,
    #[serde(rename = "Verschil per inwoner")]
    pub difference_per_resident: Decimal,
}

/// The member rows of one group and their total.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationGroup {
    pub rows: Vec<ReconciliationRow>,
    pub total: ReconciliationRow,
}

impl ReconciliationGroup {
    fn new(rows: Vec<ReconciliationRow>) -> Self {
        let mut total = ReconciliationRow {
            cluster: TOTAL_ROW.to_string(),
            ..Default::default()
        };
        for row in &rows {
            total.net_cost += row.net_cost;
            total.fund += row.fund;
            total.difference += row.difference;
            total.difference_per_resident += row.difference_per_resident;
        }
        total.net_cost = total.net_cost.trunc();
        total.fund = total.fund.trunc();
        total.difference = total.difference.trunc();
        Self { rows, total }
    }

    pub fn get(&self, cluster: &str) -> Option<&ReconciliationRow> {
        self.rows.iter().find(|r| r.cluster == cluster)
    }
}

/// The income and expenditure tables of one municipality against one circular.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub municipality: String,
    pub circulaire: String,
    pub residents: u64,
    pub unit: Unit,
    pub income: ReconciliationGroup,
    pub expenditure: ReconciliationGroup,
}

impl Reconciliation {
    pub fn get(&self, cluster: &str) -> Option<&ReconciliationRow> {
        self.income
            .get(cluster)
            .or_else(|| self.expenditure.get(cluster))
    }
}

/// Builds the reconciliation tables.
///
/// The fund side gets a synthesized `Gemeentefonds` row holding the total fund allocation: the
/// column sum of the fund table before normalization, with its sign flipped like the income-side
/// clusters. Clusters missing on either side count as zero. Both sides are expressed in € 1.000.
pub fn reconcile(
    local: &Normalized<ClusterValues>,
    fund: &Normalized<FundAllocationTable>,
    residents: u64,
    taxonomy: &Taxonomy,
) -> Result<Reconciliation, PipelineError> {
    if residents == 0 {
        return Err(PipelineError::DivisionByZero {
            what: String::from("the number of residents"),
        });
    }
    let residents_dec = Decimal::from(residents);

    let local_values = local.to_unit(Unit::Thousand);
    let fund_values = fund.allocations().to_unit(Unit::Thousand);
    let raw_fund_total: Decimal = flip_income_side(fund_values.clone())
        .values()
        .iter()
        .filter(|v| v.cluster != FUND)
        .map(|v| v.value)
        .sum();
    let fund_total = -raw_fund_total;
    debug!(
        "Total fund allocation for {} in {}: {fund_total}",
        fund.municipality(),
        fund.circulaire()
    );

    let make_row = |cluster: &str| -> ReconciliationRow {
        let net_cost = local_values.get(cluster).unwrap_or(Decimal::ZERO);
        let fund = if cluster == FUND {
            fund_total
        } else {
            fund_values.get(cluster).unwrap_or(Decimal::ZERO)
        };
        let difference = net_cost - fund;
        let difference_per_resident =
            (Unit::Thousand.euros() * difference / residents_dec).round_dp(2);
        ReconciliationRow {
            cluster: cluster.to_string(),
            net_cost,
            fund,
            difference,
            difference_per_resident,
        }
    };

    let income: Vec<ReconciliationRow> = INCOME_GROUP.iter().map(|c| make_row(*c)).collect();

    let mut expenditure: Vec<ReconciliationRow> = taxonomy
        .names()
        .filter(|c| !INCOME_GROUP.contains(c))
        .map(make_row)
        .collect();

    let extra = local_values
        .values()
        .iter()
        .chain(fund_values.values())
        .map(|v| v.cluster.as_str())
        .filter(|c| !taxonomy.contains(c) && !INCOME_GROUP.contains(c));
    for cluster in extra {
        if expenditure.iter().any(|r| r.cluster == cluster) {
            continue;
        }
        warn!("The cluster '{cluster}' is not part of the taxonomy, adding it to the expenditure");
        expenditure.push(make_row(cluster));
    }

    Ok(Reconciliation {
        municipality: fund.municipality().to_string(),
        circulaire: fund.circulaire().to_string(),
        residents,
        unit: Unit::Thousand,
        income: ReconciliationGroup::new(income),
        expenditure: ReconciliationGroup::new(expenditure),
    })
}
