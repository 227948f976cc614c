//! Types that represent the data model: task-field records, cluster tables, fund allocations and
//! the amounts and units they are expressed in.
mod amount;
mod cluster;
mod mapping;
mod taakveld;
mod unit;

pub use amount::{Amount, AmountError, AmountFormat, NumberStyle};
pub use cluster::{ClusterRow, ClusterTable, ClusterValue, ClusterValues, FundAllocationTable};
pub use mapping::{Mapping, MappingError};
pub use taakveld::{DetailTable, MunicipalityProfile, TaskFieldRecord};
pub use unit::Unit;
