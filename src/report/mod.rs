//! Presentation of analysis results: the chart dataset and the reconciliation tables.

mod chart;
mod table;

pub use chart::{chart_dataset, legend, ChartDataset, ChartRow, Measure, Series};
pub use table::{chart_table, group_table, markdown, reconciliation_tables};
