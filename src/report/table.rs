//! Markdown tables with Dutch number formatting.

use crate::model::{Amount, AmountFormat};
use crate::pipeline::{Reconciliation, ReconciliationGroup, ReconciliationRow};
use crate::report::chart::{ChartDataset, Measure};
use rust_decimal::Decimal;

const RECONCILIATION_HEADERS: [&str; 5] = [
    "Cluster",
    "Netto lasten",
    "Gemeentefonds",
    "Verschil",
    "Verschil per inwoner",
];

/// Millions are shown with one decimal.
const MILLIONS: AmountFormat = AmountFormat::new(false, true, 1);

fn amount(value: Decimal, format: AmountFormat) -> String {
    Amount::new_with_format(value, format).to_string()
}

/// Renders a markdown table. The first column is left aligned, the others right aligned.
pub fn markdown(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(ix, (cell, &width))| {
                if ix == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers.iter().map(|h| h.to_string()).collect()));
    let rule: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(ix, width)| {
            let dashes = "-".repeat(width.saturating_sub(1).max(2));
            if ix == 0 {
                format!(":{dashes}")
            } else {
                format!("{dashes}:")
            }
        })
        .collect();
    out.push(format!("| {} |", rule.join(" | ")));
    for row in rows {
        out.push(line(row.clone()));
    }
    out.join("\n")
}

fn reconciliation_cells(row: &ReconciliationRow) -> Vec<String> {
    vec![
        row.cluster.clone(),
        amount(row.net_cost, AmountFormat::whole()),
        amount(row.fund, AmountFormat::whole()),
        amount(row.difference, AmountFormat::whole()),
        amount(row.difference_per_resident, AmountFormat::euros()),
    ]
}

/// Renders a group with its total row last.
pub fn group_table(group: &ReconciliationGroup) -> String {
    let rows: Vec<Vec<String>> = group
        .rows
        .iter()
        .chain([&group.total])
        .map(reconciliation_cells)
        .collect();
    markdown(&RECONCILIATION_HEADERS, &rows)
}

/// Renders the income and expenditure tables with a caption.
pub fn reconciliation_tables(reconciliation: &Reconciliation) -> String {
    format!(
        "{municipality}, circulaire {circulaire}, {residents} inwoners (bedragen in {unit})\n\n\
         Inkomsten\n\n{income}\n\nUitgaven\n\n{expenditure}",
        municipality = reconciliation.municipality,
        circulaire = reconciliation.circulaire,
        residents = amount(Decimal::from(reconciliation.residents), AmountFormat::whole()),
        unit = reconciliation.unit.label(),
        income = group_table(&reconciliation.income),
        expenditure = group_table(&reconciliation.expenditure),
    )
}

/// Renders the chart dataset with one row per cluster and one column per category.
pub fn chart_table(chart: &ChartDataset) -> String {
    let format = match chart.measure {
        Measure::Total => MILLIONS,
        Measure::PerResident => AmountFormat::euros(),
    };
    let mut headers = vec!["Cluster"];
    headers.extend(chart.categories.iter().map(String::as_str));
    let rows: Vec<Vec<String>> = chart
        .clusters
        .iter()
        .map(|cluster| {
            let mut cells = vec![cluster.clone()];
            cells.extend(chart.categories.iter().map(|category| {
                chart
                    .get(cluster, category)
                    .map(|v| amount(v, format))
                    .unwrap_or_default()
            }));
            cells
        })
        .collect();
    format!(
        "{}\n\n{}\n\n{}",
        chart.axis,
        markdown(&headers, &rows),
        chart.legend
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TOTAL_ROW;
    use crate::report::chart::ChartRow;

    #[test]
    fn test_markdown_alignment() {
        let table = markdown(
            &["Cluster", "Waarde"],
            &[
                vec!["OZB".to_string(), "1.000".to_string()],
                vec!["Onderwijs".to_string(), "5".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Cluster   | Waarde |");
        assert_eq!(lines[1], "| :-------- | -----: |");
        assert_eq!(lines[2], "| OZB       |  1.000 |");
        assert_eq!(lines[3], "| Onderwijs |      5 |");
    }

    #[test]
    fn test_group_table_dutch_numbers() {
        let row = ReconciliationRow {
            cluster: "Onderwijs".to_string(),
            net_cost: Decimal::from(52_950),
            fund: Decimal::from(2_000),
            difference: Decimal::from(50_950),
            difference_per_resident: Decimal::new(509_500, 2),
        };
        let group = ReconciliationGroup {
            rows: vec![row.clone()],
            total: ReconciliationRow {
                cluster: TOTAL_ROW.to_string(),
                ..row
            },
        };
        let table = group_table(&group);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("52.950"));
        assert!(lines[2].contains("€ 5.095,00"));
        assert!(lines[3].starts_with("| Totaal"));
    }

    #[test]
    fn test_chart_table() {
        let chart = ChartDataset {
            measure: Measure::Total,
            axis: "€ 1 mln.".to_string(),
            clusters: vec!["OZB".to_string(), "Onderwijs".to_string()],
            categories: vec!["Utrecht".to_string(), "Gemeentefonds".to_string()],
            rows: vec![
                ChartRow {
                    cluster: "OZB".to_string(),
                    value: Decimal::new(48, 1),
                    category: "Utrecht".to_string(),
                },
                ChartRow {
                    cluster: "Onderwijs".to_string(),
                    value: Decimal::new(1234, 1),
                    category: "Gemeentefonds".to_string(),
                },
            ],
            legend: "OZB: Onroerendezaakbelasting".to_string(),
        };
        let table = chart_table(&chart);
        assert!(table.starts_with("€ 1 mln."));
        assert!(table.contains("| OZB       |     4,8 |"));
        assert!(table.contains("123,4"));
        assert!(table.ends_with("OZB: Onroerendezaakbelasting"));
    }
}
