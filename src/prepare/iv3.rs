//! Turns the raw Iv3 export into the analysis table read by `Iv3Table`.
//!
//! The raw export has one row per municipality, task field and category. Per municipality and task
//! field the categories are summed into `Baten` (categories starting with `B`), `Lasten` (starting
//! with `L`) and the salaries (starting with `L1.1`). Balance sheet posts, whose labels start with
//! `A` or `P`, are dropped. The class attributes of the municipality are joined in and municipality
//! codes are replaced by names.

use crate::error::Res;
use crate::model::{Mapping, NumberStyle};
use crate::source::iv3::{
    parse_number, BATEN_COLUMN, LASTEN_COLUMN, SALARIES_COLUMN, TASK_FIELD_COLUMN,
};
use crate::source::{read_table, Document, MUNICIPALITY_COLUMN};
use anyhow::Context;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub const RAW_TASK_FIELD_COLUMN: &str = "TaakveldBalanspost";
pub const RAW_CATEGORY_COLUMN: &str = "Categorie";
pub const RAW_VALUE_COLUMN: &str = "k_2ePlaatsing_2";

const RAW_DELIMITER: u8 = b',';
const CLASSES_DELIMITER: u8 = b'\t';
const NAMES_DELIMITER: u8 = b'\t';
const OUTPUT_DELIMITER: u8 = b';';

/// The summed values of one municipality and task field.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TaskFieldTotal {
    pub municipality: String,
    pub task_field: String,
    pub salaries: Decimal,
    pub baten: Decimal,
    pub lasten: Decimal,
}

/// The name of the analysis file for a raw export, e.g. `2024_begroting.csv` for a file named
/// `2024...000.csv`. Returns `None` for files that are neither a budget nor an account.
pub fn output_name(raw_file_name: &str) -> Option<String> {
    let year = raw_file_name.get(..4)?;
    if year.parse::<i32>().is_err() {
        return None;
    }
    let document = if raw_file_name.ends_with("000.csv") {
        Document::Begroting
    } else if raw_file_name.ends_with("005.csv") {
        Document::Jaarrekening
    } else {
        return None;
    };
    Some(format!("{year}_{document}.csv"))
}

fn is_balance_post(task_field: &str) -> bool {
    task_field.starts_with('A') || task_field.starts_with('P')
}

/// Sums the categories of the raw export per municipality and task field, sorted by municipality
/// and task field.
pub fn task_field_totals(raw: &str) -> Res<Vec<TaskFieldTotal>> {
    let (headers, data) = read_table(raw, RAW_DELIMITER)?;
    let mapping = Mapping::new(&headers)?;
    let municipality_ix = mapping.require(MUNICIPALITY_COLUMN)?;
    let task_field_ix = mapping.require(RAW_TASK_FIELD_COLUMN)?;
    let category_ix = mapping.require(RAW_CATEGORY_COLUMN)?;
    let value_ix = mapping.require(RAW_VALUE_COLUMN)?;

    let mut totals: BTreeMap<(String, String), TaskFieldTotal> = BTreeMap::new();
    for (i, cells) in data.iter().enumerate() {
        let task_field = cells[task_field_ix].trim();
        if is_balance_post(task_field) {
            continue;
        }
        let municipality = cells[municipality_ix].trim();
        let category = cells[category_ix].trim();
        let value = parse_number(&cells[value_ix], NumberStyle::Plain).with_context(|| {
            format!("Bad value in line {}, column '{RAW_VALUE_COLUMN}'", i + 2)
        })?;

        let total = totals
            .entry((municipality.to_string(), task_field.to_string()))
            .or_insert_with(|| TaskFieldTotal {
                municipality: municipality.to_string(),
                task_field: task_field.to_string(),
                ..Default::default()
            });
        if category.starts_with('B') {
            total.baten += value;
        } else if category.starts_with('L') {
            total.lasten += value;
            if category.starts_with("L1.1") {
                total.salaries += value;
            }
        }
    }
    debug!("Summed {} raw rows into {} task fields", data.len(), totals.len());
    Ok(totals.into_values().collect())
}

/// Reads the code to name table. The first column is the code, the second the name.
pub fn municipality_names(text: &str) -> Res<HashMap<String, String>> {
    let (_, data) = read_table(text, NAMES_DELIMITER)?;
    Ok(data
        .into_iter()
        .filter(|cells| cells.len() >= 2)
        .map(|cells| (cells[0].trim().to_string(), cells[1].trim().to_string()))
        .collect())
}

/// Builds the `;` separated analysis table from the raw export and the class table of the year.
/// Task fields of municipalities without class data are dropped.
pub fn prepare_iv3(raw: &str, classes: &str, names: &HashMap<String, String>) -> Res<String> {
    let totals = task_field_totals(raw)?;

    let (class_headers, class_rows) =
        read_table(classes, CLASSES_DELIMITER).context("Unable to read the class table")?;
    let class_mapping = Mapping::new(&class_headers)?;
    let class_name_ix = class_mapping.require(MUNICIPALITY_COLUMN)?;
    let class_columns: Vec<usize> = (0..class_headers.len())
        .filter(|ix| *ix != class_name_ix && !class_headers[*ix].trim().is_empty())
        .collect();
    let classes: HashMap<&str, &Vec<String>> = class_rows
        .iter()
        .map(|cells| (cells[class_name_ix].trim(), cells))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .from_writer(Vec::new());
    let mut header = vec![
        MUNICIPALITY_COLUMN.to_string(),
        TASK_FIELD_COLUMN.to_string(),
        SALARIES_COLUMN.to_string(),
        BATEN_COLUMN.to_string(),
        LASTEN_COLUMN.to_string(),
    ];
    header.extend(class_columns.iter().map(|ix| class_headers[*ix].trim().to_string()));
    writer.write_record(&header)?;

    let mut dropped = 0usize;
    for total in &totals {
        let class_row = match classes.get(total.municipality.as_str()) {
            Some(row) => row,
            None => {
                dropped += 1;
                continue;
            }
        };
        let name = names
            .get(&total.municipality)
            .cloned()
            .unwrap_or_else(|| total.municipality.clone());
        let mut record = vec![
            name,
            total.task_field.clone(),
            total.salaries.to_string(),
            total.baten.to_string(),
            total.lasten.to_string(),
        ];
        record.extend(class_columns.iter().map(|ix| class_row[*ix].clone()));
        writer.write_record(&record)?;
    }
    if dropped > 0 {
        warn!("Dropped {dropped} task fields of municipalities without class data");
    }

    let bytes = writer
        .into_inner()
        .context("Unable to finish the analysis table")?;
    String::from_utf8(bytes).context("The analysis table is not valid UTF-8")
}
