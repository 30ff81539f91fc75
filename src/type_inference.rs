use chrono::{NaiveDate, NaiveDateTime};

use crate::dataset::{Cell, StorageType};
use crate::loader::LoadOptions;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// infers the strictest storage type that can represent all non-null string values in a column.
// values matching one of the configured null tokens ("", "NA", "NULL", ...) are skipped, so a
// column may be nullable regardless of its type.
//
// the hierarchy, from strictest to most general, is:
// 1. unknown: the column is empty or every value is a null token.
// 2. boolean: every value is "true" or "false" (case-insensitive). "1"/"0" stay integers.
// 3. integer: every value parses as i64.
// 4. float: every value parses as f64.
// 5. timestamp: only when date parsing is enabled, every value parses as a datetime or a
//    plain date (yyyy-mm-dd, read as midnight).
// 6. text: anything else.
pub fn infer_storage_type(column_data: &[&str], options: &LoadOptions) -> StorageType {
    let mut has_only_nulls = true;
    let mut all_booleans = true;
    let mut all_integers = true;
    let mut all_floats = true;
    let mut all_timestamps = options.parse_dates;

    for value_str in column_data {
        if options.is_null(value_str) {
            continue;
        }
        has_only_nulls = false;
        let value = value_str.trim();

        if all_booleans && parse_bool(value).is_none() {
            all_booleans = false;
        }
        if all_integers && value.parse::<i64>().is_err() {
            all_integers = false;
        }
        if all_floats && value.parse::<f64>().is_err() {
            all_floats = false;
        }
        if all_timestamps && parse_timestamp(value).is_none() {
            all_timestamps = false;
        }
    }

    if has_only_nulls {
        StorageType::Unknown
    } else if all_booleans {
        StorageType::Boolean
    } else if all_integers {
        StorageType::Integer
    } else if all_floats {
        StorageType::Float
    } else if all_timestamps {
        StorageType::Timestamp
    } else {
        StorageType::Text
    }
}

/// converts one raw value under its column's inferred type.
pub fn parse_cell(raw: &str, storage_type: StorageType, options: &LoadOptions) -> Cell {
    if options.is_null(raw) {
        return Cell::Null;
    }
    let value = raw.trim();
    // the type was inferred from these very values, so the fallbacks only guard misuse.
    match storage_type {
        StorageType::Boolean => parse_bool(value).map_or_else(|| text(raw), Cell::Boolean),
        StorageType::Integer => value.parse::<i64>().map_or_else(|_| text(raw), Cell::Integer),
        StorageType::Float => match value.parse::<f64>() {
            Ok(f) if f.is_nan() => Cell::Null,
            Ok(f) => Cell::Float(f),
            Err(_) => text(raw),
        },
        StorageType::Timestamp => parse_timestamp(value).map_or_else(|| text(raw), Cell::Timestamp),
        StorageType::Text | StorageType::Unknown => text(raw),
    }
}

// unifies cells that already carry a type (spreadsheet values) into one storage type.
// integral floats are folded into integers when the whole column is integral, and a column
// that mixes kinds becomes text with every value converted to its text form.
pub fn unify_cells(cells: Vec<Cell>) -> (StorageType, Vec<Cell>) {
    let values: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();

    if values.is_empty() {
        return (StorageType::Unknown, cells);
    }
    if values.iter().all(|c| matches!(c, Cell::Boolean(_))) {
        return (StorageType::Boolean, cells);
    }
    if values.iter().all(|c| matches!(c, Cell::Timestamp(_))) {
        return (StorageType::Timestamp, cells);
    }
    if values.iter().all(|c| matches!(c, Cell::Integer(_) | Cell::Float(_))) {
        let integral = values.iter().all(|c| match c {
            Cell::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => true,
        });
        if integral {
            let cells = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Float(f) => Cell::Integer(f as i64),
                    other => other,
                })
                .collect();
            return (StorageType::Integer, cells);
        }
        let cells = cells
            .into_iter()
            .map(|c| match c {
                Cell::Integer(i) => Cell::Float(i as f64),
                other => other,
            })
            .collect();
        return (StorageType::Float, cells);
    }

    let cells = cells
        .into_iter()
        .map(|c| c.to_text().map_or(Cell::Null, Cell::Text))
        .collect();
    (StorageType::Text, cells)
}

fn text(raw: &str) -> Cell {
    Cell::Text(raw.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
