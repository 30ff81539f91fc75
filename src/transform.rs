use regex::Regex;

use crate::dataset::{Cell, Column, Dataset, StorageType};
use crate::error::{EtlError, Result};

/// splits a leading numeric code off the first column, e.g. `"123456Springfield"`.
///
/// the result holds an integer code column, the trimmed remainder of the first column, and
/// the other columns unchanged; every column is then renamed to its position (`0`, `1`, ...).
pub fn split_leading_code(dataset: Dataset) -> Result<Dataset> {
    let pattern = Regex::new(r"(?s)^(\d+)(.*)$").map_err(|e| EtlError::InvalidDataset(e.to_string()))?;

    let mut columns = dataset.into_columns().into_iter();
    let Some(first) = columns.next() else {
        return Err(EtlError::InvalidDataset("dataset has no columns to split".to_string()));
    };

    let mut codes = Vec::with_capacity(first.cells.len());
    let mut names = Vec::with_capacity(first.cells.len());
    for (row, cell) in first.cells.iter().enumerate() {
        let Some(value) = cell.to_text() else {
            codes.push(Cell::Null);
            names.push(Cell::Null);
            continue;
        };
        let captures = pattern.captures(&value).ok_or_else(|| {
            EtlError::InvalidDataset(format!("row {row}: \"{value}\" has no leading numeric code"))
        })?;
        let code = captures[1].parse::<i64>().map_err(|e| {
            EtlError::InvalidDataset(format!("row {row}: code {} is not an integer: {e}", &captures[1]))
        })?;
        codes.push(Cell::Integer(code));
        names.push(Cell::Text(captures[2].trim().to_string()));
    }

    let mut split = vec![
        (StorageType::Integer, codes),
        (StorageType::Text, names),
    ];
    split.extend(columns.map(|c| (c.storage_type, c.cells)));

    let renamed = split
        .into_iter()
        .enumerate()
        .map(|(i, (storage_type, cells))| Column::new(i.to_string(), storage_type, cells))
        .collect();
    Dataset::new(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn municipal(values: &[&str]) -> Dataset {
        let cells: Vec<Cell> = values.iter().map(|v| Cell::Text(v.to_string())).collect();
        let population = (0..values.len() as i64).map(Cell::Integer).collect();
        Dataset::new(vec![
            Column::new("0", StorageType::Text, cells),
            Column::new("1", StorageType::Integer, population),
        ])
        .expect("valid dataset")
    }

    #[test]
    fn test_split_leading_code() {
        let ds = split_leading_code(municipal(&["123456 Springfield", "42Shelbyville"]))
            .expect("split codes");
        assert_eq!(ds.column_names(), vec!["0", "1", "2"]);
        let types: Vec<StorageType> = ds.columns().iter().map(|c| c.storage_type).collect();
        assert_eq!(types, vec![StorageType::Integer, StorageType::Text, StorageType::Integer]);
        let first: Vec<&Cell> = ds.row(0).collect();
        assert_eq!(
            first,
            vec![&Cell::Integer(123456), &Cell::Text("Springfield".into()), &Cell::Integer(0)]
        );
    }

    #[test]
    fn test_integer_first_column_splits_to_empty_name() {
        let ds = Dataset::new(vec![Column::new("0", StorageType::Integer, vec![Cell::Integer(77)])])
            .expect("valid dataset");
        let ds = split_leading_code(ds).expect("split codes");
        let row: Vec<&Cell> = ds.row(0).collect();
        assert_eq!(row, vec![&Cell::Integer(77), &Cell::Text(String::new())]);
    }

    #[test]
    fn test_missing_code_is_rejected() {
        let result = split_leading_code(municipal(&["Springfield"]));
        assert!(matches!(result, Err(EtlError::InvalidDataset(_))));
    }

    #[test]
    fn test_nulls_pass_through() {
        let ds = Dataset::new(vec![Column::new("0", StorageType::Text, vec![Cell::Null])])
            .expect("valid dataset");
        let ds = split_leading_code(ds).expect("split codes");
        let row: Vec<&Cell> = ds.row(0).collect();
        assert_eq!(row, vec![&Cell::Null, &Cell::Null]);
    }
}
