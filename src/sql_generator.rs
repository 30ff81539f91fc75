use crate::dataset::{Cell, Dataset, format_float};

/// storage type label → sql column type. anything not listed falls back to `TEXT`.
pub const COLUMN_TYPE_MAPPING: &[(&str, &str)] = &[
    ("text", "TEXT"),
    ("object", "TEXT"),
    ("int64", "INTEGER"),
    ("integer", "INTEGER"),
    ("float64", "NUMERIC"),
    ("timestamp", "TIMESTAMP"),
    ("datetime64[ns]", "TIMESTAMP"),
    ("bool", "BOOLEAN"),
    ("boolean", "BOOLEAN"),
];

/// maps a storage type label to the sql keyword used in `create table`.
pub fn map_type(storage_type: &str) -> &'static str {
    COLUMN_TYPE_MAPPING
        .iter()
        .find(|(label, _)| *label == storage_type)
        .map_or("TEXT", |(_, sql_type)| *sql_type)
}

/// renders one cell as a sql literal for a `values (...)` list.
///
/// text is single-quoted with embedded quotes doubled; nothing else is escaped.
/// timestamps and unclassified values are written as their plain string form, unquoted.
pub fn format_value(cell: &Cell) -> String {
    match cell {
        Cell::Null => "NULL".to_string(),
        Cell::Integer(i) => i.to_string(),
        Cell::Float(f) => format_float(*f),
        Cell::Boolean(true) => "TRUE".to_string(),
        Cell::Boolean(false) => "FALSE".to_string(),
        Cell::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Cell::Timestamp(ts) => ts.to_string(),
        Cell::Other(s) => s.clone(),
    }
}

fn quoted_columns(dataset: &Dataset) -> Vec<String> {
    // quote column names to handle spaces or special characters.
    dataset
        .column_names()
        .into_iter()
        .map(|name| format!("\"{name}\""))
        .collect()
}

/// generates a `create table if not exists` statement from a dataset's columns and inferred types.
pub fn build_create_table(dataset: &Dataset, table_name: &str) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {table_name} (\n");

    let columns: Vec<String> = dataset
        .columns()
        .iter()
        .map(|column| {
            format!(
                "    \"{}\" {}",
                column.name,
                map_type(column.storage_type.label())
            )
        })
        .collect();

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n);");

    sql
}

/// generates one `insert into` statement per row, in row order.
pub fn build_inserts(dataset: &Dataset, table_name: &str) -> Vec<String> {
    let columns_list = quoted_columns(dataset).join(", ");
    (0..dataset.row_count())
        .map(|row| {
            let values: Vec<String> = dataset.row(row).map(format_value).collect();
            format!(
                "INSERT INTO {table_name} ({columns_list}) VALUES ({});",
                values.join(", ")
            )
        })
        .collect()
}
