//! reads csv, excel and fixed-width files into a [`Dataset`].

use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::dataset::{Cell, Column, Dataset};
use crate::error::{EtlError, Result};
use crate::fixed_width::parse_fixed_width;
use crate::type_inference::{infer_storage_type, parse_cell, parse_timestamp, unify_cells};

/// values read as null unless overridden.
pub const DEFAULT_NULL_VALUES: &[&str] = &[
    "", "#N/A", "<NA>", "N/A", "NA", "NULL", "NaN", "-NaN", "None", "n/a", "nan", "-nan", "null",
];

/// the kinds of file the loader understands, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Excel,
    FixedWidth,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xls" | "xlsx" => Ok(SourceFormat::Excel),
            "txt" => Ok(SourceFormat::FixedWidth),
            _ => Err(EtlError::UnsupportedFormat(format!(
                "{}: please use .csv, .xls, .xlsx or .txt files",
                path.display()
            ))),
        }
    }

    fn header_by_default(self) -> bool {
        !matches!(self, SourceFormat::FixedWidth)
    }
}

/// options controlling how source files are decoded and typed.
///
/// ```ignore
/// let options = LoadOptions::new()
///     .with_encoding("latin1")?
///     .with_has_header(true)
///     .with_parse_dates(true);
/// ```
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// text encoding for csv and fixed-width files (default: utf-8).
    pub encoding: &'static Encoding,
    /// whether the first row names the columns; `None` uses the format's default.
    pub has_header: Option<bool>,
    /// csv field delimiter (default: `,`).
    pub delimiter: u8,
    /// raw values read as null.
    pub null_values: Vec<String>,
    /// infer timestamp columns from text values (default: off).
    pub parse_dates: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            has_header: None,
            delimiter: b',',
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
            parse_dates: false,
        }
    }
}

impl LoadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// sets the encoding from a label such as `utf-8`, `latin1` or `windows-1252`.
    pub fn with_encoding(mut self, label: &str) -> Result<Self> {
        self.encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| EtlError::Encoding(label.to_string()))?;
        Ok(self)
    }

    #[must_use]
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_null_values(mut self, null_values: Vec<String>) -> Self {
        self.null_values = null_values;
        self
    }

    #[must_use]
    pub fn with_parse_dates(mut self, parse_dates: bool) -> Self {
        self.parse_dates = parse_dates;
        self
    }

    pub fn is_null(&self, raw: &str) -> bool {
        self.null_values.iter().any(|n| n == raw)
    }

    fn header_for(&self, format: SourceFormat) -> bool {
        self.has_header.unwrap_or_else(|| format.header_by_default())
    }
}

/// loads a file into a dataset, choosing the reader from the file extension.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let format = SourceFormat::from_path(path)?;
    let source = path.display().to_string();
    debug!("Loading {source} as {format:?}");

    let dataset = match format {
        SourceFormat::Csv => {
            let text = read_text(path, options)?;
            parse_csv_text(&text, options, &source)?
        }
        SourceFormat::Excel => read_excel(path, options)?,
        SourceFormat::FixedWidth => {
            let text = read_text(path, options)?;
            let rows = parse_fixed_width(&text);
            rows_to_dataset(rows, options.header_for(format), options, &source)?
        }
    };

    debug!(
        "Loaded {} row(s) across {} column(s) from {source}",
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(dataset)
}

/// reads csv data from any reader; the first record is the header unless disabled.
pub fn read_csv<R: Read>(mut reader: R, options: &LoadOptions) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| EtlError::parse("csv input", e))?;
    let text = decode(&bytes, options.encoding, "csv input")?;
    parse_csv_text(&text, options, "csv input")
}

fn read_text(path: &Path, options: &LoadOptions) -> Result<String> {
    let source = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| EtlError::parse(source.as_str(), e))?;
    decode(&bytes, options.encoding, &source)
}

fn decode(bytes: &[u8], encoding: &'static Encoding, source: &str) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(EtlError::parse(
            source,
            format!("failed to decode text with encoding {}", encoding.name()),
        ));
    }
    Ok(text.into_owned())
}

fn parse_csv_text(text: &str, options: &LoadOptions, source: &str) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| EtlError::parse(source, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    rows_to_dataset(rows, options.header_for(SourceFormat::Csv), options, source)
}

// builds typed columns from rows of raw text. every row must have one value per column.
fn rows_to_dataset(
    mut rows: Vec<Vec<String>>,
    has_header: bool,
    options: &LoadOptions,
    source: &str,
) -> Result<Dataset> {
    if rows.is_empty() {
        return Err(EtlError::parse(source, "no columns to parse from file"));
    }
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let headers = if has_header {
        rows.remove(0)
    } else {
        (0..width).map(|i| i.to_string()).collect()
    };
    let headers = unique_headers(headers);

    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let column_data: Vec<&str> = rows
                .iter()
                .map(|row| row.get(i).map_or("", String::as_str))
                .collect();
            let storage_type = infer_storage_type(&column_data, options);
            debug!("Column \"{name}\" inferred as {}", storage_type.label());
            let cells = column_data
                .iter()
                .map(|raw| parse_cell(raw, storage_type, options))
                .collect();
            Column::new(name, storage_type, cells)
        })
        .collect();

    Dataset::new(columns)
}

/// trims header names, names blank headers `Unnamed: <i>` and suffixes repeats with `.1`, `.2`, ...
pub fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            let base = match header.trim() {
                "" => format!("Unnamed: {i}"),
                trimmed => trimmed.to_string(),
            };
            let mut name = base.clone();
            let mut counter = 1;
            while seen.contains(&name) {
                name = format!("{base}.{counter}");
                counter += 1;
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

fn read_excel(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let source = path.display().to_string();
    let mut workbook = open_workbook_auto(path).map_err(|e| EtlError::parse(source.as_str(), e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::parse(source.as_str(), "workbook has no worksheets"))?
        .map_err(|e| EtlError::parse(source.as_str(), e))?;

    let width = range.width();
    if width == 0 {
        return Err(EtlError::parse(source, "no columns to parse from file"));
    }

    let mut rows = range.rows();
    let headers: Vec<String> = if options.header_for(SourceFormat::Excel) {
        rows.next()
            .map(|row| row.iter().map(header_text).collect())
            .unwrap_or_default()
    } else {
        (0..width).map(|i| i.to_string()).collect()
    };

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); width];
    for row in rows {
        for (column, data) in cells.iter_mut().zip(row) {
            column.push(excel_cell(data, options));
        }
    }

    let columns = unique_headers(headers)
        .into_iter()
        .zip(cells)
        .map(|(name, column)| {
            let (storage_type, cells) = unify_cells(column);
            Column::new(name, storage_type, cells)
        })
        .collect();
    Dataset::new(columns)
}

fn header_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        other => other.to_string(),
    }
}

/// converts one spreadsheet cell into a tagged cell.
pub fn excel_cell(data: &Data, options: &LoadOptions) -> Cell {
    match data {
        Data::Empty => Cell::Null,
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) if f.is_nan() => Cell::Null,
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::String(s) if options.is_null(s) => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(_) => data
            .as_datetime()
            .map_or_else(|| Cell::Other(data.to_string()), Cell::Timestamp),
        Data::DateTimeIso(s) => parse_timestamp(s).map_or_else(|| Cell::Other(s.clone()), Cell::Timestamp),
        Data::DurationIso(s) => Cell::Other(s.clone()),
        Data::Error(_) => Cell::Text(data.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StorageType;
    use std::io::Cursor;

    #[test]
    fn test_source_format_from_path() {
        assert_eq!(SourceFormat::from_path(Path::new("a/b.CSV")).ok(), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("b.xlsx")).ok(), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::from_path(Path::new("b.xls")).ok(), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::from_path(Path::new("b.txt")).ok(), Some(SourceFormat::FixedWidth));
        assert!(matches!(
            SourceFormat::from_path(Path::new("b.json")),
            Err(EtlError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SourceFormat::from_path(Path::new("no_extension")),
            Err(EtlError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_csv_types_and_nulls() {
        let csv_data = "id,score,active,note\n1,2.5,true,hi\n2,,false,\n";
        let ds = read_csv(Cursor::new(csv_data), &LoadOptions::default()).expect("read csv");
        let types: Vec<StorageType> = ds.columns().iter().map(|c| c.storage_type).collect();
        assert_eq!(
            types,
            vec![
                StorageType::Integer,
                StorageType::Float,
                StorageType::Boolean,
                StorageType::Text
            ]
        );
        let second: Vec<&Cell> = ds.row(1).collect();
        assert_eq!(
            second,
            vec![&Cell::Integer(2), &Cell::Null, &Cell::Boolean(false), &Cell::Null]
        );
    }

    #[test]
    fn test_read_csv_custom_delimiter() {
        let options = LoadOptions::default().with_delimiter(b';');
        let ds = read_csv(Cursor::new("a;b\n1;x\n"), &options).expect("read csv");
        assert_eq!(ds.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_read_csv_without_header() {
        let options = LoadOptions::default().with_has_header(false);
        let ds = read_csv(Cursor::new("1,x\n2,y\n"), &options).expect("read csv");
        assert_eq!(ds.column_names(), vec!["0", "1"]);
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_read_csv_latin1() {
        let options = LoadOptions::default().with_encoding("latin1").expect("known label");
        let bytes: &[u8] = b"name\nJos\xe9\n";
        let ds = read_csv(bytes, &options).expect("read csv");
        assert_eq!(ds.columns()[0].cells, vec![Cell::Text("José".into())]);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            LoadOptions::default().with_encoding("klingon"),
            Err(EtlError::Encoding(_))
        ));
    }

    #[test]
    fn test_empty_csv_is_parse_failure() {
        let result = read_csv(Cursor::new(""), &LoadOptions::default());
        assert!(matches!(result, Err(EtlError::ParseFailure { .. })));
    }

    #[test]
    fn test_unique_headers() {
        let headers = vec!["a".to_string(), " a ".to_string(), String::new(), "a".to_string()];
        assert_eq!(unique_headers(headers), vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_excel_cell_conversion() {
        let options = LoadOptions::default();
        assert_eq!(excel_cell(&Data::Empty, &options), Cell::Null);
        assert_eq!(excel_cell(&Data::Float(1.5), &options), Cell::Float(1.5));
        assert_eq!(excel_cell(&Data::Int(4), &options), Cell::Integer(4));
        assert_eq!(excel_cell(&Data::Bool(true), &options), Cell::Boolean(true));
        assert_eq!(excel_cell(&Data::String("NA".into()), &options), Cell::Null);
        assert_eq!(
            excel_cell(&Data::String("O'Brien".into()), &options),
            Cell::Text("O'Brien".into())
        );
        assert!(matches!(
            excel_cell(&Data::DateTimeIso("2023-05-01T12:00:00".into()), &options),
            Cell::Timestamp(_)
        ));
    }
}
