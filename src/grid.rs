//! Spreadsheet parsing into the rectangular cell grid the layout
//! readers walk. Excel workbooks are read with `calamine` (first sheet
//! only); `.csv` inputs go through the `csv` crate with `encoding_rs`
//! decoding so the two paths produce identical grids.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use encoding_rs::Encoding;

use crate::{error::ImportError, io_utils, variant::ImportConfig};

/// One spreadsheet cell. Empty text counts as blank everywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.is_empty(),
            Cell::Number(_) => false,
        }
    }
}

/// Rectangular grid parsed from the first sheet of the input file.
/// Reads outside the populated area yield `Cell::Empty`, so callers can
/// index by (row, column) without bounds bookkeeping.
#[derive(Debug, Clone)]
pub struct RawGrid {
    sheet_name: String,
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawGrid {
    pub fn new(sheet_name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        RawGrid {
            sheet_name: sheet_name.into(),
            rows,
            width,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.width
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&Cell::Empty)
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_none_or(|cells| cells.iter().all(Cell::is_blank))
    }
}

/// Parses the input file into a grid, enforcing the variant's
/// file-type whitelist first.
pub fn load(
    path: &Path,
    config: &ImportConfig,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawGrid> {
    let extension = io_utils::file_extension(path)
        .ok_or_else(|| ImportError::validation("Input file has no recognizable extension"))?;
    if !config.allows_extension(&extension) {
        return Err(ImportError::validation(format!(
            "Unsupported file type '.{extension}' for this import (expected: {})",
            config.extensions.join(", ")
        ))
        .into());
    }
    if extension == "csv" {
        load_csv(path, delimiter, encoding)
    } else {
        load_workbook(path)
    }
}

fn load_workbook(path: &Path) -> Result<RawGrid> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Opening spreadsheet {}", path.display()))?;
    let sheet_names = workbook.sheet_names();
    let first_sheet = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ImportError::validation("The workbook contains no sheets"))?;
    let range = workbook
        .worksheet_range(&first_sheet)
        .with_context(|| format!("Reading sheet '{first_sheet}'"))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Ok(RawGrid::new(first_sheet, rows))
}

fn load_csv(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<RawGrid> {
    let delimiter = io_utils::resolve_csv_delimiter(delimiter);
    let mut reader = io_utils::open_csv_reader(path, delimiter)?;

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Reading row {} of {}", rows.len() + 1, path.display()))?
    {
        let decoded = io_utils::decode_record(&record, encoding)?;
        rows.push(decoded.iter().map(|field| parse_csv_cell(field)).collect());
    }

    let sheet_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("datos")
        .to_string();
    Ok(RawGrid::new(sheet_name, rows))
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(number) => Cell::Number(*number),
        Data::Int(number) => Cell::Number(*number as f64),
        Data::DateTime(stamp) => Cell::Number(stamp.as_f64()),
        Data::Bool(flag) => Cell::Text(flag.to_string()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
        Data::Error(err) => Cell::Text(err.to_string()),
    }
}

// CSV fields are untyped text; numeric-looking fields are coerced so
// the formatter's unquoted-number rule matches the workbook path.
fn parse_csv_cell(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }
    let leading = field.as_bytes()[0];
    if leading.is_ascii_digit() || matches!(leading, b'-' | b'+' | b'.') {
        if let Ok(number) = field.parse::<f64>() {
            return Cell::Number(number);
        }
    }
    Cell::Text(field.to_string())
}
