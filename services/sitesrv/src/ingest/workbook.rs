//! Workbook decoding for site uploads
//!
//! Decodes an uploaded .xlsx or .csv byte buffer into a rectangular cell
//! table. Sheets follow the distribution template layout: row 1 carries a
//! decorative banner, row 2 carries the column headers, data starts at row 3.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use csv::ReaderBuilder;

use crate::error::{Result, SiteSrvError};

/// 1-based sheet row number of the first data row. Row-level validation
/// messages count from here.
pub const FIRST_DATA_SHEET_ROW: usize = 3;

/// Zero-based index of the header row within the decoded grid.
const HEADER_ROW_INDEX: usize = 1;

/// Upload file format, chosen from the uploaded filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    Csv,
}

impl FileFormat {
    /// Detect the format from a filename. Matching is case-insensitive;
    /// unknown extensions return `None`.
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".xlsx") {
            Some(FileFormat::Xlsx)
        } else if lower.ends_with(".csv") {
            Some(FileFormat::Csv)
        } else {
            None
        }
    }
}

/// A single cell lifted out of the spreadsheet or CSV decoder.
///
/// This is the only untyped surface in the pipeline; normalization turns it
/// into the typed record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Spreadsheet date serial (days since the 1899-12-30 epoch)
    DateTime(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    /// Whether the cell carries no usable value. Whitespace-only text counts
    /// as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Rectangular sheet contents with the header row resolved to column indices.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    /// Data rows in sheet order (banner and header rows excluded).
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the header row carried the given canonical column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Look up a cell in `row` by canonical column name.
    pub fn cell<'r>(&self, row: &'r [Cell], name: &str) -> Option<&'r Cell> {
        self.columns.get(name).and_then(|&idx| row.get(idx))
    }
}

/// Decode an uploaded byte buffer into a sheet table.
pub fn parse_workbook(bytes: &[u8], format: FileFormat) -> Result<SheetTable> {
    match format {
        FileFormat::Xlsx => parse_xlsx(bytes),
        FileFormat::Csv => parse_csv(bytes),
    }
}

fn parse_xlsx(bytes: &[u8]) -> Result<SheetTable> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .ok_or_else(|| SiteSrvError::parse("Workbook has no sheets"))?
        .clone();

    let range = workbook.worksheet_range(&sheet_name)?;
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    build_table(grid)
}

fn parse_csv(bytes: &[u8]) -> Result<SheetTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    // CSV fields stay text so numeric-looking codes keep
                    // their leading zeros.
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        grid.push(cells);
    }

    build_table(grid)
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn build_table(grid: Vec<Vec<Cell>>) -> Result<SheetTable> {
    // Blank rows are dropped before indexing, matching the numbering the
    // operator sees in validation messages.
    let mut rows: Vec<Vec<Cell>> = grid
        .into_iter()
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();

    if rows.len() <= HEADER_ROW_INDEX {
        return Err(SiteSrvError::parse("Sheet is missing the header row"));
    }

    let columns = parse_header(&rows[HEADER_ROW_INDEX]);
    if columns.is_empty() {
        return Err(SiteSrvError::parse("Header row has no readable column names"));
    }

    let data_rows = rows.split_off(HEADER_ROW_INDEX + 1);
    Ok(SheetTable {
        columns,
        rows: data_rows,
    })
}

fn parse_header(header: &[Cell]) -> HashMap<String, usize> {
    let mut columns = HashMap::new();
    for (idx, cell) in header.iter().enumerate() {
        let name = match cell {
            Cell::Text(s) => canonical_header(s),
            _ => continue,
        };
        if name.is_empty() {
            continue;
        }
        // First occurrence wins for duplicated headers.
        columns.entry(name).or_insert(idx);
    }
    columns
}

/// Map template header spellings onto storage column names. The sheet
/// abbreviates the coordinate columns as `lat` / `long`.
fn canonical_header(raw: &str) -> String {
    match raw.trim() {
        "lat" => "latitude".to_string(),
        "long" => "longitude".to_string(),
        other => other.to_string(),
    }
}
