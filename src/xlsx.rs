// Spreadsheet (.xlsx) codec for the issue log

use crate::error::FormatError;
use crate::models::{Category, Issue, Severity, parse_status_label};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::Cursor;
use tracing::{debug, warn};

pub const COL_STATUS: &str = "Status";
pub const COL_TIME_FOUND: &str = "Time Found";
pub const COL_DESCRIPTION: &str = "Issue Description";
pub const COL_CATEGORY: &str = "Category";
pub const COL_SEVERITY: &str = "Severity";
pub const COL_TIME_RESOLVED: &str = "Time Resolved";

/// Required columns, in export order
pub const COLUMNS: [&str; 6] = [
    COL_STATUS,
    COL_TIME_FOUND,
    COL_DESCRIPTION,
    COL_CATEGORY,
    COL_SEVERITY,
    COL_TIME_RESOLVED,
];

/// Layout used when rendering timestamps stored as Excel date cells
const DATE_CELL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Sheet settings applied on export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub sheet_name: String,
    pub column_width: f64,
}

impl Default for ExportLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Logs".to_string(),
            column_width: 20.0,
        }
    }
}

/// One data row of a decoded sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// 1-based spreadsheet row number, for error messages
    pub number: usize,
    pub cells: Vec<String>,
}

/// A decoded worksheet: header names plus string-coerced data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Build a table whose data starts on spreadsheet row 2
    pub fn from_rows<H, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<String>>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, cells)| TableRow { number: i + 2, cells })
                .collect(),
        }
    }

    /// Position of a header, compared after trimming
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }
}

/// Decode the first worksheet of an .xlsx workbook
///
/// The first row is taken as the header. Fully blank data rows are dropped.
pub fn read_table(bytes: &[u8]) -> Result<Table, FormatError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or(FormatError::NoWorksheet)??;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(cells) => cells.iter().map(|c| cell_to_string(c).trim().to_string()).collect(),
        None => Vec::new(),
    };

    let mut table = Table {
        headers,
        rows: Vec::new(),
    };

    for (offset, cells) in rows.enumerate() {
        // +1 for the header, +1 for 1-based numbering
        let number = first_row + offset + 2;
        let cells: Vec<String> = cells.iter().map(cell_to_string).collect();

        if cells.iter().all(|c| c.trim().is_empty()) {
            warn!(row = number, "Skipping blank row");
            continue;
        }

        table.rows.push(TableRow { number, cells });
    }

    debug!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "Decoded worksheet"
    );

    Ok(table)
}

/// Coerce a cell to the text shown in the log
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format(DATE_CELL_FORMAT).to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        other => other.to_string(),
    }
}

struct ColumnMap {
    status: usize,
    time_found: usize,
    description: usize,
    category: usize,
    severity: usize,
    time_resolved: usize,
}

impl ColumnMap {
    fn locate(table: &Table) -> Result<Self, FormatError> {
        let missing = table.missing_columns(&COLUMNS);
        if !missing.is_empty() {
            return Err(FormatError::MissingColumns { missing });
        }

        let index = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(Self {
            status: index(COL_STATUS),
            time_found: index(COL_TIME_FOUND),
            description: index(COL_DESCRIPTION),
            category: index(COL_CATEGORY),
            severity: index(COL_SEVERITY),
            time_resolved: index(COL_TIME_RESOLVED),
        })
    }
}

/// Convert a decoded table into issues
///
/// `now` stamps closed rows that arrive without a resolved time. Open rows
/// have any resolved time cleared.
pub fn parse_issues(table: &Table, now: &str) -> Result<Vec<Issue>, FormatError> {
    let columns = ColumnMap::locate(table)?;
    let mut issues = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |idx: usize| row.cells.get(idx).map(String::as_str).unwrap_or("");

        let description = cell(columns.description).to_string();
        if description.trim().is_empty() {
            return Err(FormatError::InvalidValue {
                row: row.number,
                column: COL_DESCRIPTION.to_string(),
                reason: "description is empty".to_string(),
            });
        }

        let category_text = cell(columns.category);
        let category = category_text.parse::<Category>().unwrap_or_else(|_| {
            warn!(row = row.number, value = category_text, "Unknown category, using Other");
            Category::Other
        });

        let severity_text = cell(columns.severity);
        let severity = severity_text
            .parse::<Severity>()
            .map_err(|e| FormatError::InvalidValue {
                row: row.number,
                column: COL_SEVERITY.to_string(),
                reason: e.to_string(),
            })?;

        let status = parse_status_label(cell(columns.status));
        let time_resolved = match (status, cell(columns.time_resolved).trim()) {
            (false, _) => String::new(),
            (true, "") => now.to_string(),
            (true, stamp) => stamp.to_string(),
        };

        issues.push(Issue {
            status,
            time_found: cell(columns.time_found).trim().to_string(),
            description,
            category,
            severity,
            time_resolved,
        });
    }

    Ok(issues)
}

/// Render issues as a single-sheet workbook
pub fn write_issues(issues: &[Issue], layout: &ExportLayout) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(&layout.sheet_name)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *name, &header)?;
        sheet.set_column_width(col, layout.column_width)?;
    }

    for (i, issue) in issues.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, issue.status_label())?;
        sheet.write_string(row, 1, &issue.time_found)?;
        sheet.write_string(row, 2, &issue.description)?;
        sheet.write_string(row, 3, issue.category.as_str())?;
        sheet.write_string(row, 4, issue.severity.as_str())?;
        sheet.write_string(row, 5, &issue.time_resolved)?;
    }

    debug!(rows = issues.len(), sheet = %layout.sheet_name, "Rendered workbook");

    workbook.save_to_buffer()
}
