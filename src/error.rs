// Typed errors surfaced through eyre

use thiserror::Error;

/// Problems with an imported workbook; the store is never touched when one is returned
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Invalid file format: missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Invalid file format: workbook has no worksheets")]
    NoWorksheet,

    #[error("Invalid file format: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("Invalid file format: row {row}, column {column:?}: {reason}")]
    InvalidValue { row: usize, column: String, reason: String },
}

/// Rejected store operations; the store is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Issue description cannot be empty")]
    EmptyDescription,

    #[error("Row {row} out of range (log has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Edited table has {got} rows, expected {expected}")]
    RowCountMismatch { expected: usize, got: usize },
}
