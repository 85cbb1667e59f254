// issuelog - Testing issue log with spreadsheet import/export

pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod store;
pub mod xlsx;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock, export_file_name};
pub use config::Config;
pub use error::{FormatError, StoreError};
pub use filter::{Filter, FilterField, FilterOp};
pub use models::{Category, Issue, IssueRow, Metrics, Severity};
pub use session::Session;
pub use store::{IssuePatch, IssueStore};
