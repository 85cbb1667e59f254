// Wall-clock timestamps for found/resolved times

use chrono::{FixedOffset, Offset, Utc};
use eyre::{Result, eyre};

/// Default stamp layout, e.g. "2025-01-06 09:15"
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Source of "now" stamps for the store
pub trait Clock {
    fn now(&self) -> String;
}

/// Reads the system clock in a fixed UTC offset
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
    format: String,
}

impl SystemClock {
    pub fn new(offset: FixedOffset, format: impl Into<String>) -> Self {
        Self {
            offset,
            format: format.into(),
        }
    }

    /// Build from a whole-hour offset such as `7` for WIB
    pub fn from_offset_hours(hours: i32, format: impl Into<String>) -> Result<Self> {
        let offset = offset_from_hours(hours)?;
        Ok(Self::new(offset, format))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        // UTC+07:00 is always in range
        let offset = FixedOffset::east_opt(7 * 3600).unwrap_or_else(|| Utc.fix());
        Self::new(offset, DEFAULT_TIMESTAMP_FORMAT)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> String {
        Utc::now().with_timezone(&self.offset).format(&self.format).to_string()
    }
}

/// Always returns the same stamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock(pub String);

impl FixedClock {
    pub fn new(stamp: impl Into<String>) -> Self {
        Self(stamp.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.clone()
    }
}

pub fn offset_from_hours(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| eyre!("Invalid UTC offset: {} hours (must be within -23..=23)", hours))
}

/// Export filename for a stamp: `UAT_Log_<stamp>.xlsx`
///
/// Spaces become '_'; anything else outside `[A-Za-z0-9_-]` becomes '-', so
/// layouts like `%d/%m/%Y` never produce path separators.
pub fn export_file_name(stamp: &str) -> String {
    let stamp: String = stamp
        .chars()
        .map(|c| match c {
            ' ' => '_',
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => c,
            _ => '-',
        })
        .collect();
    format!("UAT_Log_{}.xlsx", stamp)
}
