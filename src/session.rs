// One user action against a working workbook

use crate::clock::export_file_name;
use crate::config::Config;
use crate::store::IssueStore;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Owns the issue store for the length of one action
///
/// Opening a session takes an exclusive lock on `<working file>.lock`, so a
/// second session on the same file fails instead of overwriting the first.
/// The lock is released on drop. The `.lock` file itself stays on disk: it
/// is empty, reused by the next session, and never removed, since unlinking
/// a locked file would let two sessions lock different inodes.
pub struct Session {
    path: PathBuf,
    store: IssueStore,
    _lock: File,
}

impl Session {
    /// Lock the working file and load it if it exists
    pub fn open<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = Self::acquire_lock(&path)?;

        let mut store = IssueStore::from_config(config)?;
        if path.exists() {
            let bytes = fs::read(&path).with_context(|| format!("Failed to read working log {}", path.display()))?;
            let count = store
                .import_xlsx(&bytes)
                .with_context(|| format!("Failed to load working log {}", path.display()))?;
            info!(path = ?path, count, "Loaded working log");
        } else {
            debug!(path = ?path, "Working log does not exist yet, starting empty");
        }

        Ok(Self {
            path,
            store,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut IssueStore {
        &mut self.store
    }

    /// Write the store back to the working file
    pub fn commit(&self) -> Result<()> {
        let bytes = self.store.export()?;

        // Write beside the target, then rename over it
        let tmp = sibling_with_suffix(&self.path, ".tmp");
        fs::write(&tmp, &bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("Failed to replace {}", self.path.display()))?;

        info!(path = ?self.path, rows = self.store.len(), "Committed working log");
        Ok(())
    }

    /// Write a timestamped `UAT_Log_<stamp>.xlsx` into `dir`
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create export directory {}", dir.display()))?;

        let path = dir.join(export_file_name(&self.store.now()));
        let bytes = self.store.export()?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write export {}", path.display()))?;

        info!(path = ?path, rows = self.store.len(), "Exported issue log");
        Ok(path)
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let lock_path = sibling_with_suffix(path, ".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        file.try_lock_exclusive()
            .map_err(|_| eyre!("Working log {} is in use by another session", path.display()))?;

        Ok(file)
    }
}

/// `dir/name.xlsx` -> `dir/name.xlsx<suffix>`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::models::{Category, Severity};
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let session = Session::open(temp.path().join("log.xlsx"), &Config::default()).unwrap();

        assert!(session.store().is_empty());
        assert!(!session.path().exists());
        assert!(temp.path().join("log.xlsx.lock").exists());
    }

    #[test]
    fn test_commit_then_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/log.xlsx");

        {
            let mut session = Session::open(&path, &Config::default()).unwrap();
            session
                .store_mut()
                .create("Upload stalls at 99%", Category::Performance, Severity::High)
                .unwrap();
            session.store_mut().set_status(&[1], true).unwrap();
            session.commit().unwrap();
        }

        assert!(path.exists());
        assert!(!temp.path().join("nested/log.xlsx.tmp").exists());

        let session = Session::open(&path, &Config::default()).unwrap();
        let issue = session.store().get(1).unwrap();
        assert_eq!(issue.description, "Upload stalls at 99%");
        assert!(issue.status);
        assert!(!issue.time_resolved.is_empty());
    }

    #[test]
    fn test_second_session_is_refused() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.xlsx");

        let _first = Session::open(&path, &Config::default()).unwrap();
        let err = Session::open(&path, &Config::default()).err().unwrap();
        assert!(err.to_string().contains("in use"));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.xlsx");

        drop(Session::open(&path, &Config::default()).unwrap());
        assert!(temp.path().join("log.xlsx.lock").exists());
        assert!(Session::open(&path, &Config::default()).is_ok());
    }

    #[test]
    fn test_export_with_slashed_timestamp_format() {
        let temp = TempDir::new().unwrap();
        let config = Config::from_yaml("timestamp_format: \"%d/%m/%Y %H:%M\"\n").unwrap();
        let mut session = Session::open(temp.path().join("log.xlsx"), &config).unwrap();
        session
            .store_mut()
            .create("Date picker shows wrong month", Category::FunctionalBug, Severity::Medium)
            .unwrap();

        let out = temp.path().join("out");
        let exported = session.export_to(&out).unwrap();
        assert_eq!(exported.parent(), Some(out.as_path()));
        assert!(exported.exists());

        let name = exported.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains('/'));
        assert!(name.starts_with("UAT_Log_"));
    }

    #[test]
    fn test_corrupt_working_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.xlsx");
        fs::write(&path, b"not a workbook").unwrap();

        let err = Session::open(&path, &Config::default()).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to load working log"));
        assert!(err.downcast_ref::<FormatError>().is_some());
    }

    #[test]
    fn test_export_to_uses_timestamped_name() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(temp.path().join("log.xlsx"), &Config::default()).unwrap();
        session
            .store_mut()
            .create("Tooltip clipped", Category::UiUxDefect, Severity::Low)
            .unwrap();

        let exported = session.export_to(&temp.path().join("exports")).unwrap();
        let name = exported.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("UAT_Log_"));
        assert!(name.ends_with(".xlsx"));
        assert!(!name.contains(':'));
        assert!(!name.contains(' '));
        assert!(exported.exists());
    }
}
