//! # Workbook Files
//!
//! Storage helpers for callers that keep workbooks on disk:
//! - **Atomic saves**: write `.cwb.tmp`, fsync, rename over the target
//! - **Advisory locks**: a `.cwb.lock` file plus an OS-level exclusive lock,
//!   so two people editing the same formula on a shared drive are serialized
//! - **Version checks**: refuse files written by a newer schema
//!
//! None of this is used by the calculators themselves.
//!
//! ## Example
//!
//! ```rust,no_run
//! use costing_core::file_io::{load_workbook, save_workbook, FileLock};
//! use std::path::Path;
//!
//! let path = Path::new("costing.cwb");
//! let lock = FileLock::acquire(path, "dana@example.com")?;
//! let workbook = load_workbook(path)?;
//! save_workbook(&workbook, path)?;
//! drop(lock);
//! # Ok::<(), costing_core::errors::CostingError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{CostingError, CostingResult};
use crate::workbook::{Workbook, SCHEMA_VERSION};

/// Locks older than this are taken over regardless of owner
const STALE_LOCK_HOURS: i64 = 24;

/// Contents of a `.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where the lock was acquired
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// The owning process has exited, or the lock has simply been held too long
    fn is_stale(&self) -> bool {
        if hostname().as_deref() == Some(self.machine.as_str()) && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    // Without a cheap liveness check only the age rule applies
    true
}

fn io_error(operation: &str, path: &Path) -> impl FnOnce(std::io::Error) -> CostingError {
    let operation = operation.to_string();
    let path = path.display().to_string();
    move |e| CostingError::file_error(operation, path, e.to_string())
}

fn serde_error(e: serde_json::Error) -> CostingError {
    CostingError::SerializationError { reason: e.to_string() }
}

/// Exclusive lock on a workbook file, released on drop.
pub struct FileLock {
    lock_path: PathBuf,
    /// Holds the OS-level lock for as long as the guard lives
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on `path` for `user_id`.
    ///
    /// A lock left behind by a dead process (or older than a day) is taken
    /// over.
    ///
    /// # Errors
    ///
    /// * `FileLocked` - someone else holds a live lock
    /// * `FileError` - the lock file could not be written
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CostingResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if let Some(existing) = FileLock::check(path) {
            return Err(CostingError::file_locked(
                path.display().to_string(),
                format!("{} ({})", existing.user_id, existing.machine),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            CostingError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(serde_error)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(io_error("write lock", &lock_path))?;
        lock_file.sync_all().map_err(io_error("sync lock", &lock_path))?;

        debug!(
            target: "costing.file_io",
            path = %path.display(),
            user = %info.user_id,
            "Workbook lock acquired"
        );

        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Who holds a live lock on `path`, if anyone.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path))
            .ok()
            .filter(|info| !info.is_stale())
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `costing.cwb` -> `costing.cwb.lock`
fn lock_path_for(workbook_path: &Path) -> PathBuf {
    let mut lock_path = workbook_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_to_string(path: &Path, operation: &str) -> CostingResult<String> {
    let mut file = File::open(path).map_err(io_error(operation, path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(io_error(operation, path))?;
    Ok(contents)
}

fn read_lock_info(lock_path: &Path) -> CostingResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    serde_json::from_str(&contents).map_err(serde_error)
}

/// Save a workbook atomically: temp file, fsync, rename.
pub fn save_workbook(workbook: &Workbook, path: &Path) -> CostingResult<()> {
    let json = serde_json::to_string_pretty(workbook).map_err(serde_error)?;
    let tmp_path = path.with_extension("cwb.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(io_error("write temp file", &tmp_path))?;
    tmp_file.sync_all().map_err(io_error("sync temp file", &tmp_path))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(CostingError::file_error(
            "rename to final",
            path.display().to_string(),
            e.to_string(),
        ));
    }

    info!(
        target: "costing.file_io",
        path = %path.display(),
        formulas = workbook.formulas.len(),
        estimates = workbook.estimates.len(),
        "Workbook saved"
    );
    Ok(())
}

/// Load a workbook and check its schema version.
///
/// # Errors
///
/// * `VersionMismatch` - file written by an incompatible schema
/// * `SerializationError` - invalid JSON
/// * `FileError` - I/O failure
pub fn load_workbook(path: &Path) -> CostingResult<Workbook> {
    let contents = read_to_string(path, "read")?;
    let workbook: Workbook =
        serde_json::from_str(&contents).map_err(|e| CostingError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;
    validate_version(&workbook.meta.version)?;
    Ok(workbook)
}

/// Load a workbook along with the lock held on it by someone else, if any.
pub fn load_workbook_with_lock_check(path: &Path) -> CostingResult<(Workbook, Option<LockInfo>)> {
    let workbook = load_workbook(path)?;
    Ok((workbook, FileLock::check(path)))
}

/// Major versions must match; within 0.x a newer minor is refused.
fn validate_version(file_version: &str) -> CostingResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || CostingError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (Some(&file_major), Some(&current_major)) = (file_parts.first(), current_parts.first())
    else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    use crate::costing::formula::Formula;

    fn temp_workbook_path(name: &str) -> PathBuf {
        temp_dir().join(format!("costing_test_{}_{}.cwb", name, std::process::id()))
    }

    #[test]
    fn test_lock_path_generation() {
        let lock_path = lock_path_for(Path::new("/data/costing.cwb"));
        assert_eq!(lock_path, Path::new("/data/costing.cwb.lock"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_workbook_path("roundtrip");

        let mut workbook = Workbook::new("Dana", "Acme");
        let id = workbook.add_formula(Formula::new("Lip balm"));
        save_workbook(&workbook, &path).unwrap();

        let loaded = load_workbook(&path).unwrap();
        assert_eq!(loaded.meta.company, "Acme");
        assert_eq!(loaded.get_formula(&id).unwrap().name, "Lip balm");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let path = temp_workbook_path("atomic");
        save_workbook(&Workbook::default(), &path).unwrap();
        assert!(!path.with_extension("cwb.tmp").exists());
        assert!(path.exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_workbook_path("lock");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "dana@example.com").unwrap();
        assert_eq!(lock.info.user_id, "dana@example.com");
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("someone");
        info.machine = "elsewhere".to_string();
        assert!(!info.is_stale());
        info.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(info.is_stale());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_workbook(Path::new("/nonexistent/dir/none.cwb")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_workbook_path("lock_check");
        save_workbook(&Workbook::new("Dana", "Acme"), &path).unwrap();

        let (loaded, lock_info) = load_workbook_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.owner, "Dana");
        assert!(lock_info.is_none());

        let _ = fs::remove_file(&path);
    }
}
