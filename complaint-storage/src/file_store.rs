//! One-file-per-record JSON store.
//!
//! Records live at `<base_dir>/<id>.json`. Writes go to a hidden temp file in
//! the same directory and are renamed over the final path, so a reader sees
//! either the previous file or the complete new one. Single-record lookup is
//! a direct path read; only bulk queries walk the directory.
//!
//! # Legacy names
//!
//! Older deployments named files by timestamp. With `legacy_fallback`
//! enabled, a lookup miss on `<id>.json` scans those files, bulk queries
//! include them (the canonical file wins when both exist), and
//! [`FileStore::migrate_legacy`] rewrites them under canonical names.

use crate::{ComplaintRepository, LoadReport};
use complaint_core::{
    CallContext, Complaint, ComplaintFilter, ComplaintId, ComplaintResult, Page, StorageError,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";
const TEMP_PREFIX: &str = ".complaint-";
const TEMP_SUFFIX: &str = ".tmp";

/// Durable complaint store backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
    legacy_fallback: bool,
}

/// Which naming scheme a record file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Canonical(ComplaintId),
    Legacy,
}

impl FileStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed.
    ///
    /// On unix the directory is created with mode `0o750`. Temp files left
    /// behind by an interrupted write are removed.
    pub fn open(base_dir: impl Into<PathBuf>) -> ComplaintResult<Self> {
        let base_dir = base_dir.into();
        create_dir(&base_dir).map_err(|e| StorageError::io(&base_dir, &e))?;
        let store = Self {
            base_dir,
            legacy_fallback: false,
        };
        let swept = store.remove_stale_temp_files()?;
        tracing::debug!(base_dir = %store.base_dir.display(), swept, "opened complaint file store");
        Ok(store)
    }

    /// Enable or disable reading timestamp-named legacy files.
    pub fn with_legacy_fallback(mut self, enabled: bool) -> Self {
        self.legacy_fallback = enabled;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn legacy_fallback(&self) -> bool {
        self.legacy_fallback
    }

    /// Canonical path of the record with `id`.
    pub fn path_for(&self, id: ComplaintId) -> PathBuf {
        self.base_dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// Rewrite every legacy-named file as `<id>.json` and remove the original.
    ///
    /// When a canonical file already exists for the same id it wins and the
    /// legacy copy is only removed. Corrupted legacy files are left in place.
    /// Returns the number of legacy files removed.
    pub fn migrate_legacy(&self, ctx: &CallContext) -> ComplaintResult<usize> {
        let mut migrated = 0;
        for (path, kind) in self.record_files()? {
            if kind != FileKind::Legacy {
                continue;
            }
            ctx.check("migrate_legacy")?;
            let complaint = match read_record(&path) {
                Ok(Some(complaint)) => complaint,
                Ok(None) => continue,
                Err(StorageError::Corrupted { reason, .. }) => {
                    tracing::warn!(path = %path.display(), reason = %reason, "leaving corrupted legacy file in place");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let target = self.path_for(complaint.id());
            if !target.exists() {
                self.write_record(&complaint)?;
            }
            remove_if_exists(&path)?;
            tracing::info!(from = %path.display(), to = %target.display(), "migrated legacy complaint file");
            migrated += 1;
        }
        Ok(migrated)
    }

    // === File plumbing ===

    fn write_record(&self, complaint: &Complaint) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(complaint).map_err(|e| StorageError::Serialization {
            reason: e.to_string(),
        })?;
        let path = self.path_for(complaint.id());

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.base_dir)
            .map_err(|e| StorageError::io(&self.base_dir, &e))?;
        temp.write_all(&bytes)
            .map_err(|e| StorageError::io(temp.path(), &e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(temp.path(), &e))?;
        // On failure the temp file is dropped and removed; the old record stays.
        temp.persist(&path)
            .map_err(|e| StorageError::io(&path, &e.error))?;
        sync_dir(&self.base_dir).map_err(|e| StorageError::io(&self.base_dir, &e))?;

        tracing::trace!(id = %complaint.id(), "wrote complaint file");
        Ok(())
    }

    /// Remove `.complaint-*.tmp` files an interrupted write left behind.
    fn remove_stale_temp_files(&self) -> Result<usize, StorageError> {
        let entries = fs::read_dir(&self.base_dir).map_err(|e| StorageError::io(&self.base_dir, &e))?;
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.base_dir, &e))?;
            let path = entry.path();
            if !is_temp_file(&path) {
                continue;
            }
            if remove_if_exists(&path)? {
                tracing::warn!(path = %path.display(), "removed stale temp file");
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Every `*.json` file in the base directory, classified by name.
    ///
    /// Hidden files (including in-flight temp files) are skipped. Legacy files
    /// are listed only when the fallback is enabled.
    fn record_files(&self) -> Result<Vec<(PathBuf, FileKind)>, StorageError> {
        let entries = fs::read_dir(&self.base_dir).map_err(|e| StorageError::io(&self.base_dir, &e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.base_dir, &e))?;
            let path = entry.path();
            let Some(kind) = classify(&path) else {
                continue;
            };
            if kind == FileKind::Legacy && !self.legacy_fallback {
                continue;
            }
            files.push((path, kind));
        }
        Ok(files)
    }

    /// Read a canonical file, checking the record id matches the file name.
    fn read_canonical(&self, path: &Path, id: ComplaintId) -> Result<Option<Complaint>, StorageError> {
        match read_record(path)? {
            Some(complaint) if complaint.id() != id => Err(StorageError::Corrupted {
                path: path.to_path_buf(),
                reason: format!("file holds record {}", complaint.id()),
            }),
            other => Ok(other),
        }
    }

    fn find_legacy(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<Option<Complaint>> {
        for (path, kind) in self.record_files()? {
            if kind != FileKind::Legacy {
                continue;
            }
            ctx.check("find_by_id")?;
            match read_record(&path) {
                Ok(Some(complaint)) if complaint.id() == id => return Ok(Some(complaint)),
                Ok(_) => {}
                Err(StorageError::Corrupted { reason, .. }) => {
                    tracing::warn!(path = %path.display(), reason = %reason, "skipping corrupted legacy file");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// Read every record, de-duplicated by id in favour of canonical files.
    ///
    /// Corrupted files are logged and counted, never fatal.
    fn scan(&self, ctx: &CallContext) -> ComplaintResult<(Vec<Complaint>, usize)> {
        let mut found: HashMap<ComplaintId, (FileKind, Complaint)> = HashMap::new();
        let mut skipped = 0;
        for (path, kind) in self.record_files()? {
            ctx.check("scan")?;
            let record = match kind {
                FileKind::Canonical(id) => self.read_canonical(&path, id),
                FileKind::Legacy => read_record(&path),
            };
            let complaint = match record {
                Ok(Some(complaint)) => complaint,
                // Deleted between listing and reading.
                Ok(None) => continue,
                Err(StorageError::Corrupted { reason, .. }) => {
                    tracing::warn!(path = %path.display(), reason = %reason, "skipping corrupted complaint file");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match found.entry(complaint.id()) {
                Entry::Vacant(slot) => {
                    slot.insert((kind, complaint));
                }
                Entry::Occupied(mut slot) => {
                    if matches!(kind, FileKind::Canonical(_)) {
                        slot.insert((kind, complaint));
                    }
                }
            }
        }
        let records = found.into_values().map(|(_, complaint)| complaint).collect();
        Ok((records, skipped))
    }
}

impl ComplaintRepository for FileStore {
    fn save(&self, ctx: &CallContext, complaint: &Complaint) -> ComplaintResult<()> {
        ctx.check("save")?;
        complaint.validate()?;
        self.write_record(complaint)?;
        Ok(())
    }

    fn find_by_id(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<Option<Complaint>> {
        ctx.check("find_by_id")?;
        match self.read_canonical(&self.path_for(id), id)? {
            Some(complaint) => Ok(Some(complaint)),
            None if self.legacy_fallback => self.find_legacy(ctx, id),
            None => Ok(None),
        }
    }

    fn delete(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<bool> {
        ctx.check("delete")?;
        let mut existed = remove_if_exists(&self.path_for(id))?;
        if self.legacy_fallback {
            for (path, kind) in self.record_files()? {
                if kind != FileKind::Legacy {
                    continue;
                }
                ctx.check("delete")?;
                match read_record(&path) {
                    Ok(Some(complaint)) if complaint.id() == id => {
                        existed |= remove_if_exists(&path)?;
                    }
                    Ok(_) => {}
                    Err(StorageError::Corrupted { reason, .. }) => {
                        tracing::warn!(path = %path.display(), reason = %reason, "skipping corrupted legacy file");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(existed)
    }

    fn query(
        &self,
        ctx: &CallContext,
        filter: &ComplaintFilter,
        page: Page,
    ) -> ComplaintResult<Vec<Complaint>> {
        if page.limit == 0 {
            return Ok(Vec::new());
        }
        let (records, _) = self.scan(ctx)?;
        let matching = records
            .into_iter()
            .filter(|complaint| filter.matches(complaint))
            .collect();
        Ok(page.apply(matching))
    }

    fn load_newest(&self, ctx: &CallContext, limit: usize) -> ComplaintResult<LoadReport> {
        let (records, skipped) = self.scan(ctx)?;
        Ok(LoadReport {
            records: Page::first(limit).apply(records),
            skipped,
        })
    }
}

fn classify(path: &Path) -> Option<FileKind> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    if path.extension()?.to_str()? != RECORD_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    Some(match ComplaintId::parse(stem) {
        Ok(id) if id.to_string() == stem => FileKind::Canonical(id),
        _ => FileKind::Legacy,
    })
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX))
}

/// Read and decode one record. A missing file is `Ok(None)`.
fn read_record(path: &Path) -> Result<Option<Complaint>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, &e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StorageError::Corrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn remove_if_exists(path: &Path) -> Result<bool, StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StorageError::io(path, &e)),
    }
}

/// Flush the directory entry so a completed rename survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o750).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

// ============================================================================
// TESTS
// ============================================================================
