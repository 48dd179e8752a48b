//! Per-repository dependency archive cache.
//!
//! An `ArchiveCache` hands out one `ArchiveContainer` per repository root.
//! A container runs the archive scan the first time it is read and serves
//! copies of that snapshot afterwards. Nothing watches the filesystem: callers
//! that know new build output exists call `replace` or `invalidate`.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::diagnostic::Diagnostic;
use crate::scan::{ArchiveFinder, ArchiveScan};

#[derive(Debug)]
pub struct ArchiveContainer {
    repo_root: PathBuf,
    finder: ArchiveFinder,
    entries: Mutex<Option<ArchiveScan>>,
}

impl ArchiveContainer {
    pub fn new(repo_root: PathBuf, finder: ArchiveFinder) -> Self {
        Self {
            repo_root,
            finder,
            entries: Mutex::new(None),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Returns a copy of the cached archive set, scanning on first use.
    pub fn archives(&self) -> BTreeSet<PathBuf> {
        self.with_scan(|scan| scan.archives.clone())
    }

    /// Entries the last scan could not read. Empty after `replace`.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.with_scan(|scan| scan.diagnostics.clone())
    }

    fn with_scan<T>(&self, read: impl FnOnce(&ArchiveScan) -> T) -> T {
        let mut entries = self.lock();
        read(entries.get_or_insert_with(|| self.finder.find_dependency_archives(&self.repo_root)))
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Overwrites the snapshot seen by all subsequent readers.
    pub fn replace(&self, archives: BTreeSet<PathBuf>) {
        *self.lock() = Some(ArchiveScan {
            archives,
            diagnostics: Vec::new(),
        });
    }

    /// Drops the snapshot so the next read scans again.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    pub fn description(&self) -> String {
        let name = self
            .repo_root
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.repo_root.to_string_lossy().to_string());
        format!("{name} - java dependencies")
    }

    fn lock(&self) -> MutexGuard<'_, Option<ArchiveScan>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct ArchiveCache {
    finder: ArchiveFinder,
    containers: Mutex<HashMap<PathBuf, Arc<ArchiveContainer>>>,
}

impl ArchiveCache {
    pub fn new(finder: ArchiveFinder) -> Self {
        Self {
            finder,
            containers: Mutex::new(HashMap::new()),
        }
    }

    pub fn container(&self, repo_root: &Path) -> Arc<ArchiveContainer> {
        let mut containers = self
            .containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let container = containers
            .entry(repo_root.to_path_buf())
            .or_insert_with(|| {
                Arc::new(ArchiveContainer::new(
                    repo_root.to_path_buf(),
                    self.finder.clone(),
                ))
            });
        Arc::clone(container)
    }

    pub fn archives(&self, repo_root: &Path) -> BTreeSet<PathBuf> {
        self.container(repo_root).archives()
    }

    pub fn replace(&self, repo_root: &Path, archives: BTreeSet<PathBuf>) {
        self.container(repo_root).replace(archives);
    }

    pub fn invalidate(&self, repo_root: &Path) {
        self.container(repo_root).invalidate();
    }
}
