//! Java source root discovery.
//!
//! Every directory is listed files-first. The first `.java` file in a
//! directory whose package agrees with its location reveals a source root;
//! the rest of that directory, subdirectories included, is then skipped.
//! Files that disagree with their location (generated or relocated code) are
//! ignored and the scan of the directory goes on.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::SourceConfig;
use crate::diagnostic::Diagnostic;
use crate::package::extract_package;
use crate::resolve::resolve_source_root;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceRootScan {
    pub root: PathBuf,
    pub source_roots: BTreeSet<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct SourceTreeWalker {
    config: SourceConfig,
}

impl SourceTreeWalker {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Walks `root` and returns every source root found beneath it.
    ///
    /// Never fails as a whole: unreadable entries, unparseable files and
    /// anomalous roots end up in `diagnostics`.
    pub fn find_java_source_directories(&self, root: &Path) -> SourceRootScan {
        let mut source_roots = BTreeSet::new();
        let mut diagnostics = Vec::new();

        let excluded = self.config.excluded_dirs.clone();
        let mut entries = WalkDir::new(root)
            .sort_by(files_first)
            .into_iter()
            .filter_entry(move |e| !is_excluded_dir(e, &excluded));

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    diagnostics.push(
                        Diagnostic::Unreadable {
                            path,
                            message: err.to_string(),
                        }
                        .emit(),
                    );
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_java_file(&entry) {
                continue;
            }

            match self.source_root_for(entry.path()) {
                Ok(Some(dir)) => {
                    if !dir.is_dir() {
                        diagnostics.push(
                            Diagnostic::NotADirectory {
                                file: entry.path().to_path_buf(),
                                root: dir,
                            }
                            .emit(),
                        );
                        continue;
                    }
                    source_roots.insert(dir);
                    entries.skip_current_dir();
                }
                Ok(None) => {}
                Err(diagnostic) => diagnostics.push(diagnostic.emit()),
            }
        }

        tracing::debug!(
            root = %root.display(),
            roots = source_roots.len(),
            diagnostics = diagnostics.len(),
            "source root discovery finished"
        );

        SourceRootScan {
            root: root.to_path_buf(),
            source_roots,
            diagnostics,
        }
    }

    fn source_root_for(&self, file: &Path) -> Result<Option<PathBuf>, Diagnostic> {
        let package = extract_package(file, self.config.max_source_len).map_err(|err| {
            Diagnostic::Extraction {
                file: file.to_path_buf(),
                message: err.to_string(),
            }
        })?;
        let dir = file.parent().unwrap_or(Path::new(""));
        Ok(resolve_source_root(dir, &package))
    }

    fn is_java_file(&self, entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(self.config.java_suffix.as_str()))
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    a_dir
        .cmp(&b_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_excluded_dir(entry: &DirEntry, excluded: &[String]) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excluded.iter().any(|e| e == name))
}
