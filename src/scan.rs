use ignore::{DirEntry, WalkBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use crate::config::ArchiveConfig;
use crate::diagnostic::Diagnostic;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveScan {
    pub archives: BTreeSet<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Locates compiled `classes.jar` archives below a repository's library
/// output directory.
#[derive(Debug, Clone)]
pub struct ArchiveFinder {
    config: Arc<ArchiveConfig>,
}

impl ArchiveFinder {
    pub fn new(config: ArchiveConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn libraries_dir(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.config.libraries_dir)
    }

    /// Archives of every non-excluded library built in `repo_root`.
    pub fn find_dependency_archives(&self, repo_root: &Path) -> ArchiveScan {
        self.find_java_libs(&self.libraries_dir(repo_root))
    }

    /// Recursive search below `base`. A missing `base` yields an empty set;
    /// entries that cannot be read are reported in `diagnostics`.
    pub fn find_java_libs(&self, base: &Path) -> ArchiveScan {
        if !base.is_dir() {
            tracing::debug!(base = %base.display(), "no library output directory");
            return ArchiveScan::default();
        }

        let (tx, rx) = mpsc::channel::<Result<PathBuf, ignore::Error>>();
        let filter_config = Arc::clone(&self.config);

        let walker = WalkBuilder::new(base)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .filter_entry(move |entry| !is_filtered(&filter_config, entry))
            .build_parallel();

        let archive_name = self.config.archive_name.clone();
        walker.run(|| {
            let tx = tx.clone();
            let archive_name = archive_name.clone();
            Box::new(move |entry| {
                match entry {
                    Ok(entry) => {
                        let is_file = entry.file_type().is_some_and(|t| t.is_file());
                        if is_file && entry.file_name() == archive_name.as_str() {
                            let _ = tx.send(Ok(entry.into_path()));
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err));
                    }
                }
                ignore::WalkState::Continue
            })
        });

        drop(tx);
        let mut scan = ArchiveScan::default();
        for found in rx {
            match found {
                Ok(path) => {
                    scan.archives.insert(path);
                }
                Err(err) => scan.diagnostics.push(
                    Diagnostic::Unreadable {
                        path: error_path(&err).unwrap_or(base).to_path_buf(),
                        message: err.to_string(),
                    }
                    .emit(),
                ),
            }
        }
        tracing::debug!(
            base = %base.display(),
            archives = scan.archives.len(),
            diagnostics = scan.diagnostics.len(),
            "dependency archive scan finished"
        );
        scan
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

fn is_filtered(config: &ArchiveConfig, entry: &DirEntry) -> bool {
    if !entry.file_type().is_some_and(|t| t.is_dir()) {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name == config.instrumentation_dir
        || config
            .excluded_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"PK").unwrap();
    }

    #[test]
    fn excludes_sdk_support_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("out/target/common/obj/JAVA_LIBRARIES");
        touch(&libs.join("android-support-v4_intermediates/classes.jar"));
        touch(&libs.join("mylib_intermediates/classes.jar"));

        let finder = ArchiveFinder::new(ArchiveConfig::default());
        let found = finder.find_dependency_archives(dir.path()).archives;
        assert_eq!(
            found,
            BTreeSet::from([libs.join("mylib_intermediates/classes.jar")])
        );
    }

    #[test]
    fn prefix_filters_cover_families() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("out/target/common/obj/JAVA_LIBRARIES");
        touch(&libs.join("sdk_v14_intermediates/classes.jar"));
        touch(&libs.join("sdk_v8_intermediates/classes.jar"));
        touch(&libs.join("android_stubs_current_intermediates/classes.jar"));
        touch(&libs.join("framework_intermediates/classes.jar"));
        // Prefix match is case-sensitive.
        touch(&libs.join("SDK_V1_intermediates/classes.jar"));

        let finder = ArchiveFinder::new(ArchiveConfig::default());
        let found = finder.find_dependency_archives(dir.path()).archives;
        assert_eq!(
            found,
            BTreeSet::from([
                libs.join("SDK_V1_intermediates/classes.jar"),
                libs.join("framework_intermediates/classes.jar"),
            ])
        );
    }

    #[test]
    fn instrumentation_output_and_other_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let libs = dir.path().join("out/target/common/obj/JAVA_LIBRARIES");
        touch(&libs.join("core_intermediates/emma_out/lib/classes.jar"));
        touch(&libs.join("core_intermediates/classes.jar"));
        touch(&libs.join("core_intermediates/javalib.jar"));
        touch(&libs.join("core_intermediates/classes-full-debug.jar"));

        let finder = ArchiveFinder::new(ArchiveConfig::default());
        let found = finder.find_dependency_archives(dir.path()).archives;
        assert_eq!(
            found,
            BTreeSet::from([libs.join("core_intermediates/classes.jar")])
        );
    }

    #[test]
    fn missing_output_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let finder = ArchiveFinder::new(ArchiveConfig::default());
        let scan = finder.find_dependency_archives(dir.path());
        assert!(scan.archives.is_empty());
        assert!(scan.diagnostics.is_empty());
    }

    #[test]
    fn walk_errors_keep_the_offending_path() {
        let denied = PathBuf::from("/aosp/out/locked");
        let err = ignore::Error::WithDepth {
            depth: 2,
            err: Box::new(ignore::Error::WithPath {
                path: denied.clone(),
                err: Box::new(ignore::Error::Io(std::io::Error::from(
                    std::io::ErrorKind::PermissionDenied,
                ))),
            }),
        };
        assert_eq!(error_path(&err), Some(denied.as_path()));

        let bare = ignore::Error::Io(std::io::Error::from(std::io::ErrorKind::Other));
        assert_eq!(error_path(&bare), None);
    }
}
