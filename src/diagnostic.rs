use serde::Serialize;
use std::path::PathBuf;

/// A non-fatal event observed while walking a tree or analyzing modules.
///
/// Operations that absorb per-item failures return these next to their
/// result; each one is also emitted as a `tracing` warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The package clause of a source file could not be read.
    Extraction { file: PathBuf, message: String },
    /// A resolved root candidate is not an existing directory.
    NotADirectory { file: PathBuf, root: PathBuf },
    /// A directory entry could not be listed or inspected.
    Unreadable { path: PathBuf, message: String },
    /// A module's build script could not be analyzed.
    BuildScript { script: PathBuf, message: String },
    /// A module's build script lacks a name or an inclusion directive.
    IncompleteModule { module_dir: PathBuf },
}

impl Diagnostic {
    pub(crate) fn emit(self) -> Self {
        match &self {
            Diagnostic::Extraction { file, message } => {
                tracing::warn!(file = %file.display(), "skipping source file: {message}");
            }
            Diagnostic::NotADirectory { file, root } => {
                tracing::warn!(
                    file = %file.display(),
                    root = %root.display(),
                    "resolved source root is not a directory"
                );
            }
            Diagnostic::Unreadable { path, message } => {
                tracing::warn!(path = %path.display(), "unreadable entry: {message}");
            }
            Diagnostic::BuildScript { script, message } => {
                tracing::warn!(script = %script.display(), "skipping module: {message}");
            }
            Diagnostic::IncompleteModule { module_dir } => {
                tracing::warn!(
                    module = %module_dir.display(),
                    "skipping module without name or build output"
                );
            }
        }
        self
    }
}
