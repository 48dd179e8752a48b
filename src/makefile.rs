//! `Android.mk` analysis.
//!
//! This is not a make parser. Each line is classified as an assignment, one
//! of the two recognized inclusion directives, or noise, and a small state
//! machine keeps the last module name seen and the output directory implied
//! by the last directive.

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::BuildScriptConfig;

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[:+]=\s*").expect("assignment pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildKind {
    App,
    JavaLibrary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildModule {
    pub module_dir: PathBuf,
    pub package_name: Option<String>,
    pub module_name: Option<String>,
    pub kind: Option<BuildKind>,
    pub out_dir: Option<PathBuf>,
}

impl BuildModule {
    /// The package name if one was declared, the plain module name otherwise.
    pub fn name(&self) -> Option<&str> {
        self.package_name
            .as_deref()
            .or(self.module_name.as_deref())
    }

    pub fn is_complete(&self) -> bool {
        self.name().is_some() && self.out_dir.is_some()
    }

    /// Jar files sitting directly in the module's build output directory.
    pub fn library_archives(&self) -> std::io::Result<Vec<PathBuf>> {
        let Some(out_dir) = self.out_dir.as_deref() else {
            return Ok(Vec::new());
        };
        if !out_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut jars = Vec::new();
        for entry in std::fs::read_dir(out_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "jar") {
                jars.push(path);
            }
        }
        jars.sort();
        Ok(jars)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to read build script {path}: {source}")]
pub struct BuildScriptError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Assignment { key: &'a str, value: &'a str },
    Directive(BuildKind),
    Other,
}

#[derive(Debug, Clone)]
pub struct MakefileAnalyzer<'a> {
    repo_root: &'a Path,
    config: &'a BuildScriptConfig,
}

impl<'a> MakefileAnalyzer<'a> {
    pub fn new(repo_root: &'a Path, config: &'a BuildScriptConfig) -> Self {
        Self { repo_root, config }
    }

    pub fn analyze(&self, script: &Path) -> Result<BuildModule, BuildScriptError> {
        let bytes = std::fs::read(script).map_err(|source| BuildScriptError {
            path: script.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let module_dir = script.parent().unwrap_or(Path::new("")).to_path_buf();
        Ok(self.analyze_str(module_dir, &content))
    }

    pub fn analyze_str(&self, module_dir: PathBuf, content: &str) -> BuildModule {
        let mut module = BuildModule {
            module_dir,
            package_name: None,
            module_name: None,
            kind: None,
            out_dir: None,
        };

        for raw in content.lines() {
            match self.classify(raw.trim()) {
                Line::Assignment { key, value } => {
                    if key == self.config.package_name_key {
                        module.package_name = Some(value.to_string());
                    } else if key == self.config.module_key {
                        module.module_name = Some(value.to_string());
                    }
                }
                Line::Directive(kind) => {
                    let name = match kind {
                        BuildKind::App => module.package_name.as_deref(),
                        BuildKind::JavaLibrary => module.module_name.as_deref(),
                    };
                    match name {
                        Some(name) => {
                            module.out_dir = Some(self.out_dir(kind, name));
                            module.kind = Some(kind);
                        }
                        None => {
                            tracing::debug!(
                                module = %module.module_dir.display(),
                                ?kind,
                                "inclusion directive before any module name"
                            );
                        }
                    }
                }
                Line::Other => {}
            }
        }

        module
    }

    fn classify<'l>(&self, line: &'l str) -> Line<'l> {
        let mut tokens = ASSIGNMENT.splitn(line, 3);
        let key = tokens.next().unwrap_or("");
        if let Some(value) = tokens.next().filter(|v| !v.is_empty()) {
            return Line::Assignment { key, value };
        }

        if line == self.config.app_directive {
            Line::Directive(BuildKind::App)
        } else if line == self.config.java_library_directive {
            Line::Directive(BuildKind::JavaLibrary)
        } else {
            Line::Other
        }
    }

    fn out_dir(&self, kind: BuildKind, name: &str) -> PathBuf {
        let base = match kind {
            BuildKind::App => &self.config.apps_out_dir,
            BuildKind::JavaLibrary => &self.config.java_libraries_out_dir,
        };
        self.repo_root
            .join(base)
            .join(format!("{name}{}", self.config.intermediates_suffix))
    }
}
