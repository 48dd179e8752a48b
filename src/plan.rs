//! Classpath plans: what a host would create as IDE projects.
//!
//! One platform project covers the framework sources, and one project per
//! package module covers the module's own sources and jars. Both point at the
//! repository's shared dependency archives through a container entry.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cache::ArchiveCache;
use crate::config::DiscoveryConfig;
use crate::diagnostic::Diagnostic;
use crate::makefile::BuildModule;
use crate::modules::{ModuleError, analyze_modules};
use crate::sources::SourceTreeWalker;

pub const CONTAINER_ID: &str = "aosp-indexer.java-dependencies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Source,
    Library,
    Container,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClasspathEntry {
    pub kind: EntryKind,
    pub path: PathBuf,
}

impl ClasspathEntry {
    fn source(path: PathBuf) -> Self {
        Self {
            kind: EntryKind::Source,
            path,
        }
    }

    fn library(path: PathBuf) -> Self {
        Self {
            kind: EntryKind::Library,
            path,
        }
    }

    /// Container entries name the repository they resolve against.
    fn container(repo_root: &Path) -> Self {
        Self {
            kind: EntryKind::Container,
            path: Path::new(CONTAINER_ID).join(repo_root.strip_prefix("/").unwrap_or(repo_root)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPlan {
    pub name: String,
    pub root: PathBuf,
    pub entries: Vec<ClasspathEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryPlan {
    pub repo_root: PathBuf,
    pub projects: Vec<ProjectPlan>,
    pub dependency_archives: BTreeSet<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Planner<'a> {
    config: &'a DiscoveryConfig,
    archives: &'a ArchiveCache,
}

impl<'a> Planner<'a> {
    pub fn new(config: &'a DiscoveryConfig, archives: &'a ArchiveCache) -> Self {
        Self { config, archives }
    }

    pub fn plan(&self, repo_root: &Path) -> Result<RepositoryPlan, ModuleError> {
        let mut diagnostics = Vec::new();

        let platform = self.platform_project(repo_root, &mut diagnostics);
        let mut projects = vec![platform];

        let scan = analyze_modules(
            repo_root,
            &self.config.modules,
            &self.config.build_script,
        )?;
        diagnostics.extend(scan.diagnostics);
        for module in &scan.modules {
            if let Some(project) = self.package_project(repo_root, module, &mut diagnostics) {
                projects.push(project);
            }
        }

        let container = self.archives.container(repo_root);
        let dependency_archives = container.archives();
        diagnostics.extend(container.diagnostics());

        Ok(RepositoryPlan {
            repo_root: repo_root.to_path_buf(),
            projects,
            dependency_archives,
            diagnostics,
        })
    }

    pub fn platform_project(
        &self,
        repo_root: &Path,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ProjectPlan {
        let platform = &self.config.platform;
        let walker = SourceTreeWalker::new(self.config.sources.clone());
        let scan = walker.find_java_source_directories(&repo_root.join(&platform.source_base));
        diagnostics.extend(scan.diagnostics);

        let mut sources: Vec<PathBuf> = scan
            .source_roots
            .into_iter()
            .filter(|root| {
                let relative = root.strip_prefix(repo_root).unwrap_or(root);
                let text = relative.to_string_lossy();
                !platform
                    .skipped_markers
                    .iter()
                    .any(|marker| text.contains(marker.as_str()))
            })
            .collect();
        sources.extend(
            platform
                .extra_source_roots
                .iter()
                .map(|extra| repo_root.join(extra)),
        );
        sources.sort();
        sources.dedup();

        let mut entries: Vec<ClasspathEntry> =
            sources.into_iter().map(ClasspathEntry::source).collect();
        entries.push(ClasspathEntry::container(repo_root));

        ProjectPlan {
            name: format!("{}-platform", last_segment(repo_root)),
            root: repo_root.to_path_buf(),
            entries,
        }
    }

    pub fn package_project(
        &self,
        repo_root: &Path,
        module: &BuildModule,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<ProjectPlan> {
        let name = module.name()?;

        let mut entries: Vec<ClasspathEntry> = self
            .config
            .platform
            .package_source_dirs
            .iter()
            .map(|dir| module.module_dir.join(dir))
            .filter(|dir| dir.is_dir())
            .map(ClasspathEntry::source)
            .collect();

        match module.library_archives() {
            Ok(jars) => entries.extend(jars.into_iter().map(ClasspathEntry::library)),
            Err(err) => diagnostics.push(
                Diagnostic::Unreadable {
                    path: module.out_dir.clone().unwrap_or_default(),
                    message: err.to_string(),
                }
                .emit(),
            ),
        }
        entries.push(ClasspathEntry::container(repo_root));

        Some(ProjectPlan {
            name: format!("{}-{name}", last_segment(repo_root)),
            root: module.module_dir.clone(),
            entries,
        })
    }
}

fn last_segment(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string())
}
