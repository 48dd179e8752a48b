use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{BuildScriptConfig, ModuleConfig};
use crate::diagnostic::Diagnostic;
use crate::makefile::{BuildModule, MakefileAnalyzer};

#[derive(Debug, thiserror::Error)]
#[error("failed to list {path}: {source}")]
pub struct ModuleError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleScan {
    pub modules: Vec<BuildModule>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleDirs {
    pub dirs: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Module directories laid out as `packages/<category>/<project>` that carry
/// a build script.
///
/// Only a `packages` directory that cannot be listed is an error. A category
/// that cannot be listed is reported and the other categories are kept.
pub fn find_package_modules(
    repo_root: &Path,
    modules: &ModuleConfig,
    build_script: &BuildScriptConfig,
) -> Result<ModuleDirs, ModuleError> {
    let packages = repo_root.join(&modules.packages_dir);
    if !packages.is_dir() {
        return Ok(ModuleDirs::default());
    }

    let categories = list_dirs(&packages)?.into_iter().filter(|category| {
        !category
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| modules.skipped_categories.iter().any(|s| s == n))
    });
    Ok(collect_modules(categories, build_script))
}

fn collect_modules(
    categories: impl IntoIterator<Item = PathBuf>,
    build_script: &BuildScriptConfig,
) -> ModuleDirs {
    let mut found = ModuleDirs::default();
    for category in categories {
        match list_dirs(&category) {
            Ok(projects) => found.dirs.extend(
                projects
                    .into_iter()
                    .filter(|project| project.join(&build_script.file_name).is_file()),
            ),
            Err(err) => found.diagnostics.push(
                Diagnostic::Unreadable {
                    path: err.path,
                    message: err.source.to_string(),
                }
                .emit(),
            ),
        }
    }
    found.dirs.sort();
    found
}

/// Analyzes every package module in parallel.
///
/// Unreadable categories, unreadable scripts and incomplete modules are
/// reported and left out; the remaining modules are returned sorted by name.
pub fn analyze_modules(
    repo_root: &Path,
    modules: &ModuleConfig,
    build_script: &BuildScriptConfig,
) -> Result<ModuleScan, ModuleError> {
    let found = find_package_modules(repo_root, modules, build_script)?;
    let analyzer = MakefileAnalyzer::new(repo_root, build_script);

    let outcomes: Vec<Result<BuildModule, Diagnostic>> = found
        .dirs
        .par_iter()
        .map(|dir| {
            let script = dir.join(&build_script.file_name);
            let module = analyzer.analyze(&script).map_err(|err| {
                Diagnostic::BuildScript {
                    script: script.clone(),
                    message: err.to_string(),
                }
                .emit()
            })?;
            if module.is_complete() {
                Ok(module)
            } else {
                Err(Diagnostic::IncompleteModule {
                    module_dir: dir.clone(),
                }
                .emit())
            }
        })
        .collect();

    let mut scan = ModuleScan {
        modules: Vec::new(),
        diagnostics: found.diagnostics,
    };
    for outcome in outcomes {
        match outcome {
            Ok(module) => scan.modules.push(module),
            Err(diagnostic) => scan.diagnostics.push(diagnostic),
        }
    }
    scan.modules.sort_by(|a, b| a.name().cmp(&b.name()));
    Ok(scan)
}

fn list_dirs(path: &Path) -> Result<Vec<PathBuf>, ModuleError> {
    let to_err = |source: std::io::Error| ModuleError {
        path: path.to_path_buf(),
        source,
    };
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(path).map_err(to_err)? {
        let entry = entry.map_err(to_err)?;
        let child = entry.path();
        if child.is_dir() {
            dirs.push(child);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn app_script(name: &str) -> String {
        format!("include $(CLEAR_VARS)\nLOCAL_PACKAGE_NAME := {name}\ninclude $(BUILD_PACKAGE)\n")
    }

    #[test]
    fn finds_modules_with_build_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        write(&repo.join("packages/apps/Music/Android.mk"), &app_script("Music"));
        write(&repo.join("packages/apps/Browser/Android.mk"), &app_script("Browser"));
        write(&repo.join("packages/apps/Notes/README"), "no script");
        write(&repo.join("packages/providers/Contacts/Android.mk"), &app_script("Contacts"));
        write(&repo.join("packages/experimental/Toy/Android.mk"), &app_script("Toy"));
        write(&repo.join("packages/stray.txt"), "");

        let found = find_package_modules(
            repo,
            &ModuleConfig::default(),
            &BuildScriptConfig::default(),
        )
        .unwrap();
        assert!(found.diagnostics.is_empty());
        assert_eq!(
            found.dirs,
            vec![
                repo.join("packages/apps/Browser"),
                repo.join("packages/apps/Music"),
                repo.join("packages/providers/Contacts"),
            ]
        );
    }

    #[test]
    fn missing_packages_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = find_package_modules(
            dir.path(),
            &ModuleConfig::default(),
            &BuildScriptConfig::default(),
        )
        .unwrap();
        assert_eq!(found, ModuleDirs::default());
    }

    #[test]
    fn unreadable_category_is_reported_and_others_kept() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        write(&repo.join("packages/apps/Music/Android.mk"), &app_script("Music"));
        let vanished = repo.join("packages/vanished");

        let found = collect_modules(
            [repo.join("packages/apps"), vanished.clone()],
            &BuildScriptConfig::default(),
        );
        assert_eq!(found.dirs, vec![repo.join("packages/apps/Music")]);
        assert!(matches!(
            found.diagnostics.as_slice(),
            [Diagnostic::Unreadable { path, .. }] if *path == vanished
        ));
    }

    #[test]
    fn incomplete_modules_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        write(&repo.join("packages/apps/Music/Android.mk"), &app_script("Music"));
        write(&repo.join("packages/apps/Alarm/Android.mk"), &app_script("Alarm"));
        write(
            &repo.join("packages/apps/Static/Android.mk"),
            "LOCAL_MODULE := static\ninclude $(BUILD_STATIC_JAVA_LIBRARY)\n",
        );

        let scan = analyze_modules(
            repo,
            &ModuleConfig::default(),
            &BuildScriptConfig::default(),
        )
        .unwrap();
        let names: Vec<_> = scan.modules.iter().filter_map(|m| m.name()).collect();
        assert_eq!(names, vec!["Alarm", "Music"]);
        assert_eq!(
            scan.diagnostics,
            vec![Diagnostic::IncompleteModule {
                module_dir: repo.join("packages/apps/Static"),
            }]
        );
    }
}
