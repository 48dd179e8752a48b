use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

pub const CONFIG_ENV: &str = "AOSP_INDEXER_CONFIG";

/// Every constant the discovery engine consults.
///
/// All fields default to the layout of a stock platform checkout, so an empty
/// JSON object is a valid configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub sources: SourceConfig,
    pub build_script: BuildScriptConfig,
    pub archives: ArchiveConfig,
    pub modules: ModuleConfig,
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub java_suffix: String,
    /// Directory names pruned from source root discovery.
    pub excluded_dirs: Vec<String>,
    pub max_source_len: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            java_suffix: ".java".to_string(),
            excluded_dirs: vec![INSTRUMENTATION_DIR.to_string()],
            max_source_len: u64::from(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildScriptConfig {
    pub file_name: String,
    pub package_name_key: String,
    pub module_key: String,
    pub app_directive: String,
    pub java_library_directive: String,
    pub apps_out_dir: String,
    pub java_libraries_out_dir: String,
    pub intermediates_suffix: String,
}

impl Default for BuildScriptConfig {
    fn default() -> Self {
        Self {
            file_name: "Android.mk".to_string(),
            package_name_key: "LOCAL_PACKAGE_NAME".to_string(),
            module_key: "LOCAL_MODULE".to_string(),
            app_directive: "include $(BUILD_PACKAGE)".to_string(),
            java_library_directive: "include $(BUILD_JAVA_LIBRARY)".to_string(),
            apps_out_dir: "out/target/common/obj/APPS".to_string(),
            java_libraries_out_dir: JAVA_LIBRARIES_DIR.to_string(),
            intermediates_suffix: "_intermediates".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub libraries_dir: String,
    pub archive_name: String,
    /// Matched against directory names with `starts_with`.
    pub excluded_prefixes: Vec<String>,
    pub instrumentation_dir: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            libraries_dir: JAVA_LIBRARIES_DIR.to_string(),
            archive_name: "classes.jar".to_string(),
            excluded_prefixes: [
                "android_stubs_current_intermediates",
                "api-stubs_intermediates",
                "offline-sdk_intermediates",
                "online-sdk_intermediates",
                // sdk_v*_intermediates
                "sdk_v",
                // android-support-v*_intermediates
                "android-support-v",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            instrumentation_dir: INSTRUMENTATION_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub packages_dir: String,
    pub skipped_categories: Vec<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            packages_dir: "packages".to_string(),
            // Not built with the rest of the platform.
            skipped_categories: vec!["experimental".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub source_base: String,
    /// Discovered roots whose path contains any of these are left out.
    pub skipped_markers: Vec<String>,
    pub extra_source_roots: Vec<String>,
    pub package_source_dirs: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            source_base: "frameworks/base".to_string(),
            skipped_markers: vec!["tools".to_string(), "tests".to_string()],
            extra_source_roots: vec![
                "libcore/luni/src/main/java".to_string(),
                "out/target/common/R".to_string(),
            ],
            package_source_dirs: vec!["src".to_string(), "java/src".to_string()],
        }
    }
}

const INSTRUMENTATION_DIR: &str = "emma_out";
const JAVA_LIBRARIES_DIR: &str = "out/target/common/obj/JAVA_LIBRARIES";

impl DiscoveryConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

pub fn resolve_config(cli: &Cli) -> Result<DiscoveryConfig> {
    match resolve_config_path(cli)? {
        Some(path) => DiscoveryConfig::load(&path),
        None => Ok(DiscoveryConfig::default()),
    }
}

/// Explicit flag, then environment, then the per-user default file if present.
pub fn resolve_config_path(cli: &Cli) -> Result<Option<PathBuf>> {
    if let Some(p) = cli.config.clone() {
        return Ok(Some(p));
    }

    if let Ok(p) = env::var(CONFIG_ENV)
        && !p.is_empty()
    {
        return Ok(Some(PathBuf::from(p)));
    }

    let default_path = default_config_path()?;
    if default_path.is_file() {
        return Ok(Some(default_path));
    }

    Ok(None)
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve config directory"))?;
    Ok(base.join("aosp-indexer").join("config.json"))
}
