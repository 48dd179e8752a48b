use anyhow::{Context, Result};
use aosp_indexer::cache::ArchiveCache;
use aosp_indexer::cli::{Cli, Commands, OutputFormat};
use aosp_indexer::config::{DiscoveryConfig, resolve_config};
use aosp_indexer::diagnostic::Diagnostic;
use aosp_indexer::makefile::MakefileAnalyzer;
use aosp_indexer::modules::analyze_modules;
use aosp_indexer::package::{JavaPackage, extract_package};
use aosp_indexer::plan::Planner;
use aosp_indexer::resolve::resolve_source_root;
use aosp_indexer::scan::ArchiveFinder;
use aosp_indexer::sources::SourceTreeWalker;
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command.clone() {
        Commands::Package { file } => {
            let package = extract_package(&file, config.sources.max_source_len)?;
            let output = PackageOutput { file, package };
            let text = output.package.to_string();
            write_output(cli.format, &output, text)?;
        }
        Commands::Resolve { dir, package } => {
            let package = JavaPackage::new(package);
            let source_root = resolve_source_root(&dir, &package);
            let text = match &source_root {
                Some(root) => root.display().to_string(),
                None => "no match".to_string(),
            };
            let output = ResolveOutput {
                dir,
                package,
                source_root,
            };
            write_output(cli.format, &output, text)?;
        }
        Commands::Roots { dir } => {
            let start = Instant::now();
            let walker = SourceTreeWalker::new(config.sources.clone());
            let scan = walker.find_java_source_directories(&dir);
            let text = lines(scan.source_roots.iter());
            let output = Timed {
                duration_ms: start.elapsed().as_millis() as u64,
                result: scan,
            };
            write_output(cli.format, &output, text)?;
        }
        Commands::Makefile { repo, file } => {
            let analyzer = MakefileAnalyzer::new(&repo, &config.build_script);
            let module = analyzer.analyze(&file)?;
            let text = format!(
                "name: {}\nout_dir: {}\n",
                module.name().unwrap_or("-"),
                module
                    .out_dir
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            write_output(cli.format, &module, text)?;
        }
        Commands::Archives { repo } => {
            let start = Instant::now();
            let cache = archive_cache(&config);
            let container = cache.container(&repo);
            let archives = container.archives();
            let text = lines(archives.iter());
            let output = Timed {
                duration_ms: start.elapsed().as_millis() as u64,
                result: ArchivesOutput {
                    description: container.description(),
                    libraries_dir: ArchiveFinder::new(config.archives.clone())
                        .libraries_dir(&repo),
                    archives,
                    diagnostics: container.diagnostics(),
                },
            };
            write_output(cli.format, &output, text)?;
        }
        Commands::Modules { repo } => {
            let scan = analyze_modules(&repo, &config.modules, &config.build_script)
                .with_context(|| format!("Failed to analyze modules of {}", repo.display()))?;
            let text = scan
                .modules
                .iter()
                .map(|m| {
                    format!(
                        "{}\t{}\n",
                        m.name().unwrap_or("-"),
                        m.module_dir.display()
                    )
                })
                .collect();
            write_output(cli.format, &scan, text)?;
        }
        Commands::Plan { repo } => {
            let start = Instant::now();
            let cache = archive_cache(&config);
            let plan = Planner::new(&config, &cache)
                .plan(&repo)
                .with_context(|| format!("Failed to plan {}", repo.display()))?;
            let mut text = String::new();
            for project in &plan.projects {
                text.push_str(&format!("{} ({})\n", project.name, project.root.display()));
                for entry in &project.entries {
                    text.push_str(&format!("  {:?}\t{}\n", entry.kind, entry.path.display()));
                }
            }
            let output = Timed {
                duration_ms: start.elapsed().as_millis() as u64,
                result: plan,
            };
            write_output(cli.format, &output, text)?;
        }
        Commands::Config => {
            let text = serde_json::to_string_pretty(&config)?;
            write_output(cli.format, &config, text)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn archive_cache(config: &DiscoveryConfig) -> ArchiveCache {
    ArchiveCache::new(ArchiveFinder::new(config.archives.clone()))
}

fn lines<'a>(paths: impl Iterator<Item = &'a PathBuf>) -> String {
    paths.map(|p| format!("{}\n", p.display())).collect()
}

#[derive(Debug, Serialize)]
struct PackageOutput {
    file: PathBuf,
    package: JavaPackage,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    dir: PathBuf,
    package: JavaPackage,
    source_root: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ArchivesOutput {
    description: String,
    libraries_dir: PathBuf,
    archives: BTreeSet<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct Timed<T> {
    duration_ms: u64,
    #[serde(flatten)]
    result: T,
}

fn write_output<T: Serialize>(format: OutputFormat, value: &T, text: String) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Text => text,
    };

    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}
