use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "aosp-indexer")]
#[command(about = "Index source roots, modules and dependency archives of an Android checkout")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the package declared by a Java source file.
    Package { file: PathBuf },
    /// Compute the source root for a directory and package name.
    Resolve { dir: PathBuf, package: String },
    /// Find every Java source root below a directory.
    Roots { dir: PathBuf },
    /// Analyze one Android.mk.
    Makefile { repo: PathBuf, file: PathBuf },
    /// List compiled dependency archives of a checkout.
    Archives { repo: PathBuf },
    /// Analyze all package modules of a checkout.
    Modules { repo: PathBuf },
    /// Build the classpath plan for a checkout.
    Plan { repo: PathBuf },
    /// Print the effective configuration.
    Config,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
