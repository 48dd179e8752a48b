//! # aosp-indexer
//!
//! Infers an IDE project model for an Android platform checkout, which has no
//! manifest listing source roots or dependencies.
//!
//! ## Architecture
//!
//! - **package**: package clause extraction using tree-sitter
//! - **resolve**: source root inference from a directory and its package
//! - **sources**: recursive source root discovery with per-directory pruning
//! - **makefile**: `Android.mk` analysis for module name and build output
//! - **scan**: compiled dependency archive discovery
//! - **cache**: per-repository archive snapshots shared across threads
//! - **modules**: package module discovery and parallel analysis
//! - **plan**: classpath plans combining all of the above
//! - **diagnostic**: non-fatal events reported by walks and scans
//! - **config**: configuration model and resolution

pub mod cache;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod makefile;
pub mod modules;
pub mod package;
pub mod plan;
pub mod resolve;
pub mod scan;
pub mod sources;
