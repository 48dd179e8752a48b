//! Package clause extraction using the tree-sitter Java grammar.
//!
//! Only the top-level `package_declaration` node is inspected. The grammar
//! recovers from syntax errors, so a broken method body further down the file
//! does not hide a well-formed package clause.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tree_sitter::Parser;

/// A dot-separated package name. Empty means the unnamed (default) package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JavaPackage(String);

impl JavaPackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifiers in declaration order, ignoring empty pieces.
    pub fn identifiers(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for JavaPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{path} is too large to parse ({len} bytes, limit {limit})")]
    TooLarge { path: PathBuf, len: u64, limit: u64 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load the Java grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

/// Reads `path` and returns its declared package.
///
/// Files longer than `max_len` bytes are rejected before being read.
pub fn extract_package(path: &Path, max_len: u64) -> Result<JavaPackage, ExtractError> {
    let len = std::fs::metadata(path)
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len > max_len {
        return Err(ExtractError::TooLarge {
            path: path.to_path_buf(),
            len,
            limit: max_len,
        });
    }

    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8_lossy(&bytes);
    parse_package(&source)
}

/// Extracts the package clause from in-memory source text.
pub fn parse_package(source: &str) -> Result<JavaPackage, ExtractError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_java::LANGUAGE.into())?;
    let Some(tree) = parser.parse(source, None) else {
        return Ok(JavaPackage::default());
    };
    let root = tree.root_node();
    let bytes = source.as_bytes();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "package_declaration" {
            return Ok(package_name(&child, bytes));
        }
    }

    Ok(JavaPackage::default())
}

fn package_name(node: &tree_sitter::Node, source: &[u8]) -> JavaPackage {
    if node.has_error() {
        return JavaPackage::default();
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
            let text = child.utf8_text(source).unwrap_or("");
            // `package com . acme;` is legal Java.
            let name: String = text.split_whitespace().collect();
            return JavaPackage::new(name);
        }
    }
    JavaPackage::default()
}
