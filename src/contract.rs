//! # contract: data model and seams shared by every pipeline stage
//!
//! This module holds the plain data that flows from discovery to assembly, and the two
//! traits the pipeline talks through when it leaves the process or hands content off:
//!
//! - [`HistoryQuery`]: the version-control history service. The resolver consumes its raw
//!   text output and never runs version-control operations itself.
//! - [`Renderer`]: the highlighter / markup service. It receives text plus a language hint,
//!   or raw bytes, and returns markup. Its internals are not part of this crate's contract.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, exported behind the default
//!   `test-export-mocks` feature so integration tests can build deterministic mocks.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::language::LanguageHint;

/// A file found during discovery. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub absolute_path: PathBuf,
    /// Forward-slash separated path relative to the repository root. Unique per render.
    pub repo_relative_path: String,
    pub byte_size: u64,
}

impl FileCandidate {
    pub fn new(
        absolute_path: impl Into<PathBuf>,
        repo_relative_path: impl Into<String>,
        byte_size: u64,
    ) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            repo_relative_path: repo_relative_path.into(),
            byte_size,
        }
    }

    /// Lowercased extension of the final path segment, without the dot.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.repo_relative_path)
    }
}

/// Lowercased extension of the last segment of a forward-slash path.
pub fn extension_of(repo_relative_path: &str) -> Option<String> {
    let name = repo_relative_path.rsplit('/').next().unwrap_or(repo_relative_path);
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// The per-file decision made by the classifier. Computed once, never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Included, rendered as text.
    Ok,
    /// Included, rendered through the binary path.
    Binary,
    /// Excluded: large-data format over the size limit.
    TooLarge,
    /// Excluded: version-control metadata.
    Ignored,
}

impl Classification {
    pub fn include(self) -> bool {
        matches!(self, Classification::Ok | Classification::Binary)
    }

    pub fn reason(self) -> &'static str {
        match self {
            Classification::Ok => "ok",
            Classification::Binary => "binary",
            Classification::TooLarge => "too_large",
            Classification::Ignored => "ignored",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// A candidate paired with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub candidate: FileCandidate,
    pub classification: Classification,
}

impl ClassifiedFile {
    pub fn path(&self) -> &str {
        &self.candidate.repo_relative_path
    }
}

/// Oldest known commit time for a file or directory.
///
/// `Unknown` sorts after every known timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Age {
    Known(i64),
    Unknown,
}

impl Age {
    pub fn from_record(ages: &AgeRecord, path: &str) -> Self {
        ages.get(path).copied().map_or(Age::Unknown, Age::Known)
    }
}

/// Repo-relative path → oldest commit timestamp (Unix seconds). Paths without history are absent.
pub type AgeRecord = BTreeMap<String, i64>;

/// How the ordered list is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Oldest history first, aggregated through directories.
    #[default]
    Age,
    /// Plain case-insensitive path order; no history queries.
    Filename,
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "age" | "history" => Ok(SortMode::Age),
            "filename" | "name" | "path" => Ok(SortMode::Filename),
            other => Err(format!("unknown sort mode '{other}' (expected age or filename)")),
        }
    }
}

/// Error type for the history service (simple boxed error, swallowed by the resolver).
pub type HistoryError = Box<dyn std::error::Error + Send + Sync>;

/// Version-control history service consumed by the age resolver.
///
/// Implementations return raw query output; all parsing happens in [`crate::history`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HistoryQuery: Send + Sync {
    /// Whole-repository log, oldest revision first. Each revision starts with a line holding
    /// [`crate::history::REVISION_MARKER`] followed by the commit timestamp, then one line per
    /// touched path. Blank lines may separate revisions.
    async fn bulk_log(&self, root: &Path) -> Result<String, HistoryError>;

    /// Log of a single path following renames: one commit timestamp per line, newest first.
    async fn path_log(&self, root: &Path, path: &str) -> Result<String, HistoryError>;
}

/// Markup service for file bodies. Receives a hint, never performs classification itself.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Renderer: Send + Sync {
    fn render_text(&self, path: &str, text: &str, hint: LanguageHint) -> String;

    fn render_binary(&self, path: &str, byte_size: u64) -> String;
}
