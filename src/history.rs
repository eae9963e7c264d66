//! # history: oldest-commit age per file
//!
//! Resolution runs in two phases, each a plain function returning an [`AgeRecord`]:
//!
//! - [`ages_from_bulk_log`] folds one oldest-first whole-repository log. The first sighting of a
//!   requested path wins, since revisions arrive oldest first, and the fold stops once every
//!   requested path is resolved.
//! - [`fallback_ages`] issues one rename-following query per path the bulk log missed and keeps
//!   the last (oldest) timestamp of each.
//!
//! [`resolve_ages`] composes the two. Nothing here is fatal: a failed bulk query sends every path
//! to the fallback, a failed per-path query leaves that path absent, and malformed timestamp
//! tokens are skipped. At most [`FALLBACK_CONCURRENCY`] per-path queries run at once, each one
//! holding a child process and its pipes.
//!
//! [`GitHistory`] is the production [`HistoryQuery`], backed by the `git` command line.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::contract::{AgeRecord, HistoryError, HistoryQuery};

/// Starts each revision header in the bulk log. Paths can never contain it.
pub const REVISION_MARKER: char = '\u{1e}';

/// Upper bound on per-path history queries in flight.
pub const FALLBACK_CONCURRENCY: usize = 16;

/// Undoes git's C-style quoting of unusual paths, e.g. `"a\"b.txt"` or `"tab\there"`.
///
/// Octal escapes are raw bytes and are decoded as UTF-8, lossily. Unquoted lines pass through.
pub fn unquote_path(raw: &str) -> Cow<'_, str> {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return Cow::Borrowed(raw);
    };

    let src = inner.as_bytes();
    let mut bytes = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] != b'\\' || i + 1 == src.len() {
            bytes.push(src[i]);
            i += 1;
            continue;
        }

        let octal = src
            .get(i + 1..i + 4)
            .filter(|digits| digits.iter().all(|d| (b'0'..=b'7').contains(d)));
        if let Some(digits) = octal {
            let value = digits
                .iter()
                .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
            bytes.push((value & 0xff) as u8);
            i += 4;
            continue;
        }

        bytes.push(match src[i + 1] {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            other => other,
        });
        i += 2;
    }

    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

/// Folds a bulk log into ages for the `wanted` paths.
pub fn ages_from_bulk_log(log: &str, wanted: &BTreeSet<String>) -> AgeRecord {
    let mut ages = AgeRecord::new();
    if wanted.is_empty() {
        return ages;
    }

    let mut current: Option<i64> = None;
    for line in log.lines() {
        if let Some(header) = line.strip_prefix(REVISION_MARKER) {
            current = match header.trim().parse::<i64>() {
                Ok(ts) => Some(ts),
                Err(e) => {
                    debug!(header = %header, error = ?e, "Skipping revision with malformed timestamp");
                    None
                }
            };
            continue;
        }

        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let path = unquote_path(line);

        let Some(ts) = current else {
            continue;
        };

        if wanted.contains(path.as_ref()) && !ages.contains_key(path.as_ref()) {
            ages.insert(path.into_owned(), ts);
            if ages.len() == wanted.len() {
                debug!("All requested paths resolved from bulk log, stopping early");
                break;
            }
        }
    }

    ages
}

/// Oldest timestamp from a newest-first per-path log: the last well-formed entry.
pub fn oldest_from_path_log(log: &str) -> Option<i64> {
    log.lines()
        .filter_map(|line| {
            let token = line.trim();
            if token.is_empty() {
                return None;
            }
            match token.parse::<i64>() {
                Ok(ts) => Some(ts),
                Err(_) => {
                    debug!(token = %token, "Ignoring malformed timestamp token");
                    None
                }
            }
        })
        .last()
}

/// Runs the bulk phase against a history service. A failed query resolves nothing.
pub async fn bulk_ages<H>(history: &H, root: &Path, wanted: &BTreeSet<String>) -> AgeRecord
where
    H: HistoryQuery + ?Sized,
{
    match history.bulk_log(root).await {
        Ok(log) => ages_from_bulk_log(&log, wanted),
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Bulk history query failed, falling back per file");
            AgeRecord::new()
        }
    }
}

/// Runs the per-path phase, at most [`FALLBACK_CONCURRENCY`] queries at a time.
pub async fn fallback_ages<H>(history: &H, root: &Path, pending: &BTreeSet<String>) -> AgeRecord
where
    H: HistoryQuery + ?Sized,
{
    let resolved: Vec<Option<(String, i64)>> = stream::iter(pending)
        .map(move |path| async move {
            match history.path_log(root, path).await {
                Ok(log) => {
                    let oldest = oldest_from_path_log(&log);
                    if oldest.is_none() {
                        debug!(path = %path, "No history found for path");
                    }
                    oldest.map(|ts| (path.clone(), ts))
                }
                Err(e) => {
                    debug!(path = %path, error = %e, "Per-file history query failed");
                    None
                }
            }
        })
        .buffer_unordered(FALLBACK_CONCURRENCY)
        .collect()
        .await;

    resolved.into_iter().flatten().collect()
}

/// Resolves as many of `paths` as the history allows. Absent entries mean "unknown age".
pub async fn resolve_ages<H>(history: &H, root: &Path, paths: &BTreeSet<String>) -> AgeRecord
where
    H: HistoryQuery + ?Sized,
{
    let mut ages = bulk_ages(history, root, paths).await;
    let pending: BTreeSet<String> = paths
        .iter()
        .filter(|p| !ages.contains_key(*p))
        .cloned()
        .collect();

    info!(
        requested = paths.len(),
        bulk_resolved = ages.len(),
        pending = pending.len(),
        "Bulk history phase complete"
    );

    if !pending.is_empty() {
        let fallback = fallback_ages(history, root, &pending).await;
        info!(
            resolved = fallback.len(),
            unresolved = pending.len() - fallback.len(),
            "Fallback history phase complete"
        );
        ages.extend(fallback);
    }

    ages
}

/// [`HistoryQuery`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitHistory {
    program: String,
}

impl Default for GitHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHistory {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Uses a different executable, e.g. a wrapper script.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, root: &Path, args: &[&str]) -> Result<String, HistoryError> {
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(root)
            .args(["--literal-pathspecs", "-c", "core.quotepath=off"])
            .args(args)
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(format!("git {} exited with {}: {}", args.join(" "), output.status, stderr).into())
        }
    }
}

#[async_trait]
impl HistoryQuery for GitHistory {
    async fn bulk_log(&self, root: &Path) -> Result<String, HistoryError> {
        self.run(
            root,
            &[
                "log",
                "--reverse",
                "--no-color",
                "--relative",
                "--format=%x1e%ct",
                "--name-only",
            ],
        )
        .await
    }

    async fn path_log(&self, root: &Path, path: &str) -> Result<String, HistoryError> {
        self.run(root, &["log", "--follow", "--no-color", "--format=%ct", "--", path])
            .await
    }
}
