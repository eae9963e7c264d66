//! Repository content provider: where the files come from.
//!
//! A [`RepoSource`] is either a local working tree, used as-is, or a git URL cloned into a
//! temporary directory. [`discover`] then lists the candidate files under the root.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::classify::VCS_DIRS;
use crate::contract::FileCandidate;
use crate::error::RenderError;

/// Selects where the repository content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RepoSource {
    Local { path: PathBuf },
    Git { repo_url: String, reference: Option<String> },
}

impl RepoSource {
    /// An existing directory is local, anything else is treated as a git URL.
    pub fn from_arg(arg: &str, reference: Option<String>) -> Self {
        let path = Path::new(arg);
        if path.is_dir() {
            RepoSource::Local {
                path: path.to_path_buf(),
            }
        } else {
            RepoSource::Git {
                repo_url: arg.to_string(),
                reference,
            }
        }
    }

    /// Human-readable name used as the document title.
    pub fn display_name(&self) -> String {
        match self {
            RepoSource::Local { path } => {
                let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
                absolute
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| absolute.display().to_string())
            }
            RepoSource::Git { repo_url, .. } => repo_url
                .trim_end_matches('/')
                .rsplit(['/', ':'])
                .next()
                .unwrap_or(repo_url)
                .trim_end_matches(".git")
                .to_string(),
        }
    }
}

/// A repository root ready for discovery. Holds the clone directory alive when there is one.
#[derive(Debug)]
pub struct PreparedRepo {
    pub root: PathBuf,
    _workdir: Option<TempDir>,
}

impl PreparedRepo {
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _workdir: None,
        }
    }
}

/// Resolves a source into a local root, cloning when needed.
pub async fn prepare(source: &RepoSource) -> Result<PreparedRepo, RenderError> {
    match source {
        RepoSource::Local { path } => {
            if !path.is_dir() {
                error!(path = %path.display(), "Repository root is not a directory");
                return Err(RenderError::RepositoryNotFound(path.clone()));
            }
            info!(path = %path.display(), "Using local working tree");
            Ok(PreparedRepo::local(path.clone()))
        }
        RepoSource::Git {
            repo_url,
            reference,
        } => {
            let workdir = tempfile::Builder::new().prefix("repo-flatten-").tempdir()?;
            let target = workdir.path().join("repo");
            clone(repo_url, reference.as_deref(), &target).await?;
            Ok(PreparedRepo {
                root: target,
                _workdir: Some(workdir),
            })
        }
    }
}

async fn git_output(args: &[&OsStr]) -> Result<std::process::Output, RenderError> {
    Command::new("git")
        .args(args)
        .output()
        .await
        .map_err(RenderError::GitLaunch)
}

/// `git clone <repo_url> <target>` with full history, then checks out `reference` if given.
pub async fn clone(
    repo_url: &str,
    reference: Option<&str>,
    target: &Path,
) -> Result<(), RenderError> {
    info!(repo_url = repo_url, path = %target.display(), "Cloning git repository");
    let output = git_output(&[OsStr::new("clone"), OsStr::new(repo_url), target.as_os_str()]).await?;

    if !output.status.success() {
        let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(repo_url = repo_url, status = ?output.status, "Git clone exited with non-zero code");
        return Err(RenderError::Clone {
            repo_url: repo_url.to_string(),
            message,
        });
    }
    info!(repo_url = repo_url, path = %target.display(), "Successfully cloned git repository");

    let Some(reference) = reference else {
        return Ok(());
    };

    let output = git_output(&[
        OsStr::new("-C"),
        target.as_os_str(),
        OsStr::new("checkout"),
        OsStr::new(reference),
    ])
    .await?;

    if output.status.success() {
        info!(repo_url = repo_url, reference = reference, "Checked out git reference");
        Ok(())
    } else {
        let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(reference = reference, status = ?output.status, "Git checkout exited with non-zero code");
        Err(RenderError::Checkout {
            reference: reference.to_string(),
            message,
        })
    }
}

/// Forward-slash path of `path` relative to `root`, or `None` when it escapes the root.
pub fn repo_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

fn stat_size(path: &Path) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!(path = %path.display(), error = ?e, "Failed to stat file, size defaults to 0");
            0
        }
    }
}

fn is_vcs_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| VCS_DIRS.contains(&name))
}

/// Recursive walk: skips symlinks and prunes version-control metadata directories.
pub fn walk(root: &Path) -> Vec<FileCandidate> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_vcs_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = repo_relative(root, entry.path()) else {
            continue;
        };
        out.push(FileCandidate::new(
            entry.path(),
            relative,
            stat_size(entry.path()),
        ));
    }
    out
}

/// Explicit mode: keeps listed paths that exist, are regular files, and lie under the root.
pub fn explicit(root: &Path, paths: &[PathBuf]) -> Vec<FileCandidate> {
    let canonical_root = root.canonicalize().ok();
    let mut seen: BTreeMap<String, FileCandidate> = BTreeMap::new();
    for listed in paths {
        let absolute = if listed.is_absolute() {
            listed.clone()
        } else {
            root.join(listed)
        };
        if !absolute.is_file() {
            warn!(path = %listed.display(), "Listed path is not an existing regular file, skipping");
            continue;
        }
        let relative = repo_relative(root, &absolute).or_else(|| {
            let canonical_root = canonical_root.as_deref()?;
            repo_relative(canonical_root, &absolute.canonicalize().ok()?)
        });
        let Some(relative) = relative else {
            warn!(path = %listed.display(), "Listed path lies outside the repository root, skipping");
            continue;
        };
        let size = stat_size(&absolute);
        seen.entry(relative.clone())
            .or_insert_with(|| FileCandidate::new(absolute, relative, size));
    }
    seen.into_values().collect()
}

/// Lists candidate files under `root`. The root itself must be an accessible directory.
pub fn discover(root: &Path, paths: Option<&[PathBuf]>) -> Result<Vec<FileCandidate>, RenderError> {
    if !root.is_dir() {
        error!(path = %root.display(), "Repository root is not an accessible directory");
        return Err(RenderError::RepositoryNotFound(root.to_path_buf()));
    }

    let mut candidates = match paths {
        Some(paths) => explicit(root, paths),
        None => walk(root),
    };
    candidates.sort_by(|a, b| a.repo_relative_path.cmp(&b.repo_relative_path));

    info!(root = %root.display(), count = candidates.len(), "Discovered candidate files");
    Ok(candidates)
}
