//! Per-file include/skip decisions.
//!
//! The decision is a pure function of (path, size, byte prefix): [`classify_prefix`] holds all of
//! the policy, and [`classify`] only adds the one disk read of up to [`SNIFF_BYTES`] bytes.
//! Checks run in a fixed order:
//!
//! 1. version-control metadata paths are `ignored`, unconditionally;
//! 2. large-data formats over the size limit are `too_large`;
//! 3. everything else is included, as text or binary.

use std::fs::File;
use std::io::Read;

use tracing::{debug, warn};

use crate::contract::{extension_of, Classification, ClassifiedFile, FileCandidate};

/// Bytes inspected when sniffing content.
pub const SNIFF_BYTES: usize = 8192;

/// Default size limit for large-data formats.
pub const DEFAULT_MAX_BYTES: u64 = 51_200;

/// Directory names that hold version-control metadata.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Delimited and structured-data formats subject to the size limit.
const LARGE_DATA_EXTENSIONS: &[&str] = &["csv", "tsv", "psv", "json", "jsonl", "ndjson", "geojson"];

/// Always rendered as text, whatever the bytes look like.
const FORCED_TEXT_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "xml", "svg", "md", "markdown"];

/// Always treated as binary, whatever the bytes look like.
const FORCED_BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tif", "tiff", "avif", "heic", "psd",
    "pdf", "zip", "tar", "gz", "tgz", "bz2", "xz", "zst", "7z", "rar", "jar", "war", "whl",
    "exe", "dll", "so", "dylib", "a", "lib", "o", "obj", "class", "pyc", "pyo", "wasm", "bin",
    "dat", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "m4a", "wav", "ogg", "flac",
    "avi", "mov", "mkv", "webm", "sqlite", "db", "parquet", "npy", "npz", "pkl", "pt", "onnx",
];

/// True when any segment of the path is a version-control metadata directory.
pub fn is_vcs_path(repo_relative_path: &str) -> bool {
    repo_relative_path
        .split('/')
        .any(|segment| VCS_DIRS.contains(&segment))
}

/// True for a large-data format over the size limit.
pub fn is_too_large(extension: Option<&str>, byte_size: u64, max_bytes: u64) -> bool {
    extension.is_some_and(|ext| LARGE_DATA_EXTENSIONS.contains(&ext)) && byte_size > max_bytes
}

/// Decides binary-ness from the extension lists, falling back to the content prefix.
///
/// `prefix` is `None` when the file could not be read; unreadable content is binary.
pub fn looks_binary(extension: Option<&str>, prefix: Option<&[u8]>) -> bool {
    if let Some(ext) = extension {
        if FORCED_TEXT_EXTENSIONS.contains(&ext) {
            return false;
        }
        if FORCED_BINARY_EXTENSIONS.contains(&ext) {
            return true;
        }
    }

    let Some(prefix) = prefix else {
        return true;
    };
    let prefix = &prefix[..prefix.len().min(SNIFF_BYTES)];

    if prefix.contains(&0) {
        return true;
    }

    match std::str::from_utf8(prefix) {
        Ok(_) => false,
        // A multi-byte sequence cut off by the sniff window is still valid text.
        Err(e) => !(e.error_len().is_none() && prefix.len() == SNIFF_BYTES),
    }
}

/// Classifies one file from already-known facts. Deterministic for identical input.
pub fn classify_prefix(
    repo_relative_path: &str,
    byte_size: u64,
    max_bytes: u64,
    prefix: Option<&[u8]>,
) -> Classification {
    if is_vcs_path(repo_relative_path) {
        return Classification::Ignored;
    }

    let extension = extension_of(repo_relative_path);
    let ext = extension.as_deref();

    if is_too_large(ext, byte_size, max_bytes) {
        return Classification::TooLarge;
    }

    if looks_binary(ext, prefix) {
        Classification::Binary
    } else {
        Classification::Ok
    }
}

/// Reads up to [`SNIFF_BYTES`] from the start of a file.
pub fn read_prefix(path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(SNIFF_BYTES);
    File::open(path)?
        .take(SNIFF_BYTES as u64)
        .read_to_end(&mut buf)?;
    Ok(buf)
}

/// Classifies a discovered candidate, reading its prefix only when the decision needs it.
pub fn classify(candidate: &FileCandidate, max_bytes: u64) -> Classification {
    let path = candidate.repo_relative_path.as_str();

    if is_vcs_path(path) {
        return Classification::Ignored;
    }

    let extension = candidate.extension();
    let ext = extension.as_deref();

    let needs_content = match ext {
        _ if is_too_large(ext, candidate.byte_size, max_bytes) => false,
        Some(ext) => {
            !FORCED_TEXT_EXTENSIONS.contains(&ext) && !FORCED_BINARY_EXTENSIONS.contains(&ext)
        }
        None => true,
    };

    let prefix = if needs_content {
        match read_prefix(&candidate.absolute_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path, error = ?e, "Failed to read file prefix, treating as binary");
                None
            }
        }
    } else {
        Some(Vec::new())
    };

    let classification = classify_prefix(path, candidate.byte_size, max_bytes, prefix.as_deref());
    debug!(path = %path, size = candidate.byte_size, reason = %classification, "Classified file");
    classification
}

/// Classifies every candidate, keeping discovery order.
pub fn classify_all(candidates: Vec<FileCandidate>, max_bytes: u64) -> Vec<ClassifiedFile> {
    candidates
        .into_iter()
        .map(|candidate| {
            let classification = classify(&candidate, max_bytes);
            ClassifiedFile {
                candidate,
                classification,
            }
        })
        .collect()
}
