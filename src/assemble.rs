//! Turns the ordered, classified list into records for the rendering stage.

use serde::Serialize;
use tracing::{debug, warn};

use crate::contract::{Classification, ClassifiedFile};
use crate::language::{language_hint, LanguageHint};

/// Body of an ordered entry once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    Text {
        text: String,
        line_count: usize,
        language: LanguageHint,
    },
    Binary,
}

/// One included file, in final order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedEntry {
    pub path: String,
    pub classification: Classification,
    pub byte_size: u64,
    pub content: EntryContent,
}

impl OrderedEntry {
    pub fn line_count(&self) -> Option<usize> {
        match &self.content {
            EntryContent::Text { line_count, .. } => Some(*line_count),
            EntryContent::Binary => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.content, EntryContent::Binary)
    }
}

/// A file left out of the document, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: Classification,
    pub byte_size: u64,
}

/// Aggregate counts. Each file lands in exactly one of text, binary, ignored, too_large.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub considered: usize,
    pub rendered: usize,
    pub text: usize,
    pub binary: usize,
    pub ignored: usize,
    pub too_large: usize,
}

/// Everything the document writers need.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub entries: Vec<OrderedEntry>,
    pub skipped: Vec<SkippedFile>,
    pub summary: RenderSummary,
}

/// Number of lines as an editor shows them; a trailing newline does not start a new line.
pub fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.lines().count()
    }
}

/// Reads one included file into an entry. Unreadable text degrades to the binary marker.
pub fn read_entry(file: ClassifiedFile) -> OrderedEntry {
    let path = file.candidate.repo_relative_path;
    let byte_size = file.candidate.byte_size;

    let content = match file.classification {
        Classification::Ok => match std::fs::read(&file.candidate.absolute_path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let line_count = count_lines(&text);
                EntryContent::Text {
                    language: language_hint(&path),
                    line_count,
                    text,
                }
            }
            Err(e) => {
                warn!(path = %path, error = ?e, "Failed to read text file, rendering as binary");
                EntryContent::Binary
            }
        },
        _ => EntryContent::Binary,
    };

    OrderedEntry {
        path,
        classification: file.classification,
        byte_size,
        content,
    }
}

/// Builds the assembly from the ordered included files and the skipped ones.
///
/// `ordered` must hold only included files; `skipped` only excluded ones.
pub fn assemble(ordered: Vec<ClassifiedFile>, skipped: Vec<ClassifiedFile>) -> Assembly {
    let mut summary = RenderSummary {
        considered: ordered.len() + skipped.len(),
        ..RenderSummary::default()
    };

    let entries: Vec<OrderedEntry> = ordered.into_iter().map(read_entry).collect();
    for entry in &entries {
        summary.rendered += 1;
        if entry.is_binary() {
            summary.binary += 1;
        } else {
            summary.text += 1;
        }
    }

    let skipped: Vec<SkippedFile> = skipped
        .into_iter()
        .map(|file| {
            match file.classification {
                Classification::TooLarge => summary.too_large += 1,
                _ => summary.ignored += 1,
            }
            SkippedFile {
                reason: file.classification,
                byte_size: file.candidate.byte_size,
                path: file.candidate.repo_relative_path,
            }
        })
        .collect();

    debug!(?summary, "Assembly complete");
    Assembly {
        entries,
        skipped,
        summary,
    }
}
