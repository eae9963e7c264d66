//! High-level pipeline: discover → classify → resolve ages → order → assemble.
//!
//! # Responsibilities
//! - Runs each stage to completion before the next one starts
//! - Queries history only in [`SortMode::Age`], and only for included files
//! - Logs counts at every stage for traceability
//!
//! # Error Handling
//! Only discovery can fail (inaccessible root). Classification and history problems are
//! logged and degrade to binary rendering or unknown ages.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::assemble::{assemble, Assembly};
use crate::classify::classify_all;
use crate::config::RenderConfig;
use crate::contract::{AgeRecord, ClassifiedFile, HistoryQuery, SortMode};
use crate::download::discover;
use crate::error::RenderError;
use crate::history::resolve_ages;
use crate::order::order_files;

/// Renders the repository at `root` into an ordered [`Assembly`].
///
/// `paths` switches discovery to explicit mode.
pub async fn render<H>(
    config: &RenderConfig,
    root: &Path,
    paths: Option<&[PathBuf]>,
    history: &H,
) -> Result<Assembly, RenderError>
where
    H: HistoryQuery + ?Sized,
{
    info!(root = %root.display(), sort = ?config.sort, "[RENDER] Starting render pipeline");

    let candidates = discover(root, paths)?;
    let classified = classify_all(candidates, config.max_bytes);
    let (included, skipped): (Vec<ClassifiedFile>, Vec<ClassifiedFile>) = classified
        .into_iter()
        .partition(|f| f.classification.include());
    info!(
        included = included.len(),
        skipped = skipped.len(),
        "[RENDER] Classification complete"
    );

    let ages = match config.sort {
        SortMode::Age => {
            let wanted: BTreeSet<String> = included.iter().map(|f| f.path().to_string()).collect();
            resolve_ages(history, root, &wanted).await
        }
        SortMode::Filename => AgeRecord::new(),
    };

    let ordered = order_files(included, config.sort, &ages);
    let assembly = assemble(ordered, skipped);

    match serde_json::to_string(&assembly.summary) {
        Ok(json) => info!(summary = %json, "[RENDER] Render pipeline complete"),
        Err(_) => info!(summary = ?assembly.summary, "[RENDER] Render pipeline complete"),
    }
    Ok(assembly)
}
