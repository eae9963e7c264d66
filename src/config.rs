use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::DEFAULT_MAX_BYTES;
use crate::contract::SortMode;
use crate::output::OutputFormat;

/// Effective settings for one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Size limit for large-data formats, in bytes.
    pub max_bytes: u64,
    pub sort: SortMode,
    pub format: OutputFormat,
    /// Branch, tag or commit to check out after cloning.
    pub reference: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            sort: SortMode::default(),
            format: OutputFormat::default(),
            reference: None,
        }
    }
}

impl RenderConfig {
    pub fn trace_loaded(&self) {
        info!(
            max_bytes = self.max_bytes,
            sort = ?self.sort,
            format = ?self.format,
            reference = self.reference.as_deref().unwrap_or("HEAD"),
            "Loaded RenderConfig"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
