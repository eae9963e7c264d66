/// `load_config` module: builds the effective [`RenderConfig`] from an optional YAML file and
/// environment overrides.
///
/// Precedence, lowest first: built-in defaults, YAML file, environment. Command-line flags are
/// applied on top by the CLI.
///
/// # Environment
/// - `REPO_FLATTEN_MAX_BYTES`: size limit for large-data formats (integer bytes)
/// - `REPO_FLATTEN_SORT`: `age` or `filename`
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::config::RenderConfig;
use crate::contract::SortMode;

pub const ENV_MAX_BYTES: &str = "REPO_FLATTEN_MAX_BYTES";
pub const ENV_SORT: &str = "REPO_FLATTEN_SORT";

/// Parses a YAML config file. Missing keys keep their defaults; unknown keys are rejected.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<RenderConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    // An empty document deserializes to unit, not to a struct with defaults.
    if config_content.trim().is_empty() {
        return Ok(RenderConfig::default());
    }

    match serde_yaml::from_str::<RenderConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Applies `REPO_FLATTEN_*` environment overrides onto `config`.
pub fn apply_env_overrides(config: &mut RenderConfig) -> Result<()> {
    if let Ok(var) = std::env::var(ENV_MAX_BYTES) {
        config.max_bytes = match var.trim().parse::<u64>() {
            Ok(max) => max,
            Err(e) => {
                error!(error = ?e, var = ?var, "{} must be a non-negative integer", ENV_MAX_BYTES);
                anyhow::bail!("{ENV_MAX_BYTES} must be a non-negative integer: {e}");
            }
        };
        info!(max_bytes = config.max_bytes, "{} found in env", ENV_MAX_BYTES);
    }

    if let Ok(var) = std::env::var(ENV_SORT) {
        config.sort = match var.parse::<SortMode>() {
            Ok(sort) => sort,
            Err(e) => {
                error!(error = %e, "{} has an unsupported value", ENV_SORT);
                anyhow::bail!("{ENV_SORT}: {e}");
            }
        };
        info!(sort = ?config.sort, "{} found in env", ENV_SORT);
    }

    Ok(())
}

/// Defaults, then the optional YAML file, then the environment.
pub fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => RenderConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}
