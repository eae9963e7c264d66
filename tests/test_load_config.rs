use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use repo_flatten::cli::apply_flags;
use repo_flatten::config::RenderConfig;
use repo_flatten::contract::SortMode;
use repo_flatten::load_config::{load_config, ENV_MAX_BYTES, ENV_SORT};
use repo_flatten::output::OutputFormat;

fn clear_env() {
    env::remove_var(ENV_MAX_BYTES);
    env::remove_var(ENV_SORT);
}

/// No file and no environment gives the built-in defaults.
#[test]
#[serial]
fn test_load_config_defaults() {
    clear_env();
    let config = load_config(None).expect("Config should load");
    assert_eq!(config, RenderConfig::default());
    assert_eq!(config.max_bytes, 51_200);
    assert_eq!(config.sort, SortMode::Age);
    assert_eq!(config.format, OutputFormat::Html);
}

/// YAML values replace defaults, the environment replaces YAML.
#[test]
#[serial]
fn test_load_config_yaml_then_env() {
    clear_env();
    let config_yaml = r#"
max_bytes: 1000
sort: filename
format: cxml
reference: v1.2.0
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(Some(config_file.path())).expect("Config should load");
    assert_eq!(config.max_bytes, 1000);
    assert_eq!(config.sort, SortMode::Filename);
    assert_eq!(config.format, OutputFormat::Cxml);
    assert_eq!(config.reference.as_deref(), Some("v1.2.0"));

    env::set_var(ENV_MAX_BYTES, "2048");
    env::set_var(ENV_SORT, "age");
    let config = load_config(Some(config_file.path())).expect("Config should load");
    clear_env();

    assert_eq!(config.max_bytes, 2048);
    assert_eq!(config.sort, SortMode::Age);
    assert_eq!(config.format, OutputFormat::Cxml);
}

/// Command-line flags win over everything that was loaded.
#[test]
#[serial]
fn test_flags_override_loaded_config() {
    clear_env();
    let mut config = load_config(None).unwrap();
    apply_flags(&mut config, Some("main".into()), None, Some(SortMode::Filename), Some(10));

    assert_eq!(config.reference.as_deref(), Some("main"));
    assert_eq!(config.sort, SortMode::Filename);
    assert_eq!(config.max_bytes, 10);
    assert_eq!(config.format, OutputFormat::Html);
}

#[test]
#[serial]
fn test_load_config_errors_on_invalid_env() {
    clear_env();
    env::set_var(ENV_MAX_BYTES, "lots");
    let err = load_config(None).unwrap_err();
    clear_env();
    assert!(err.to_string().contains(ENV_MAX_BYTES), "got: {err}");

    env::set_var(ENV_SORT, "random");
    let err = load_config(None).unwrap_err();
    clear_env();
    assert!(err.to_string().contains(ENV_SORT), "got: {err}");
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_config(Some(config_file.path())).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "max_bytez: 10\n").unwrap();
    assert!(load_config(Some(config_file.path())).is_err());
}

#[test]
#[serial]
fn test_load_config_empty_file_is_defaults() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    let config = load_config(Some(config_file.path())).unwrap();
    assert_eq!(config, RenderConfig::default());
}

#[test]
#[serial]
fn test_load_config_missing_file() {
    clear_env();
    let err = load_config(Some(std::path::Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
