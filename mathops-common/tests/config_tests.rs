//! Configuration file resolution and loading
//!
//! Tests touching `MATHOPS_CONFIG` are `#[serial]` so they never race on the
//! process environment.

use mathops_common::config::{load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use mathops_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_argument_wins_over_environment() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/mathops-from-env.toml");

    let cli = PathBuf::from("/tmp/mathops-from-cli.toml");
    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_used_without_cli_argument() {
    let file = config_file("dry_run = false\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    assert_eq!(resolve_config_path(None), Some(file.path().to_path_buf()));
    let config = load_config(None).unwrap();
    assert!(!config.dry_run);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);

    let missing = PathBuf::from("/nonexistent/mathops/config.toml");
    let result = load_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_environment_named_missing_file_is_an_error() {
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/mathops/from-env.toml");

    let result = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    match result {
        Err(Error::Config(message)) => assert!(message.contains("from-env.toml")),
        other => panic!("expected a config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_loads_all_sections() {
    env::remove_var(CONFIG_ENV_VAR);

    let file = config_file(
        r#"
        dry_run = false

        [databases]
        primary = "/srv/mathops/primary.db"
        ods = "/srv/mathops/ods.db"
        live = "/srv/mathops/live.db"

        [logging]
        level = "debug"
        "#,
    );

    let config = load_config(Some(file.path())).unwrap();
    assert!(!config.dry_run);
    assert_eq!(config.databases.primary, PathBuf::from("/srv/mathops/primary.db"));
    assert_eq!(config.databases.live, PathBuf::from("/srv/mathops/live.db"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_empty_file_yields_defaults() {
    env::remove_var(CONFIG_ENV_VAR);

    let file = config_file("");
    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config, TomlConfig::default());
}
