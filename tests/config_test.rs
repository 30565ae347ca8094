//! Integration tests for Settings loading with layered precedence.
//!
//! Defaults → global file: REPLACE per field that the file specifies.
//! DEPOT_* environment overrides are not exercised here; they are process-wide.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use depot::application::services::DEFAULT_PORT;
use depot::config::Settings;

// ============================================================
// Settings::load_from() tests
// ============================================================

#[test]
fn given_missing_global_file_when_load_then_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depot.toml");

    // Act
    let settings = Settings::load_from(Some(&path)).unwrap();

    // Assert
    assert_eq!(settings.default_port, DEFAULT_PORT);
    assert_eq!(settings.config_name, None);
    assert!(settings.enviro_file.ends_with(".p4enviro"));
}

#[test]
fn given_global_file_with_scalars_when_load_then_specified_fields_replace_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depot.toml");
    fs::write(
        &path,
        r#"
backend = "/opt/depot/bin/p4"
config_name = ".p4config"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_from(Some(&path)).unwrap();

    // Assert
    assert_eq!(settings.backend, "/opt/depot/bin/p4");
    assert_eq!(settings.config_name.as_deref(), Some(".p4config"));
    assert_eq!(settings.default_port, DEFAULT_PORT);
}

#[test]
fn given_tilde_in_enviro_file_when_load_then_home_is_expanded() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depot.toml");
    fs::write(&path, "enviro_file = \"~/.config/depot/enviro\"\n").unwrap();

    // Act
    let settings = Settings::load_from(Some(&path)).unwrap();

    // Assert
    assert!(!settings.enviro_file.starts_with("~"));
    assert!(settings.enviro_file.ends_with(PathBuf::from(".config/depot/enviro")));
}

#[test]
fn given_malformed_toml_when_load_then_config_error_names_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depot.toml");
    fs::write(&path, "backend = [unterminated\n").unwrap();

    // Act
    let err = Settings::load_from(Some(&path)).unwrap_err();

    // Assert
    assert!(err.to_string().contains("depot.toml"));
}

#[test]
fn given_loaded_settings_when_rendering_then_toml_round_trips() {
    // Arrange
    let settings = Settings {
        default_port: "ssl:depot.example:1666".into(),
        ..Settings::default()
    };

    // Act
    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    // Assert
    assert_eq!(parsed, settings);
}
