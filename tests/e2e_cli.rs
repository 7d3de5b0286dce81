//! CLI end-to-end tests
//!
//! Tests for the webpforge command-line interface. None of them need `cwebp`.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the webpforge binary
#[allow(deprecated)]
fn webpforge_cmd() -> Command {
    Command::cargo_bin("webpforge").unwrap()
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = webpforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = webpforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("webpforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = webpforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_convert_help() {
    let mut cmd = webpforge_cmd();
    cmd.args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Convert a single original"));
}

#[test]
fn test_cli_convert_requires_file() {
    let mut cmd = webpforge_cmd();
    cmd.arg("convert")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = webpforge_cmd();
    cmd.arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("cwebp"));
}

#[test]
fn test_cli_validate_defaults() {
    let dir = tempdir().unwrap();
    let mut cmd = webpforge_cmd();
    cmd.current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("Quality: 82"));
}

#[test]
fn test_cli_validate_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("webpforge.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[source]
base_dir = "{}"
extensions = ["jpg", "svg"]

[quality]
webp = 75

[schedule]
time = "04:30"
recurrence = "weekly"
"#,
            dir.path().display()
        ),
    )
    .unwrap();

    let mut cmd = webpforge_cmd();
    cmd.arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Extensions: jpg\n"))
        .stdout(predicate::str::contains("Quality: 75"))
        .stdout(predicate::str::contains("04:30 (Weekly)"));
}

#[test]
fn test_cli_validate_rejects_bad_quality() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "[quality]\nwebp = 0\n").unwrap();

    let mut cmd = webpforge_cmd();
    cmd.arg("validate").arg(&config_path).assert().failure();
}

#[test]
fn test_cli_validate_missing_file() {
    let mut cmd = webpforge_cmd();
    cmd.args(["validate", "/nonexistent/webpforge.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[cfg(unix)]
#[test]
fn test_cli_delete_removes_fallback_link() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("photo.jpg");
    let artifact = dir.path().join("photo.webp");
    std::os::unix::fs::symlink("photo.jpg", &artifact).unwrap();

    let mut cmd = webpforge_cmd();
    cmd.arg("delete")
        .arg(&original)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed artifact"));

    assert!(fs::symlink_metadata(&artifact).is_err());
}

#[test]
fn test_cli_delete_without_artifact() {
    let dir = tempdir().unwrap();
    let mut cmd = webpforge_cmd();
    cmd.arg("delete")
        .arg(dir.path().join("photo.jpg"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No artifact"));
}

#[test]
fn test_cli_metadata_import() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("meta.db");
    let config_path = dir.path().join("webpforge.toml");
    fs::write(
        &config_path,
        format!(
            "[metadata]\nbackend = \"sqlite\"\npath = \"{}\"\n",
            db_path.display()
        ),
    )
    .unwrap();

    let json_path = dir.path().join("meta.json");
    fs::write(
        &json_path,
        r#"{
  "2024/05/photo.jpg": {"sizes": {"thumbnail": {"file": "photo-150x150.jpg", "width": 150, "height": 150}}},
  "2024/05/logo.png": {}
}"#,
    )
    .unwrap();

    let mut cmd = webpforge_cmd();
    cmd.arg("--config")
        .arg(&config_path)
        .args(["metadata", "import"])
        .arg(&json_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 records"));

    let store = webpforge_db::SqliteMetadataStore::open(&db_path).unwrap();
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn test_cli_metadata_import_requires_sqlite_backend() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("meta.json");
    fs::write(&json_path, "{}").unwrap();

    let mut cmd = webpforge_cmd();
    cmd.current_dir(dir.path())
        .args(["metadata", "import"])
        .arg(&json_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sqlite"));
}
