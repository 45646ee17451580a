use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn shader_dir(root: &Path) -> std::path::PathBuf {
    let shaders = root.join("Shaders");
    fs::create_dir_all(&shaders).unwrap();
    fs::write(shaders.join("vertex.vs"), "void main() {}\n").unwrap();
    fs::write(shaders.join("waves.frag"), "void main() {}\n").unwrap();
    fs::write(shaders.join("aurora.frag"), "void main() {}\n").unwrap();
    fs::create_dir_all(shaders.join("drafts")).unwrap();
    shaders
}

fn shadart(config: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_shadart"));
    command.env("SHADART_CONFIG", config).env("RUST_LOG", "error");
    command
}

#[test]
fn list_prints_sorted_catalog_from_config() {
    let root = TempDir::new().unwrap();
    let shaders = shader_dir(root.path());
    let config = root.path().join("config.toml");
    fs::write(
        &config,
        format!("shader_dir = {:?}\n", shaders.display().to_string()),
    )
    .unwrap();

    let output = shadart(&config)
        .arg("list")
        .output()
        .expect("failed to run shadart list");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "0. aurora.frag\n1. waves.frag\n");
}

#[test]
fn list_honours_shader_dir_override() {
    let root = TempDir::new().unwrap();
    let shaders = shader_dir(root.path());
    let config = root.path().join("config.toml");
    fs::write(&config, "shader_dir = \"/nonexistent\"\n").unwrap();

    let output = shadart(&config)
        .args(["list", "--shader-dir"])
        .arg(&shaders)
        .output()
        .expect("failed to run shadart list");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("aurora.frag"));
    assert!(!stdout.contains("vertex.vs"));
    assert!(!stdout.contains("drafts"));
}

#[test]
fn list_reports_missing_directory() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let output = shadart(&config)
        .args(["list", "--shader-dir"])
        .arg(root.path().join("missing"))
        .output()
        .expect("failed to run shadart list");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to list shaders"));
}

#[test]
fn invalid_config_fails_fast() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("config.toml");
    fs::write(&config, "[window]\nwidth = 0\n").unwrap();

    let output = shadart(&config)
        .arg("list")
        .output()
        .expect("failed to run shadart list");

    assert!(!output.status.success());
}
