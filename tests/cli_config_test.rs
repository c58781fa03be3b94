use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn tablesync(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tablesync"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tablesync")
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = tablesync(temp_dir.path(), &["init"]);
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".tablesync/settings.toml");
    assert!(config_path.exists());

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[watcher]"));
    assert!(content.contains("[storage]"));

    // A second init without --force refuses to overwrite
    let output = tablesync(temp_dir.path(), &["init"]);
    assert!(!output.status.success());
    let output = tablesync(temp_dir.path(), &["init", "--force"]);
    assert!(output.status.success());
}

#[test]
fn test_config_command() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".tablesync");
    std::fs::create_dir_all(&config_dir).unwrap();

    let config_content = r#"
version = 2
[watcher]
debounce_ms = 750
"#;
    std::fs::write(config_dir.join("settings.toml"), config_content).unwrap();

    let output = tablesync(temp_dir.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains("debounce_ms = 750"));
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = TempDir::new().unwrap();
    let output = tablesync(temp_dir.path(), &["config", "--config", "missing.toml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("config file not found"));
}

#[test]
fn test_sync_then_export_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(tablesync(root, &["init"]).status.success());

    std::fs::create_dir_all(root.join("data")).unwrap();
    std::fs::write(
        root.join("data/equipment.csv"),
        "name,serial\nPump1,SN001\nPump2,SN002\n",
    )
    .unwrap();

    let output = tablesync(root, &["sync", "data/equipment.csv"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(root.join(".tablesync/tables/equipment.json").exists());

    let output = tablesync(root, &["export", "equipment", "--format", "csv", "--stdout"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"name,serial\nPump1,SN001\nPump2,SN002\n");

    let output = tablesync(root, &["export", "equipment", "--format", "json"]);
    assert!(output.status.success());
    let exported: Vec<_> = std::fs::read_dir(root.join("exports"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(exported.len(), 1);
    assert!(exported[0].starts_with("equipment_"));
    assert!(exported[0].ends_with(".json"));

    let output = tablesync(root, &["clear", "equipment"]);
    assert!(output.status.success());
    let output = tablesync(root, &["export", "equipment", "--format", "json", "--stdout"]);
    assert_eq!(output.stdout, b"[]");
}

#[test]
fn test_sync_rejects_unknown_extension() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(tablesync(root, &["init"]).status.success());
    std::fs::write(root.join("notes.txt"), "hello").unwrap();

    let output = tablesync(root, &["sync", "notes.txt"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Not a data file"));
}
