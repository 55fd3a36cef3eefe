use std::process::Command;
use tempfile::TempDir;

fn embedex(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_embedex"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let output = embedex(temp_path)
        .arg("init")
        .output()
        .expect("Failed to run init command");

    assert!(output.status.success());

    let config_path = temp_path.join(".embedex/settings.toml");
    assert!(config_path.exists());

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[embedding]"));
    assert!(content.contains("[chunking]"));
    assert!(content.contains("bind = \"127.0.0.1:8000\""));
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();
    let config_path = temp_path.join(".embedex/settings.toml");

    assert!(embedex(temp_path).arg("init").status().unwrap().success());
    std::fs::write(&config_path, "version = 7\n").unwrap();

    let output = embedex(temp_path).arg("init").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("already exists"), "{stderr}");
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "version = 7\n");

    let output = embedex(temp_path).args(["init", "--force"]).output().unwrap();
    assert!(output.status.success());
    assert!(std::fs::read_to_string(&config_path).unwrap().contains("version = 1"));
}

#[test]
fn test_config_command() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let config_dir = temp_path.join(".embedex");
    std::fs::create_dir_all(&config_dir).unwrap();

    let config_content = r#"
version = 2

[server]
bind = "0.0.0.0:9100"

[chunking]
strategy = "sections"
chunk_size = 900
overlap = 90
"#;
    std::fs::write(config_dir.join("settings.toml"), config_content).unwrap();

    // Settings are found from a nested working directory too
    let nested = temp_path.join("a/b");
    std::fs::create_dir_all(&nested).unwrap();

    let output = embedex(&nested)
        .arg("config")
        .output()
        .expect("Failed to run config command");

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains("bind = \"0.0.0.0:9100\""));
    assert!(stdout.contains("strategy = \"sections\""));
    assert!(stdout.contains("chunk_size = 900"));
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let output = embedex(temp_path)
        .arg("config")
        .env("EMBEDEX_SERVER__BIND", "127.0.0.1:9999")
        .env("EMBEDEX_CHUNKING__CHUNK_SIZE", "2000")
        .env("EMBEDEX_EMBEDDING__BACKEND", "openai")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("bind = \"127.0.0.1:9999\""));
    assert!(stdout.contains("chunk_size = 2000"));
    assert!(stdout.contains("backend = \"openai\""));
}

#[test]
fn test_explicit_config_path() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();
    std::fs::write(temp_path.join("custom.toml"), "[ingest]\ncontent_dir = \"docs\"\n").unwrap();

    let output = embedex(temp_path)
        .args(["--config", "custom.toml", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("content_dir = \"docs\""));

    let output = embedex(temp_path)
        .args(["--config", "missing.toml", "config"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("not found"));
}

#[test]
fn test_invalid_chunking_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let output = embedex(temp_path)
        .arg("config")
        .env("EMBEDEX_CHUNKING__OVERLAP", "5000")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("overlap"), "{stderr}");
}
