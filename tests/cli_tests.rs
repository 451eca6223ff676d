mod common;

use common::{create, engine_over};
use resx::storage::FileStore;
use serde_json::{json, Value};
use std::process::Command;
use std::sync::Arc;

fn resx() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_resx"));
    cmd.env_remove("RESX_CONFIG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run resx");
    assert!(
        output.status.success(),
        "resx failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_components_command_prints_catalog() {
    let catalog = stdout_json(resx().arg("components"));
    assert_eq!(catalog["TimeRange"]["uri"], json!("/code/TimeRange"));
    assert!(catalog.get("TestComponent").is_some());
}

#[test]
fn test_resources_command_reads_storage() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_over(Arc::new(FileStore::open(dir.path()).unwrap()));
    create(
        &engine,
        "/code/Db",
        json!({"account_name": "sales", "account_password": "pw"}),
        "Sales",
        false,
    );
    create(&engine, "/code/Db", json!({"account_password": "pw"}), "DbPw", true);

    let plain = stdout_json(resx().arg("resources").arg("--storage").arg(dir.path()));
    assert_eq!(plain["Sales"]["uri"], json!("/resource/Sales"));
    assert!(plain.get("DbPw").is_none());

    let partial = stdout_json(
        resx()
            .arg("resources")
            .arg("--partial")
            .arg("--storage")
            .arg(dir.path()),
    );
    assert_eq!(partial["DbPw"]["uri"], json!("/specialized/DbPw"));
}

#[test]
fn test_missing_config_file_fails() {
    let output = resx()
        .args(["components", "--config", "/nonexistent/resx.yaml"])
        .output()
        .expect("run resx");
    assert!(!output.status.success());
}
