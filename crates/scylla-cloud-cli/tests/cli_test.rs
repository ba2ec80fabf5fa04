use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const PROJECT: &str = r#"
provider {
    token "test-token"
}

cluster "orders" {
    region "us-east-1"
    node-count 3
    node-type "i3.large"
}
"#;

/// Command isolated from the caller's environment and global config
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scylla-cloud").unwrap();
    cmd.current_dir(dir)
        .env_remove("SCYLLA_CLOUD_CONFIG")
        .env_remove("SCYLLA_CLOUD_TOKEN")
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn test_schema_lists_attributes() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("scylla_cluster"))
        .stdout(predicate::str::contains("node_count"))
        .stdout(predicate::str::contains("force-new"));
}

#[test]
fn test_schema_json_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli(dir.path()).args(["schema", "--json"]).output().unwrap();
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = schema
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["name"].as_str())
        .collect();
    assert!(names.contains(&"cidr_block"));
    assert!(names.contains(&"request_id"));
}

#[test]
fn test_plan_for_new_project() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scylla.kdl"), PROJECT).unwrap();

    cli(dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Create cluster orders"))
        .stdout(predicate::str::contains("1 to create"));
}

#[test]
fn test_plan_rejects_unknown_attribute() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("scylla.kdl"),
        r#"cluster "orders" { replicas 3 }"#,
    )
    .unwrap();

    cli(dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("replicas"));
}

#[test]
fn test_plan_without_project_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cli(dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}
