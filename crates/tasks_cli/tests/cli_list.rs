use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasks-{nanos}-{file_name}"))
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasks"))
        .args(args)
        .env("TASKS_STORE_PATH", store_path)
        .env("TASKS_CONFIG_PATH", store_path.with_extension("config.json"))
        .env_remove("TASKS_LOG")
        .output()
        .expect("failed to run tasks")
}

fn write_raw_state(store_path: &Path, raw: &str) {
    let storage = serde_json::json!({ "tasks-state": raw });
    std::fs::write(store_path, serde_json::to_string_pretty(&storage).unwrap()).unwrap();
}

#[test]
fn list_plain_text_shows_table_and_summary() {
    let store_path = temp_path("cli-list.json");
    write_raw_state(
        &store_path,
        r#"{"todos":[{"id":1,"text":"buy milk","completed":true},{"id":2,"text":"walk dog","completed":false}],"length":2,"completed":1,"pending":1}"#,
    );

    let output = run(&store_path, &["list"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("buy milk"));
    assert!(stdout.contains("walk dog"));
    assert!(stdout.contains("2 tasks, 1 completed, 1 pending"));
}

#[test]
fn list_json_returns_state() {
    let store_path = temp_path("cli-list-json.json");
    write_raw_state(
        &store_path,
        r#"{"todos":[{"id":1,"text":"buy milk","completed":false}],"length":1,"completed":0,"pending":1}"#,
    );

    let output = run(&store_path, &["list", "--json"]);
    std::fs::remove_file(&store_path).ok();

    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["length"], 1);
    assert_eq!(state["todos"][0]["id"], 1);
}

#[test]
fn list_with_no_storage_is_empty() {
    let store_path = temp_path("cli-list-empty.json");
    let output = run(&store_path, &["list", "--json"]);

    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        state,
        serde_json::json!({ "todos": [], "length": 0, "completed": 0, "pending": 0 })
    );
}

#[test]
fn list_with_tampered_state_falls_back_to_empty_and_logs() {
    let store_path = temp_path("cli-list-tampered.json");
    write_raw_state(&store_path, r#"{"todos": "not-an-array"}"#);

    let output = run(&store_path, &["list", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["length"], 0);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("discarding persisted task state"));
}

#[test]
fn check_command_reports_invalid_state() {
    let store_path = temp_path("cli-check-invalid.json");
    write_raw_state(&store_path, r#"{"todos": "not-an-array"}"#);

    let output = run(&store_path, &["check"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_data"));
}

#[test]
fn check_command_reports_valid_state() {
    let store_path = temp_path("cli-check-valid.json");
    write_raw_state(
        &store_path,
        r#"{"todos":[],"length":0,"completed":0,"pending":0}"#,
    );

    let output = run(&store_path, &["check"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Stored task state is valid"));
}
