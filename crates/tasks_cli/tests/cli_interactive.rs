use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasks-{nanos}-{file_name}"))
}

fn run_interactive(input: &str) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_tasks");
    let store_path = temp_path("cli-interactive.json");

    let mut child = Command::new(exe)
        .env("TASKS_STORE_PATH", &store_path)
        .env("TASKS_CONFIG_PATH", store_path.with_extension("config.json"))
        .env_remove("TASKS_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");

    std::fs::remove_file(&store_path).ok();
    output
}

#[test]
fn interactive_help_shows_usage() {
    let output = run_interactive("help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_question_mark_shows_usage() {
    let output = run_interactive("?\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_prints_error() {
    let output = run_interactive("nope\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_session_keeps_state_between_commands() {
    let output = run_interactive("add \"buy milk\"\nadd \"walk dog\"\nlist\nquit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: buy milk"));
    assert!(stdout.contains("2 tasks, 0 completed, 2 pending"));
}

#[test]
fn interactive_rejects_config_overrides() {
    let output = run_interactive("list --config-override log=debug\nexit\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("only accepted on the command line"));
}
