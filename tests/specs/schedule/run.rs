//! schedule:run specs
//!
//! Verify the tick dispatches due events from a task directory.

use crate::prelude::*;

fn event_id(temp: &Project, description: &str) -> String {
    let stdout = temp
        .origin()
        .args(["schedule:list", "--directory", "tasks", "--output", "json"])
        .passes()
        .stdout();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    rows.iter()
        .find(|row| row["description"] == description)
        .and_then(|row| row["id"].as_str())
        .unwrap()
        .to_string()
}

#[test]
fn run_dispatches_every_minute_command() {
    let temp = Project::empty();
    temp.task("marker.toml", EVERY_MINUTE_TASK);

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.wait_for("ran.txt"), "ran\n");
}

#[test]
fn run_skips_events_that_are_not_due() {
    let temp = Project::empty();
    temp.task(
        "never.toml",
        r#"
[[command]]
run = "echo ran > ran.txt"
cron = "0 0 30 2 *"
wait = true
"#,
    );

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.read("ran.txt"), "");
}

#[test]
fn run_respects_maintenance_mode() {
    let temp = Project::empty();
    temp.file("down", "{}");
    temp.task(
        "mixed.toml",
        r#"
[[command]]
run = "echo held > held.txt"
wait = true

[[command]]
run = "echo urgent > urgent.txt"
maintenance = true
wait = true
"#,
    );

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.read("held.txt"), "");
    assert_eq!(temp.read("urgent.txt"), "urgent\n");
}

#[test]
fn run_with_id_executes_that_event_only() {
    let temp = Project::empty();
    temp.task(
        "pair.toml",
        r#"
[[command]]
run = "echo first > first.txt"
cron = "0 0 30 2 *"
description = "first"
wait = true

[[command]]
run = "echo second > second.txt"
cron = "0 0 30 2 *"
description = "second"
wait = true
"#,
    );
    let id = event_id(&temp, "second");

    temp.origin()
        .args(["schedule:run", "--directory", "tasks", "--id", &id])
        .passes();

    assert_eq!(temp.read("first.txt"), "");
    assert_eq!(temp.read("second.txt"), "second\n");
}

#[test]
fn run_with_unknown_id_fails() {
    let temp = Project::empty();
    temp.task("marker.toml", EVERY_MINUTE_TASK);

    temp.origin()
        .args(["schedule:run", "--directory", "tasks", "--id", "ffffffffffff"])
        .fails()
        .stderr_has("no event with id 'ffffffffffff'");
}

#[test]
fn run_rejects_missing_directory() {
    let temp = Project::empty();

    temp.origin()
        .args(["schedule:run", "--directory", "missing"])
        .fails()
        .stderr_has("not a task directory");
}

#[test]
fn run_passes_arguments_and_redirects_output() {
    let temp = Project::empty();
    temp.task(
        "greet.toml",
        r#"
[[command]]
run = "echo"
arguments = ["hello world", 42]
output = "greet.log"
wait = true
"#,
    );

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.read("greet.log"), "hello world 42\n");
}

#[test]
fn run_waits_for_background_commands() {
    let temp = Project::empty();
    temp.task(
        "slow.toml",
        r#"
[[command]]
run = "sleep 0.2 && echo done"
output = "slow.log"
background = true
"#,
    );

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.read("slow.log"), "done\n");
}

#[test]
fn run_honours_live_siblings_in_lock_file() {
    let temp = Project::empty();
    temp.task(
        "single.toml",
        r#"
[[command]]
run = "echo ran > ran.txt"
description = "single"
limit = 1
wait = true
"#,
    );
    let id = event_id(&temp, "single");
    // pid 1 always exists
    temp.file(&format!("locks/origin-{}.lock", id), "[1]");

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.read("ran.txt"), "");
    assert_eq!(temp.read(&format!("locks/origin-{}.lock", id)), "[1]");
}

#[test]
fn run_prunes_dead_pids_from_lock_file() {
    let temp = Project::empty();
    temp.task(
        "single.toml",
        r#"
[[command]]
run = "echo ran > ran.txt"
description = "single"
limit = 1
wait = true
"#,
    );
    let id = event_id(&temp, "single");
    temp.file(&format!("locks/origin-{}.lock", id), "[2147483647]");

    temp.origin()
        .args(["schedule:run", "--directory", "tasks"])
        .passes();

    assert_eq!(temp.read("ran.txt"), "ran\n");
    assert_eq!(temp.read(&format!("locks/origin-{}.lock", id)), "[]");
}

#[test]
fn run_writes_logs_to_log_file() {
    let temp = Project::empty();
    temp.task("marker.toml", EVERY_MINUTE_TASK);

    temp.origin()
        .args([
            "schedule:run",
            "--directory",
            "tasks",
            "--log-file",
            "logs/origin.log",
        ])
        .passes();

    assert!(temp.read("logs/origin.log").contains("tick complete"));
}
