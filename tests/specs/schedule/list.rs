//! schedule:list specs
//!
//! Verify listing of declared events.

use crate::prelude::*;

#[test]
fn list_shows_expression_kind_and_description() {
    let temp = Project::empty();
    temp.task(
        "nightly.toml",
        r#"
namespace = "app"

[[command]]
run = "backup --full"
frequency = "daily"
at = "02:30"
description = "nightly backup"
"#,
    );

    temp.origin()
        .args(["schedule:list", "--directory", "tasks"])
        .passes()
        .stdout_has("30 2 * * *")
        .stdout_has("command")
        .stdout_has("app::nightly")
        .stdout_has("nightly backup");
}

#[test]
fn list_falls_back_to_kind_and_payload() {
    let temp = Project::empty();
    temp.task("marker.toml", EVERY_MINUTE_TASK);

    temp.origin()
        .args(["schedule:list", "--directory", "tasks"])
        .passes()
        .stdout_has("command:echo ran >> ran.txt");
}

#[test]
fn list_empty_directory() {
    let temp = Project::empty();

    temp.origin()
        .args(["schedule:list", "--directory", "tasks"])
        .passes()
        .stdout_eq("No events\n");
}

#[test]
fn list_skips_files_that_are_not_tasks() {
    let temp = Project::empty();
    temp.task("notes.toml", "description = \"just notes\"\n");
    temp.task("broken.toml", "[[command]\n");
    temp.task("readme.md", "[[command]]\nrun = \"nope\"\n");

    temp.origin()
        .args(["schedule:list", "--directory", "tasks"])
        .passes()
        .stdout_eq("No events\n");
}

#[test]
fn list_json_output_has_stable_ids() {
    let temp = Project::empty();
    temp.task("marker.toml", EVERY_MINUTE_TASK);

    let first = temp
        .origin()
        .args(["schedule:list", "--directory", "tasks", "--output", "json"])
        .passes()
        .stdout();
    let second = temp
        .origin()
        .args(["schedule:list", "--directory", "tasks", "--output", "json"])
        .passes()
        .stdout();

    let rows: Vec<serde_json::Value> = serde_json::from_str(&first).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"].as_str().unwrap().len(), 12);
    assert_eq!(rows[0]["expression"], "* * * * *");
    assert_eq!(rows[0]["kind"], "command");
    assert_eq!(rows[0]["task"], "marker");
    assert_eq!(first, second);
}

#[test]
fn list_reports_unknown_jobs() {
    let temp = Project::empty();
    temp.task("reports.toml", "[[job]]\nname = \"reports\"\n");

    temp.origin()
        .args(["schedule:list", "--directory", "tasks"])
        .fails()
        .stderr_has("unknown job 'reports'");
}

#[test]
fn list_rejects_missing_directory() {
    let temp = Project::empty();

    temp.origin()
        .args(["schedule:list", "--directory", "missing"])
        .fails()
        .stderr_has("not a task directory");
}
