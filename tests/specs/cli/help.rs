//! CLI help specs
//!
//! Verify the runner advertises its subcommands and flags.

use crate::prelude::*;

#[test]
fn help_lists_schedule_commands() {
    let temp = Project::empty();

    temp.origin()
        .args(["--help"])
        .passes()
        .stdout_has("schedule:run")
        .stdout_has("schedule:list");
}

#[test]
fn run_help_lists_flags() {
    let temp = Project::empty();

    temp.origin()
        .args(["schedule:run", "--help"])
        .passes()
        .stdout_has("--directory")
        .stdout_has("--id")
        .stdout_has("--lock-dir")
        .stdout_has("--maintenance-file")
        .stdout_has("--log-file");
}

#[test]
fn unknown_subcommand_fails() {
    let temp = Project::empty();

    temp.origin()
        .args(["schedule:frobnicate"])
        .fails()
        .stderr_has("unrecognized subcommand");
}
