//! Shared helpers for CLI specs.
//!
//! A `Project` is a temp directory holding a `tasks/` directory, a lock
//! directory and a maintenance flag path, so specs never touch shared state.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use predicates::prelude::*;

/// A task file with one every-minute command that writes `ran.txt`
pub const EVERY_MINUTE_TASK: &str = r#"
description = "touch a marker"

[[command]]
run = "echo ran >> ran.txt"
"#;

pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(project.tasks()).unwrap();
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tasks(&self) -> PathBuf {
        self.path().join("tasks")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.path().join("locks")
    }

    pub fn maintenance_file(&self) -> PathBuf {
        self.path().join("down")
    }

    /// Write a file relative to the project root
    pub fn file(&self, relative: &str, content: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Write a task file into `tasks/`
    pub fn task(&self, name: &str, content: &str) {
        self.file(&format!("tasks/{}", name), content);
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).unwrap_or_default()
    }

    /// `origin` with the project's isolated lock dir and maintenance flag,
    /// running from the project root
    pub fn origin(&self) -> CliBuilder {
        let mut cmd = Command::cargo_bin("origin").unwrap();
        cmd.current_dir(self.path())
            .env("ORIGIN_LOCK_DIR", self.lock_dir())
            .env("ORIGIN_MAINTENANCE_FILE", self.maintenance_file())
            .env_remove("ORIGIN_RUNNER")
            .env_remove("RUST_LOG");
        CliBuilder { cmd }
    }

    /// Poll until `relative` exists with content, for output written by
    /// detached children
    pub fn wait_for(&self, relative: &str) -> String {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let content = self.read(relative);
            if !content.is_empty() || Instant::now() > deadline {
                return content;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> RunAssert {
        RunAssert {
            assert: self.cmd.assert().failure(),
        }
    }
}

pub struct RunAssert {
    assert: assert_cmd::assert::Assert,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(expected)),
        }
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(expected)),
        }
    }
}
