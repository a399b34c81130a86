// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell process adapter

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use origin_core::process::{ProcessError, ProcessHandle, ProcessOptions, ProcessSpawner};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Runs command lines through `<shell> -c`
#[derive(Clone, Debug)]
pub struct ShellProcessSpawner {
    shell: String,
    env: Vec<(String, String)>,
}

impl Default for ShellProcessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellProcessSpawner {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
            env: Vec::new(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set a variable on every child, beneath any per-event `env`
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl ProcessSpawner for ShellProcessSpawner {
    fn start(
        &self,
        command: &str,
        options: &ProcessOptions,
    ) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command).stdin(Stdio::null());

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in self.env.iter().chain(&options.env) {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| ProcessError::Start {
            command: command.to_string(),
            source,
        })?;
        let pid = child.id();

        Ok(Box::new(ShellProcess { child, pid }))
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        // Signal 0 only checks existence; EPERM means it exists under another user
        match kill(Pid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

/// A child started by [`ShellProcessSpawner`]
#[derive(Debug)]
pub struct ShellProcess {
    child: Child,
    // Cached: tokio forgets the id once the child has been reaped
    pid: Option<u32>,
}

#[async_trait]
impl ProcessHandle for ShellProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_running(&mut self) -> Result<bool, ProcessError> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid = ?self.pid, %status, "child exited");
                Ok(false)
            }
            Ok(None) => Ok(true),
            Err(source) => Err(ProcessError::Wait {
                pid: self.pid.unwrap_or_default(),
                source,
            }),
        }
    }

    async fn wait(&mut self) -> Result<(), ProcessError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| ProcessError::Wait {
                pid: self.pid.unwrap_or_default(),
                source,
            })?;
        tracing::debug!(pid = ?self.pid, %status, "child exited");
        Ok(())
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
