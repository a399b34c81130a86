// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background process adapter
//!
//! The scheduler never talks to the OS directly: it starts children and
//! probes process liveness through [`ProcessSpawner`], so tests can swap in
//! [`FakeProcessSpawner`].

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessHandle, FakeProcessSpawner, StartedProcess};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start '{command}': {source}")]
    Start {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for pid {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("process started without a pid: {0}")]
    NoPid(String),
}

/// Options applied when starting a child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// A started child process
#[async_trait]
pub trait ProcessHandle: Send {
    fn pid(&self) -> Option<u32>;

    /// Non-blocking check; reaps the child once it has exited
    fn is_running(&mut self) -> Result<bool, ProcessError>;

    /// Block until the child exits
    async fn wait(&mut self) -> Result<(), ProcessError>;
}

/// Starts shell command lines as detached children
pub trait ProcessSpawner: Send + Sync {
    /// Start `command` (a full shell line) in the background
    fn start(
        &self,
        command: &str,
        options: &ProcessOptions,
    ) -> Result<Box<dyn ProcessHandle>, ProcessError>;

    /// Whether any process with this pid currently exists
    fn is_alive(&self, pid: u32) -> bool;
}
