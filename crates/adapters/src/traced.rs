// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use async_trait::async_trait;
use origin_core::process::{ProcessError, ProcessHandle, ProcessOptions, ProcessSpawner};
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessSpawner
#[derive(Clone)]
pub struct TracedProcessSpawner<S> {
    inner: S,
}

impl<S> TracedProcessSpawner<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: ProcessSpawner> ProcessSpawner for TracedProcessSpawner<S> {
    fn start(
        &self,
        command: &str,
        options: &ProcessOptions,
    ) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let span = tracing::info_span!("process.start", command);
        let _guard = span.enter();

        tracing::debug!(
            cwd = ?options.cwd,
            env_count = options.env.len(),
            "starting"
        );

        // Precondition: cwd must exist
        if let Some(cwd) = &options.cwd {
            if !cwd.is_dir() {
                tracing::error!(cwd = %cwd.display(), "working directory does not exist");
                return Err(ProcessError::Start {
                    command: command.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("working directory does not exist: {}", cwd.display()),
                    ),
                });
            }
        }

        let start = std::time::Instant::now();
        let result = self.inner.start(command, options);
        let elapsed = start.elapsed();

        match result {
            Ok(handle) => {
                tracing::info!(
                    pid = ?handle.pid(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "process started"
                );
                Ok(Box::new(TracedProcessHandle::new(handle)))
            }
            Err(e) => {
                tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "start failed"
                );
                Err(e)
            }
        }
    }

    fn is_alive(&self, pid: u32) -> bool {
        let alive = self.inner.is_alive(pid);
        tracing::trace!(pid, alive, "probed");
        alive
    }
}

/// Handle wrapper that logs exits and wait timings
pub struct TracedProcessHandle {
    inner: Box<dyn ProcessHandle>,
    started: std::time::Instant,
}

impl TracedProcessHandle {
    pub fn new(inner: Box<dyn ProcessHandle>) -> Self {
        Self {
            inner,
            started: std::time::Instant::now(),
        }
    }
}

#[async_trait]
impl ProcessHandle for TracedProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.inner.pid()
    }

    fn is_running(&mut self) -> Result<bool, ProcessError> {
        let result = self.inner.is_running();
        match &result {
            Ok(true) => tracing::trace!(pid = ?self.pid(), "still running"),
            Ok(false) => tracing::info!(
                pid = ?self.pid(),
                runtime_ms = self.started.elapsed().as_millis() as u64,
                "process exited"
            ),
            Err(e) => tracing::warn!(pid = ?self.pid(), error = %e, "poll failed"),
        }
        result
    }

    async fn wait(&mut self) -> Result<(), ProcessError> {
        let span = tracing::info_span!("process.wait", pid = ?self.pid());
        let result = self.inner.wait().instrument(span.clone()).await;
        let _guard = span.enter();
        match &result {
            Ok(()) => tracing::info!(
                runtime_ms = self.started.elapsed().as_millis() as u64,
                "process exited"
            ),
            Err(e) => tracing::error!(error = %e, "wait failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
