// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process spawner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessError, ProcessHandle, ProcessOptions, ProcessSpawner};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const FIRST_FAKE_PID: u32 = 40_000;

/// A recorded call to [`ProcessSpawner::start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedProcess {
    pub pid: u32,
    pub command: String,
    pub options: ProcessOptions,
}

#[derive(Debug, Default)]
struct FakeState {
    next_pid: u32,
    started: Vec<StartedProcess>,
    running: HashSet<u32>,
    alive: HashSet<u32>,
    waited: Vec<u32>,
    polls_until_exit: usize,
    fail_start: bool,
}

/// Fake spawner: children never touch the OS and exit when polled
/// `polls_until_exit` times, when waited on, or when [`Self::finish`] is called
#[derive(Clone, Debug)]
pub struct FakeProcessSpawner {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeProcessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcessSpawner {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                next_pid: FIRST_FAKE_PID,
                ..FakeState::default()
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Children report running for this many polls before exiting
    pub fn with_polls_until_exit(self, polls: usize) -> Self {
        self.state().polls_until_exit = polls;
        self
    }

    /// Make every subsequent start fail
    pub fn fail_starts(&self) {
        self.state().fail_start = true;
    }

    /// Mark an unrelated pid (e.g. one written to a lock-file) as alive
    pub fn set_alive(&self, pid: u32) {
        self.state().alive.insert(pid);
    }

    /// Mark a pid as gone
    pub fn kill(&self, pid: u32) {
        let mut state = self.state();
        state.alive.remove(&pid);
        state.running.remove(&pid);
    }

    /// Force a started child to exit
    pub fn finish(&self, pid: u32) {
        self.state().running.remove(&pid);
    }

    /// All recorded starts in order
    pub fn started(&self) -> Vec<StartedProcess> {
        self.state().started.clone()
    }

    /// Command lines of all recorded starts in order
    pub fn commands(&self) -> Vec<String> {
        self.state()
            .started
            .iter()
            .map(|p| p.command.clone())
            .collect()
    }

    /// Pids that were explicitly waited on
    pub fn waited(&self) -> Vec<u32> {
        self.state().waited.clone()
    }

    /// Pids of children that have not exited yet
    pub fn running(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.state().running.iter().copied().collect();
        pids.sort_unstable();
        pids
    }
}

impl ProcessSpawner for FakeProcessSpawner {
    fn start(
        &self,
        command: &str,
        options: &ProcessOptions,
    ) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let mut state = self.state();
        if state.fail_start {
            return Err(ProcessError::Start {
                command: command.to_string(),
                source: std::io::Error::other("fake start failure"),
            });
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.running.insert(pid);
        state.started.push(StartedProcess {
            pid,
            command: command.to_string(),
            options: options.clone(),
        });

        Ok(Box::new(FakeProcessHandle {
            pid,
            polls_left: state.polls_until_exit,
            state: Arc::clone(&self.state),
        }))
    }

    fn is_alive(&self, pid: u32) -> bool {
        let state = self.state();
        pid == std::process::id() || state.running.contains(&pid) || state.alive.contains(&pid)
    }
}

/// Handle to a fake child
#[derive(Debug)]
pub struct FakeProcessHandle {
    pid: u32,
    polls_left: usize,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl ProcessHandle for FakeProcessHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn is_running(&mut self) -> Result<bool, ProcessError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.running.contains(&self.pid) {
            return Ok(false);
        }
        if self.polls_left == 0 {
            state.running.remove(&self.pid);
            return Ok(false);
        }
        self.polls_left -= 1;
        Ok(true)
    }

    async fn wait(&mut self) -> Result<(), ProcessError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.running.remove(&self.pid);
        state.waited.push(self.pid);
        Ok(())
    }
}
