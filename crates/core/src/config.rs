// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler configuration and runtime context

use crate::clock::{Clock, SystemClock};
use crate::process::ProcessSpawner;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding [`ScheduleConfig::lock_dir`]
pub const LOCK_DIR_ENV: &str = "ORIGIN_LOCK_DIR";
/// Environment variable setting [`ScheduleConfig::maintenance_file`]
pub const MAINTENANCE_FILE_ENV: &str = "ORIGIN_MAINTENANCE_FILE";
/// Environment variable overriding [`ScheduleConfig::runner`]
pub const RUNNER_ENV: &str = "ORIGIN_RUNNER";

/// Subcommand a background callable re-invokes the runner with
pub const RUN_SUBCOMMAND: &str = "schedule:run";

/// Scheduler settings, passed explicitly at construction
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Directory holding the per-event PID lock-files
    pub lock_dir: PathBuf,
    /// Maintenance mode is on while this file exists
    pub maintenance_file: Option<PathBuf>,
    /// Binary used to re-invoke the scheduler for background callables;
    /// `None` means the current executable
    pub runner: Option<PathBuf>,
    /// How often the tick polls tracked background processes
    pub poll_interval: Duration,
    /// Shell that command lines are handed to
    pub shell: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lock_dir: std::env::temp_dir(),
            maintenance_file: None,
            runner: None,
            poll_interval: Duration::from_millis(250),
            shell: "sh".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ORIGIN_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(LOCK_DIR_ENV) {
            config.lock_dir = PathBuf::from(dir);
        }
        if let Some(file) = std::env::var_os(MAINTENANCE_FILE_ENV) {
            config.maintenance_file = Some(PathBuf::from(file));
        }
        if let Some(runner) = std::env::var_os(RUNNER_ENV) {
            config.runner = Some(PathBuf::from(runner));
        }
        config
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    pub fn with_maintenance_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.maintenance_file = Some(file.into());
        self
    }

    pub fn with_runner(mut self, runner: impl Into<PathBuf>) -> Self {
        self.runner = Some(runner.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Whether the maintenance flag is currently raised
    pub fn in_maintenance(&self) -> bool {
        self.maintenance_file
            .as_deref()
            .is_some_and(|file| file.exists())
    }

    /// Runner binary for self-re-invocation
    pub fn runner_path(&self) -> std::io::Result<PathBuf> {
        match &self.runner {
            Some(runner) => Ok(runner.clone()),
            None => std::env::current_exe(),
        }
    }
}

/// Everything a tick needs besides its events: settings, the process
/// adapter, the clock, and the task directory being run
#[derive(Clone)]
pub struct Context {
    pub config: ScheduleConfig,
    pub processes: Arc<dyn ProcessSpawner>,
    pub clock: Arc<dyn Clock>,
    pub directory: Option<PathBuf>,
}

impl Context {
    pub fn new(config: ScheduleConfig, processes: Arc<dyn ProcessSpawner>) -> Self {
        Self {
            config,
            processes,
            clock: Arc::new(SystemClock),
            directory: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_directory(mut self, directory: impl AsRef<Path>) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}
