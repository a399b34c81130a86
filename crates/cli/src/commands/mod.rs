// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod list;
pub mod run;

use clap::Args;
use origin_adapters::{ShellProcessSpawner, TracedProcessSpawner};
use origin_core::config::{LOCK_DIR_ENV, MAINTENANCE_FILE_ENV, RUNNER_ENV};
use origin_core::{Context, ScheduleConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings shared by every schedule command; flags win over `ORIGIN_*`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Directory for per-event PID lock-files
    #[arg(long)]
    pub lock_dir: Option<PathBuf>,

    /// Maintenance mode is on while this file exists
    #[arg(long)]
    pub maintenance_file: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn config(&self) -> ScheduleConfig {
        let mut config = ScheduleConfig::from_env();
        if let Some(dir) = &self.lock_dir {
            config = config.with_lock_dir(dir);
        }
        if let Some(file) = &self.maintenance_file {
            config = config.with_maintenance_file(file);
        }
        config
    }
}

/// Build the runtime context.
///
/// Children inherit the resolved settings through the environment, so a
/// re-invoked runner sees the same lock directory and maintenance flag.
pub fn context(config: ScheduleConfig) -> Context {
    let mut spawner = ShellProcessSpawner::new()
        .with_shell(config.shell.clone())
        .with_env(LOCK_DIR_ENV, config.lock_dir.display().to_string());
    if let Some(file) = &config.maintenance_file {
        spawner = spawner.with_env(MAINTENANCE_FILE_ENV, file.display().to_string());
    }
    if let Some(runner) = &config.runner {
        spawner = spawner.with_env(RUNNER_ENV, runner.display().to_string());
    }
    Context::new(config, Arc::new(TracedProcessSpawner::new(spawner)))
}

/// Absolute form of `directory` when it exists, so self-invocations work
/// from any working directory
pub fn resolve_directory(directory: &Path) -> PathBuf {
    std::fs::canonicalize(directory).unwrap_or_else(|_| directory.to_path_buf())
}
