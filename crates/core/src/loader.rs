// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task discovery
//!
//! Every `*.toml` file in a task directory is a candidate task, visited in
//! file-name order. A file resolves to the Rust task registered under its
//! qualified name (`namespace::stem`) if there is one, otherwise to a
//! [`FileTask`] built from the entries it declares:
//!
//! ```toml
//! namespace = "app"
//! description = "Nightly housekeeping"
//!
//! [[command]]
//! run = "backup --full"
//! frequency = "daily"
//! at = "02:30"
//! output = "/var/log/backup.log"
//! background = true
//! limit = 1
//!
//! [[job]]
//! name = "reports"
//! cron = "0 6 * * 1"
//! arguments = ["weekly"]
//!
//! [[call]]
//! name = "prune-cache"
//! frequency = "hourly"
//! days = "weekdays"
//! ```
//!
//! Entries are declared commands first, then jobs, then calls.

use crate::error::ScheduleError;
use crate::event::Event;
use crate::job::BoxError;
use crate::registry::Registry;
use crate::schedule::Schedule;
use crate::task::Task;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading a task directory or applying task-file entries
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not a task directory: {}", .0.display())]
    InvalidDirectory(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid task file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid entry in task {task}: {reason}")]
    InvalidEntry { task: String, reason: String },
    #[error("failed to initialize task {task}: {source}")]
    Initialize {
        task: String,
        #[source]
        source: BoxError,
    },
}

/// Named cron presets accepted by `frequency`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    EveryMinute,
    EveryFiveMinutes,
    EveryTenMinutes,
    EveryFifteenMinutes,
    EveryTwentyMinutes,
    EveryThirtyMinutes,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    fn apply(self, event: &mut Event) {
        match self {
            Frequency::EveryMinute => event.every_minute(),
            Frequency::EveryFiveMinutes => event.every_five_minutes(),
            Frequency::EveryTenMinutes => event.every_ten_minutes(),
            Frequency::EveryFifteenMinutes => event.every_fifteen_minutes(),
            Frequency::EveryTwentyMinutes => event.every_twenty_minutes(),
            Frequency::EveryThirtyMinutes => event.every_thirty_minutes(),
            Frequency::Hourly => event.hourly(),
            Frequency::Daily => event.daily(),
            Frequency::Weekly => event.weekly(),
            Frequency::Monthly => event.monthly(),
            Frequency::Quarterly => event.quarterly(),
            Frequency::Yearly => event.yearly(),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Days {
    Weekdays,
    Weekends,
}

/// Schedule and policy keys shared by every entry kind
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryOptions {
    #[serde(default)]
    pub cron: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// `"HH:MM"`
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub between: Option<[u32; 2]>,
    #[serde(default)]
    pub on: Option<u32>,
    #[serde(default)]
    pub days: Option<Days>,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub append: bool,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub processes: Option<usize>,
    /// Run even while maintenance mode is active
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntryOptions {
    /// Apply schedule keys (cron, then frequency, days, on, at, between)
    /// and policy keys to `event`
    fn apply(&self, event: &mut Event, task: &str) -> Result<(), ScheduleError> {
        if let Some(cron) = &self.cron {
            event.cron(cron)?;
        }
        if let Some(frequency) = self.frequency {
            frequency.apply(event);
        }
        match self.days {
            Some(Days::Weekdays) => {
                event.weekdays();
            }
            Some(Days::Weekends) => {
                event.weekends();
            }
            None => {}
        }
        if let Some(day) = self.on {
            event.on(day);
        }
        if let Some(at) = &self.at {
            let (hour, minute) = parse_time(at).ok_or_else(|| LoadError::InvalidEntry {
                task: task.to_string(),
                reason: format!("'at' must be HH:MM, got '{}'", at),
            })?;
            event.at(hour, minute);
        }
        if let Some([start, end]) = self.between {
            event.between(start, end);
        }

        if let Some(description) = &self.description {
            event.description(description.clone());
        }
        if let Some(output) = &self.output {
            if self.append {
                event.append_output(output.clone());
            } else {
                event.output(output.clone());
            }
        }
        if self.background {
            event.run_in_background();
        }
        if self.wait {
            event.wait();
        }
        if self.maintenance {
            event.ignore_maintenance_mode();
        }
        if let Some(limit) = self.limit {
            event.limit(limit);
        }
        if let Some(count) = self.processes {
            event.processes(count);
        }
        if let Some(cwd) = &self.cwd {
            event.in_directory(cwd.clone());
        }
        for (key, value) in &self.env {
            event.env(key.clone(), value.clone());
        }
        Ok(())
    }
}

fn parse_time(at: &str) -> Option<(u32, u32)> {
    let (hour, minute) = at.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// `[[command]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    pub run: String,
    #[serde(flatten)]
    pub options: EntryOptions,
}

/// `[[job]]` or `[[call]]` entry, resolved by name through the [`Registry`]
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    #[serde(flatten)]
    pub options: EntryOptions,
}

/// Parsed contents of one task file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFile {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandEntry>,
    #[serde(default, rename = "job")]
    pub jobs: Vec<NamedEntry>,
    #[serde(default, rename = "call")]
    pub calls: Vec<NamedEntry>,
}

impl TaskFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self, LoadError> {
        toml::from_str(content).map_err(|source| LoadError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn has_entries(&self) -> bool {
        !(self.commands.is_empty() && self.jobs.is_empty() && self.calls.is_empty())
    }
}

/// A task declared entirely in a task file
pub struct FileTask {
    name: String,
    file: TaskFile,
    registry: Registry,
}

impl FileTask {
    pub fn new(name: impl Into<String>, file: TaskFile, registry: Registry) -> Self {
        Self {
            name: name.into(),
            file,
            registry,
        }
    }
}

impl Task for FileTask {
    fn name(&self) -> String {
        self.file.name.clone().unwrap_or_else(|| self.name.clone())
    }

    fn description(&self) -> Option<String> {
        self.file.description.clone()
    }

    fn handle(&self, schedule: &mut Schedule) -> Result<(), ScheduleError> {
        let task = self.name();

        for entry in &self.file.commands {
            let event = schedule.command(entry.run.clone(), entry.options.arguments.clone());
            entry.options.apply(event, &task)?;
        }

        for entry in &self.file.jobs {
            let job = self
                .registry
                .job(&entry.name)
                .ok_or_else(|| ScheduleError::UnknownJob {
                    task: task.clone(),
                    name: entry.name.clone(),
                })?;
            let event = schedule.job(job, entry.options.arguments.clone());
            entry.options.apply(event, &task)?;
        }

        for entry in &self.file.calls {
            let callable =
                self.registry
                    .callable(&entry.name)
                    .ok_or_else(|| ScheduleError::UnknownCallable {
                        task: task.clone(),
                        name: entry.name.clone(),
                    })?;
            let event = schedule.call(
                entry.name.clone(),
                callable,
                entry.options.arguments.clone(),
            );
            entry.options.apply(event, &task)?;
        }
        Ok(())
    }
}

/// A task resolved from a file in the task directory
pub struct LoadedTask {
    pub name: String,
    pub path: PathBuf,
    pub task: Box<dyn Task>,
}

/// Resolve and initialize every task in `directory`, in file-name order
pub fn load_tasks(directory: &Path, registry: &Registry) -> Result<Vec<LoadedTask>, LoadError> {
    if !directory.is_dir() {
        return Err(LoadError::InvalidDirectory(directory.to_path_buf()));
    }

    let entries = std::fs::read_dir(directory).map_err(|source| LoadError::Io {
        path: directory.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut tasks = Vec::new();
    for path in paths {
        if let Some(task) = load_task(&path, registry)? {
            tasks.push(task);
        }
    }
    tracing::debug!(directory = %directory.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

fn load_task(path: &Path, registry: &Registry) -> Result<Option<LoadedTask>, LoadError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable task file");
            return Ok(None);
        }
    };
    let file = match TaskFile::parse(&content, path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unparseable task file");
            return Ok(None);
        }
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let qualified = match &file.namespace {
        Some(namespace) => format!("{}::{}", namespace, stem),
        None => stem,
    };

    let task: Box<dyn Task> = if let Some(task) = registry.task(&qualified) {
        task
    } else if file.has_entries() {
        Box::new(FileTask::new(qualified, file, registry.clone()))
    } else {
        tracing::debug!(path = %path.display(), name = %qualified, "no task in file");
        return Ok(None);
    };

    let name = task.name();
    task.initialize()
        .map_err(|source| LoadError::Initialize {
            task: name.clone(),
            source,
        })?;

    Ok(Some(LoadedTask {
        name,
        path: path.to_path_buf(),
        task,
    }))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
