// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for scheduling and dispatch

use crate::cron::CronError;
use crate::job::BoxError;
use crate::loader::LoadError;
use crate::process::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring, loading or dispatching events.
///
/// Failures from user code (hooks, jobs, callables) are carried unchanged;
/// nothing at this layer retries or swallows them.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cron error: {0}")]
    Cron(#[from] CronError),
    #[error("process error: {0}")]
    Process(#[from] ProcessError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("lock-file {path}: {source}")]
    LockFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no event with id '{0}' in any task")]
    EventNotFound(String),
    #[error("unknown job '{name}' in task {task}")]
    UnknownJob { task: String, name: String },
    #[error("unknown callable '{name}' in task {task}")]
    UnknownCallable { task: String, name: String },
    #[error("{0} is not a command")]
    NotACommand(String),
    #[error("cannot shell-quote {0:?}")]
    Unquotable(String),
    #[error("could not resolve scheduler runner: {0}")]
    Runner(#[source] std::io::Error),
    #[error("hook failed for event {event}: {source}")]
    Hook {
        event: String,
        #[source]
        source: BoxError,
    },
    #[error("job '{job}' failed: {source}")]
    Job {
        job: String,
        #[source]
        source: BoxError,
    },
    #[error("callable '{name}' failed: {source}")]
    Callable {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("task {task} failed: {source}")]
    Task {
        task: String,
        #[source]
        source: BoxError,
    },
}
