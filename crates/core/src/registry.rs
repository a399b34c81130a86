// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of tasks, jobs and callables known to a runner binary
//!
//! A re-invoked runner rebuilds every event from the task directory, so any
//! Rust task, job or callable a task file refers to must be registered by
//! the binary that embeds the runner.

use crate::job::{Callable, Job};
use crate::task::Task;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds a task instance
pub type TaskFactory = Arc<dyn Fn() -> Box<dyn Task> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Registry {
    tasks: BTreeMap<String, TaskFactory>,
    jobs: BTreeMap<String, Arc<dyn Job>>,
    callables: BTreeMap<String, Callable>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Rust task under its qualified name (`namespace::stem`)
    pub fn with_task<F>(mut self, qualified_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Task> + Send + Sync + 'static,
    {
        self.tasks.insert(qualified_name.into(), Arc::new(factory));
        self
    }

    /// Register a job under [`Job::name`]
    pub fn with_job(mut self, job: Arc<dyn Job>) -> Self {
        self.jobs.insert(job.name().to_string(), job);
        self
    }

    pub fn with_callable(mut self, name: impl Into<String>, callable: Callable) -> Self {
        self.callables.insert(name.into(), callable);
        self
    }

    /// Construct the task registered under `qualified_name`
    pub fn task(&self, qualified_name: &str) -> Option<Box<dyn Task>> {
        self.tasks.get(qualified_name).map(|factory| factory())
    }

    pub fn job(&self, name: &str) -> Option<Arc<dyn Job>> {
        self.jobs.get(name).cloned()
    }

    pub fn callable(&self, name: &str) -> Option<Callable> {
        self.callables.get(name).cloned()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .field("callables", &self.callables.keys().collect::<Vec<_>>())
            .finish()
    }
}
