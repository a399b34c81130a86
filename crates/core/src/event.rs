// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedulable events
//!
//! An [`Event`] pairs *what* runs (a shell command, a [`Job`], or a named
//! [`Callable`]) with *when* and *how* it runs: five cron segments mutated by
//! fluent helpers, plus an execution policy (output redirection,
//! backgrounding, concurrency ceiling, repeat count, hooks and filters).

use crate::config::{Context, RUN_SUBCOMMAND};
use crate::cron::{CronError, CronExpression};
use crate::error::ScheduleError;
use crate::id::EventId;
use crate::job::{BoxError, Callable, Job};
use crate::lockfile::PidFile;
use crate::process::{ProcessError, ProcessHandle, ProcessOptions};
use chrono::NaiveDateTime;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Hook run before or after an event's launches
pub type Hook = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// Condition consulted before an event runs
pub type Filter = Arc<dyn Fn() -> bool + Send + Sync>;

const MINUTE: usize = 0;
const HOUR: usize = 1;
const DAY: usize = 2;
const MONTH: usize = 3;
const WEEKDAY: usize = 4;

/// What an event runs
#[derive(Clone)]
pub enum EventKind {
    /// A shell command line, always started as a child process
    Command(String),
    /// A job dispatched in-process
    Job(Arc<dyn Job>),
    /// A closure invoked in-process, identified by a caller-supplied name
    Callable { name: String, callable: Callable },
}

impl EventKind {
    /// Kind name used in the event id
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::Command(_) => "command",
            EventKind::Job(_) => "job",
            EventKind::Callable { .. } => "callable",
        }
    }

    /// Payload descriptor used in the event id
    pub fn descriptor(&self) -> &str {
        match self {
            EventKind::Command(line) => line,
            EventKind::Job(job) => job.name(),
            EventKind::Callable { name, .. } => name,
        }
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.descriptor())
    }
}

/// One schedulable unit of work and its policy
#[derive(Clone)]
pub struct Event {
    id: EventId,
    kind: EventKind,
    arguments: Vec<Value>,
    segments: [String; 5],
    description: Option<String>,
    output: Option<PathBuf>,
    append_output: bool,
    background: bool,
    wait: bool,
    ignore_maintenance: bool,
    max_processes: usize,
    count: usize,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    before: Vec<Hook>,
    after: Vec<Hook>,
    when: Vec<Filter>,
    skip: Vec<Filter>,
    self_invoking: bool,
}

impl Event {
    /// Build an event; its id is fixed here and never changes
    pub fn new(kind: EventKind, arguments: Vec<Value>) -> Self {
        let id = EventId::derive(kind.type_name(), kind.descriptor(), &arguments);
        Self {
            id,
            kind,
            arguments,
            segments: ["*", "*", "*", "*", "*"].map(String::from),
            description: None,
            output: None,
            append_output: false,
            background: false,
            wait: false,
            ignore_maintenance: false,
            max_processes: 0,
            count: 1,
            cwd: None,
            env: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            when: Vec::new(),
            skip: Vec::new(),
            self_invoking: false,
        }
    }

    pub fn command(line: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self::new(EventKind::Command(line.into()), arguments)
    }

    pub fn job(job: Arc<dyn Job>, arguments: Vec<Value>) -> Self {
        Self::new(EventKind::Job(job), arguments)
    }

    pub fn call(name: impl Into<String>, callable: Callable, arguments: Vec<Value>) -> Self {
        Self::new(
            EventKind::Callable {
                name: name.into(),
                callable,
            },
            arguments,
        )
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind, EventKind::Command(_))
    }

    pub fn is_job(&self) -> bool {
        matches!(self.kind, EventKind::Job(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, EventKind::Callable { .. })
    }

    pub fn runs_in_background(&self) -> bool {
        self.background
    }

    pub fn ignores_maintenance_mode(&self) -> bool {
        self.ignore_maintenance
    }

    /// Concurrency ceiling; 0 means unlimited
    pub fn max_processes(&self) -> usize {
        self.max_processes
    }

    /// Launches per tick
    pub fn process_count(&self) -> usize {
        self.count
    }

    /// Whether this is a background callable rewritten into a runner call
    pub fn is_self_invocation(&self) -> bool {
        self.self_invoking
    }

    /// The five cron segments joined by spaces
    pub fn expression(&self) -> String {
        self.segments.join(" ")
    }

    /// Human-readable summary for logs and listings
    pub fn summary(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => format!("{}:{}", self.kind.type_name(), self.kind.descriptor()),
        }
    }

    pub fn pid_file(&self, lock_dir: &Path) -> PidFile {
        PidFile::for_event(lock_dir, self.id.as_str())
    }

    // ------------------------------------------------------------------
    // Cron helpers
    // ------------------------------------------------------------------

    fn set(&mut self, index: usize, value: impl ToString) -> &mut Self {
        self.segments[index] = value.to_string();
        self
    }

    pub fn every_minute(&mut self) -> &mut Self {
        self.segments = ["*", "*", "*", "*", "*"].map(String::from);
        self
    }

    fn every_n_minutes(&mut self, n: u32) -> &mut Self {
        self.every_minute().set(MINUTE, format!("*/{}", n))
    }

    pub fn every_five_minutes(&mut self) -> &mut Self {
        self.every_n_minutes(5)
    }

    pub fn every_ten_minutes(&mut self) -> &mut Self {
        self.every_n_minutes(10)
    }

    pub fn every_fifteen_minutes(&mut self) -> &mut Self {
        self.every_n_minutes(15)
    }

    pub fn every_twenty_minutes(&mut self) -> &mut Self {
        self.every_n_minutes(20)
    }

    pub fn every_thirty_minutes(&mut self) -> &mut Self {
        self.every_n_minutes(30)
    }

    pub fn hourly(&mut self) -> &mut Self {
        self.set(MINUTE, 0)
    }

    pub fn daily(&mut self) -> &mut Self {
        self.set(MINUTE, 0).set(HOUR, 0)
    }

    pub fn weekly(&mut self) -> &mut Self {
        self.set(MINUTE, 0).set(HOUR, 0).set(WEEKDAY, 0)
    }

    pub fn monthly(&mut self) -> &mut Self {
        self.set(MINUTE, 0).set(HOUR, 0).set(DAY, 1)
    }

    pub fn quarterly(&mut self) -> &mut Self {
        self.set(MINUTE, 0).set(HOUR, 0).set(DAY, 1).set(MONTH, "*/3")
    }

    pub fn yearly(&mut self) -> &mut Self {
        self.set(MINUTE, 0).set(HOUR, 0).set(DAY, 1).set(MONTH, 1)
    }

    /// Run on day-of-week `day` (0 = Sunday)
    pub fn on(&mut self, day: u32) -> &mut Self {
        self.set(WEEKDAY, day)
    }

    pub fn sundays(&mut self) -> &mut Self {
        self.on(0)
    }

    pub fn mondays(&mut self) -> &mut Self {
        self.on(1)
    }

    pub fn tuesdays(&mut self) -> &mut Self {
        self.on(2)
    }

    pub fn wednesdays(&mut self) -> &mut Self {
        self.on(3)
    }

    pub fn thursdays(&mut self) -> &mut Self {
        self.on(4)
    }

    pub fn fridays(&mut self) -> &mut Self {
        self.on(5)
    }

    pub fn saturdays(&mut self) -> &mut Self {
        self.on(6)
    }

    pub fn weekdays(&mut self) -> &mut Self {
        self.set(WEEKDAY, "1-5")
    }

    pub fn weekends(&mut self) -> &mut Self {
        self.set(WEEKDAY, "0,6")
    }

    pub fn at(&mut self, hour: u32, minute: u32) -> &mut Self {
        self.set(HOUR, hour).set(MINUTE, minute)
    }

    /// Restrict to hours `start` through `end` inclusive
    pub fn between(&mut self, start: u32, end: u32) -> &mut Self {
        self.set(HOUR, format!("{}-{}", start, end))
    }

    /// Replace all five segments from a cron string
    pub fn cron(&mut self, expression: &str) -> Result<&mut Self, CronError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        let segments: [&str; 5] =
            parts
                .as_slice()
                .try_into()
                .map_err(|_| CronError::FieldCount {
                    expression: expression.to_string(),
                    found: parts.len(),
                })?;
        self.segments = segments.map(String::from);
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Policy helpers
    // ------------------------------------------------------------------

    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }

    /// Redirect command output to `path`, truncating it each run
    pub fn output(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output = Some(path.into());
        self.append_output = false;
        self
    }

    /// Redirect command output to `path`, appending
    pub fn append_output(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output = Some(path.into());
        self.append_output = true;
        self
    }

    pub fn run_in_background(&mut self) -> &mut Self {
        self.background = true;
        self
    }

    /// Block on a foreground command until it exits
    pub fn wait(&mut self) -> &mut Self {
        self.wait = true;
        self
    }

    pub fn ignore_maintenance_mode(&mut self) -> &mut Self {
        self.ignore_maintenance = true;
        self
    }

    /// At most `max` live processes; 0 removes the ceiling
    pub fn limit(&mut self, max: usize) -> &mut Self {
        self.max_processes = max;
        self
    }

    /// Launch `count` times per tick
    pub fn processes(&mut self, count: usize) -> &mut Self {
        self.count = count;
        self
    }

    pub fn in_directory(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Run only if every `when` filter returns true
    pub fn when<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.when.push(Arc::new(filter));
        self
    }

    /// Skip the run if any `skip` filter returns true
    pub fn skip<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.skip.push(Arc::new(filter));
        self
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Whether the expression matches `now`
    pub fn is_due(&self, now: NaiveDateTime) -> Result<bool, CronError> {
        Ok(CronExpression::new(&self.expression(), now)?.is_due(now))
    }

    pub fn passes_filters(&self) -> bool {
        self.when.iter().all(|f| f()) && !self.skip.iter().any(|f| f())
    }

    pub fn run_before_hooks(&self) -> Result<(), ScheduleError> {
        self.run_hooks(&self.before)
    }

    pub fn run_after_hooks(&self) -> Result<(), ScheduleError> {
        self.run_hooks(&self.after)
    }

    fn run_hooks(&self, hooks: &[Hook]) -> Result<(), ScheduleError> {
        for hook in hooks {
            hook().map_err(|source| ScheduleError::Hook {
                event: self.id.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Full shell line for a command event, with arguments quoted and
    /// output redirection applied
    pub fn command_line(&self) -> Result<String, ScheduleError> {
        let EventKind::Command(base) = &self.kind else {
            return Err(ScheduleError::NotACommand(self.summary()));
        };

        let mut line = base.clone();
        for argument in &self.arguments {
            line.push(' ');
            line.push_str(&quote_argument(argument)?);
        }
        if let Some(output) = &self.output {
            let redirect = if self.append_output { ">>" } else { ">" };
            line.push_str(&format!(
                " {} {} 2>&1",
                redirect,
                quote(&output.display().to_string())?
            ));
        }
        Ok(line)
    }

    /// Live sibling pids from the lock-file, pruning dead ones.
    ///
    /// Neither the current process nor its parent (the shell wrapper of a
    /// re-invoked runner) counts against the ceiling.
    pub fn live_processes(&self, ctx: &Context) -> Result<Vec<u32>, ScheduleError> {
        let pid_file = self.pid_file(&ctx.config.lock_dir);
        let own = std::process::id();
        let parent = std::os::unix::process::parent_id();
        let live = pid_file
            .live(|pid| ctx.processes.is_alive(pid))
            .map_err(|source| ScheduleError::LockFile {
                path: pid_file.path().to_path_buf(),
                source,
            })?;
        Ok(live
            .into_iter()
            .filter(|pid| *pid != own && *pid != parent)
            .collect())
    }

    /// Whether `live` processes already meet the ceiling
    pub fn at_capacity(&self, live: usize) -> bool {
        self.max_processes > 0 && live >= self.max_processes
    }

    fn record_pid(&self, ctx: &Context, pid: u32) -> Result<(), ScheduleError> {
        let pid_file = self.pid_file(&ctx.config.lock_dir);
        pid_file
            .record(pid)
            .map_err(|source| ScheduleError::LockFile {
                path: pid_file.path().to_path_buf(),
                source,
            })
    }

    fn forget_pid(&self, ctx: &Context, pid: u32) -> Result<(), ScheduleError> {
        let pid_file = self.pid_file(&ctx.config.lock_dir);
        pid_file
            .remove(pid)
            .map_err(|source| ScheduleError::LockFile {
                path: pid_file.path().to_path_buf(),
                source,
            })
    }

    /// Start the command as a child process and record its pid
    pub fn start_background(&self, ctx: &Context) -> Result<Box<dyn ProcessHandle>, ScheduleError> {
        let line = self.command_line()?;
        let options = ProcessOptions {
            cwd: self.cwd.clone(),
            env: self.env.clone(),
        };

        let handle = ctx.processes.start(&line, &options)?;
        let pid = handle.pid().ok_or_else(|| ProcessError::NoPid(line.clone()))?;
        self.record_pid(ctx, pid)?;

        tracing::info!(event_id = %self.id, pid, command = %line, "started process");
        Ok(handle)
    }

    /// Drop a finished child from the lock-file
    pub fn finalize_process(&self, ctx: &Context, pid: u32) -> Result<(), ScheduleError> {
        tracing::debug!(event_id = %self.id, pid, "process finished");
        self.forget_pid(ctx, pid)
    }

    /// Rewrite a callable into a command that re-invokes the scheduler runner
    /// for just this event. The id and policy are kept.
    pub fn into_self_invocation(&mut self, ctx: &Context) -> Result<(), ScheduleError> {
        let runner = ctx.config.runner_path().map_err(ScheduleError::Runner)?;
        let directory = ctx
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let line = format!(
            "{} {} --directory={} --id={}",
            quote(&runner.display().to_string())?,
            RUN_SUBCOMMAND,
            quote(&directory.display().to_string())?,
            self.id
        );

        tracing::debug!(event_id = %self.id, command = %line, "callable moved to background");
        self.kind = EventKind::Command(line);
        self.arguments.clear();
        self.self_invoking = true;
        Ok(())
    }

    /// Run the event once for this tick: filters, then [`Self::launch`].
    ///
    /// Returns the number of launches.
    pub async fn execute(&self, ctx: &Context) -> Result<usize, ScheduleError> {
        if !self.passes_filters() {
            tracing::debug!(event_id = %self.id, "filtered out");
            return Ok(0);
        }
        self.launch(ctx).await
    }

    /// Before-hooks, `count` launches bounded by the concurrency ceiling,
    /// after-hooks. Filters are not consulted.
    pub async fn launch(&self, ctx: &Context) -> Result<usize, ScheduleError> {
        let mut live = self.live_processes(ctx)?;

        self.run_before_hooks()?;

        let mut launched = 0;
        for _ in 0..self.count {
            if self.spawn_process(ctx, &mut live).await? {
                launched += 1;
            }
        }

        self.run_after_hooks()?;
        Ok(launched)
    }

    async fn spawn_process(&self, ctx: &Context, live: &mut Vec<u32>) -> Result<bool, ScheduleError> {
        if self.at_capacity(live.len()) {
            tracing::info!(
                event_id = %self.id,
                live = live.len(),
                limit = self.max_processes,
                "concurrency limit reached"
            );
            return Ok(false);
        }

        match &self.kind {
            EventKind::Job(job) => {
                let pid = std::process::id();
                self.record_pid(ctx, pid)?;
                live.push(pid);
                tracing::info!(event_id = %self.id, job = job.name(), "dispatching job");
                job.dispatch(&self.arguments)
                    .await
                    .map_err(|source| ScheduleError::Job {
                        job: job.name().to_string(),
                        source,
                    })?;
            }
            EventKind::Callable { name, callable } => {
                let pid = std::process::id();
                self.record_pid(ctx, pid)?;
                live.push(pid);
                tracing::info!(event_id = %self.id, callable = %name, "invoking callable");
                callable(&self.arguments).map_err(|source| ScheduleError::Callable {
                    name: name.clone(),
                    source,
                })?;
            }
            EventKind::Command(_) => {
                let mut handle = self.start_background(ctx)?;
                let pid = handle.pid();
                live.extend(pid);
                if self.wait {
                    handle.wait().await?;
                    if let Some(pid) = pid {
                        self.finalize_process(ctx, pid)?;
                    }
                }
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("expression", &self.expression())
            .field("background", &self.background)
            .field("max_processes", &self.max_processes)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

fn quote(raw: &str) -> Result<String, ScheduleError> {
    shlex::try_quote(raw)
        .map(|q| q.into_owned())
        .map_err(|_| ScheduleError::Unquotable(raw.to_string()))
}

fn quote_argument(argument: &Value) -> Result<String, ScheduleError> {
    match argument {
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
