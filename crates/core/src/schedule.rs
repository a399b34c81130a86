// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task event container and the tick that dispatches it

use crate::clock::truncate_to_minute;
use crate::config::Context;
use crate::error::ScheduleError;
use crate::event::Event;
use crate::id::EventId;
use crate::job::{Callable, Job};
use crate::loader;
use crate::process::ProcessHandle;
use crate::registry::Registry;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Events that were due and went through dispatch, in order
    pub dispatched: Vec<EventId>,
    /// Events that were due but held back by maintenance mode
    pub skipped_maintenance: Vec<EventId>,
    /// Processes started or in-process runs performed
    pub launches: usize,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.dispatched.extend(other.dispatched);
        self.skipped_maintenance.extend(other.skipped_maintenance);
        self.launches += other.launches;
    }
}

/// A background child the tick is still watching
struct Tracked {
    event: usize,
    handle: Box<dyn ProcessHandle>,
}

/// The events one task declares, plus the context they run in
#[derive(Debug)]
pub struct Schedule {
    task: String,
    ctx: Context,
    events: Vec<Event>,
}

impl Schedule {
    pub fn new(task: impl Into<String>, ctx: Context) -> Self {
        Self {
            task: task.into(),
            ctx,
            events: Vec::new(),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Task directory this schedule was loaded from
    pub fn directory(&self) -> Option<&Path> {
        self.ctx.directory.as_deref()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == id)
    }

    /// Append an already-built event
    pub fn add(&mut self, event: Event) -> &mut Event {
        self.events.push(event);
        let last = self.events.len() - 1;
        &mut self.events[last]
    }

    pub fn call(
        &mut self,
        name: impl Into<String>,
        callable: Callable,
        arguments: Vec<Value>,
    ) -> &mut Event {
        self.add(Event::call(name, callable, arguments))
    }

    pub fn command(&mut self, line: impl Into<String>, arguments: Vec<Value>) -> &mut Event {
        self.add(Event::command(line, arguments))
    }

    pub fn job(&mut self, job: Arc<dyn Job>, arguments: Vec<Value>) -> &mut Event {
        self.add(Event::job(job, arguments))
    }

    /// Run one tick over every event, in declaration order.
    ///
    /// Background commands are started and then watched until they exit;
    /// everything else runs to completion inline. Returns once all
    /// tracked children have finished, even when an event failed.
    pub async fn dispatch(&mut self) -> Result<DispatchReport, ScheduleError> {
        let now = truncate_to_minute(self.ctx.clock.now());
        let maintenance = self.ctx.config.in_maintenance();
        let mut report = DispatchReport::default();
        let mut tracked = Vec::new();

        let mut failure = None;
        for index in 0..self.events.len() {
            let dispatched = self
                .dispatch_event(index, now, maintenance, &mut report, &mut tracked)
                .await;
            if let Err(e) = dispatched {
                failure = Some(e);
                break;
            }
        }

        let watched = self.watch(tracked).await;
        if let Some(e) = failure {
            if let Err(watch_error) = watched {
                tracing::warn!(task = %self.task, error = %watch_error, "watching children failed");
            }
            return Err(e);
        }
        watched?;
        Ok(report)
    }

    async fn dispatch_event(
        &mut self,
        index: usize,
        now: NaiveDateTime,
        maintenance: bool,
        report: &mut DispatchReport,
        tracked: &mut Vec<Tracked>,
    ) -> Result<(), ScheduleError> {
        let event = &self.events[index];
        if !event.is_due(now)? {
            tracing::trace!(task = %self.task, event_id = %event.id(), "not due");
            return Ok(());
        }
        if maintenance && !event.ignores_maintenance_mode() {
            tracing::info!(task = %self.task, event_id = %event.id(), "skipped for maintenance");
            report.skipped_maintenance.push(event.id().clone());
            return Ok(());
        }

        if event.runs_in_background() && event.is_callable() {
            self.events[index].into_self_invocation(&self.ctx)?;
        }

        // A re-invoked runner applies its own filters
        let event = &self.events[index];
        if !event.is_self_invocation() && !event.passes_filters() {
            tracing::debug!(task = %self.task, event_id = %event.id(), "filtered out");
            return Ok(());
        }

        tracing::info!(task = %self.task, event_id = %event.id(), summary = %event.summary(), "due");
        report.dispatched.push(event.id().clone());

        if event.runs_in_background() && event.is_command() {
            report.launches += self.launch_background(index, tracked)?;
        } else {
            report.launches += event.launch(&self.ctx).await?;
        }
        Ok(())
    }

    fn launch_background(
        &self,
        index: usize,
        tracked: &mut Vec<Tracked>,
    ) -> Result<usize, ScheduleError> {
        let event = &self.events[index];
        // A re-invoked runner runs its own hooks and repeats `count` times
        let own_hooks = !event.is_self_invocation();
        let launches = if own_hooks { event.process_count() } else { 1 };

        if own_hooks {
            event.run_before_hooks()?;
        }

        let mut live = event.live_processes(&self.ctx)?.len();
        let mut launched = 0;
        for _ in 0..launches {
            if event.at_capacity(live) {
                tracing::info!(
                    event_id = %event.id(),
                    live,
                    limit = event.max_processes(),
                    "concurrency limit reached"
                );
                break;
            }
            let handle = event.start_background(&self.ctx)?;
            tracked.push(Tracked {
                event: index,
                handle,
            });
            live += 1;
            launched += 1;
        }

        // Nothing to watch, so the after-hooks pair with the before-hooks now
        if launched == 0 && own_hooks {
            event.run_after_hooks()?;
        }
        Ok(launched)
    }

    /// Poll tracked children until all have exited, finalizing each
    async fn watch(&self, mut tracked: Vec<Tracked>) -> Result<(), ScheduleError> {
        let mut outstanding: HashMap<usize, usize> = HashMap::new();
        for t in &tracked {
            *outstanding.entry(t.event).or_default() += 1;
        }

        while !tracked.is_empty() {
            let mut running = Vec::with_capacity(tracked.len());
            for mut t in tracked {
                if t.handle.is_running()? {
                    running.push(t);
                    continue;
                }

                let event = &self.events[t.event];
                if let Some(pid) = t.handle.pid() {
                    event.finalize_process(&self.ctx, pid)?;
                }
                let left = outstanding.entry(t.event).or_default();
                *left = left.saturating_sub(1);
                if *left == 0 && !event.is_self_invocation() {
                    event.run_after_hooks()?;
                }
            }

            tracked = running;
            if !tracked.is_empty() {
                tokio::time::sleep(self.ctx.config.poll_interval).await;
            }
        }
        Ok(())
    }

    /// Load every task in `directory` and build its schedule
    pub fn load(
        directory: &Path,
        registry: &Registry,
        ctx: &Context,
    ) -> Result<Vec<Schedule>, ScheduleError> {
        let ctx = ctx.clone().with_directory(directory);
        loader::load_tasks(directory, registry)?
            .iter()
            .map(|loaded| loaded.task.build_schedule(&ctx))
            .collect()
    }

    /// Runner entry point.
    ///
    /// With an event id, find that event across all tasks in `directory`
    /// and execute it in this process. Without one, dispatch every task.
    pub async fn run(
        directory: &Path,
        event_id: Option<&str>,
        registry: &Registry,
        ctx: Context,
    ) -> Result<DispatchReport, ScheduleError> {
        let ctx = ctx.with_directory(directory);
        let tasks = loader::load_tasks(directory, registry)?;

        let Some(id) = event_id else {
            let mut report = DispatchReport::default();
            for loaded in &tasks {
                tracing::debug!(task = %loaded.name, "dispatching task");
                report.merge(loaded.task.dispatch(&ctx).await?);
            }
            return Ok(report);
        };

        for loaded in &tasks {
            let schedule = loaded.task.build_schedule(&ctx)?;
            if let Some(event) = schedule.find(id) {
                tracing::info!(task = %loaded.name, event_id = %id, "running single event");
                let launches = event.execute(&ctx).await?;
                return Ok(DispatchReport {
                    dispatched: vec![event.id().clone()],
                    launches,
                    ..DispatchReport::default()
                });
            }
        }
        Err(ScheduleError::EventNotFound(id.to_string()))
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
