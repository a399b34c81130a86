// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-defined tasks: a named group of events with lifecycle hooks

use crate::config::Context;
use crate::error::ScheduleError;
use crate::job::BoxError;
use crate::schedule::{DispatchReport, Schedule};
use async_trait::async_trait;

/// A unit that declares events on a [`Schedule`].
///
/// Implementors only have to provide [`Task::handle`]; everything else has a
/// working default.
#[async_trait]
pub trait Task: Send + Sync {
    /// Name used in logs; the unqualified type name by default
    fn name(&self) -> String {
        short_type_name(std::any::type_name_of_val(self)).to_string()
    }

    fn description(&self) -> Option<String> {
        None
    }

    /// Called once after the loader constructs the task
    fn initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called before each dispatch
    async fn startup(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after each dispatch
    async fn shutdown(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Declare this task's events
    fn handle(&self, schedule: &mut Schedule) -> Result<(), ScheduleError>;

    /// A fresh schedule populated by [`Task::handle`]
    fn build_schedule(&self, ctx: &Context) -> Result<Schedule, ScheduleError> {
        let mut schedule = Schedule::new(self.name(), ctx.clone());
        self.handle(&mut schedule)?;
        Ok(schedule)
    }

    /// startup, handle, dispatch, shutdown
    async fn dispatch(&self, ctx: &Context) -> Result<DispatchReport, ScheduleError> {
        let name = self.name();
        self.startup()
            .await
            .map_err(|source| ScheduleError::Task {
                task: name.clone(),
                source,
            })?;

        let mut schedule = self.build_schedule(ctx)?;
        let report = schedule.dispatch().await?;

        self.shutdown()
            .await
            .map_err(|source| ScheduleError::Task { task: name, source })?;
        Ok(report)
    }
}

/// `app::tasks::Backup<T>` -> `Backup`
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
