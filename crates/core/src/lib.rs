// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! origin-core: the Origin task-scheduling engine
//!
//! This crate provides:
//! - A five-field cron evaluator
//! - Events (commands, jobs, callables) with fluent schedule and policy helpers
//! - Tasks and per-task schedules, dispatched once per minute
//! - Per-event PID lock-files and a standalone exclusive file lock
//! - Task-directory discovery from TOML task files
//! - Process and clock adapter traits, with fakes for tests

pub mod clock;
pub mod config;
pub mod cron;
pub mod error;
pub mod event;
pub mod id;
pub mod job;
pub mod loader;
pub mod lock;
pub mod lockfile;
pub mod process;
pub mod registry;
pub mod schedule;
pub mod task;

pub use clock::{truncate_to_minute, Clock, FakeClock, SystemClock};
pub use config::{Context, ScheduleConfig};
pub use cron::{CronError, CronExpression};
pub use error::ScheduleError;
pub use event::{Event, EventKind};
pub use id::EventId;
pub use job::{callable, BoxError, Callable, Job};
pub use loader::{load_tasks, FileTask, LoadError, LoadedTask};
pub use lock::{Lock, LockError};
pub use lockfile::PidFile;
pub use process::{ProcessError, ProcessHandle, ProcessOptions, ProcessSpawner};
pub use registry::Registry;
pub use schedule::{DispatchReport, Schedule};
pub use task::Task;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use job::RecordingJob;
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessHandle, FakeProcessSpawner, StartedProcess};
