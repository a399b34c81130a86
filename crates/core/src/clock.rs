// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction for testable due-ness checks

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use std::sync::{Arc, Mutex};

/// A clock that provides the current local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Real system clock (local time zone)
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl FakeClock {
    pub fn at(instant: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(instant)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }

    /// Set the clock to a specific instant
    pub fn set(&self, instant: NaiveDateTime) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = instant;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Truncate an instant to the start of its minute
pub fn truncate_to_minute(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
