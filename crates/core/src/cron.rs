// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field cron expression evaluator
//!
//! Fields are `minute hour day-of-month month day-of-week`. Each field takes
//! exactly one of these forms:
//! - `*` matches any value
//! - `a-b` matches the inclusive range
//! - `*/n` (or `a/n`) matches every n-th value from the field minimum
//! - `a,b,c` matches the listed values
//! - a single integer
//!
//! Forms cannot be combined within a field (`1-5/2` and `1-3,7` are rejected).
//! Day-of-week runs 0-6 with 0 = Sunday; 7 is not accepted as Sunday.

use crate::clock::truncate_to_minute;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Longest forward/backward walk before giving up: five years of minutes
const WALK_HORIZON_MINUTES: i64 = 5 * 366 * 24 * 60;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while parsing or walking a cron expression
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression '{expression}' must have 5 fields, found {found}")]
    FieldCount { expression: String, found: usize },
    #[error("invalid {field} field '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("cron expression '{0}' never matches within the search horizon")]
    NoMatch(String),
}

/// One of the five cron fields and its valid bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Minute,
    Hour,
    Day,
    Month,
    Weekday,
}

impl FieldKind {
    const ORDER: [FieldKind; 5] = [
        FieldKind::Minute,
        FieldKind::Hour,
        FieldKind::Day,
        FieldKind::Month,
        FieldKind::Weekday,
    ];

    fn name(self) -> &'static str {
        match self {
            FieldKind::Minute => "minute",
            FieldKind::Hour => "hour",
            FieldKind::Day => "day-of-month",
            FieldKind::Month => "month",
            FieldKind::Weekday => "day-of-week",
        }
    }

    fn bounds(self) -> (u32, u32) {
        match self {
            FieldKind::Minute => (0, 59),
            FieldKind::Hour => (0, 23),
            FieldKind::Day => (1, 31),
            FieldKind::Month => (1, 12),
            FieldKind::Weekday => (0, 6),
        }
    }

    fn component(self, at: &NaiveDateTime) -> u32 {
        match self {
            FieldKind::Minute => at.minute(),
            FieldKind::Hour => at.hour(),
            FieldKind::Day => at.day(),
            FieldKind::Month => at.month(),
            FieldKind::Weekday => at.weekday().num_days_from_sunday(),
        }
    }

    fn invalid(self, value: &str, reason: impl Into<String>) -> CronError {
        CronError::InvalidField {
            field: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_value(self, raw: &str, whole: &str) -> Result<u32, CronError> {
        let value: u32 = raw
            .trim()
            .parse()
            .map_err(|_| self.invalid(whole, format!("'{}' is not an integer", raw)))?;
        let (min, max) = self.bounds();
        if value < min || value > max {
            return Err(self.invalid(whole, format!("{} is outside {}-{}", value, min, max)));
        }
        Ok(value)
    }

    /// Parse a single field. `None` means any value.
    fn parse(self, raw: &str) -> Result<Option<BTreeSet<u32>>, CronError> {
        if raw == "*" {
            return Ok(None);
        }

        let forms = [raw.contains('-'), raw.contains('/'), raw.contains(',')];
        if forms.iter().filter(|f| **f).count() > 1 {
            return Err(self.invalid(raw, "only one of range, step or list may be used"));
        }

        let (min, max) = self.bounds();

        if let Some((start, end)) = raw.split_once('-') {
            let start = self.parse_value(start, raw)?;
            let end = self.parse_value(end, raw)?;
            if start > end {
                return Err(self.invalid(raw, "range start is after range end"));
            }
            return Ok(Some((start..=end).collect()));
        }

        if let Some((prefix, step)) = raw.split_once('/') {
            if prefix.trim() != "*" {
                self.parse_value(prefix, raw)?;
            }
            let step: usize = step
                .trim()
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| self.invalid(raw, "step must be a positive integer"))?;
            return Ok(Some((min..=max).step_by(step).collect()));
        }

        if raw.contains(',') {
            let values = raw
                .split(',')
                .map(|v| self.parse_value(v, raw))
                .collect::<Result<BTreeSet<_>, _>>()?;
            return Ok(Some(values));
        }

        Ok(Some(BTreeSet::from([self.parse_value(raw, raw)?])))
    }
}

/// A parsed cron expression anchored at a reference instant
#[derive(Debug, Clone)]
pub struct CronExpression {
    expression: String,
    reference: NaiveDateTime,
    fields: [Option<BTreeSet<u32>>; 5],
}

impl CronExpression {
    /// Parse `expression` with `reference` (truncated to the minute) as the
    /// starting point for next/previous walks
    pub fn new(expression: &str, reference: NaiveDateTime) -> Result<Self, CronError> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(CronError::FieldCount {
                expression: expression.to_string(),
                found: parts.len(),
            });
        }

        let mut fields: [Option<BTreeSet<u32>>; 5] = Default::default();
        for (slot, (kind, raw)) in fields
            .iter_mut()
            .zip(FieldKind::ORDER.iter().zip(parts.iter()))
        {
            *slot = kind.parse(raw)?;
        }

        Ok(Self {
            expression: parts.join(" "),
            reference: truncate_to_minute(reference),
            fields,
        })
    }

    /// Parse `expression` anchored at the current local time
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        Self::new(expression, chrono::Local::now().naive_local())
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    /// Whether the expression matches the minute containing `at`
    pub fn is_due(&self, at: NaiveDateTime) -> bool {
        // Weekday, month, day, hour, minute: a mismatch stops the check
        [4usize, 3, 2, 1, 0].iter().all(|&i| match &self.fields[i] {
            None => true,
            Some(values) => values.contains(&FieldKind::ORDER[i].component(&at)),
        })
    }

    /// First matching minute strictly after the reference
    pub fn next_run_date(&self) -> Result<NaiveDateTime, CronError> {
        self.walk(Duration::minutes(1))
    }

    /// Last matching minute strictly before the reference
    pub fn previous_run_date(&self) -> Result<NaiveDateTime, CronError> {
        self.walk(Duration::minutes(-1))
    }

    /// [`Self::next_run_date`] formatted as `YYYY-MM-DD HH:MM:SS`
    pub fn next_run_timestamp(&self) -> Result<String, CronError> {
        self.next_run_date().map(format_timestamp)
    }

    /// [`Self::previous_run_date`] formatted as `YYYY-MM-DD HH:MM:SS`
    pub fn previous_run_timestamp(&self) -> Result<String, CronError> {
        self.previous_run_date().map(format_timestamp)
    }

    fn walk(&self, step: Duration) -> Result<NaiveDateTime, CronError> {
        let mut current = self.reference;
        for _ in 0..WALK_HORIZON_MINUTES {
            current += step;
            if self.is_due(current) {
                return Ok(current);
            }
        }
        Err(CronError::NoMatch(self.expression.clone()))
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Render an instant as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
