// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// Logs go to stderr, or to `log_file` through a non-blocking writer whose
/// guard must be held until exit so buffered lines are flushed.
pub fn setup(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
        return Ok(None);
    };

    // Create log directory if needed
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow!("log file has no file name: {}", log_file.display()))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()?;

    Ok(Some(guard))
}
