// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event PID lock-files
//!
//! `<lock_dir>/origin-<event id>.lock` holds a JSON array of the process ids
//! currently running the event. Reads and writes are not atomic against other
//! processes touching the same file; at one tick per minute that race is
//! accepted.

use std::path::{Path, PathBuf};

/// PID list for one event
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn for_event(lock_dir: &Path, event_id: &str) -> Self {
        Self {
            path: lock_dir.join(format!("origin-{}.lock", event_id)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded pids; a missing or unreadable file counts as empty
    pub fn load(&self) -> Vec<u32> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&contents) {
            Ok(pids) => pids,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt lock-file");
                Vec::new()
            }
        }
    }

    pub fn save(&self, pids: &[u32]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(pids)?;
        std::fs::write(&self.path, json)
    }

    /// Load, drop pids the probe reports dead, and persist the pruned list
    pub fn live(&self, is_alive: impl Fn(u32) -> bool) -> std::io::Result<Vec<u32>> {
        let recorded = self.load();
        let live: Vec<u32> = recorded.iter().copied().filter(|p| is_alive(*p)).collect();
        if live.len() != recorded.len() {
            tracing::debug!(
                path = %self.path.display(),
                pruned = recorded.len() - live.len(),
                "pruned dead pids"
            );
            self.save(&live)?;
        }
        Ok(live)
    }

    /// Append `pid` unless already present
    pub fn record(&self, pid: u32) -> std::io::Result<()> {
        let mut pids = self.load();
        if !pids.contains(&pid) {
            pids.push(pid);
            self.save(&pids)?;
        }
        Ok(())
    }

    pub fn remove(&self, pid: u32) -> std::io::Result<()> {
        let mut pids = self.load();
        let before = pids.len();
        pids.retain(|p| *p != pid);
        if pids.len() != before {
            self.save(&pids)?;
        }
        Ok(())
    }
}
