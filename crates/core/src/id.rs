// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable event identifiers

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of an event id in hex characters
pub const EVENT_ID_LEN: usize = 12;

/// Identifies *what* an event runs: derived from its kind, payload descriptor
/// and arguments, never from its schedule or policy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Digest `{"type", "data", "arguments"}` into a 12-char lowercase hex id
    pub fn derive(kind: &str, descriptor: &str, arguments: &[Value]) -> Self {
        let canonical = json!({
            "type": kind,
            "data": descriptor,
            "arguments": arguments,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        let digest = hasher.finalize();
        let mut hex = hex_encode(&digest[..EVENT_ID_LEN / 2]);
        hex.truncate(EVENT_ID_LEN);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for EventId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
