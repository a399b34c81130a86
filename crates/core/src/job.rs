// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Units of work an event can dispatch in-process

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Error type user code (jobs, callables, hooks) may return
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A fire-and-forget unit of work, possibly handed to a queue
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name; part of the owning event's id
    fn name(&self) -> &str;

    async fn dispatch(&self, args: &[Value]) -> Result<(), BoxError>;
}

/// Any invocable taking the event's arguments
pub type Callable = Arc<dyn Fn(&[Value]) -> Result<(), BoxError> + Send + Sync>;

/// Wrap a closure as a [`Callable`]
pub fn callable<F>(f: F) -> Callable
where
    F: Fn(&[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingJob;

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::{BoxError, Job};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    /// Job double that records the arguments of every dispatch
    #[derive(Clone, Debug, Default)]
    pub struct RecordingJob {
        name: String,
        calls: Arc<Mutex<Vec<Vec<Value>>>>,
        fail_with: Option<String>,
    }

    impl RecordingJob {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                ..Self::default()
            }
        }

        /// Every dispatch fails with `message`
        pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
            Self {
                fail_with: Some(message.into()),
                ..Self::new(name)
            }
        }

        pub fn calls(&self) -> Vec<Vec<Value>> {
            self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    #[async_trait]
    impl Job for RecordingJob {
        fn name(&self) -> &str {
            &self.name
        }

        async fn dispatch(&self, args: &[Value]) -> Result<(), BoxError> {
            self.calls
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(args.to_vec());
            match &self.fail_with {
                Some(message) => Err(message.clone().into()),
                None => Ok(()),
            }
        }
    }
}
