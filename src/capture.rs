//! Executor and captured output
//!
//! Runs one test page against one profile and collects what the engine
//! emitted, in emission order. Engine failures and timeouts never propagate:
//! the capture becomes the single [`FAULT_SENTINEL`] entry and goes through
//! the normal comparison, so a fault is visible as a mismatch (or as a pass
//! when the expectation itself is the sentinel).

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::engine::{Engine, PageRequest};
use crate::expect::members::{ALERT_DELIMITER, EMPTY_PLACEHOLDER};
use crate::suite::TestCase;

/// Captured value substituted when execution faults
pub const FAULT_SENTINEL: &str = "exception";

/// Ordered strings emitted by one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedOutput {
    entries: Vec<String>,
}

impl CapturedOutput {
    /// Wrap engine output
    ///
    /// An empty alert is stored as the `-` placeholder so that no capture
    /// joins to the empty string except the one with no alerts at all.
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| {
                    if entry.is_empty() {
                        EMPTY_PLACEHOLDER.to_string()
                    } else {
                        entry
                    }
                })
                .collect(),
        }
    }

    /// The capture used in place of a faulted execution
    pub fn sentinel() -> Self {
        Self {
            entries: vec![FAULT_SENTINEL.to_string()],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.entries.len() == 1 && self.entries[0] == FAULT_SENTINEL
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Join into the textual form expected values use
    ///
    /// Entries are joined as-is; reordering is the engine's responsibility.
    pub fn joined(&self) -> String {
        self.entries.join(&ALERT_DELIMITER.to_string())
    }

    /// Inverse of [`joined`](Self::joined) for entries free of the delimiter
    ///
    /// The empty string is the capture with no alerts.
    pub fn split(joined: &str) -> Self {
        if joined.is_empty() {
            return Self::new(Vec::new());
        }
        Self::new(joined.split(ALERT_DELIMITER).map(str::to_string).collect())
    }
}

/// Sends the cancellation signal for a run
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        // No receivers left means nothing to cancel
        let _ = self.0.send(true);
    }
}

/// Observes the cancellation signal; cheap to clone per unit
#[derive(Debug, Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                // Handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancellation handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelToken(rx))
}

/// Drives the engine for single executions
#[derive(Clone)]
pub struct Executor {
    engine: Arc<dyn Engine>,
    timeout: Duration,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("engine", &self.engine.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Executor {
    pub fn new(engine: Arc<dyn Engine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Execute a test page for a profile
    pub async fn execute(&self, test: &TestCase, profile: &str) -> CapturedOutput {
        let request = PageRequest {
            test: &test.id,
            profile,
            html: &test.html,
        };

        match tokio::time::timeout(self.timeout, self.engine.run_page(request)).await {
            Ok(Ok(entries)) => {
                tracing::debug!(test = %test.id, profile, entries = entries.len(), "Captured output");
                CapturedOutput::new(entries)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    test = %test.id,
                    profile,
                    engine = self.engine.name(),
                    "Execution fault, substituting '{}': {}",
                    FAULT_SENTINEL,
                    e
                );
                CapturedOutput::sentinel()
            }
            Err(_) => {
                tracing::warn!(
                    test = %test.id,
                    profile,
                    engine = self.engine.name(),
                    "Execution timed out after {:?}, substituting '{}'",
                    self.timeout,
                    FAULT_SENTINEL
                );
                CapturedOutput::sentinel()
            }
        }
    }

    /// Execute unless cancelled first
    ///
    /// Returns `None` when cancellation wins; the in-flight engine future is
    /// dropped, which for process engines kills the child.
    pub async fn execute_cancellable(
        &self,
        test: &TestCase,
        profile: &str,
        cancel: &mut CancelToken,
    ) -> Option<CapturedOutput> {
        if cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(test = %test.id, profile, "Execution cancelled");
                None
            }
            captured = self.execute(test, profile) => Some(captured),
        }
    }
}
