use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Future returned by one run of a polling callback.
pub type PollFuture = BoxFuture<'static, Result<()>>;

/// Zero-argument async operation run on every tick.
pub type PollCallback = Arc<dyn Fn() -> PollFuture + Send + Sync>;

/// Registration options for a polling task.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Run once right after registering
    pub immediate: bool,
    /// Skip ticks while the application is hidden
    pub only_when_visible: bool,
    /// Only run while this tab is active (`None` = all tabs)
    pub tab: Option<String>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            immediate: false,
            only_when_visible: true,
            tab: None,
        }
    }
}

impl PollOptions {
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    pub fn always(mut self) -> Self {
        self.only_when_visible = false;
        self
    }

    pub fn on_tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }
}

/// A registered task and its counters.
pub(super) struct PollTask {
    pub callback: PollCallback,
    pub interval: Duration,
    pub paused: bool,
    pub only_when_visible: bool,
    pub tab: Option<String>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_run_at: Option<Instant>,
    pub run_count: u64,
    pub errors: u32,
    /// Distinguishes this registration from earlier ones under the same key
    pub generation: u64,
    pub cancel: CancellationToken,
    pub handle: Option<JoinHandle<()>>,
}

impl PollTask {
    pub fn stop(&mut self) {
        self.cancel.cancel();
        // Runs already in flight are not interrupted; only the ticker stops.
        self.handle.take();
    }
}

/// Why a tick did not invoke the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SkipReason {
    Paused,
    NotVisible,
    WrongTab,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::Paused => "paused",
            SkipReason::NotVisible => "not visible",
            SkipReason::WrongTab => "wrong tab",
        };
        f.write_str(text)
    }
}

/// Aggregate polling diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct PollingStats {
    pub total: usize,
    pub active: usize,
    pub paused: usize,
    pub tasks: Vec<TaskStats>,
}

/// Per-task diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    pub key: String,
    pub interval_ms: u64,
    /// Gating tab, or `"all"`
    pub tab: String,
    pub paused: bool,
    pub run_count: u64,
    pub errors: u32,
    pub last_run: Option<DateTime<Utc>>,
    pub time_since_last_run_ms: Option<u64>,
}
