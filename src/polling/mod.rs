//! Named recurring background tasks.
//!
//! Each registered task gets its own ticker. On every tick the task is run
//! unless it is paused, hidden-gated while the application is not visible, or
//! tab-gated while another tab is active. Failures are counted per task; once
//! a task reaches the error threshold it pauses itself until resumed.
//!
//! Ticks are scheduled on the interval, not on completion: every tick spawns
//! its own run, so a callback that outlives its interval overlaps the next
//! run. Pausing or unregistering never interrupts a run already in flight.
//!
//! # Example
//!
//! ```ignore
//! let polling = PollingManager::new(5);
//! polling.register(
//!     "images",
//!     move || { let svc = svc.clone(); async move { svc.refresh().await }.boxed() },
//!     Duration::from_secs(30),
//!     PollOptions::default().on_tab("images"),
//! );
//! polling.set_active_tab("images"); // runs "images" right away
//! ```

mod task;
mod visibility;

pub use task::{PollCallback, PollFuture, PollOptions, PollingStats, TaskStats};
pub use visibility::VisibilitySignal;

use crate::error::{Error, Result};
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use task::{PollTask, SkipReason};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Failures after which a task pauses itself.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 5;

struct Inner {
    tasks: Mutex<HashMap<String, PollTask>>,
    visible: AtomicBool,
    active_tab: RwLock<Option<String>>,
    next_generation: AtomicU64,
    error_threshold: u32,
    shutdown: CancellationToken,
}

/// Registry of polling tasks. Cloning yields another handle to the same registry.
///
/// Registering tasks requires a running Tokio runtime.
#[derive(Clone)]
pub struct PollingManager {
    inner: Arc<Inner>,
}

impl Default for PollingManager {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_THRESHOLD)
    }
}

impl PollingManager {
    pub fn new(error_threshold: u32) -> Self {
        tracing::debug!("Polling manager initialized");
        Self {
            inner: Arc::new(Inner {
                tasks: Mutex::new(HashMap::new()),
                visible: AtomicBool::new(true),
                active_tab: RwLock::new(None),
                next_generation: AtomicU64::new(1),
                error_threshold: error_threshold.max(1),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Register `callback` to run every `interval` under `key`.
    ///
    /// An existing task with the same key is unregistered first.
    pub fn register<F, Fut>(&self, key: &str, callback: F, interval: Duration, options: PollOptions)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        let callback: PollCallback = Arc::new(move || callback().boxed());
        self.register_boxed(key, callback, interval, options);
    }

    pub fn register_boxed(&self, key: &str, callback: PollCallback, interval: Duration, options: PollOptions) {
        self.unregister(key);

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = self.inner.shutdown.child_token();
        let tab_label = options.tab.clone().unwrap_or_else(|| "all".to_string());

        let task = PollTask {
            callback,
            interval,
            paused: false,
            only_when_visible: options.only_when_visible,
            tab: options.tab,
            last_run: None,
            last_run_at: None,
            run_count: 0,
            errors: 0,
            generation,
            cancel: cancel.clone(),
            handle: None,
        };
        self.inner.tasks.lock().insert(key.to_string(), task);

        if options.immediate {
            spawn_run(&self.inner, key.to_string(), generation);
        }

        let handle = tokio::spawn(run_ticker(
            Arc::downgrade(&self.inner),
            key.to_string(),
            generation,
            interval,
            cancel,
        ));
        if let Some(task) = self.inner.tasks.lock().get_mut(key) {
            if task.generation == generation {
                task.handle = Some(handle);
            }
        }

        tracing::info!(
            "Polling registered: {} ({}ms, tab: {})",
            key,
            interval.as_millis(),
            tab_label
        );
    }

    /// Stop and remove a task. Returns whether it existed.
    pub fn unregister(&self, key: &str) -> bool {
        let removed = self.inner.tasks.lock().remove(key);
        match removed {
            Some(mut task) => {
                task.stop();
                tracing::debug!("Polling unregistered: {}", key);
                true
            }
            None => false,
        }
    }

    pub fn pause(&self, key: &str) -> bool {
        match self.inner.tasks.lock().get_mut(key) {
            Some(task) => {
                task.paused = true;
                tracing::debug!("Polling paused: {}", key);
                true
            }
            None => false,
        }
    }

    /// Unpause a task and reset its error counter.
    pub fn resume(&self, key: &str) -> bool {
        match self.inner.tasks.lock().get_mut(key) {
            Some(task) => {
                task.paused = false;
                task.errors = 0;
                tracing::debug!("Polling resumed: {}", key);
                true
            }
            None => false,
        }
    }

    pub fn pause_all(&self) {
        self.inner.pause_all();
    }

    /// Unpause every task and reset all error counters.
    pub fn resume_all(&self) {
        self.inner.resume_all();
    }

    /// Switch the active tab and run every task gated on it once, right away.
    pub fn set_active_tab(&self, tab: &str) {
        let previous = self.inner.active_tab.write().replace(tab.to_string());
        tracing::debug!(
            "Polling active tab changed: {} -> {}",
            previous.as_deref().unwrap_or("none"),
            tab
        );

        let due: Vec<(String, u64)> = self
            .inner
            .tasks
            .lock()
            .iter()
            .filter(|(_, task)| task.tab.as_deref() == Some(tab))
            .map(|(key, task)| (key.clone(), task.generation))
            .collect();

        for (key, generation) in due {
            spawn_run(&self.inner, key, generation);
        }
    }

    pub fn active_tab(&self) -> Option<String> {
        self.inner.active_tab.read().clone()
    }

    /// Apply a visibility change: hidden pauses every task, visible resumes them.
    pub fn set_visible(&self, visible: bool) {
        self.inner.set_visible(visible);
    }

    pub fn is_visible(&self) -> bool {
        self.inner.visible.load(Ordering::SeqCst)
    }

    /// Follow a visibility signal until the manager shuts down.
    pub fn attach_visibility(&self, mut rx: watch::Receiver<bool>) {
        let inner = Arc::downgrade(&self.inner);
        let shutdown = self.inner.shutdown.clone();

        {
            let visible = *rx.borrow_and_update();
            self.inner.visible.store(visible, Ordering::SeqCst);
        }

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Visibility signal dropped");
                            break;
                        }
                        let visible = *rx.borrow_and_update();
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        inner.set_visible(visible);
                    }
                }
            }
        });
    }

    pub fn stats(&self) -> PollingStats {
        let tasks = self.inner.tasks.lock();
        let now = Instant::now();

        let mut items: Vec<TaskStats> = tasks
            .iter()
            .map(|(key, task)| TaskStats {
                key: key.clone(),
                interval_ms: task.interval.as_millis() as u64,
                tab: task.tab.clone().unwrap_or_else(|| "all".to_string()),
                paused: task.paused,
                run_count: task.run_count,
                errors: task.errors,
                last_run: task.last_run,
                time_since_last_run_ms: task
                    .last_run_at
                    .map(|at| now.saturating_duration_since(at).as_millis() as u64),
            })
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));

        let paused = items.iter().filter(|t| t.paused).count();
        PollingStats {
            total: items.len(),
            active: items.len() - paused,
            paused,
            tasks: items,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.tasks.lock().contains_key(key)
    }

    /// Stop and remove every task.
    pub fn clear(&self) {
        let mut tasks = self.inner.tasks.lock();
        for task in tasks.values_mut() {
            task.stop();
        }
        tasks.clear();
        tracing::debug!("Polling tasks cleared");
    }

    /// Clear all tasks and stop the visibility follower.
    pub fn shutdown(&self) {
        self.clear();
        self.inner.shutdown.cancel();
    }
}

impl Inner {
    fn pause_all(&self) {
        for task in self.tasks.lock().values_mut() {
            task.paused = true;
        }
        tracing::debug!("Polling: all tasks paused");
    }

    fn resume_all(&self) {
        for task in self.tasks.lock().values_mut() {
            task.paused = false;
            task.errors = 0;
        }
        tracing::debug!("Polling: all tasks resumed");
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        if visible {
            tracing::info!("Application visible - resuming polling");
            self.resume_all();
        } else {
            tracing::info!("Application hidden - pausing polling");
            self.pause_all();
        }
    }

    fn gate(&self, task: &PollTask) -> Option<SkipReason> {
        if task.paused {
            return Some(SkipReason::Paused);
        }
        if task.only_when_visible && !self.visible.load(Ordering::SeqCst) {
            return Some(SkipReason::NotVisible);
        }
        if let Some(tab) = &task.tab {
            if self.active_tab.read().as_deref() != Some(tab.as_str()) {
                return Some(SkipReason::WrongTab);
            }
        }
        None
    }
}

fn spawn_run(inner: &Arc<Inner>, key: String, generation: u64) {
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        execute_task(&inner, &key, generation).await;
    });
}

async fn run_ticker(
    inner: Weak<Inner>,
    key: String,
    generation: u64,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                spawn_run(&inner, key.clone(), generation);
            }
        }
    }
}

/// Run one tick of a task, applying the gates and updating its counters.
async fn execute_task(inner: &Inner, key: &str, generation: u64) {
    let callback = {
        let tasks = inner.tasks.lock();
        let Some(task) = tasks.get(key).filter(|t| t.generation == generation) else {
            return;
        };
        if let Some(reason) = inner.gate(task) {
            tracing::debug!("Polling skipped ({}): {}", reason, key);
            return;
        }
        Arc::clone(&task.callback)
    };

    tracing::debug!("Polling run: {}", key);
    let started = Instant::now();
    let outcome = run_callback(key, &callback).await;

    let mut tasks = inner.tasks.lock();
    let Some(task) = tasks.get_mut(key).filter(|t| t.generation == generation) else {
        return;
    };
    match outcome {
        Ok(()) => {
            task.last_run = Some(chrono::Utc::now());
            task.last_run_at = Some(Instant::now());
            task.run_count += 1;
            tracing::debug!(
                "Polling completed: {} ({}ms)",
                key,
                started.elapsed().as_millis()
            );
        }
        Err(e) => {
            task.errors += 1;
            tracing::error!("Polling task '{}' failed: {}", key, e);
            if task.errors >= inner.error_threshold && !task.paused {
                task.paused = true;
                tracing::warn!(
                    "Polling task '{}' failed {} times, pausing until resumed",
                    key,
                    task.errors
                );
            }
        }
    }
}

/// Await one callback run, turning a panic into [`Error::TaskPanicked`].
async fn run_callback(key: &str, callback: &PollCallback) -> Result<()> {
    match AssertUnwindSafe(callback()).catch_unwind().await {
        Ok(result) => result,
        Err(panic_info) => Err(Error::TaskPanicked {
            task: key.to_string(),
            message: panic_message(panic_info.as_ref()),
        }),
    }
}

pub(crate) fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
