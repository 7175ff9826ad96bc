//! Autosave scheduler.
//!
//! [`AutosaveScheduler`] runs as a background task while an already
//! identified content item is being edited. On every interval tick it
//! persists the draft if it differs from its snapshot. At most one autosave
//! is in flight; a tick that fires while one is running is skipped. Failures
//! are published on the event bus and retried on the next tick while the
//! draft stays dirty. The loop exits when its [`CancellationToken`] is
//! cancelled, abandoning any in-flight save.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use h2space_events::{EditorEvent, EditorEventKind, EventBus};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::parse_or;
use crate::draft::{AutosaveAttempt, DraftStateManager};

/// Default period between autosave attempts.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    pub interval: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl AutosaveConfig {
    /// Reads `AUTOSAVE_INTERVAL_SECS` (default `60`). Zero is treated as
    /// malformed.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_secs = DEFAULT_AUTOSAVE_INTERVAL.as_secs();
        let secs = match parse_or(lookup, "AUTOSAVE_INTERVAL_SECS", default_secs) {
            0 => default_secs,
            secs => secs,
        };
        Self {
            interval: Duration::from_secs(secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Result of a single autosave tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another autosave was still in flight.
    SkippedInFlight,
    /// The draft has no id yet.
    NotPersisted,
    /// Nothing changed since the last save.
    Clean,
    Saved,
    Failed,
}

/// Periodic, non-overlapping autosave for one draft.
///
/// Cheap to clone; clones share the in-flight guard.
#[derive(Clone)]
pub struct AutosaveScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    draft: Arc<DraftStateManager>,
    bus: Arc<EventBus>,
    config: AutosaveConfig,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag when the tick finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AutosaveScheduler {
    pub fn new(draft: Arc<DraftStateManager>, bus: Arc<EventBus>, config: AutosaveConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                draft,
                bus,
                config,
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.config.interval
    }

    /// Whether an autosave is currently in flight.
    pub fn is_saving(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Run one autosave attempt.
    pub async fn tick(&self) -> TickOutcome {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Autosave still in flight, skipping tick");
            return TickOutcome::SkippedInFlight;
        }
        let _guard = InFlightGuard(&self.inner.in_flight);

        match self.inner.draft.autosave().await {
            Ok(AutosaveAttempt::NotPersisted) => TickOutcome::NotPersisted,
            Ok(AutosaveAttempt::Clean) => TickOutcome::Clean,
            Ok(AutosaveAttempt::Saved(id)) => {
                tracing::info!(content_id = %id, "Content autosaved");
                self.inner
                    .bus
                    .publish(EditorEvent::new(EditorEventKind::Autosaved).with_content(id));
                TickOutcome::Saved
            }
            Err(e) => {
                let id = self.inner.draft.id().await;
                tracing::warn!(content_id = ?id, error = %e, "Failed to autosave content");
                let mut event =
                    EditorEvent::new(EditorEventKind::AutosaveFailed).with_message(e.to_string());
                if let Some(id) = id {
                    event = event.with_content(id);
                }
                self.inner.bus.publish(event);
                TickOutcome::Failed
            }
        }
    }

    /// Run the autosave loop.
    ///
    /// The first attempt happens one interval after start. Each tick runs on
    /// its own task so a slow save does not delay the timer; the in-flight
    /// guard makes overlapping ticks skip. The loop and any running tick
    /// stop when `cancel` is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let period = self.inner.config.interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Autosave scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let scheduler = self.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = scheduler.tick() => {}
                        }
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn interval_from_lookup() {
        let vars: HashMap<&str, &str> = [("AUTOSAVE_INTERVAL_SECS", "5")].into_iter().collect();
        let config = AutosaveConfig::from_lookup(|key: &str| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let config = AutosaveConfig::from_lookup(|key: &str| {
            (key == "AUTOSAVE_INTERVAL_SECS").then(|| "0".to_string())
        });
        assert_eq!(config.interval, DEFAULT_AUTOSAVE_INTERVAL);
    }

    #[test]
    fn guard_releases_flag_on_drop() {
        let flag = AtomicBool::new(true);
        drop(InFlightGuard(&flag));
        assert!(!flag.load(Ordering::Acquire));
    }
}
