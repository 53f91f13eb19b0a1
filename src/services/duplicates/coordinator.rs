//! Live duplicate-check coordinator.
//!
//! One coordinator exists per record being edited. The form feeds it the
//! checkable attributes on every edit; it waits for a quiet period, issues at
//! most one lookup for the burst, and publishes the answer.
//!
//! # States
//!
//! ```text
//!            trigger(blank) / clear
//!   ┌──────────────────────────────────────────────┐
//!   v                                              │
//! Idle ──trigger──> Waiting(snapshot, timer) ──timer fires──> Checking(snapshot, request)
//!   ^                 ^   │ trigger restarts timer              │       │
//!   │                 │   └─────────┘                           │       │
//!   │                 └──────────────── trigger ────────────────┘       │
//!   └─────────────────────────── response for current request ──────────┘
//! ```
//!
//! A response is applied only while the session is still `Checking` the
//! exact request it answers. Any trigger or clear moves the session away from
//! that request, so late answers to superseded requests are discarded on
//! arrival instead of overwriting fresher state.

use crate::models::{
    CheckableAttributes, DuplicateCandidate, DuplicateCheckRequest, DuplicateState, RecordKind,
};
use crate::{Error, Result};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use super::config::DuplicateCheckConfig;
use super::lookup::DuplicateLookup;

/// Sequence number of an issued lookup request.
///
/// Strictly increasing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pending debounce timer owned by the session.
struct Timer {
    id: u64,
    task: JoinHandle<()>,
}

enum Phase {
    Idle,
    Waiting {
        snapshot: CheckableAttributes,
        timer: Timer,
    },
    Checking {
        snapshot: CheckableAttributes,
        request: RequestId,
    },
}

impl Phase {
    const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting { .. } => "waiting",
            Self::Checking { .. } => "checking",
        }
    }
}

struct Session {
    phase: Phase,
    next_timer: u64,
    next_request: u64,
    /// Task running the most recently issued lookup.
    in_flight: Option<JoinHandle<()>>,
    closed: bool,
}

impl Session {
    const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            next_timer: 0,
            next_request: 0,
            in_flight: None,
            closed: false,
        }
    }

    const fn next_timer_id(&mut self) -> u64 {
        self.next_timer += 1;
        self.next_timer
    }

    const fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Moves to `Idle`, cancelling any pending timer.
    ///
    /// An in-flight lookup keeps running; its answer no longer matches the
    /// phase and is dropped when it lands.
    fn reset(&mut self) {
        if let Phase::Waiting { timer, .. } = std::mem::replace(&mut self.phase, Phase::Idle) {
            timer.task.abort();
        }
    }
}

struct Inner<L> {
    kind: RecordKind,
    record_id: Option<i64>,
    debounce: Duration,
    lookup: L,
    runtime: Handle,
    session: Mutex<Session>,
    state: watch::Sender<DuplicateState>,
    /// Woken whenever the session returns to `Idle`.
    idle: Notify,
}

impl<L: DuplicateLookup> Inner<L> {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        // Every critical section leaves the session consistent, so a poisoned
        // lock still guards valid state.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, next: DuplicateState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn set_checking(&self, checking: bool) {
        self.state.send_if_modified(|current| {
            let changed = current.checking != checking;
            current.checking = checking;
            changed
        });
    }

    /// Debounce timer elapsed: issue the lookup if the timer is still current.
    fn fire(self: &Arc<Self>, timer_id: u64) {
        let mut session = self.lock_session();
        if session.closed {
            return;
        }

        let snapshot = match std::mem::replace(&mut session.phase, Phase::Idle) {
            Phase::Waiting { snapshot, timer } if timer.id == timer_id => snapshot,
            other => {
                // Restarted or cleared between wake-up and lock.
                session.phase = other;
                return;
            },
        };

        let request_id = session.next_request_id();
        let request = DuplicateCheckRequest::new(&snapshot, self.record_id);
        session.phase = Phase::Checking {
            snapshot,
            request: request_id,
        };
        self.set_checking(true);

        tracing::debug!(
            record_kind = %self.kind,
            request_id = %request_id,
            attributes = request.attributes.len(),
            "Issuing duplicate lookup"
        );
        metrics::counter!("duplicate_checks_issued_total", "record_kind" => self.kind.as_str())
            .increment(1);

        let inner = Arc::clone(self);
        let task = self.runtime.spawn(async move {
            let started = Instant::now();
            let outcome = inner.lookup.lookup(request).await;
            inner.settle(request_id, outcome, started.elapsed());
        });

        // Older lookups are detached rather than aborted; the phase check
        // discards whatever they return.
        session.in_flight = Some(task);
    }

    /// Applies a lookup outcome if it answers the current request.
    #[allow(clippy::cast_possible_truncation)]
    fn settle(
        &self,
        request_id: RequestId,
        outcome: Result<Vec<DuplicateCandidate>>,
        elapsed: Duration,
    ) {
        let duration_ms = elapsed.as_millis() as u64;
        let mut session = self.lock_session();

        let current = !session.closed
            && matches!(session.phase, Phase::Checking { request, .. } if request == request_id);
        if !current {
            tracing::debug!(
                record_kind = %self.kind,
                request_id = %request_id,
                phase = session.phase.name(),
                duration_ms,
                "Discarding superseded duplicate lookup response"
            );
            metrics::counter!("duplicate_checks_stale_total", "record_kind" => self.kind.as_str())
                .increment(1);
            return;
        }

        session.phase = Phase::Idle;
        session.in_flight = None;
        self.idle.notify_waiters();

        match outcome {
            Ok(duplicates) => {
                tracing::debug!(
                    record_kind = %self.kind,
                    request_id = %request_id,
                    candidates = duplicates.len(),
                    duration_ms,
                    "Duplicate lookup completed"
                );
                self.publish(DuplicateState {
                    duplicates,
                    checking: false,
                });
            },
            Err(e) => {
                tracing::warn!(
                    record_kind = %self.kind,
                    request_id = %request_id,
                    error = %e,
                    duration_ms,
                    "Duplicate lookup failed, clearing suggestions"
                );
                metrics::counter!(
                    "duplicate_checks_failed_total",
                    "record_kind" => self.kind.as_str()
                )
                .increment(1);
                self.publish(DuplicateState::default());
            },
        }
    }
}

/// Debounced, stale-safe duplicate checker for one record being edited.
///
/// The record kind and identity are fixed for the coordinator's lifetime.
/// Editing a different record means constructing a new coordinator;
/// dropping the old one cancels its timer and in-flight lookup so nothing it
/// started can publish afterwards.
///
/// # Example
///
/// ```rust,ignore
/// use crmcheck::{CheckableAttributes, DuplicateCheckConfig, DuplicateCoordinator,
///     HttpDuplicateLookup, RecordKind};
///
/// let config = DuplicateCheckConfig::from_env();
/// let coordinator = DuplicateCoordinator::new(
///     RecordKind::Contact,
///     Some(42),
///     HttpDuplicateLookup::new(&config)?,
///     &config,
/// )?;
///
/// let mut updates = coordinator.subscribe();
/// coordinator.check_duplicates(
///     CheckableAttributes::for_kind(RecordKind::Contact).with("email", "ada@example.com")?,
/// );
/// updates.changed().await?;
/// ```
pub struct DuplicateCoordinator<L: DuplicateLookup> {
    inner: Arc<Inner<L>>,
}

impl<L: DuplicateLookup> DuplicateCoordinator<L> {
    /// Creates a coordinator bound to the current Tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `kind` - Record kind whose attributes will be checked
    /// * `record_id` - Identity of the record being edited, if it exists yet
    /// * `lookup` - Backend answering duplicate lookups
    /// * `config` - Supplies the debounce window
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if called outside a Tokio runtime.
    pub fn new(
        kind: RecordKind,
        record_id: Option<i64>,
        lookup: L,
        config: &DuplicateCheckConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::OperationFailed {
            operation: "duplicate_coordinator_new".to_string(),
            cause: e.to_string(),
        })?;
        let (state, _) = watch::channel(DuplicateState::default());

        Ok(Self {
            inner: Arc::new(Inner {
                kind,
                record_id,
                debounce: config.debounce,
                lookup,
                runtime,
                session: Mutex::new(Session::new()),
                state,
                idle: Notify::new(),
            }),
        })
    }

    /// Feeds the latest attribute snapshot from an edit event.
    ///
    /// Never blocks and never fails. If no attribute is provided, results are
    /// cleared immediately and no lookup is made. Otherwise the debounce
    /// window restarts and only the last snapshot of a burst is looked up.
    pub fn check_duplicates(&self, attributes: CheckableAttributes) {
        let inner = &self.inner;
        if attributes.kind() != inner.kind {
            tracing::warn!(
                record_kind = %inner.kind,
                snapshot_kind = %attributes.kind(),
                "Ignoring attributes for a different record kind"
            );
            return;
        }

        let mut session = inner.lock_session();
        if session.closed {
            return;
        }

        if !attributes.has_any_value() {
            session.reset();
            inner.publish(DuplicateState::default());
            inner.idle.notify_waiters();
            metrics::counter!("duplicate_checks_skipped_total", "record_kind" => inner.kind.as_str())
                .increment(1);
            return;
        }

        let timer_id = session.next_timer_id();
        let debounce = inner.debounce;
        let weak = Arc::downgrade(inner);
        let task = inner.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(timer_id);
            }
        });

        let timer = Timer { id: timer_id, task };
        if let Phase::Waiting { timer: previous, .. } = std::mem::replace(
            &mut session.phase,
            Phase::Waiting {
                snapshot: attributes,
                timer,
            },
        ) {
            previous.task.abort();
        }
    }

    /// Clears results and cancels any pending lookup.
    pub fn clear(&self) {
        let mut session = self.inner.lock_session();
        if session.closed {
            return;
        }
        session.reset();
        self.inner.publish(DuplicateState::default());
        self.inner.idle.notify_waiters();
    }

    /// Returns the record kind this coordinator checks.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.inner.kind
    }

    /// Returns the identity excluded from results.
    #[must_use]
    pub fn record_id(&self) -> Option<i64> {
        self.inner.record_id
    }

    /// Returns a snapshot of the published state.
    #[must_use]
    pub fn state(&self) -> DuplicateState {
        self.inner.state.borrow().clone()
    }

    /// Returns the latest applied candidate list.
    #[must_use]
    pub fn duplicates(&self) -> Vec<DuplicateCandidate> {
        self.inner.state.borrow().duplicates.clone()
    }

    /// Returns whether a lookup is in progress.
    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.inner.state.borrow().checking
    }

    /// Returns the snapshot currently waiting out the debounce window or
    /// being looked up, if any.
    #[must_use]
    pub fn pending_snapshot(&self) -> Option<CheckableAttributes> {
        match &self.inner.lock_session().phase {
            Phase::Idle => None,
            Phase::Waiting { snapshot, .. } | Phase::Checking { snapshot, .. } => {
                Some(snapshot.clone())
            },
        }
    }

    /// Subscribes to state changes.
    ///
    /// The channel keeps only the latest state, so a receiver that is slow to
    /// poll may never see a short-lived `checking: true`. Use
    /// [`settled`](Self::settled) to wait for a lookup to finish.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DuplicateState> {
        self.inner.state.subscribe()
    }

    /// Waits until no snapshot is waiting out the window or being looked up,
    /// then returns the published state.
    ///
    /// Returns at once when the session is already idle. A lookup that fails
    /// settles with an empty candidate list.
    pub async fn settled(&self) -> DuplicateState {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a wake-up between the check and the
            // await is not lost.
            notified.as_mut().enable();

            let idle = matches!(self.inner.lock_session().phase, Phase::Idle);
            if idle {
                return self.state();
            }
            notified.await;
        }
    }
}

impl<L: DuplicateLookup> Drop for DuplicateCoordinator<L> {
    fn drop(&mut self) {
        let mut session = self.inner.lock_session();
        session.closed = true;
        session.reset();
        if let Some(task) = session.in_flight.take() {
            task.abort();
        }
    }
}
