// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Connection supervisor.
//!
//! One supervisor owns one transport. Transport events drive the
//! connection state through [`next_state`]; a dedicated reconnector thread
//! sleeps on a condition variable until the link is lost and then retries
//! with backoff, escalating once the attempt budget is used up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::escalation::Escalation;
use super::machine::{next_state, LinkAction};
use super::policies::{
    Backoff, BackoffState, ExponentialBackoff, HealthCheckPolicy, RetryPolicy, RetryStep,
};
use crate::link::state::ConnectionState;
use crate::link::{EventSink, EventTarget, Transport, TransportEvent};
use crate::observe::{ObservableCell, StateLog};
use crate::{LinkError, LinkResult};

/// Retry, health-check and escalation settings for one supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    retry: Arc<dyn RetryPolicy>,
    health: HealthCheckPolicy,
    escalation: Option<Escalation>,
}

impl SupervisorConfig {
    /// Bounded retries, then `escalation` runs once.
    pub fn escalating(escalation: Escalation) -> Self {
        Self {
            retry: Arc::new(ExponentialBackoff::bounded()),
            health: HealthCheckPolicy::disabled(),
            escalation: Some(escalation),
        }
    }

    /// Retry forever, never escalate.
    pub fn persistent() -> Self {
        Self {
            retry: Arc::new(ExponentialBackoff::unbounded()),
            health: HealthCheckPolicy::disabled(),
            escalation: None,
        }
    }

    pub fn with_retry(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_health(mut self, health: HealthCheckPolicy) -> Self {
        self.health = health;
        self
    }

    pub fn retry(&self) -> &dyn RetryPolicy {
        self.retry.as_ref()
    }

    pub fn health(&self) -> &HealthCheckPolicy {
        &self.health
    }

    pub fn escalates(&self) -> bool {
        self.escalation.is_some()
    }
}

/// Outcome of waiting for the link after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Connected,
    TimedOut,
    Shutdown,
}

struct Signal {
    stopping: bool,
}

struct Shared<T> {
    id: String,
    transport: T,
    cell: ObservableCell<ConnectionState>,
    backoff: Mutex<Backoff>,
    signal: Mutex<Signal>,
    wake: Condvar,
    health: HealthCheckPolicy,
    escalation: Option<Escalation>,
}

impl<T: Transport> Shared<T> {
    fn lock_signal(&self) -> MutexGuard<'_, Signal> {
        self.signal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_backoff(&self) -> MutexGuard<'_, Backoff> {
        self.backoff.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> ConnectionState {
        self.cell.get_state()
    }

    fn notify(&self) {
        let _guard = self.lock_signal();
        self.wake.notify_all();
    }

    fn connect(&self) {
        if let Err(e) = self.transport.connect() {
            warn!("{}: connect failed: {}", self.id, e);
        }
    }

    /// Block until the link is Disconnected. Returns `false` on shutdown.
    fn wait_for_disconnect(&self) -> bool {
        let guard = self.lock_signal();
        let guard = self
            .wake
            .wait_while(guard, |s| {
                !s.stopping && self.state() != ConnectionState::Disconnected
            })
            .unwrap_or_else(PoisonError::into_inner);
        !guard.stopping
    }

    fn wait_for_connect(&self, timeout: Duration) -> WaitOutcome {
        let guard = self.lock_signal();
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, timeout, |s| {
                !s.stopping && self.state() != ConnectionState::Connected
            })
            .unwrap_or_else(PoisonError::into_inner);
        if guard.stopping {
            WaitOutcome::Shutdown
        } else if self.state() == ConnectionState::Connected {
            WaitOutcome::Connected
        } else {
            WaitOutcome::TimedOut
        }
    }

    /// Sleep for `period` unless shutdown is requested first.
    fn sleep(&self, period: Duration) -> bool {
        let guard = self.lock_signal();
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, period, |s| !s.stopping)
            .unwrap_or_else(PoisonError::into_inner);
        !guard.stopping
    }

    /// Charge one attempt to the backoff while the link is still
    /// Disconnected. Returns `None` if an event moved it on since the
    /// reconnector woke up.
    fn next_attempt(&self) -> Option<(RetryStep, u32)> {
        let signal = self.lock_signal();
        if signal.stopping || self.state() != ConnectionState::Disconnected {
            return None;
        }
        let mut backoff = self.lock_backoff();
        let step = backoff.next_delay();
        Some((step, backoff.state().attempt))
    }

    fn reconnect_loop(&self) {
        debug!("{}: reconnector started", self.id);
        while self.wait_for_disconnect() {
            let Some((step, attempt)) = self.next_attempt() else {
                debug!("{}: link left Disconnected, skipping attempt", self.id);
                continue;
            };
            let delay = match step {
                RetryStep::Retry(delay) => delay,
                RetryStep::Exhausted { attempts } => {
                    match &self.escalation {
                        Some(escalation) => escalation.escalate(&self.id, attempts),
                        None => error!(
                            "{}: retry budget exhausted after {} attempts",
                            self.id, attempts
                        ),
                    }
                    break;
                }
            };

            info!(
                "{}: reconnect attempt {} (waiting up to {:?})",
                self.id, attempt, delay
            );
            self.connect();

            match self.wait_for_connect(delay) {
                WaitOutcome::Connected => {
                    info!("{}: reconnected after {} attempt(s)", self.id, attempt);
                    self.lock_backoff().reset();
                }
                WaitOutcome::TimedOut => {
                    debug!("{}: attempt {} timed out", self.id, attempt);
                }
                WaitOutcome::Shutdown => break,
            }
        }
        debug!("{}: reconnector stopped", self.id);
    }

    fn health_loop(&self, interval: Duration) {
        let threshold = self.health.unreachable_threshold();
        let mut misses = 0u32;
        while self.sleep(interval) {
            if !self.state().is_connected() {
                misses = 0;
                continue;
            }
            let Some(health) = self.transport.probe() else {
                continue;
            };
            match health.rssi_dbm {
                Some(rssi) => debug!("{}: RSSI {} dBm", self.id, rssi),
                None => debug!("{}: probe ok={}", self.id, health.reachable),
            }
            if health.reachable {
                misses = 0;
                continue;
            }
            misses += 1;
            warn!("{}: unreachable ({}/{})", self.id, misses, threshold);
            if misses >= threshold {
                misses = 0;
                if let Err(e) = self.transport.disconnect() {
                    warn!("{}: forced disconnect failed: {}", self.id, e);
                }
            }
        }
    }
}

impl<T: Transport> EventTarget for Shared<T> {
    fn handle_event(&self, event: TransportEvent) {
        let mut action = None;
        let changed = self.cell.update(|current| {
            let transition = next_state(*current, &event)?;
            action = transition.action;
            Some(transition.to)
        });

        let Some((from, to)) = changed else {
            debug!(
                "{}: ignoring {} in state {}",
                self.id,
                event,
                self.state()
            );
            return;
        };
        debug!("{}: {} ({} -> {})", self.id, event, from, to);

        if action == Some(LinkAction::ResetBackoff) {
            self.lock_backoff().reset();
        }
        self.notify();
        if action == Some(LinkAction::Connect) {
            self.connect();
        }
    }
}

/// Keeps one transport connected.
///
/// Construction never spawns threads; [`init`](Self::init) starts the
/// transport and the worker threads, [`stop`](Self::stop) (also run on
/// drop) shuts them down and joins them.
pub struct ConnectionSupervisor<T: Transport> {
    shared: Arc<Shared<T>>,
    initialized: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Transport> ConnectionSupervisor<T> {
    pub fn new(id: impl Into<String>, transport: T, config: SupervisorConfig) -> Self {
        Self::build(id.into(), transport, config, None)
    }

    /// Like [`new`](Self::new), recording transitions in `log`.
    pub fn with_log(
        id: impl Into<String>,
        transport: T,
        config: SupervisorConfig,
        log: Arc<StateLog>,
    ) -> Self {
        Self::build(id.into(), transport, config, Some(log))
    }

    fn build(
        id: String,
        transport: T,
        config: SupervisorConfig,
        log: Option<Arc<StateLog>>,
    ) -> Self {
        let mut cell = ObservableCell::new(
            id.clone(),
            ConnectionState::NotInitialized,
            ConnectionState::describe,
        );
        if let Some(log) = log {
            cell = cell.with_log(log);
        }
        let shared = Arc::new(Shared {
            id,
            transport,
            cell,
            backoff: Mutex::new(Backoff::new(config.retry)),
            signal: Mutex::new(Signal { stopping: false }),
            wake: Condvar::new(),
            health: config.health,
            escalation: config.escalation,
        });
        Self {
            shared,
            initialized: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Start the transport and spawn the worker threads.
    pub fn init(&self) -> LinkResult<()> {
        let id = &self.shared.id;
        if self.initialized.swap(true, Ordering::SeqCst)
            || self.shared.state() != ConnectionState::NotInitialized
        {
            return Err(LinkError::AlreadyInitialized(id.clone()));
        }

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        let target: Weak<dyn EventTarget> = weak;
        self.shared.transport.bind(EventSink::new(target));

        if let Err(e) = self.shared.transport.start() {
            error!("{}: transport start failed: {}", id, e);
            self.initialized.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let mut workers = self.lock_workers();
        let shared = self.shared.clone();
        workers.push(spawn(format!("{}-reconnect", id), move || {
            shared.reconnect_loop()
        })?);

        if let Some(interval) = self.shared.health.interval() {
            let shared = self.shared.clone();
            match spawn(format!("{}-health", id), move || shared.health_loop(interval)) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    drop(workers);
                    self.stop();
                    return Err(e);
                }
            }
        }
        info!("{}: supervisor initialized", id);
        Ok(())
    }

    /// Signal the workers to exit and join them. Safe to call repeatedly.
    pub fn stop(&self) {
        {
            let mut signal = self.shared.lock_signal();
            signal.stopping = true;
            self.shared.wake.notify_all();
        }
        let workers: Vec<JoinHandle<()>> = self.lock_workers().drain(..).collect();
        if workers.is_empty() {
            return;
        }
        for handle in workers {
            if handle.join().is_err() {
                warn!("{}: worker thread panicked", self.shared.id);
            }
        }
        info!("{}: supervisor stopped", self.shared.id);
    }

    pub fn is_connected(&self) -> bool {
        self.shared.state().is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Current retry progress.
    pub fn backoff(&self) -> BackoffState {
        self.shared.lock_backoff().state()
    }

    pub fn cell(&self) -> &ObservableCell<ConnectionState> {
        &self.shared.cell
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    fn lock_workers(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> Drop for ConnectionSupervisor<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn<F>(name: String, f: F) -> LinkResult<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| LinkError::Spawn { name, source })
}
