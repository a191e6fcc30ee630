//! Fan-out dispatcher
//!
//! A dispatcher owns one bounded multi-consumer channel and a fixed pool of
//! forwarder threads competing for its events. Every event reaches exactly
//! one worker. Ordering is only preserved within a single worker's
//! consecutive deliveries.
//!
//! Cancellation is a zero-capacity channel whose sender is dropped once;
//! workers and blocked submitters observe the disconnect through `select!`.
//!
//! Send failures, panics and shutdown notices are written to the
//! [`ConsoleSink`] passed to [`Dispatcher::start`].

use super::{
    error::{LoggerError, Result},
    forwarder::Forwarder,
    log_event::LogEvent,
    metrics::LoggerMetrics,
};
use crate::appenders::ConsoleSink;
use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default timeout for joining workers during shutdown (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Worker count used when the caller asks for zero workers
pub const DEFAULT_WORKER_COUNT: usize = 100;

/// Default channel capacity
///
/// Zero makes the channel a rendezvous: `submit` returns only once a worker
/// has taken the event, so producers are throttled to the pool's pace.
/// Larger values let producers run ahead by that many events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Uninitialized,
    Running,
    Cancelling,
    Terminated,
}

/// Worker count actually launched for a requested count
pub fn effective_worker_count(requested: usize) -> usize {
    if requested == 0 {
        DEFAULT_WORKER_COUNT
    } else {
        requested
    }
}

fn is_cancelled(cancelled: &Receiver<()>) -> bool {
    matches!(cancelled.try_recv(), Err(TryRecvError::Disconnected))
}

/// Producer side of a dispatcher
///
/// Cloned out of the dispatcher so callers can block on a full channel
/// without holding any lock on the dispatcher itself.
#[derive(Clone)]
pub struct Submitter {
    events: Sender<LogEvent>,
    cancelled: Receiver<()>,
    metrics: Arc<LoggerMetrics>,
}

impl Submitter {
    /// Hand an event to the pool, blocking while no worker or buffer slot
    /// is free. Returns `false` if the event was dropped because the
    /// dispatcher was cancelled first.
    pub fn submit(&self, event: LogEvent) -> bool {
        if is_cancelled(&self.cancelled) {
            self.metrics.record_dropped();
            return false;
        }

        select! {
            send(self.events, event) -> res => match res {
                Ok(()) => {
                    self.metrics.record_submitted();
                    true
                }
                Err(_) => {
                    self.metrics.record_dropped();
                    false
                }
            },
            recv(self.cancelled) -> _ => {
                self.metrics.record_dropped();
                false
            }
        }
    }
}

/// Decrements the live worker count when a worker exits
struct LiveWorker(Arc<AtomicUsize>);

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Dispatcher {
    submitter: Submitter,
    /// Kept so events still queued at shutdown can be counted as dropped
    backlog: Receiver<LogEvent>,
    cancel: Option<Sender<()>>,
    workers: Vec<thread::JoinHandle<()>>,
    live_workers: Arc<AtomicUsize>,
    state: DispatcherState,
    forwarder_name: String,
    diagnostics: Arc<ConsoleSink>,
}

impl Dispatcher {
    /// Launch `effective_worker_count(worker_count)` forwarders draining a
    /// channel of `capacity` slots into `forwarder`. Failures are reported
    /// on `diagnostics`.
    ///
    /// If a thread cannot be spawned, the workers already started are
    /// cancelled and joined before the error is returned.
    pub fn start(
        worker_count: usize,
        capacity: usize,
        forwarder: Arc<dyn Forwarder>,
        metrics: Arc<LoggerMetrics>,
        diagnostics: Arc<ConsoleSink>,
    ) -> Result<Self> {
        let count = effective_worker_count(worker_count);
        let (events_tx, events_rx) = bounded(capacity);
        let (cancel_tx, cancel_rx) = bounded::<()>(0);

        let mut dispatcher = Self {
            submitter: Submitter {
                events: events_tx,
                cancelled: cancel_rx.clone(),
                metrics: Arc::clone(&metrics),
            },
            backlog: events_rx.clone(),
            cancel: Some(cancel_tx),
            workers: Vec::with_capacity(count),
            live_workers: Arc::new(AtomicUsize::new(0)),
            state: DispatcherState::Running,
            forwarder_name: forwarder.name().to_string(),
            diagnostics: Arc::clone(&diagnostics),
        };

        for index in 0..count {
            let events = events_rx.clone();
            let cancelled = cancel_rx.clone();
            let forwarder = Arc::clone(&forwarder);
            let metrics = Arc::clone(&metrics);
            let diagnostics = Arc::clone(&diagnostics);

            dispatcher.live_workers.fetch_add(1, Ordering::SeqCst);
            let live = LiveWorker(Arc::clone(&dispatcher.live_workers));

            let handle = thread::Builder::new()
                .name(format!("index-forwarder-{}", index))
                .spawn(move || {
                    let _live = live;
                    run_worker(events, cancelled, forwarder.as_ref(), &metrics, &diagnostics);
                })
                .map_err(|source| LoggerError::WorkerSpawn { index, source })?;

            dispatcher.workers.push(handle);
        }

        Ok(dispatcher)
    }

    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    /// Blocking submit, see [`Submitter::submit`]
    pub fn submit(&self, event: LogEvent) -> bool {
        self.submitter.submit(event)
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Number of launched workers
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of worker threads that have not exited yet
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    /// Cancel the pool and wait up to `timeout` for the workers to exit
    ///
    /// Sends already in progress are allowed to finish. Events still queued
    /// or not yet forwarded are dropped and counted.
    ///
    /// # Returns
    ///
    /// `true` if every worker exited cleanly within the timeout
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        if self.state == DispatcherState::Terminated {
            return true;
        }

        self.state = DispatcherState::Cancelling;
        drop(self.cancel.take());

        let deadline = Instant::now() + timeout;
        let mut clean = true;
        let mut stragglers = 0usize;

        for handle in self.workers.drain(..) {
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        self.diagnostics.diagnostic(format_args!(
                            "[LOGGER ERROR] Forwarder thread panicked during shutdown: {:?}",
                            e
                        ));
                        clean = false;
                    }
                    break;
                }

                if Instant::now() >= deadline {
                    stragglers += 1;
                    clean = false;
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        if stragglers > 0 {
            self.diagnostics.diagnostic(format_args!(
                "[LOGGER WARNING] {} forwarder thread(s) did not finish within {:?} timeout. \
                 They will exit after their current send.",
                stragglers, timeout
            ));
        }

        let pending = self.backlog.try_iter().count() as u64;
        if pending > 0 {
            self.submitter.metrics.record_dropped_many(pending);
        }

        self.diagnostics.diagnostic(format_args!(
            "[LOGGER INFO] Stopped forwarders for '{}', due to a forced cancel",
            self.forwarder_name
        ));

        self.state = DispatcherState::Terminated;
        clean
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if self.state != DispatcherState::Terminated {
            self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}

fn run_worker(
    events: Receiver<LogEvent>,
    cancelled: Receiver<()>,
    forwarder: &dyn Forwarder,
    metrics: &LoggerMetrics,
    diagnostics: &ConsoleSink,
) {
    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(event) => {
                    // Events taken after cancellation are dropped unsent
                    if is_cancelled(&cancelled) {
                        metrics.record_dropped();
                        break;
                    }
                    forward_isolated(forwarder, &event, metrics, diagnostics);
                }
                Err(_) => break,
            },
            recv(cancelled) -> _ => break,
        }
    }
}

/// Forward one event, containing both errors and panics to this event
fn forward_isolated(
    forwarder: &dyn Forwarder,
    event: &LogEvent,
    metrics: &LoggerMetrics,
    diagnostics: &ConsoleSink,
) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| forwarder.forward(event)));

    match result {
        Ok(Ok(())) => {
            metrics.record_forwarded();
        }
        Ok(Err(e)) => {
            diagnostics.diagnostic(format_args!(
                "[LOGGER ERROR] Forwarder '{}' failed: {}",
                forwarder.name(),
                e
            ));
            metrics.record_failed();
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            diagnostics.diagnostic(format_args!(
                "[LOGGER CRITICAL] Forwarder '{}' panicked: {}. Worker continues.",
                forwarder.name(),
                panic_msg
            ));
            metrics.record_failed();
        }
    }
}
