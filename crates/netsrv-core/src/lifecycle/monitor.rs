//! Availability monitor
//!
//! When the network service is not reachable at startup, the monitor keeps
//! probing it from a background task at a fixed interval and performs the
//! event subscription once it answers.
//!
//! ## Shutdown Ordering
//!
//! [`AvailabilityMonitor::shutdown`] raises the exit signal and then awaits
//! the worker. Callers unsubscribe only after it returns, so no subscription
//! can be created behind their back.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::lifecycle::{Readiness, SubscriptionSet};
use crate::traits::BusClient;

/// Monitor state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not started
    Idle,
    /// Background probe loop running
    Probing,
    /// Events subscribed and readiness set (terminal)
    Subscribed,
    /// Shut down before success (terminal)
    Aborted,
}

/// Background availability probe and one-time subscription
pub struct AvailabilityMonitor {
    shared: Arc<Shared>,
    context: Mutex<Option<RetryContext>>,
}

struct Shared {
    bus: Arc<dyn BusClient>,
    subscriptions: Arc<SubscriptionSet>,
    readiness: Arc<Readiness>,
    state: Mutex<MonitorState>,
    retries: AtomicU32,
    probe_timeout: Duration,
    retry_interval: Duration,
}

/// Owned by the monitor while a worker exists
struct RetryContext {
    exit: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl AvailabilityMonitor {
    /// Create an idle monitor
    pub fn new(
        bus: Arc<dyn BusClient>,
        subscriptions: Arc<SubscriptionSet>,
        readiness: Arc<Readiness>,
        probe_timeout: Duration,
        retry_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                bus,
                subscriptions,
                readiness,
                state: Mutex::new(MonitorState::Idle),
                retries: AtomicU32::new(0),
                probe_timeout,
                retry_interval,
            }),
            context: Mutex::new(None),
        }
    }

    /// Current state
    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    /// Number of failed probes so far
    pub fn retry_count(&self) -> u32 {
        self.shared.retries.load(Ordering::Acquire)
    }

    /// Start the probe loop
    ///
    /// Only an idle monitor starts; every other call is a no-op.
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// `true` if this call spawned the worker
    pub fn start(&self) -> bool {
        let mut context = lock(&self.context);

        {
            let mut state = lock(&self.shared.state);
            if *state != MonitorState::Idle {
                debug!("Availability monitor already {:?}, not starting", *state);
                return false;
            }
            *state = MonitorState::Probing;
        }

        let (exit_tx, exit_rx) = watch::channel(false);
        let worker = tokio::spawn(Arc::clone(&self.shared).run(exit_rx));

        *context = Some(RetryContext {
            exit: exit_tx,
            worker,
        });

        info!("NETWORK_NOT_READY: network service unavailable, probing in background");
        true
    }

    /// Stop the probe loop and wait for the worker to return
    ///
    /// # Returns
    ///
    /// The terminal state: `Subscribed` if the worker succeeded first,
    /// otherwise `Aborted`.
    pub async fn shutdown(&self) -> MonitorState {
        let context = lock(&self.context).take();

        if let Some(RetryContext { exit, worker }) = context {
            exit.send_replace(true);
            if let Err(e) = worker.await {
                warn!("Availability monitor worker failed: {}", e);
            }
        }

        let mut state = lock(&self.shared.state);
        if matches!(*state, MonitorState::Idle | MonitorState::Probing) {
            *state = MonitorState::Aborted;
        }
        *state
    }
}

impl Shared {
    fn state(&self) -> MonitorState {
        *lock(&self.state)
    }

    fn finish(&self, state: MonitorState) {
        *lock(&self.state) = state;
    }

    async fn run(self: Arc<Self>, mut exit: watch::Receiver<bool>) {
        loop {
            if *exit.borrow() {
                info!("Exiting availability monitor");
                self.finish(MonitorState::Aborted);
                return;
            }

            if self.readiness.is_ready() {
                debug!("Readiness already set, availability monitor done");
                self.finish(MonitorState::Subscribed);
                return;
            }

            match probe(self.bus.as_ref(), self.probe_timeout).await {
                Ok(()) if *exit.borrow() => continue,
                Ok(()) => match self.subscriptions.subscribe_all().await {
                    Ok(_) => {
                        self.readiness.mark_ready();
                        self.finish(MonitorState::Subscribed);
                        info!(
                            "NETWORK_AVAILABILITY_RETRY_SUCCESS: subscribed to network service events after {} retries",
                            self.retries.load(Ordering::Acquire)
                        );
                        return;
                    }
                    Err(e) => warn!("Network service answered but subscription failed: {}", e),
                },
                Err(e) => debug!(
                    "Network service not available ({}), retry = {}",
                    e,
                    self.retries.load(Ordering::Acquire)
                ),
            }

            self.retries.fetch_add(1, Ordering::AcqRel);

            tokio::select! {
                _ = tokio::time::sleep(self.retry_interval) => {}
                changed = exit.changed() => {
                    if changed.is_err() {
                        // Monitor dropped without shutdown
                        self.finish(MonitorState::Aborted);
                        return;
                    }
                }
            }
        }
    }
}

/// One bounded availability probe
pub(crate) async fn probe(bus: &dyn BusClient, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, bus.is_available(timeout)).await {
        Ok(result) => result,
        Err(_) => Err(Error::upstream(format!(
            "availability probe timed out after {:?}",
            timeout
        ))),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
