//! The three loops that drive the pipeline.
//!
//! One periodic poll loop scans both event kinds and sends at most one
//! batched request per cycle. One reactive loop answers ring signals
//! with a short settle delay and a single-event send. One health loop
//! probes the backend on its own period. The loops share the per-kind
//! dedup caches behind mutexes; a key is forgotten again whenever its
//! batch did not reach the backend, so the next cycle retries naturally.

use std::sync::Arc;

use relay_core::{event_key, Clock, DedupCache, Event, EventKind};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    forwarder::{Forwarder, SendOutcome},
    health::HealthMonitor,
    source::{EventSource, RingSignal},
};

/// Timing knobs for the scheduler loops.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the poll loop.
    pub poll_interval: std::time::Duration,
    /// Period of the health-probe loop.
    pub health_interval: std::time::Duration,
    /// Settle delay between a ring signal and reading the call record,
    /// giving the platform time to commit it.
    pub ring_delay: std::time::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: std::time::Duration::from_secs(60),
            health_interval: std::time::Duration::from_secs(600),
            ring_delay: std::time::Duration::from_secs(2),
        }
    }
}

/// Owns the pipeline loops and the shared dedup state.
#[derive(Debug)]
pub struct Scheduler {
    source: Arc<dyn EventSource>,
    forwarder: Forwarder,
    health: HealthMonitor,
    clock: Arc<dyn Clock>,
    message_cache: Mutex<DedupCache>,
    call_cache: Mutex<DedupCache>,
    config: SchedulerConfig,
}

/// Handle for stopping a spawned scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Requests cancellation and waits for the loops to stop. In-flight
    /// sends complete or fail on their own.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(error) = task.await {
                warn!(%error, "scheduler task panicked during shutdown");
            }
        }
    }

    /// Token observed by all loops; useful for tying the scheduler into
    /// a wider shutdown tree.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Scheduler {
    /// Creates a scheduler over the given source, forwarder, and health
    /// monitor.
    pub fn new(
        source: Arc<dyn EventSource>,
        forwarder: Forwarder,
        health: HealthMonitor,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            source,
            forwarder,
            health,
            message_cache: Mutex::new(DedupCache::new(Arc::clone(&clock))),
            call_cache: Mutex::new(DedupCache::new(Arc::clone(&clock))),
            clock,
            config,
        }
    }

    /// Runs one poll cycle: scan both kinds, gate through the caches,
    /// send at most one batched request, then evict.
    pub async fn run_poll_cycle(&self) {
        let mut batch: Vec<(EventKind, String, Event)> = Vec::new();

        for kind in [EventKind::Message, EventKind::Call] {
            let records = match self.source.poll(kind).await {
                Ok(records) => records,
                Err(error) => {
                    warn!(%kind, %error, "source poll failed, skipping kind this cycle");
                    continue;
                },
            };

            for record in records {
                match record {
                    Ok(event) => {
                        let key = event_key(&event, self.clock.as_ref());
                        let mut cache = self.cache_for(kind).lock().await;
                        if cache.should_notify(&key, event.occurred_at) {
                            batch.push((kind, key, event));
                        }
                    },
                    Err(error) => warn!(%error, "skipping unreadable source record"),
                }
            }
        }

        if !batch.is_empty() {
            let events: Vec<Event> = batch.iter().map(|(_, _, event)| event.clone()).collect();

            match self.forwarder.send(&events).await {
                Ok(SendOutcome::Delivered { status }) => {
                    debug!(count = events.len(), status, "poll cycle delivered batch");
                },
                Ok(SendOutcome::Skipped) => {
                    debug!("batch skipped, releasing dedup keys");
                    self.release_keys(&batch).await;
                },
                Err(error) => {
                    warn!(%error, "batch send failed, releasing dedup keys");
                    self.release_keys(&batch).await;
                },
            }
        }

        self.message_cache.lock().await.evict();
        self.call_cache.lock().await.evict();
    }

    /// Handles one ring signal: wait out the settle delay, read the
    /// most recent call, gate it through the shared call cache, and send
    /// it on its own.
    pub async fn handle_ring_signal(&self) {
        self.clock.sleep(self.config.ring_delay).await;

        let event = match self.source.latest_call().await {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(error) => {
                warn!(%error, "failed to read latest call after ring signal");
                return;
            },
        };

        let key = event_key(&event, self.clock.as_ref());
        let fresh = self.call_cache.lock().await.should_notify(&key, event.occurred_at);
        if !fresh {
            debug!("ring-signalled call already reported");
            return;
        }

        match self.forwarder.send(std::slice::from_ref(&event)).await {
            Ok(SendOutcome::Delivered { status }) => {
                debug!(status, "ring-triggered call delivered");
            },
            Ok(SendOutcome::Skipped) => {
                self.call_cache.lock().await.forget([&key]);
            },
            Err(error) => {
                warn!(%error, "ring-triggered send failed, releasing dedup key");
                self.call_cache.lock().await.forget([&key]);
            },
        }
    }

    /// Runs one health probe.
    pub async fn run_health_probe(&self) {
        self.health.probe().await;
    }

    /// Spawns the poll, ring, and health loops. All three stop when the
    /// returned handle is shut down.
    pub fn spawn(self: Arc<Self>, mut ring_rx: mpsc::Receiver<RingSignal>) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let mut tasks = Vec::with_capacity(3);

        {
            let scheduler = Arc::clone(&self);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(scheduler.config.poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        _ = ticker.tick() => scheduler.run_poll_cycle().await,
                    }
                }
                info!("poll loop stopped");
            }));
        }

        {
            let scheduler = Arc::clone(&self);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        signal = ring_rx.recv() => match signal {
                            Some(RingSignal) => scheduler.handle_ring_signal().await,
                            None => break,
                        },
                    }
                }
                info!("ring loop stopped");
            }));
        }

        {
            let scheduler = Arc::clone(&self);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(scheduler.config.health_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        _ = ticker.tick() => scheduler.run_health_probe().await,
                    }
                }
                info!("health loop stopped");
            }));
        }

        SchedulerHandle { cancel, tasks }
    }

    fn cache_for(&self, kind: EventKind) -> &Mutex<DedupCache> {
        match kind {
            EventKind::Message => &self.message_cache,
            EventKind::Call => &self.call_cache,
        }
    }

    async fn release_keys(&self, batch: &[(EventKind, String, Event)]) {
        for kind in [EventKind::Message, EventKind::Call] {
            let keys: Vec<&String> =
                batch.iter().filter(|(k, _, _)| *k == kind).map(|(_, key, _)| key).collect();
            if !keys.is_empty() {
                self.cache_for(kind).lock().await.forget(keys);
            }
        }
    }
}
