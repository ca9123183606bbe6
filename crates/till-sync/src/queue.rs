//! # Offline Queue
//!
//! Durable FIFO queue of sales awaiting server acknowledgement, plus the
//! background worker that drains it.
//!
//! ## Drain Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Offline Queue Drain                               │
//! │                                                                         │
//! │  enqueue(sale) ──► store.append ──► ACK only after the row is durable  │
//! │                                                                         │
//! │  drain():                                                               │
//! │  1. Single-flight: a second concurrent drain returns immediately       │
//! │  2. entries = store.pending()           (oldest-first, always)         │
//! │  3. for each entry, IN ORDER:                                           │
//! │       submit(entry.sale)  - same local_id on every retry               │
//! │       Ok(ack)        → store.remove, sale.mark_synced(ack.server_id)   │
//! │       Err(anything)  → attempts += 1, last_error recorded, STOP        │
//! │                                                                         │
//! │  Stopping on the first failure is what preserves FIFO: entry N+1 is    │
//! │  never submitted before entry N has been acknowledged.                 │
//! │                                                                         │
//! │  NOTHING IS EVER DROPPED AUTOMATICALLY. An entry stuck past the warn   │
//! │  threshold is logged loudly and waits for purge(), a deliberate,       │
//! │  manual, logged operation.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use till_core::{OfflineQueueEntry, Sale, SyncState};

use crate::config::QueueConfig;
use crate::connectivity::ConnectivitySignal;
use crate::endpoint::SaleEndpoint;
use crate::error::{SyncError, SyncResult};
use crate::store::QueueStore;

// =============================================================================
// Drain Report
// =============================================================================

/// What one drain pass accomplished.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Sales acknowledged this pass, in queue order, with `server_id` set
    /// and `sync_state == Synced`.
    pub synced: Vec<Sale>,

    /// Entries still queued after the pass.
    pub remaining: u64,

    /// Why the pass stopped early, if it did.
    pub stopped_on: Option<SyncError>,

    /// True when another drain was already in flight and this call did
    /// nothing.
    pub already_running: bool,
}

impl DrainReport {
    /// True when the queue is empty and nothing went wrong.
    pub fn fully_drained(&self) -> bool {
        self.remaining == 0 && self.stopped_on.is_none() && !self.already_running
    }
}

// =============================================================================
// Offline Queue
// =============================================================================

/// The durable offline queue. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct OfflineQueue {
    store: Arc<dyn QueueStore>,
    endpoint: Arc<dyn SaleEndpoint>,
    draining: Arc<AtomicBool>,
    attempts_warn_threshold: i64,
}

/// Resets the single-flight flag on every exit path out of `drain`.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl OfflineQueue {
    pub fn new(
        store: Arc<dyn QueueStore>,
        endpoint: Arc<dyn SaleEndpoint>,
        config: &QueueConfig,
    ) -> Self {
        OfflineQueue {
            store,
            endpoint,
            draining: Arc::new(AtomicBool::new(false)),
            attempts_warn_threshold: config.attempts_warn_threshold,
        }
    }

    /// Durably enqueues a sale for later submission.
    ///
    /// Returns only after the entry is on disk; from this point the sale
    /// cannot be lost by a crash or power failure.
    pub async fn enqueue(&self, sale: Sale) -> SyncResult<OfflineQueueEntry> {
        let entry = OfflineQueueEntry::new(sale, Utc::now());
        self.store.append(&entry).await?;

        info!(
            local_id = %entry.sale.local_id,
            total = %entry.sale.total,
            "Sale queued for offline sync"
        );
        Ok(entry)
    }

    /// Entries currently queued, oldest-first.
    ///
    /// An entry with a recorded failed attempt surfaces with
    /// `sync_state == Failed`. The state is derived here from the attempt
    /// metadata; the stored payload is never rewritten.
    pub async fn pending(&self) -> SyncResult<Vec<OfflineQueueEntry>> {
        let mut entries = self.store.pending().await?;
        for entry in &mut entries {
            if entry.last_error.is_some() {
                entry.sale.sync_state = SyncState::Failed;
            }
        }
        Ok(entries)
    }

    /// Number of queued entries.
    pub async fn pending_count(&self) -> SyncResult<u64> {
        Ok(self.store.count().await?)
    }

    /// Replays queued sales oldest-first, stopping at the first failure.
    ///
    /// Single-flight: concurrent calls (interval tick racing a connectivity
    /// edge) collapse into one pass; the loser returns immediately with
    /// `already_running` set.
    pub async fn drain(&self) -> SyncResult<DrainReport> {
        if self.draining.swap(true, Ordering::SeqCst) {
            debug!("Drain already in flight, skipping");
            return Ok(DrainReport {
                already_running: true,
                remaining: self.store.count().await?,
                ..DrainReport::default()
            });
        }
        let _guard = DrainGuard(self.draining.as_ref());

        let entries = self.store.pending().await?;
        if entries.is_empty() {
            return Ok(DrainReport::default());
        }

        info!(count = entries.len(), "Draining offline queue");

        let mut report = DrainReport::default();

        for entry in entries {
            let local_id = entry.sale.local_id.clone();

            match self.endpoint.submit(&entry.sale).await {
                Ok(ack) => {
                    // Remove first: if the process dies between ack and
                    // remove, the entry is resubmitted with the same
                    // local_id and the server deduplicates.
                    self.store.remove(&local_id).await?;

                    let mut sale = entry.sale;
                    sale.mark_synced(&ack.server_id);

                    info!(
                        local_id = %local_id,
                        server_id = %ack.server_id,
                        "Queued sale synced"
                    );
                    report.synced.push(sale);
                }
                Err(e) => {
                    self.store.record_attempt(&local_id, &e.to_string()).await?;

                    let attempts = entry.attempts + 1;
                    if attempts >= self.attempts_warn_threshold {
                        warn!(
                            local_id = %local_id,
                            attempts,
                            error = %e,
                            "Queue entry is stuck; manual purge may be needed"
                        );
                    } else {
                        debug!(local_id = %local_id, attempts, error = %e, "Sync attempt failed");
                    }

                    // Stop here: submitting younger entries first would
                    // break the FIFO replay order.
                    report.stopped_on = Some(e.into());
                    break;
                }
            }
        }

        report.remaining = self.store.count().await?;
        Ok(report)
    }

    /// Deliberately removes a stuck entry. This is the ONLY path that drops
    /// a queued sale, and it is always operator-initiated.
    pub async fn purge(&self, local_id: &str) -> SyncResult<bool> {
        let removed = self.store.remove(local_id).await?;
        if removed {
            warn!(local_id = %local_id, "Queue entry purged manually");
        }
        Ok(removed)
    }
}

// =============================================================================
// Queue Worker
// =============================================================================

/// Background drain loop.
///
/// Drains on a fixed interval while online, and immediately on every
/// offline→online connectivity edge.
pub struct QueueWorker {
    queue: OfflineQueue,
    connectivity: ConnectivitySignal,
    drain_interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a running worker.
#[derive(Clone)]
pub struct QueueWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl QueueWorkerHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }
}

impl QueueWorker {
    /// Creates a worker and its control handle.
    pub fn new(
        queue: OfflineQueue,
        connectivity: ConnectivitySignal,
        config: &QueueConfig,
    ) -> (Self, QueueWorkerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = QueueWorker {
            queue,
            connectivity,
            drain_interval: Duration::from_secs(config.drain_interval_secs),
            shutdown_rx,
        };

        (worker, QueueWorkerHandle { shutdown_tx })
    }

    /// Runs the worker loop. Spawn this as a background task.
    pub async fn run(mut self) {
        info!("Queue worker starting");

        let mut online_rx = self.connectivity.subscribe();
        let mut interval = tokio::time::interval(self.drain_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Periodic drain while online
                _ = interval.tick() => {
                    if self.connectivity.is_online() {
                        self.drain_and_log().await;
                    } else {
                        debug!("Offline, skipping scheduled drain");
                    }
                }

                // Connectivity edges
                changed = online_rx.changed() => {
                    match changed {
                        Ok(()) => {
                            if *online_rx.borrow_and_update() {
                                info!("Connectivity restored, draining queue");
                                self.drain_and_log().await;
                            }
                        }
                        Err(_) => {
                            warn!("Connectivity signal dropped, stopping worker");
                            break;
                        }
                    }
                }

                // Shutdown
                _ = self.shutdown_rx.recv() => {
                    info!("Queue worker shutting down");
                    break;
                }
            }
        }

        info!("Queue worker stopped");
    }

    async fn drain_and_log(&self) {
        match self.queue.drain().await {
            Ok(report) => {
                if !report.synced.is_empty() || report.stopped_on.is_some() {
                    info!(
                        synced = report.synced.len(),
                        remaining = report.remaining,
                        stopped = ?report.stopped_on,
                        "Drain pass finished"
                    );
                }
            }
            Err(e) => error!(?e, "Drain pass failed"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::testing::ScriptedEndpoint;
    use crate::store::MemoryQueueStore;
    use till_core::{CustomerInfo, Money, SyncState};

    fn sale(local_id: &str) -> Sale {
        Sale {
            local_id: local_id.to_string(),
            server_id: None,
            items: vec![],
            subtotal: Money::from_cents(1000),
            discount: Money::zero(),
            total: Money::from_cents(1000),
            tenders: vec![],
            change: Money::zero(),
            customer: CustomerInfo::default(),
            staff_name: "Ada".into(),
            notes: None,
            created_at: Utc::now(),
            sync_state: SyncState::Pending,
        }
    }

    fn queue_with(endpoint: &ScriptedEndpoint) -> OfflineQueue {
        OfflineQueue::new(
            Arc::new(MemoryQueueStore::new()),
            Arc::new(endpoint.clone()),
            &QueueConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_drain_replays_fifo_and_marks_synced() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_ack("srv-1");
        endpoint.push_ack("srv-2");
        let queue = queue_with(&endpoint);

        queue.enqueue(sale("first")).await.unwrap();
        queue.enqueue(sale("second")).await.unwrap();

        let report = queue.drain().await.unwrap();

        assert!(report.fully_drained());
        assert_eq!(report.synced.len(), 2);
        assert_eq!(report.synced[0].local_id, "first");
        assert_eq!(report.synced[0].server_id.as_deref(), Some("srv-1"));
        assert_eq!(report.synced[0].sync_state, SyncState::Synced);
        assert_eq!(report.synced[1].local_id, "second");

        // Submission order matched queue order.
        assert_eq!(endpoint.submitted(), vec!["first", "second"]);
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drain_stops_on_first_failure() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_ack("srv-1");
        endpoint.push_unreachable("connection refused");
        let queue = queue_with(&endpoint);

        queue.enqueue(sale("a")).await.unwrap();
        queue.enqueue(sale("b")).await.unwrap();
        queue.enqueue(sale("c")).await.unwrap();

        let report = queue.drain().await.unwrap();

        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.remaining, 2);
        assert!(matches!(report.stopped_on, Some(SyncError::Unreachable(_))));

        // "c" was never attempted: the failed head blocks the line.
        assert_eq!(endpoint.submitted(), vec!["a", "b"]);

        // The failure was recorded on "b"; "c" was never touched.
        let pending = queue.pending().await.unwrap();
        assert_eq!(pending[0].sale.local_id, "b");
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].sale.sync_state, SyncState::Failed);
        assert!(pending[0]
            .last_error
            .as_deref()
            .unwrap()
            .contains("connection refused"));
        assert_eq!(pending[1].sale.local_id, "c");
        assert_eq!(pending[1].sale.sync_state, SyncState::Pending);
    }

    #[tokio::test]
    async fn test_retry_reuses_same_local_id() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_unreachable("down");
        endpoint.push_ack("srv-9");
        let queue = queue_with(&endpoint);

        queue.enqueue(sale("stable-id")).await.unwrap();

        let first = queue.drain().await.unwrap();
        assert_eq!(first.remaining, 1);

        let second = queue.drain().await.unwrap();
        assert!(second.fully_drained());

        // Both attempts carried the identical idempotency key.
        assert_eq!(endpoint.submitted(), vec!["stable-id", "stable-id"]);
    }

    #[tokio::test]
    async fn test_rejection_keeps_entry_queued() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_rejected("price mismatch");
        let queue = queue_with(&endpoint);

        queue.enqueue(sale("poison")).await.unwrap();

        let report = queue.drain().await.unwrap();
        assert!(matches!(report.stopped_on, Some(SyncError::Rejected(_))));
        // Rejected, but NOT dropped: only purge() drops entries.
        assert_eq!(report.remaining, 1);

        assert!(queue.purge("poison").await.unwrap());
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drain_is_single_flight() {
        let endpoint = ScriptedEndpoint::new();
        let queue = queue_with(&endpoint);

        // Hold the flag as if a drain were mid-flight.
        queue.draining.store(true, Ordering::SeqCst);

        let report = queue.drain().await.unwrap();
        assert!(report.already_running);
        assert!(endpoint.submitted().is_empty());

        queue.draining.store(false, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_worker_drains_on_connectivity_edge() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let endpoint = ScriptedEndpoint::new();
        endpoint.push_ack("srv-1");
        let queue = queue_with(&endpoint);
        queue.enqueue(sale("edge")).await.unwrap();

        let connectivity = ConnectivitySignal::new(false);
        let mut config = QueueConfig::default();
        config.drain_interval_secs = 3600; // only the edge can trigger this test

        let (worker, handle) = QueueWorker::new(queue.clone(), connectivity.clone(), &config);
        let task = tokio::spawn(worker.run());

        connectivity.set_online(true);

        // Wait for the edge-triggered drain to land.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if queue.pending_count().await.unwrap() == 0 {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "worker never drained the queue"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
