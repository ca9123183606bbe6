//! # Sale Submitter
//!
//! Turns a confirmed checkout session into a submitted (or queued) sale.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sale Submission Flow                                │
//! │                                                                         │
//! │  CheckoutSession (consumed by value - one session, one submission)     │
//! │        │                                                                │
//! │        ▼ confirm()                                                      │
//! │  SaleDraft ──► Sale { local_id: UUIDv4, sync_state: Pending }          │
//! │        │                                                                │
//! │        ▼ endpoint.submit                                                │
//! │  ┌───────────────┬──────────────────────┬──────────────────────────┐   │
//! │  │ Ok(ack)       │ Err(Unreachable)     │ Err(Rejected)            │   │
//! │  │ mark_synced   │ queue.enqueue        │ session handed BACK to   │   │
//! │  │ → Synced(sale)│ → Queued(sale)       │ the cashier, register    │   │
//! │  │               │ (durable, replayed)  │ state intact             │   │
//! │  └───────────────┴──────────────────────┴──────────────────────────┘   │
//! │                                                                         │
//! │  Synced and Queued both COMPLETE the checkout: the cart clears and     │
//! │  the receipt prints. Only errors return the session to the caller.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use till_core::{CheckoutError, CheckoutSession, Sale, Staff};

use crate::endpoint::{EndpointError, SaleEndpoint};
use crate::error::SyncError;
use crate::queue::OfflineQueue;

// =============================================================================
// Outcome & Error
// =============================================================================

/// A completed submission. Either way the checkout is DONE and the register
/// can clear.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The server acknowledged immediately; `server_id` is set.
    Synced(Sale),

    /// The endpoint was unreachable; the sale is durably queued and will be
    /// replayed by the queue worker.
    Queued(Sale),
}

impl SubmitOutcome {
    pub fn sale(&self) -> &Sale {
        match self {
            SubmitOutcome::Synced(sale) | SubmitOutcome::Queued(sale) => sale,
        }
    }
}

/// A failed submission. Every variant hands the session back so the cashier
/// can correct and retry; register state is never torn down on failure.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The session did not pass confirmation (wrong step, underpaid split).
    #[error("checkout not confirmable: {source}")]
    Checkout {
        source: CheckoutError,
        session: Box<CheckoutSession>,
    },

    /// The server reached a verdict and refused the sale.
    #[error("sale rejected: {reason}")]
    Rejected {
        reason: String,
        session: Box<CheckoutSession>,
    },

    /// The offline queue could not persist the sale. Rare and loud: without
    /// a durable write there is no "never lost" guarantee to give.
    #[error("failed to queue sale: {source}")]
    QueueFailed {
        source: SyncError,
        session: Box<CheckoutSession>,
    },
}

impl SubmitError {
    /// Recovers the untouched session for correction and retry.
    pub fn into_session(self) -> CheckoutSession {
        match self {
            SubmitError::Checkout { session, .. }
            | SubmitError::Rejected { session, .. }
            | SubmitError::QueueFailed { session, .. } => *session,
        }
    }
}

// =============================================================================
// Sale Submitter
// =============================================================================

/// Submits confirmed checkouts, falling back to the offline queue.
pub struct SaleSubmitter {
    endpoint: Arc<dyn SaleEndpoint>,
    queue: OfflineQueue,
    staff: Staff,
}

impl SaleSubmitter {
    pub fn new(endpoint: Arc<dyn SaleEndpoint>, queue: OfflineQueue, staff: Staff) -> Self {
        SaleSubmitter {
            endpoint,
            queue,
            staff,
        }
    }

    /// Consumes a session and submits its sale.
    ///
    /// The session is only truly consumed on success; every error variant
    /// carries it back out.
    pub async fn submit(&self, session: CheckoutSession) -> Result<SubmitOutcome, SubmitError> {
        let draft = match session.confirm() {
            Ok(draft) => draft,
            Err(source) => {
                return Err(SubmitError::Checkout {
                    source,
                    session: Box::new(session),
                })
            }
        };

        // Minted once per confirmed checkout; reused verbatim on every
        // retry so the server can deduplicate.
        let local_id = Uuid::new_v4().to_string();
        let mut sale = draft.into_sale(local_id, &self.staff);

        match self.endpoint.submit(&sale).await {
            Ok(ack) => {
                sale.mark_synced(&ack.server_id);
                info!(
                    local_id = %sale.local_id,
                    server_id = %ack.server_id,
                    total = %sale.total,
                    "Sale submitted and acknowledged"
                );
                Ok(SubmitOutcome::Synced(sale))
            }

            Err(EndpointError::Unreachable(reason)) => {
                warn!(
                    local_id = %sale.local_id,
                    reason = %reason,
                    "Endpoint unreachable, queueing sale"
                );
                match self.queue.enqueue(sale).await {
                    Ok(entry) => Ok(SubmitOutcome::Queued(entry.sale)),
                    Err(source) => Err(SubmitError::QueueFailed {
                        source,
                        session: Box::new(session),
                    }),
                }
            }

            Err(EndpointError::Rejected(reason)) => Err(SubmitError::Rejected {
                reason,
                session: Box::new(session),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::endpoint::testing::ScriptedEndpoint;
    use crate::store::MemoryQueueStore;
    use till_core::{
        Cart, CheckoutStep, Money, PaymentMethod, Product, SyncState,
    };

    fn staff() -> Staff {
        Staff {
            id: "staff-1".into(),
            name: "Ada".into(),
        }
    }

    /// A session at the review step: 2 × $10.00, paid $20.00 cash.
    fn session_at_review() -> CheckoutSession {
        let mut cart = Cart::new();
        cart.add(&Product {
            id: 1,
            name: "Widget".into(),
            sku: "W-1".into(),
            price: Money::from_cents(1000),
            available_stock: 10,
            category: None,
            brand: None,
        });
        cart.set_quantity(1, 2);

        let mut session = CheckoutSession::begin(cart).unwrap();
        session.advance().unwrap(); // discount
        session.advance().unwrap(); // payment
        session.select_single(PaymentMethod::Cash);
        session.advance().unwrap(); // customer
        session.advance().unwrap(); // review
        session
    }

    fn submitter_with(endpoint: &ScriptedEndpoint) -> (SaleSubmitter, OfflineQueue) {
        let queue = OfflineQueue::new(
            Arc::new(MemoryQueueStore::new()),
            Arc::new(endpoint.clone()),
            &QueueConfig::default(),
        );
        let submitter = SaleSubmitter::new(Arc::new(endpoint.clone()), queue.clone(), staff());
        (submitter, queue)
    }

    #[tokio::test]
    async fn test_online_submission_syncs_immediately() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_ack("srv-42");
        let (submitter, queue) = submitter_with(&endpoint);

        let outcome = submitter.submit(session_at_review()).await.unwrap();

        match outcome {
            SubmitOutcome::Synced(sale) => {
                assert_eq!(sale.server_id.as_deref(), Some("srv-42"));
                assert_eq!(sale.sync_state, SyncState::Synced);
                assert_eq!(sale.total.cents(), 2000);
                assert_eq!(sale.staff_name, "Ada");
                assert!(!sale.local_id.is_empty());
            }
            other => panic!("expected Synced, got {:?}", other),
        }
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_submission_queues_durably() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_unreachable("network is down");
        let (submitter, queue) = submitter_with(&endpoint);

        let outcome = submitter.submit(session_at_review()).await.unwrap();

        match outcome {
            SubmitOutcome::Queued(sale) => {
                assert_eq!(sale.sync_state, SyncState::Pending);
                assert!(sale.server_id.is_none());
            }
            other => panic!("expected Queued, got {:?}", other),
        }
        assert_eq!(queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejection_hands_session_back() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_rejected("till closed for audit");
        let (submitter, queue) = submitter_with(&endpoint);

        let err = submitter.submit(session_at_review()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { .. }));

        // The cashier gets the session back, still at review, and the
        // rejected sale was never queued.
        let session = err.into_session();
        assert_eq!(session.current_step(), CheckoutStep::Review);
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unconfirmable_session_never_reaches_endpoint() {
        let endpoint = ScriptedEndpoint::new();
        let (submitter, _queue) = submitter_with(&endpoint);

        let mut cart = Cart::new();
        cart.add(&Product {
            id: 1,
            name: "Widget".into(),
            sku: "W-1".into(),
            price: Money::from_cents(1000),
            available_stock: 10,
            category: None,
            brand: None,
        });
        let session = CheckoutSession::begin(cart).unwrap(); // still at step 1

        let err = submitter.submit(session).await.unwrap_err();
        assert!(matches!(err, SubmitError::Checkout { .. }));
        assert!(endpoint.submitted().is_empty());
    }

    /// Offline checkout, then connectivity returns and the queue replays:
    /// the sale ends up Synced with a server id and the same local id it
    /// was minted with.
    #[tokio::test]
    async fn test_offline_then_replay_end_to_end() {
        let endpoint = ScriptedEndpoint::new();
        endpoint.push_unreachable("offline");
        endpoint.push_ack("srv-later");
        let (submitter, queue) = submitter_with(&endpoint);

        let queued = match submitter.submit(session_at_review()).await.unwrap() {
            SubmitOutcome::Queued(sale) => sale,
            other => panic!("expected Queued, got {:?}", other),
        };

        let report = queue.drain().await.unwrap();
        assert!(report.fully_drained());
        assert_eq!(report.synced.len(), 1);

        let synced = &report.synced[0];
        assert_eq!(synced.local_id, queued.local_id);
        assert_eq!(synced.server_id.as_deref(), Some("srv-later"));
        assert_eq!(synced.sync_state, SyncState::Synced);

        // Both the live attempt and the replay used the same local id.
        assert_eq!(
            endpoint.submitted(),
            vec![queued.local_id.clone(), queued.local_id.clone()]
        );
    }
}
