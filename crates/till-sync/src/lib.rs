//! # till-sync: Sale Submission & Offline Queue for Tillpoint
//!
//! This crate owns the side effects till-core refuses to have: the network
//! seam to the sale creation endpoint and the durable SQLite queue that
//! guarantees a confirmed sale is never lost.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Submission Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     SaleSubmitter                                │  │
//! │  │                                                                  │  │
//! │  │  Consumes a confirmed CheckoutSession, mints the Sale            │  │
//! │  │  (local_id = UUIDv4), and tries the endpoint once                │  │
//! │  └───────────────┬──────────────────────────┬───────────────────────┘  │
//! │                  │ Unreachable              │ Ok(ack)                  │
//! │                  ▼                          ▼                          │
//! │  ┌────────────────────────┐   ┌──────────────────────────────────┐    │
//! │  │     OfflineQueue       │   │  Sale { server_id, Synced }      │    │
//! │  │                        │   └──────────────────────────────────┘    │
//! │  │  SQLite, WAL, FULL     │                                           │
//! │  │  write-then-ack        │   ┌──────────────────────────────────┐    │
//! │  │  FIFO drain, stops on  │◄──┤          QueueWorker             │    │
//! │  │  first failure         │   │                                  │    │
//! │  └───────────┬────────────┘   │  tokio::select! over:            │    │
//! │              │                │  • drain interval tick           │    │
//! │              ▼                │  • connectivity edges            │    │
//! │  ┌────────────────────────┐   │  • shutdown                      │    │
//! │  │   HttpSaleEndpoint     │   └──────────────▲───────────────────┘    │
//! │  │                        │                  │                        │
//! │  │  reqwest POST with     │   ┌──────────────┴───────────────────┐    │
//! │  │  Idempotency-Key =     │   │       ConnectivitySignal         │    │
//! │  │  sale.local_id         │   │   watch channel, online/offline  │    │
//! │  └────────────────────────┘   └──────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Queue/endpoint configuration (TOML file + env overrides)
//! - [`connectivity`] - Shared online/offline flag (watch channel)
//! - [`coupon`] - Coupon code lookup seam for the discount step
//! - [`endpoint`] - `SaleEndpoint` trait and the retryability contract
//! - [`error`] - Sync and store error types
//! - [`http`] - reqwest implementation of the endpoint
//! - [`queue`] - Durable FIFO queue and the background drain worker
//! - [`store`] - `QueueStore` trait, SQLite and in-memory implementations
//! - [`submitter`] - Session-consuming sale submitter
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use till_core::Staff;
//! use till_sync::{
//!     ConnectivitySignal, HttpSaleEndpoint, OfflineQueue, QueueConfig,
//!     QueueWorker, SaleSubmitter, SqliteQueueStore,
//! };
//!
//! let config = QueueConfig::load_or_default(None);
//! let store = Arc::new(SqliteQueueStore::open(&db_path).await?);
//! let endpoint = Arc::new(HttpSaleEndpoint::new(&config)?);
//!
//! let queue = OfflineQueue::new(store, endpoint.clone(), &config);
//! let connectivity = ConnectivitySignal::new(false);
//!
//! let (worker, worker_handle) = QueueWorker::new(queue.clone(), connectivity.clone(), &config);
//! tokio::spawn(worker.run());
//!
//! let submitter = SaleSubmitter::new(endpoint, queue, staff);
//! let outcome = submitter.submit(session).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod connectivity;
pub mod coupon;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod queue;
pub mod store;
pub mod submitter;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::QueueConfig;
pub use connectivity::ConnectivitySignal;
pub use coupon::{apply_coupon, CouponError, CouponService, StaticCoupons};
pub use endpoint::{EndpointError, SaleEndpoint, ServerAck};
pub use error::{StoreError, SyncError, SyncResult};
pub use http::HttpSaleEndpoint;
pub use queue::{DrainReport, OfflineQueue, QueueWorker, QueueWorkerHandle};
pub use store::{MemoryQueueStore, QueueStore, SqliteQueueStore};
pub use submitter::{SaleSubmitter, SubmitError, SubmitOutcome};
