//! # Sale Endpoint Seam
//!
//! The trait boundary between the submission pipeline and whatever actually
//! carries a sale to the server. Production uses [`crate::http::HttpSaleEndpoint`];
//! tests script the seam directly.
//!
//! ## The Classification Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              submit(sale) → Result<ServerAck, EndpointError>            │
//! │                                                                         │
//! │  Ok(ServerAck)               the server accepted and assigned an id    │
//! │                                                                         │
//! │  Err(Unreachable)            no verdict was reached: network down,     │
//! │                              timeout, DNS failure, 5xx. The sale is    │
//! │                              NOT lost - it goes to the offline queue.  │
//! │                                                                         │
//! │  Err(Rejected)               the server reached a verdict and said no  │
//! │                              (4xx). Retrying the same payload will     │
//! │                              fail again; surface it to the cashier.    │
//! │                                                                         │
//! │  Implementations OWN this classification. The queue and submitter      │
//! │  never inspect transport details; they only branch on the variant.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use till_core::Sale;

// =============================================================================
// Server Acknowledgement
// =============================================================================

/// What the endpoint returns when the server accepts a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAck {
    /// Server-assigned identifier for the created sale.
    pub server_id: String,
}

// =============================================================================
// Endpoint Error
// =============================================================================

/// Submission failure, pre-classified by the endpoint implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// No verdict reached: connectivity, timeout, or server-side outage.
    /// Retryable; the sale belongs in the offline queue.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// The server reached a verdict and refused the sale. Not retryable.
    #[error("sale rejected: {0}")]
    Rejected(String),
}

impl EndpointError {
    /// True when the submission may succeed later without changing the sale.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EndpointError::Unreachable(_))
    }
}

// =============================================================================
// Sale Endpoint Trait
// =============================================================================

/// The sale creation endpoint.
///
/// Submissions are keyed by `sale.local_id`: implementations MUST present it
/// to the server as the idempotency key, so a lost-ack retry of the same sale
/// reconciles to the same server record instead of double-charging.
#[async_trait]
pub trait SaleEndpoint: Send + Sync {
    /// Submits one sale and waits for the server's verdict.
    async fn submit(&self, sale: &Sale) -> Result<ServerAck, EndpointError>;
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted endpoint for queue and submitter tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays a fixed script of results and records every submission.
    #[derive(Clone, Default)]
    pub struct ScriptedEndpoint {
        script: Arc<Mutex<VecDeque<Result<ServerAck, EndpointError>>>>,
        submitted: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedEndpoint {
        pub fn new() -> Self {
            Self::default()
        }

        /// Appends an outcome to the script (consumed in FIFO order).
        pub fn push(&self, result: Result<ServerAck, EndpointError>) {
            self.script.lock().unwrap().push_back(result);
        }

        pub fn push_ack(&self, server_id: &str) {
            self.push(Ok(ServerAck {
                server_id: server_id.to_string(),
            }));
        }

        pub fn push_unreachable(&self, msg: &str) {
            self.push(Err(EndpointError::Unreachable(msg.to_string())));
        }

        pub fn push_rejected(&self, msg: &str) {
            self.push(Err(EndpointError::Rejected(msg.to_string())));
        }

        /// Local ids of every sale submitted so far, in order.
        pub fn submitted(&self) -> Vec<String> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SaleEndpoint for ScriptedEndpoint {
        async fn submit(&self, sale: &Sale) -> Result<ServerAck, EndpointError> {
            self.submitted.lock().unwrap().push(sale.local_id.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(EndpointError::Unreachable("script exhausted".into())))
        }
    }
}
