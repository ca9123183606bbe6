//! # HTTP Sale Endpoint
//!
//! reqwest-backed implementation of [`SaleEndpoint`].
//!
//! ## Status Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                POST {endpoint_url}  (Idempotency-Key: local_id)        │
//! │                                                                         │
//! │  transport error            → Unreachable  (DNS, refused, timeout)     │
//! │  2xx                        → ServerAck { server_id: body.id }         │
//! │  408 / 429 / 5xx            → Unreachable  (no verdict; retry later)   │
//! │  other 4xx                  → Rejected     (verdict reached: no)       │
//! │                                                                         │
//! │  The Idempotency-Key header carries the sale's local_id so the server  │
//! │  can collapse lost-ack retries onto the original record.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use till_core::Sale;

use crate::config::QueueConfig;
use crate::endpoint::{EndpointError, SaleEndpoint, ServerAck};
use crate::error::SyncError;

/// Header carrying the sale's client-side id for server-side deduplication.
const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

// =============================================================================
// Response Body
// =============================================================================

/// What the sale creation endpoint returns on success.
#[derive(Debug, Deserialize)]
struct SaleCreatedBody {
    /// Server-assigned sale identifier.
    id: String,
}

// =============================================================================
// HTTP Endpoint
// =============================================================================

/// The production sale creation endpoint.
#[derive(Debug, Clone)]
pub struct HttpSaleEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpSaleEndpoint {
    /// Builds the endpoint from config (validates the URL and timeouts).
    pub fn new(config: &QueueConfig) -> Result<Self, SyncError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpSaleEndpoint {
            client,
            url: config.endpoint_url.clone(),
        })
    }

    /// Maps a non-2xx status onto the retryability contract.
    fn classify_status(status: StatusCode, body: &str) -> EndpointError {
        if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            // The server gave no verdict on the sale itself.
            EndpointError::Unreachable(format!("HTTP {}: {}", status, body))
        } else {
            EndpointError::Rejected(format!("HTTP {}: {}", status, body))
        }
    }
}

#[async_trait]
impl SaleEndpoint for HttpSaleEndpoint {
    async fn submit(&self, sale: &Sale) -> Result<ServerAck, EndpointError> {
        debug!(local_id = %sale.local_id, url = %self.url, "Submitting sale");

        let response = self
            .client
            .post(&self.url)
            .header(IDEMPOTENCY_KEY_HEADER, &sale.local_id)
            .json(sale)
            .send()
            .await
            .map_err(|e| EndpointError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let body: SaleCreatedBody = response
            .json()
            .await
            .map_err(|e| EndpointError::Unreachable(format!("Malformed response: {}", e)))?;

        Ok(ServerAck { server_id: body.id })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let e = HttpSaleEndpoint::classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(e.is_retryable());

        let e = HttpSaleEndpoint::classify_status(StatusCode::BAD_GATEWAY, "");
        assert!(e.is_retryable());

        let e = HttpSaleEndpoint::classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(e.is_retryable());

        let e = HttpSaleEndpoint::classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad sku");
        assert!(!e.is_retryable());

        let e = HttpSaleEndpoint::classify_status(StatusCode::CONFLICT, "duplicate");
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = QueueConfig::default();
        config.endpoint_url = "not-a-url".into();
        assert!(HttpSaleEndpoint::new(&config).is_err());
    }

    #[test]
    fn test_new_accepts_defaults() {
        assert!(HttpSaleEndpoint::new(&QueueConfig::default()).is_ok());
    }
}
