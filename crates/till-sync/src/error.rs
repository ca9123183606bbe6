//! # Sync Error Types
//!
//! Error types for sale submission and the offline queue.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                              │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Endpoint     │  │       Store             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unreachable    │  │  Database               │ │
//! │  │  ConfigLoad     │  │  Rejected       │  │  CorruptPayload         │ │
//! │  │  ConfigSave     │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  CLASSIFICATION MATTERS:                                                │
//! │  • Unreachable  → retryable, the sale goes to (or stays in) the queue  │
//! │  • Rejected     → NOT retryable, surfaced to the cashier               │
//! │  • Store errors → surfaced loudly; durability is the whole point       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::endpoint::EndpointError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Store Error
// =============================================================================

/// Failures of the durable queue store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A persisted queue payload no longer deserializes.
    #[error("Corrupt queue payload for {local_id}: {reason}")]
    CorruptPayload { local_id: String, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

// =============================================================================
// Sync Error
// =============================================================================

/// Sync error type covering submission and queue failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Errors are categorized for different handling strategies
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid queue configuration.
    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Endpoint Errors
    // =========================================================================
    /// The sale creation endpoint could not be reached.
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint reached a verdict and said no.
    #[error("Sale rejected by endpoint: {0}")]
    Rejected(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// Durable queue store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Failed to serialize a sale payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<EndpointError> for SyncError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Unreachable(msg) => SyncError::Unreachable(msg),
            EndpointError::Rejected(msg) => SyncError::Rejected(msg),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if this error is recoverable and the submission should be
    /// retried by the queue.
    ///
    /// ## Retryable Errors
    /// - Endpoint unreachable (network down, timeout, 5xx)
    /// - Store hiccups (the entry stays queued)
    ///
    /// ## Non-Retryable Errors
    /// - Endpoint rejections (the sale itself was refused)
    /// - Configuration errors
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Unreachable(_) | SyncError::Store(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
