//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                           │
//! │  ├── CheckoutError   - Wizard/session rule violations                   │
//! │  └── TenderError     - Payment reconciliation failures                  │
//! │                                                                         │
//! │  till-sync errors (separate crate)                                      │
//! │  ├── SyncError       - Queue/submission failures                        │
//! │  └── StoreError      - Durable store failures                           │
//! │                                                                         │
//! │  All of these are VALIDATION-class errors from the cashier's point of   │
//! │  view: the session stays put, the cashier corrects and retries.         │
//! │  Connectivity failures are NOT errors here; they are absorbed by the    │
//! │  offline queue in till-sync.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, step names)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::money::Money;
use crate::wizard::CheckoutStep;

// =============================================================================
// Tender Error
// =============================================================================

/// Payment reconciliation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TenderError {
    /// The tendered amounts do not cover the amount due.
    #[error("Insufficient funds: tendered {tendered}, due {due}")]
    InsufficientFunds { tendered: Money, due: Money },
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Checkout wizard and session rule violations.
///
/// These stop at the wizard boundary: the session state is unchanged and the
/// cashier corrects the input. Nothing here aborts an in-progress sale.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A checkout session requires a non-empty cart.
    #[error("Cannot begin checkout with an empty cart")]
    EmptyCart,

    /// The current step's guard blocks advancing.
    #[error("Step {step:?} is not complete")]
    StepIncomplete { step: CheckoutStep },

    /// Forward jumps to unvisited steps are not allowed.
    #[error("Cannot jump forward to unvisited step {step:?}")]
    StepNotVisited { step: CheckoutStep },

    /// Confirm is only valid on the review step.
    #[error("Confirm is only allowed on the review step (currently {step:?})")]
    NotAtReview { step: CheckoutStep },

    /// No payment method was selected before confirming.
    #[error("No payment method selected")]
    NoPaymentSelected,

    /// The payment selection was captured against a total that has since
    /// changed (cart or discount edited after the payment step).
    #[error("Payment was captured against {priced}, but the total is now {current}")]
    StalePayment { priced: Money, current: Money },

    /// Split tender set does not cover the total.
    #[error(transparent)]
    Tender(#[from] TenderError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CheckoutError.
pub type CoreResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
