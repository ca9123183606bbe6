//! # Split-Payment Reconciler
//!
//! Validates that one or more tendered amounts across payment methods sum to
//! at least the amount due, and computes advisory change for a single cash
//! tender.
//!
//! ## Rules
//! - Split mode: `Σ amounts >= amount_due`, otherwise `InsufficientFunds`.
//!   There is no upper bound: overage on a split is accepted and is NOT
//!   converted into change.
//! - Single cash tender: `change = max(0, amount_paid - amount_due)`. The
//!   change figure is advisory/display-only and is never subtracted from
//!   what is recorded as paid.

use crate::error::TenderError;
use crate::money::Money;
use crate::types::PaymentTender;

/// Validates a split-payment tender set against the amount due.
///
/// Returns `Ok` iff `Σ tenders.amount >= amount_due`; an underpaid split is
/// never silently accepted.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::tender::validate_split;
/// use till_core::types::{PaymentMethod, PaymentTender};
///
/// let tenders = [
///     PaymentTender::new(PaymentMethod::Cash, Money::from_cents(1000)),
///     PaymentTender::new(PaymentMethod::BankTransfer, Money::from_cents(500)),
/// ];
/// // 1500 < 1800 → insufficient
/// assert!(validate_split(&tenders, Money::from_cents(1800)).is_err());
/// // 1500 >= 1500 → ok
/// assert!(validate_split(&tenders, Money::from_cents(1500)).is_ok());
/// ```
pub fn validate_split(tenders: &[PaymentTender], amount_due: Money) -> Result<(), TenderError> {
    let tendered: Money = tenders.iter().map(|t| t.amount).sum();

    if tendered < amount_due {
        return Err(TenderError::InsufficientFunds {
            tendered,
            due: amount_due,
        });
    }

    Ok(())
}

/// Computes advisory change for a single cash tender.
///
/// `max(0, amount_paid - amount_due)`. Display-only: the recorded payment
/// stays at `amount_paid`.
#[inline]
pub fn cash_change(amount_paid: Money, amount_due: Money) -> Money {
    (amount_paid - amount_due).non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================
