//! # Totals Calculator
//!
//! Pure functions computing subtotal, discount amount, and total from a cart
//! and a discount spec. No side effects, no error conditions: all inputs are
//! sanitized internally and the output is re-clamped unconditionally.
//!
//! ## Invariants
//! - `0 ≤ discount ≤ subtotal`, enforced on this function's OWN output -
//!   it does not trust the `DiscountSpec` constructors or the caller
//! - `total = subtotal - discount ≥ 0`

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::money::Money;
use crate::types::DiscountSpec;

// =============================================================================
// Checkout Totals
// =============================================================================

/// The three figures every checkout screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    /// Sum of `unit_price × quantity` over all lines; never negative.
    pub subtotal: Money,

    /// Discount amount actually applied, clamped into `[0, subtotal]`.
    pub discount: Money,

    /// `subtotal - discount`, always `>= 0`.
    pub total: Money,
}

/// Computes checkout totals for a cart under a discount.
///
/// ## Discount Rules
/// - `Percentage`: `subtotal × clamp(bps, 0, 10000) / 10000`, rounded
/// - `FixedAmount`: `clamp(amount, 0, subtotal)`
///
/// Either way the result is re-clamped into `[0, subtotal]` before the total
/// is derived, so a hostile or buggy `DiscountSpec` cannot drive the total
/// negative or inflate it past the subtotal.
///
/// ## Example
/// ```rust
/// use till_core::cart::Cart;
/// use till_core::money::Money;
/// use till_core::totals::compute_totals;
/// use till_core::types::{DiscountSpec, Product};
///
/// let mut cart = Cart::new();
/// cart.add(&Product {
///     id: 1,
///     name: "Widget".into(),
///     sku: "W-1".into(),
///     price: Money::from_cents(1000),
///     available_stock: 10,
///     category: None,
///     brand: None,
/// });
/// cart.set_quantity(1, 2);
///
/// let totals = compute_totals(&cart, &DiscountSpec::percentage(10.0));
/// assert_eq!(totals.subtotal.cents(), 2000);
/// assert_eq!(totals.discount.cents(), 200);
/// assert_eq!(totals.total.cents(), 1800);
/// ```
pub fn compute_totals(cart: &Cart, discount: &DiscountSpec) -> CheckoutTotals {
    let subtotal = cart.subtotal().non_negative();

    let raw_discount = match discount {
        DiscountSpec::Percentage(bps) => subtotal.percentage_of((*bps).min(10_000)),
        DiscountSpec::FixedAmount(amount) => *amount,
    };

    // Re-clamp our own output; never trust the spec.
    let discount_amount = raw_discount.clamp(Money::zero(), subtotal);
    let total = (subtotal - discount_amount).non_negative();

    CheckoutTotals {
        subtotal,
        discount: discount_amount,
        total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
