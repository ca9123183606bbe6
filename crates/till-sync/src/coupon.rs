//! # Coupon Service
//!
//! Lookup seam for coupon codes entered at the discount step. A code
//! resolves to a [`DiscountSpec`]; the totals calculator clamps whatever
//! comes back, so a misconfigured coupon can never drive a total negative.
//!
//! Unknown codes are not errors: `lookup` returns `Ok(None)` and the
//! cashier is told the code did nothing. Errors are reserved for the
//! service itself being unavailable.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use till_core::{CheckoutSession, DiscountSpec};

// =============================================================================
// Coupon Error
// =============================================================================

/// The coupon service itself failed (not "code not found").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("coupon service unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Coupon Service Trait
// =============================================================================

/// Resolves coupon codes to discounts.
#[async_trait]
pub trait CouponService: Send + Sync {
    /// Looks up a code. `Ok(None)` means the code is unknown or expired.
    async fn lookup(&self, code: &str) -> Result<Option<DiscountSpec>, CouponError>;
}

/// Applies a coupon code to a checkout session's discount step.
///
/// Returns whether a discount was applied. Codes are matched after trimming
/// surrounding whitespace; an unknown code leaves the session untouched.
pub async fn apply_coupon(
    service: &dyn CouponService,
    session: &mut CheckoutSession,
    code: &str,
) -> Result<bool, CouponError> {
    let code = code.trim();
    match service.lookup(code).await? {
        Some(spec) => {
            debug!(code = %code, "Coupon applied");
            session.set_discount(spec);
            Ok(true)
        }
        None => {
            debug!(code = %code, "Unknown coupon code");
            Ok(false)
        }
    }
}

// =============================================================================
// Static Table Implementation
// =============================================================================

/// A fixed, case-insensitive coupon table. Suits single-store deployments
/// where codes are configured locally rather than fetched.
#[derive(Debug, Default)]
pub struct StaticCoupons {
    coupons: HashMap<String, DiscountSpec>,
}

impl StaticCoupons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a code (stored case-insensitively).
    pub fn with_code(mut self, code: &str, spec: DiscountSpec) -> Self {
        self.coupons.insert(code.trim().to_uppercase(), spec);
        self
    }
}

#[async_trait]
impl CouponService for StaticCoupons {
    async fn lookup(&self, code: &str) -> Result<Option<DiscountSpec>, CouponError> {
        Ok(self.coupons.get(&code.trim().to_uppercase()).copied())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::{Cart, Money, Product};

    fn session() -> CheckoutSession {
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
        CheckoutSession::begin(cart).unwrap()
    }

    #[tokio::test]
    async fn test_known_code_sets_discount() {
        let coupons = StaticCoupons::new().with_code("SAVE10", DiscountSpec::percentage(10.0));
        let mut session = session();

        let applied = apply_coupon(&coupons, &mut session, " save10 ").await.unwrap();
        assert!(applied);
        assert_eq!(session.totals().discount.cents(), 100);
    }

    #[tokio::test]
    async fn test_unknown_code_is_a_no_op() {
        let coupons = StaticCoupons::new();
        let mut session = session();

        let applied = apply_coupon(&coupons, &mut session, "NOPE").await.unwrap();
        assert!(!applied);
        assert_eq!(session.totals().discount.cents(), 0);
    }
}
