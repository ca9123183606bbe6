//! # Domain Types
//!
//! Core domain types used throughout the Tillpoint checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    LineItem     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  product_id     │──►│  local_id       │       │
//! │  │  sku, name      │   │  unit_price     │   │  server_id?     │       │
//! │  │  price, stock   │   │  qty ≤ stock    │   │  sync_state     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountSpec   │   │  PaymentTender  │   │ OfflineQueue-   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │ Entry           │       │
//! │  │  Percentage bps │   │  method         │   │  sale           │       │
//! │  │  FixedAmount    │   │  amount > 0     │   │  attempts       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A `Sale` carries two identifiers:
//! - `local_id`: UUID v4, generated client-side, stable for the life of the
//!   record and reused as the idempotency key on every resubmission
//! - `server_id`: assigned by the remote endpoint only after a successful
//!   submission

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product as read from the catalog collaborator.
///
/// The checkout core only ever reads product data; it never mutates stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog identifier.
    pub id: i64,

    /// Display name shown to the cashier.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Unit price in cents.
    pub price: Money,

    /// Stock currently available for sale.
    pub available_stock: i64,

    /// Optional category label.
    pub category: Option<String>,

    /// Optional brand label.
    pub brand: Option<String>,
}

// =============================================================================
// Line Item
// =============================================================================

/// A line in the cart (and, frozen, on a completed sale).
///
/// Uses the snapshot pattern: name, SKU and price are copied from the product
/// when the line is created, so a later catalog edit cannot change an
/// in-progress or completed sale.
///
/// Invariant: `quantity <= available_stock` at all times. Violating writes
/// are clamped by the cart, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product this line refers to.
    pub product_id: i64,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// SKU at time of adding (frozen).
    pub sku: String,

    /// Unit price in cents at time of adding (frozen).
    pub unit_price: Money,

    /// Quantity in cart.
    pub quantity: i64,

    /// Stock available when the line was created; upper bound for quantity.
    pub available_stock: i64,

    /// Optional category label (frozen).
    pub category: Option<String>,

    /// Optional brand label (frozen).
    pub brand: Option<String>,
}

impl LineItem {
    /// Creates a new line item from a product.
    ///
    /// The requested quantity is clamped into `[0, available_stock]`; a
    /// product with zero stock yields a zero-quantity line (the UI-facing
    /// caller is expected to reject that add before it gets here, but the
    /// core clamps rather than errors).
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_price: product.price,
            quantity: quantity.clamp(0, product.available_stock),
            available_stock: product.available_stock,
            category: product.category.clone(),
            brand: product.brand.clone(),
        }
    }

    /// Calculates the line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount applied to the whole cart.
///
/// ## Clamping
/// The calculator clamps the resulting amount into `[0, subtotal]` no matter
/// what this spec says; a `Percentage` is additionally domain-clamped to
/// `[0%, 100%]`. Negative inputs are treated as zero at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum DiscountSpec {
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    Percentage(u32),
    /// Fixed amount off the subtotal.
    FixedAmount(Money),
}

impl DiscountSpec {
    /// No discount.
    #[inline]
    pub const fn none() -> Self {
        DiscountSpec::FixedAmount(Money::zero())
    }

    /// Creates a percentage discount from a percentage value.
    ///
    /// Negative and non-finite inputs are treated as zero; values above
    /// 100% are clamped at construction (and again at computation).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::types::DiscountSpec;
    ///
    /// assert_eq!(DiscountSpec::percentage(10.0), DiscountSpec::Percentage(1000));
    /// assert_eq!(DiscountSpec::percentage(-5.0), DiscountSpec::Percentage(0));
    /// assert_eq!(DiscountSpec::percentage(250.0), DiscountSpec::Percentage(10000));
    /// ```
    pub fn percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return DiscountSpec::Percentage(0);
        }
        let bps = (pct * 100.0).round() as u32;
        DiscountSpec::Percentage(bps.min(10_000))
    }

    /// Creates a fixed-amount discount. Negative amounts are treated as zero.
    pub fn fixed(amount: Money) -> Self {
        DiscountSpec::FixedAmount(amount.non_negative())
    }
}

impl Default for DiscountSpec {
    fn default() -> Self {
        DiscountSpec::none()
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Payment instruments accepted at the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    CardTerminal,
    /// Bank transfer.
    BankTransfer,
    /// Mobile money wallet.
    MobileMoney,
}

/// One payment instrument and amount applied toward a sale's total.
///
/// Invariant: `amount > 0`. A sale carries either exactly one non-split
/// tender or a non-empty ordered sequence of split tenders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTender {
    pub method: PaymentMethod,
    pub amount: Money,
}

impl PaymentTender {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        PaymentTender { method, amount }
    }
}

// =============================================================================
// Customer & Staff
// =============================================================================

/// Optional customer details captured at checkout.
///
/// Entirely optional; nothing in the core requires any field to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerInfo {
    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }
}

/// Read-only staff identity attached to every sale at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Sync State
// =============================================================================

/// Whether a locally created sale has been acknowledged by the remote system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Queued locally, not yet acknowledged.
    Pending,
    /// Acknowledged by the remote endpoint. Terminal; the sale is immutable
    /// from here on.
    Synced,
    /// The last sync attempt errored. Derived by the queue's read surface
    /// from the recorded attempt metadata. The entry stays queued; there is
    /// no terminal failure state because a sale must never be silently
    /// dropped.
    Failed,
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable record produced by a successful checkout.
///
/// ## Lifecycle
/// Created by the sale submitter from a consumed checkout session. Mutated
/// only by the offline queue (`sync_state` transitions and `server_id`
/// assignment); never mutated after `sync_state == Synced`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Client-generated UUID v4; globally unique, stable for the life of
    /// the record, and reused as the idempotency key on resubmission.
    pub local_id: String,

    /// Assigned by the remote endpoint after successful submission.
    pub server_id: Option<String>,

    /// Line items, frozen at confirmation.
    pub items: Vec<LineItem>,

    /// Sum of line totals.
    pub subtotal: Money,

    /// Discount amount actually applied (already clamped).
    pub discount: Money,

    /// `subtotal - discount`, never negative.
    pub total: Money,

    /// Tenders applied toward the total, in the order they were entered.
    pub tenders: Vec<PaymentTender>,

    /// Advisory change for a single cash tender; display-only, never
    /// subtracted from what is recorded as paid.
    pub change: Money,

    /// Optional customer details.
    pub customer: CustomerInfo,

    /// Name of the staff member who rang the sale.
    pub staff_name: String,

    /// Free-form note from the cashier.
    pub notes: Option<String>,

    /// When the sale was confirmed locally.
    pub created_at: DateTime<Utc>,

    /// Local/remote reconciliation state.
    pub sync_state: SyncState,
}

impl Sale {
    /// Records the server acknowledgement.
    ///
    /// A sale that is already `Synced` is never mutated again; a repeated
    /// acknowledgement (lost-ack retry) is a no-op.
    pub fn mark_synced(&mut self, server_id: impl Into<String>) {
        if self.sync_state == SyncState::Synced {
            return;
        }
        self.server_id = Some(server_id.into());
        self.sync_state = SyncState::Synced;
    }
}

// =============================================================================
// Offline Queue Entry
// =============================================================================

/// A sale waiting in the durable offline queue.
///
/// Created when submission fails due to connectivity; removed when sync
/// succeeds; retried with the same `local_id` (never re-generated) so the
/// server can reconcile duplicates idempotently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueueEntry {
    /// The queued sale (`sync_state` is `Pending` or `Failed`).
    pub sale: Sale,

    /// Number of sync attempts so far.
    pub attempts: i64,

    /// Last error message if a sync attempt failed.
    pub last_error: Option<String>,

    /// When the entry was enqueued; drain order is strictly oldest-first.
    pub enqueued_at: DateTime<Utc>,
}

impl OfflineQueueEntry {
    /// Wraps a sale for queueing.
    pub fn new(sale: Sale, enqueued_at: DateTime<Utc>) -> Self {
        OfflineQueueEntry {
            sale,
            attempts: 0,
            last_error: None,
            enqueued_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price_cents: i64, stock: i64) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            sku: format!("SKU-{}", id),
            price: Money::from_cents(price_cents),
            available_stock: stock,
            category: None,
            brand: None,
        }
    }

    #[test]
    fn test_line_item_clamps_to_stock() {
        let p = product(1, 1000, 3);
        let line = LineItem::from_product(&p, 10);
        assert_eq!(line.quantity, 3);

        let none_left = product(2, 1000, 0);
        let line = LineItem::from_product(&none_left, 1);
        assert_eq!(line.quantity, 0);
    }

    #[test]
    fn test_line_total() {
        let p = product(1, 250, 100);
        let line = LineItem::from_product(&p, 4);
        assert_eq!(line.line_total().cents(), 1000);
    }

    #[test]
    fn test_discount_spec_sanitizes_input() {
        assert_eq!(DiscountSpec::percentage(10.0), DiscountSpec::Percentage(1000));
        assert_eq!(DiscountSpec::percentage(-5.0), DiscountSpec::Percentage(0));
        assert_eq!(DiscountSpec::percentage(f64::NAN), DiscountSpec::Percentage(0));
        assert_eq!(
            DiscountSpec::percentage(250.0),
            DiscountSpec::Percentage(10000)
        );
        assert_eq!(
            DiscountSpec::fixed(Money::from_cents(-100)),
            DiscountSpec::FixedAmount(Money::zero())
        );
    }

    #[test]
    fn test_customer_info_is_empty() {
        assert!(CustomerInfo::default().is_empty());
        let named = CustomerInfo {
            name: Some("Ada".into()),
            ..CustomerInfo::default()
        };
        assert!(!named.is_empty());
    }

    #[test]
    fn test_discount_spec_wire_format() {
        let json = serde_json::to_value(DiscountSpec::Percentage(1000)).unwrap();
        assert_eq!(json["kind"], "percentage");
        assert_eq!(json["value"], 1000);

        let back: DiscountSpec =
            serde_json::from_str(r#"{"kind":"fixed_amount","value":500}"#).unwrap();
        assert_eq!(back, DiscountSpec::FixedAmount(Money::from_cents(500)));
    }

    #[test]
    fn test_sale_mark_synced_is_idempotent() {
        let mut sale = Sale {
            local_id: "local-1".into(),
            server_id: None,
            items: vec![],
            subtotal: Money::zero(),
            discount: Money::zero(),
            total: Money::zero(),
            tenders: vec![],
            change: Money::zero(),
            customer: CustomerInfo::default(),
            staff_name: "Ada".into(),
            notes: None,
            created_at: Utc::now(),
            sync_state: SyncState::Pending,
        };

        sale.mark_synced("srv-1");
        assert_eq!(sale.sync_state, SyncState::Synced);
        assert_eq!(sale.server_id.as_deref(), Some("srv-1"));

        // A second ack (lost-ack retry) must not rewrite the record.
        sale.mark_synced("srv-2");
        assert_eq!(sale.server_id.as_deref(), Some("srv-1"));
    }
}
