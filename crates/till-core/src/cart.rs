//! # Cart Store
//!
//! In-memory ordered collection of line items with stock clamping.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Store Operations                              │
//! │                                                                         │
//! │  Cashier Action             Operation              Cart Change          │
//! │  ──────────────             ─────────              ───────────          │
//! │                                                                         │
//! │  Select product ──────────► add(product) ────────► qty += 1 or insert  │
//! │                                                    (clamped to stock)   │
//! │  Change quantity ─────────► set_quantity(id, n) ─► qty = min(n, stock) │
//! │                                                    (n ≤ 0 removes)      │
//! │  Remove line ─────────────► remove(id) ──────────► line dropped        │
//! │                                                                         │
//! │  Clear ───────────────────► clear() ─────────────► all lines dropped   │
//! │                                                                         │
//! │  NOTE: Every mutation invalidates the cached subtotal so the           │
//! │        calculator is re-run on the next read. No stale totals.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`: adding an existing product increments
//!   its quantity instead of duplicating the row. Uniqueness is enforced
//!   structurally by a product-id index, not by scanning convention.
//! - `quantity <= available_stock` at all times; violating writes are
//!   clamped, never rejected.
//! - Insertion order is preserved (the receipt shows lines in ring order).

use std::cell::Cell;
use std::collections::HashMap;

use crate::money::Money;
use crate::types::{LineItem, Product};

// =============================================================================
// Cart
// =============================================================================

/// The cart: ordered line items, keyed by product id.
#[derive(Debug, Default)]
pub struct Cart {
    /// Lines in insertion order.
    items: Vec<LineItem>,

    /// product_id → position in `items`. Rebuilt on removal.
    index: HashMap<i64, usize>,

    /// Cached subtotal in cents; `None` after any mutation.
    subtotal_cache: Cell<Option<i64>>,
}

impl Clone for Cart {
    fn clone(&self) -> Self {
        Cart {
            items: self.items.clone(),
            index: self.index.clone(),
            subtotal_cache: Cell::new(self.subtotal_cache.get()),
        }
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of a product, or increments its line if already present.
    ///
    /// ## Behavior
    /// - Product already in cart: `quantity = min(quantity + 1, stock)`
    /// - New product: inserted with quantity 1, or 0 when the product has no
    ///   stock (the store clamps silently; the UI-facing caller is expected
    ///   to reject a zero-stock add before calling)
    pub fn add(&mut self, product: &Product) {
        self.invalidate();

        if let Some(&pos) = self.index.get(&product.id) {
            let line = &mut self.items[pos];
            line.quantity = (line.quantity + 1).min(line.available_stock);
            return;
        }

        let line = LineItem::from_product(product, 1);
        self.index.insert(product.id, self.items.len());
        self.items.push(line);
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - `n <= 0` removes the line
    /// - otherwise `quantity = min(n, available_stock)`
    /// - unknown product ids are ignored
    pub fn set_quantity(&mut self, product_id: i64, n: i64) {
        if n <= 0 {
            self.remove(product_id);
            return;
        }

        if let Some(&pos) = self.index.get(&product_id) {
            self.invalidate();
            let line = &mut self.items[pos];
            line.quantity = n.min(line.available_stock);
        }
    }

    /// Removes a line by product id. Unknown ids are ignored.
    pub fn remove(&mut self, product_id: i64) {
        if let Some(pos) = self.index.remove(&product_id) {
            self.invalidate();
            self.items.remove(pos);
            // Positions after the removed line shifted down by one.
            for (i, line) in self.items.iter().enumerate().skip(pos) {
                self.index.insert(line.product_id, i);
            }
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.invalidate();
        self.items.clear();
        self.index.clear();
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Looks up a line by product id.
    pub fn get(&self, product_id: i64) -> Option<&LineItem> {
        self.index.get(&product_id).map(|&pos| &self.items[pos])
    }

    /// Sum of line totals. Cached until the next mutation.
    pub fn subtotal(&self) -> Money {
        if let Some(cents) = self.subtotal_cache.get() {
            return Money::from_cents(cents);
        }
        let subtotal: Money = self.items.iter().map(|i| i.line_total()).sum();
        self.subtotal_cache.set(Some(subtotal.cents()));
        subtotal
    }

    /// Number of unique lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    fn invalidate(&mut self) {
        self.subtotal_cache.set(None);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
