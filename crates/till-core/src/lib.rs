//! # till-core: Pure Checkout Logic for Tillpoint
//!
//! This crate is the **heart** of Tillpoint. It contains the entire checkout
//! pipeline as pure functions and plain data with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tillpoint Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Register Frontend                          │   │
//! │  │    Product grid ──► Cart panel ──► Checkout wizard ──► Receipt  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ totals  │ │ wizard  │ │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │Discount │ │ Session │ │   │
//! │  │   │  Sale   │ │  cents  │ │LineItem │ │ Totals  │ │  Steps  │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘ │   │
//! │  │                        ┌─────────┐                             │   │
//! │  │                        │ tender  │                             │   │
//! │  │                        │ split $ │                             │   │
//! │  │                        └─────────┘                             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  till-sync (Submission Layer)                   │   │
//! │  │        sale submitter, offline queue, SQLite durability         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, LineItem, Sale, DiscountSpec, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Ordered cart store with stock clamping
//! - [`totals`] - Subtotal/discount/total calculator
//! - [`tender`] - Split-payment reconciler and cash change
//! - [`wizard`] - Checkout wizard state machine
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::cart::Cart;
//! use till_core::money::Money;
//! use till_core::types::{DiscountSpec, PaymentMethod, Product};
//! use till_core::wizard::CheckoutSession;
//!
//! let mut cart = Cart::new();
//! cart.add(&Product {
//!     id: 1,
//!     name: "Espresso".into(),
//!     sku: "ESP-1".into(),
//!     price: Money::from_cents(350),
//!     available_stock: 40,
//!     category: None,
//!     brand: None,
//! });
//!
//! let mut session = CheckoutSession::begin(cart).unwrap();
//! session.advance().unwrap(); // discount step
//! session.set_discount(DiscountSpec::percentage(10.0));
//! session.advance().unwrap(); // payment step
//! session.select_single(PaymentMethod::Cash);
//! session.advance().unwrap(); // customer step
//! session.advance().unwrap(); // review step
//!
//! let draft = session.confirm().unwrap();
//! assert_eq!(draft.total.cents(), 315);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod tender;
pub mod totals;
pub mod types;
pub mod wizard;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use cart::Cart;
pub use error::{CheckoutError, CoreResult, TenderError};
pub use money::Money;
pub use totals::{compute_totals, CheckoutTotals};
pub use types::*;
pub use wizard::{CheckoutSession, CheckoutStep, PaymentSelection, SaleDraft};
