//! # Checkout Wizard
//!
//! The checkout state machine: five ordered steps from order summary to
//! review, with step-scoped form state and pure advance guards.
//!
//! ## Step Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Wizard Steps                              │
//! │                                                                         │
//! │  OrderSummary ──► Discount ──► PaymentMethod ──► CustomerInfo ──► Review│
//! │       ▲              ▲              ▲                 ▲             │    │
//! │       └──────────────┴──────────────┴─────────────────┘             │    │
//! │        backward navigation / jump to any VISITED step               │    │
//! │        (forward jumps to unvisited steps are rejected)              │    │
//! │                                                                     ▼    │
//! │                                                      confirm() ► SaleDraft
//! │                                                                         │
//! │  cancel() at any step  ──► session dropped, pristine cart returned     │
//! │                                                                         │
//! │  GUARDS (can_advance):                                                  │
//! │  • OrderSummary  always                                                 │
//! │  • Discount      always (zero discount is valid)                        │
//! │  • PaymentMethod split: tenders non-empty AND Σ > 0                     │
//! │                  single: a method is selected                           │
//! │  • CustomerInfo  always (entirely optional data)                        │
//! │  • Review        always, until confirm                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rollback Semantics
//! `begin` snapshots the cart; the session works on its own copy. `confirm`
//! commits (the session, cart included, is consumed by submission) and
//! `cancel` rolls back, returning the pristine snapshot. The rollback path
//! is symmetric and lives in one place.
//!
//! ## Stale-Amount Protection
//! The payment step pre-fills `amount_paid = total`. If the cashier walks
//! back and changes the cart or the discount, the previously captured
//! selection would be priced against a total that no longer exists. Every
//! step transition therefore drops a selection whose captured total no
//! longer matches, and `confirm()` independently rejects a mismatch (cart
//! edits made while sitting on the review step never pass through a
//! transition).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::{CheckoutError, CoreResult};
use crate::money::Money;
use crate::tender::{cash_change, validate_split};
use crate::totals::{compute_totals, CheckoutTotals};
use crate::types::{
    CustomerInfo, DiscountSpec, LineItem, PaymentMethod, PaymentTender, Sale, Staff, SyncState,
};

// =============================================================================
// Checkout Step
// =============================================================================

/// The ordered steps of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    OrderSummary,
    Discount,
    PaymentMethod,
    CustomerInfo,
    Review,
}

impl CheckoutStep {
    /// All steps in wizard order.
    pub const ALL: [CheckoutStep; 5] = [
        CheckoutStep::OrderSummary,
        CheckoutStep::Discount,
        CheckoutStep::PaymentMethod,
        CheckoutStep::CustomerInfo,
        CheckoutStep::Review,
    ];

    /// Position in the wizard order.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            CheckoutStep::OrderSummary => 0,
            CheckoutStep::Discount => 1,
            CheckoutStep::PaymentMethod => 2,
            CheckoutStep::CustomerInfo => 3,
            CheckoutStep::Review => 4,
        }
    }

    /// The following step, if any.
    pub fn next(self) -> Option<CheckoutStep> {
        CheckoutStep::ALL.get(self.index() + 1).copied()
    }

    /// The preceding step, if any.
    pub fn prev(self) -> Option<CheckoutStep> {
        self.index().checked_sub(1).map(|i| CheckoutStep::ALL[i])
    }
}

// =============================================================================
// Payment Selection
// =============================================================================

/// Step-scoped payment form state.
///
/// A checkout has either exactly one non-split tender or a non-empty ordered
/// sequence of split tenders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSelection {
    /// Nothing selected yet.
    None,
    /// One payment method covering the whole total.
    Single {
        method: PaymentMethod,
        /// What the customer hands over; pre-filled with the total.
        amount_paid: Money,
    },
    /// Multiple tenders applied in order.
    Split { tenders: Vec<PaymentTender> },
}

// =============================================================================
// Sale Draft
// =============================================================================

/// The validated, frozen output of `confirm()`.
///
/// Everything the sale submitter needs to mint a `Sale`; nothing here can
/// change once produced.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub tenders: Vec<PaymentTender>,
    /// Advisory cash change; display-only.
    pub change: Money,
    pub customer: CustomerInfo,
    pub notes: Option<String>,
}

impl SaleDraft {
    /// Mints the immutable `Sale` record for this draft.
    ///
    /// `local_id` must be freshly generated by the caller (UUID v4) - it
    /// becomes the idempotency key for every submission of this sale.
    pub fn into_sale(self, local_id: String, staff: &Staff) -> Sale {
        Sale {
            local_id,
            server_id: None,
            items: self.items,
            subtotal: self.subtotal,
            discount: self.discount,
            total: self.total,
            tenders: self.tenders,
            change: self.change,
            customer: self.customer,
            staff_name: staff.name.clone(),
            notes: self.notes,
            created_at: Utc::now(),
            sync_state: SyncState::Pending,
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// The aggregate root of one in-progress checkout.
///
/// ## Ownership
/// A session is owned by exactly one in-progress checkout; step transitions
/// are strictly sequential. The session is consumed exactly once on
/// successful submission (the submitter takes it by value) - there is no
/// re-submission of the same session object.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Working copy the wizard edits.
    cart: Cart,

    /// Snapshot taken at `begin`; what `cancel` rolls back to.
    pristine: Cart,

    discount: DiscountSpec,
    payment: PaymentSelection,
    customer: CustomerInfo,
    notes: Option<String>,

    current: CheckoutStep,
    visited: [bool; 5],

    /// The total that was current when the payment step was last entered.
    /// Used to detect stale payment selections.
    payment_priced_total: Option<Money>,
}

impl CheckoutSession {
    /// Begins a checkout over a cart.
    ///
    /// The cart must be non-empty. The session takes a pristine snapshot so
    /// cancellation can restore the cart exactly as it was.
    pub fn begin(cart: Cart) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let pristine = cart.clone();
        let mut visited = [false; 5];
        visited[CheckoutStep::OrderSummary.index()] = true;

        Ok(CheckoutSession {
            cart,
            pristine,
            discount: DiscountSpec::none(),
            payment: PaymentSelection::None,
            customer: CustomerInfo::default(),
            notes: None,
            current: CheckoutStep::OrderSummary,
            visited,
            payment_priced_total: None,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The step the wizard is currently on.
    #[inline]
    pub fn current_step(&self) -> CheckoutStep {
        self.current
    }

    /// Current totals under the current discount.
    pub fn totals(&self) -> CheckoutTotals {
        compute_totals(&self.cart, &self.discount)
    }

    /// The working cart (read-only).
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The working cart, for quantity adjustments during checkout.
    ///
    /// Edits made here are part of the session; they are discarded by
    /// `cancel` and committed by successful submission.
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// The current discount spec.
    pub fn discount(&self) -> &DiscountSpec {
        &self.discount
    }

    /// The current payment selection.
    pub fn payment(&self) -> &PaymentSelection {
        &self.payment
    }

    /// The customer form state.
    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    /// Pre-fill value for the payment step's amount field.
    pub fn suggested_amount(&self) -> Money {
        self.totals().total
    }

    // -------------------------------------------------------------------------
    // Form state
    // -------------------------------------------------------------------------

    /// Sets the discount. A coupon service may pre-populate this; the
    /// calculator clamps the result regardless.
    pub fn set_discount(&mut self, discount: DiscountSpec) {
        self.discount = discount;
    }

    /// Selects a single payment method, pre-filling the paid amount with the
    /// current total.
    pub fn select_single(&mut self, method: PaymentMethod) {
        let total = self.totals().total;
        self.payment = PaymentSelection::Single {
            method,
            amount_paid: total,
        };
        self.payment_priced_total = Some(total);
    }

    /// Overrides the paid amount of a single-method selection (e.g. the
    /// customer hands over a larger bill). Ignored when no single method is
    /// selected.
    pub fn set_amount_paid(&mut self, amount: Money) {
        if let PaymentSelection::Single { amount_paid, .. } = &mut self.payment {
            *amount_paid = amount;
        }
    }

    /// Replaces the split tender list.
    pub fn set_split_tenders(&mut self, tenders: Vec<PaymentTender>) {
        self.payment = PaymentSelection::Split { tenders };
        self.payment_priced_total = Some(self.totals().total);
    }

    /// Sets the optional customer details.
    pub fn set_customer(&mut self, customer: CustomerInfo) {
        self.customer = customer;
    }

    /// Sets the cashier note.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// The pure advance-guard table.
    ///
    /// | step          | guard                                            |
    /// |---------------|--------------------------------------------------|
    /// | OrderSummary  | always true                                      |
    /// | Discount      | always true (a zero discount is valid)           |
    /// | PaymentMethod | split: non-empty and Σ > 0; single: method chosen|
    /// | CustomerInfo  | always true                                      |
    /// | Review        | always true until Confirm                        |
    pub fn can_advance(&self) -> bool {
        match self.current {
            CheckoutStep::OrderSummary
            | CheckoutStep::Discount
            | CheckoutStep::CustomerInfo
            | CheckoutStep::Review => true,
            CheckoutStep::PaymentMethod => match &self.payment {
                PaymentSelection::None => false,
                PaymentSelection::Single { .. } => true,
                PaymentSelection::Split { tenders } => {
                    let sum: Money = tenders.iter().map(|t| t.amount).sum();
                    !tenders.is_empty() && sum.is_positive()
                }
            },
        }
    }

    /// Advances to the next step if the current guard allows it.
    pub fn advance(&mut self) -> CoreResult<CheckoutStep> {
        if !self.can_advance() {
            return Err(CheckoutError::StepIncomplete { step: self.current });
        }
        match self.current.next() {
            Some(next) => {
                self.enter(next);
                Ok(next)
            }
            // Review is the last step; advancing past it is confirm().
            None => Ok(self.current),
        }
    }

    /// Steps back to the previous step. No guard: backward navigation is
    /// always allowed. Returns the new step, or `None` at the first step.
    pub fn back(&mut self) -> Option<CheckoutStep> {
        let prev = self.current.prev()?;
        self.enter(prev);
        Some(prev)
    }

    /// Jumps directly to a step.
    ///
    /// Allowed only for steps already visited in this session; forward jumps
    /// to unvisited steps are rejected.
    pub fn goto(&mut self, step: CheckoutStep) -> CoreResult<CheckoutStep> {
        if !self.visited[step.index()] {
            return Err(CheckoutError::StepNotVisited { step });
        }
        self.enter(step);
        Ok(step)
    }

    /// Transition bookkeeping shared by advance/back/goto.
    fn enter(&mut self, step: CheckoutStep) {
        // A selection captured against an older total must not survive any
        // navigation, whichever step it lands on: the pre-filled amount
        // would be stale against the new total.
        if let Some(priced) = self.payment_priced_total {
            if priced != self.totals().total {
                self.payment = PaymentSelection::None;
                self.payment_priced_total = None;
            }
        }
        self.visited[step.index()] = true;
        self.current = step;
    }

    // -------------------------------------------------------------------------
    // Terminal actions
    // -------------------------------------------------------------------------

    /// Cancels the checkout, discarding the session.
    ///
    /// Returns the cart exactly as it was at `begin` - quantity edits made
    /// inside the wizard are rolled back, and the cart is NOT cleared
    /// (clearing happens only on successful completion or an explicit clear).
    pub fn cancel(self) -> Cart {
        self.pristine
    }

    /// Validates the session and freezes it into a `SaleDraft`.
    ///
    /// Only valid on the review step. Re-runs the reconciler on the final
    /// figures - a stale or underpaid tender set is rejected here with the
    /// session left untouched (this borrows, it does not consume).
    pub fn confirm(&self) -> CoreResult<SaleDraft> {
        if self.current != CheckoutStep::Review {
            return Err(CheckoutError::NotAtReview { step: self.current });
        }

        let totals = self.totals();

        // Last line of defense against a stale selection: cart edits made
        // without navigating (no `enter` ran) still get caught here.
        if let Some(priced) = self.payment_priced_total {
            if priced != totals.total {
                return Err(CheckoutError::StalePayment {
                    priced,
                    current: totals.total,
                });
            }
        }

        let (tenders, change) = match &self.payment {
            PaymentSelection::None => return Err(CheckoutError::NoPaymentSelected),

            PaymentSelection::Single {
                method,
                amount_paid,
            } => {
                let tender = PaymentTender::new(*method, *amount_paid);
                validate_split(std::slice::from_ref(&tender), totals.total)?;
                // Change is advisory and cash-only; the recorded tender keeps
                // the full amount paid.
                let change = if *method == PaymentMethod::Cash {
                    cash_change(*amount_paid, totals.total)
                } else {
                    Money::zero()
                };
                (vec![tender], change)
            }

            PaymentSelection::Split { tenders } => {
                if tenders.is_empty() {
                    return Err(CheckoutError::NoPaymentSelected);
                }
                validate_split(tenders, totals.total)?;
                // Split overage is accepted but never converted to change.
                (tenders.clone(), Money::zero())
            }
        };

        Ok(SaleDraft {
            items: self.cart.items().to_vec(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
            tenders,
            change,
            customer: self.customer.clone(),
            notes: self.notes.clone(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;

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

    fn session_with_cart() -> CheckoutSession {
        let mut cart = Cart::new();
        cart.add(&product(1, 1000, 10));
        cart.set_quantity(1, 2);
        CheckoutSession::begin(cart).unwrap()
    }

    /// Walks a session to the review step with a single cash tender.
    fn session_at_review() -> CheckoutSession {
        let mut s = session_with_cart();
        s.advance().unwrap(); // -> Discount
        s.advance().unwrap(); // -> PaymentMethod
        s.select_single(PaymentMethod::Cash);
        s.advance().unwrap(); // -> CustomerInfo
        s.advance().unwrap(); // -> Review
        s
    }

    #[test]
    fn test_begin_requires_non_empty_cart() {
        assert!(matches!(
            CheckoutSession::begin(Cart::new()),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_step_order() {
        let mut s = session_with_cart();
        assert_eq!(s.current_step(), CheckoutStep::OrderSummary);
        assert_eq!(s.advance().unwrap(), CheckoutStep::Discount);
        assert_eq!(s.advance().unwrap(), CheckoutStep::PaymentMethod);
    }

    #[test]
    fn test_payment_guard_blocks_until_selection() {
        let mut s = session_with_cart();
        s.advance().unwrap();
        s.advance().unwrap();
        assert_eq!(s.current_step(), CheckoutStep::PaymentMethod);

        assert!(!s.can_advance());
        assert!(matches!(
            s.advance(),
            Err(CheckoutError::StepIncomplete { .. })
        ));

        s.select_single(PaymentMethod::CardTerminal);
        assert!(s.can_advance());
        assert_eq!(s.advance().unwrap(), CheckoutStep::CustomerInfo);
    }

    #[test]
    fn test_split_guard_requires_positive_sum() {
        let mut s = session_with_cart();
        s.advance().unwrap();
        s.advance().unwrap();

        s.set_split_tenders(vec![]);
        assert!(!s.can_advance());

        s.set_split_tenders(vec![PaymentTender::new(PaymentMethod::Cash, Money::zero())]);
        assert!(!s.can_advance());

        s.set_split_tenders(vec![PaymentTender::new(
            PaymentMethod::Cash,
            Money::from_cents(500),
        )]);
        assert!(s.can_advance());
    }

    #[test]
    fn test_no_forward_jump_to_unvisited_step() {
        let mut s = session_with_cart();
        assert!(matches!(
            s.goto(CheckoutStep::Review),
            Err(CheckoutError::StepNotVisited { .. })
        ));

        // Visited steps are reachable in either direction.
        s.advance().unwrap();
        assert_eq!(s.goto(CheckoutStep::OrderSummary).unwrap(), CheckoutStep::OrderSummary);
        assert_eq!(s.goto(CheckoutStep::Discount).unwrap(), CheckoutStep::Discount);
    }

    #[test]
    fn test_back_navigation() {
        let mut s = session_with_cart();
        s.advance().unwrap();
        assert_eq!(s.back(), Some(CheckoutStep::OrderSummary));
        assert_eq!(s.back(), None);
    }

    #[test]
    fn test_payment_selection_reset_when_total_changes() {
        let mut s = session_at_review();
        assert!(matches!(s.payment(), PaymentSelection::Single { .. }));

        // Walk back and change the discount: total 2000 → 1800.
        s.goto(CheckoutStep::Discount).unwrap();
        s.set_discount(DiscountSpec::percentage(10.0));

        // Re-entering the payment step drops the stale selection.
        s.goto(CheckoutStep::PaymentMethod).unwrap();
        assert_eq!(*s.payment(), PaymentSelection::None);
        assert!(!s.can_advance());
    }

    #[test]
    fn test_payment_selection_kept_when_total_unchanged() {
        let mut s = session_at_review();
        s.goto(CheckoutStep::CustomerInfo).unwrap();
        s.goto(CheckoutStep::PaymentMethod).unwrap();
        assert!(matches!(s.payment(), PaymentSelection::Single { .. }));
    }

    #[test]
    fn test_cart_edit_during_checkout_resets_payment() {
        let mut s = session_at_review();
        s.goto(CheckoutStep::OrderSummary).unwrap();
        s.cart_mut().set_quantity(1, 1); // total 2000 → 1000

        s.goto(CheckoutStep::PaymentMethod).unwrap();
        assert_eq!(*s.payment(), PaymentSelection::None);
    }

    #[test]
    fn test_discount_change_resets_payment_without_revisiting_payment_step() {
        // Jump straight back to review after editing the discount, skipping
        // the payment step entirely. The selection priced at 2000 must not
        // confirm against the new 1800 total.
        let mut s = session_at_review();
        s.goto(CheckoutStep::Discount).unwrap();
        s.set_discount(DiscountSpec::percentage(10.0));
        s.goto(CheckoutStep::Review).unwrap();

        assert_eq!(*s.payment(), PaymentSelection::None);
        assert!(matches!(s.confirm(), Err(CheckoutError::NoPaymentSelected)));
    }

    #[test]
    fn test_confirm_rejects_cart_edit_made_at_review() {
        // Editing the cart while sitting on review never passes through a
        // step transition, so confirm itself must catch the mismatch.
        let mut s = session_at_review();
        s.cart_mut().set_quantity(1, 1); // total 2000 → 1000

        let err = s.confirm().unwrap_err();
        assert!(matches!(err, CheckoutError::StalePayment { .. }));
        assert_eq!(s.current_step(), CheckoutStep::Review);
    }

    #[test]
    fn test_cancel_rolls_back_cart_edits() {
        let mut cart = Cart::new();
        cart.add(&product(1, 1000, 10));
        cart.set_quantity(1, 2);

        let mut s = CheckoutSession::begin(cart).unwrap();
        s.cart_mut().set_quantity(1, 7);
        s.cart_mut().add(&product(2, 500, 3));

        let restored = s.cancel();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get(1).unwrap().quantity, 2);
    }

    #[test]
    fn test_confirm_requires_review_step() {
        let s = session_with_cart();
        assert!(matches!(
            s.confirm(),
            Err(CheckoutError::NotAtReview { .. })
        ));
    }

    #[test]
    fn test_confirm_single_cash_with_change() {
        // total 1800 after 10% discount; customer pays 2000 → change 200,
        // recorded tender stays 2000.
        let mut s = session_with_cart();
        s.advance().unwrap();
        s.set_discount(DiscountSpec::percentage(10.0));
        s.advance().unwrap();
        s.select_single(PaymentMethod::Cash);
        s.set_amount_paid(Money::from_cents(2000));
        s.advance().unwrap();
        s.advance().unwrap();

        let draft = s.confirm().unwrap();
        assert_eq!(draft.subtotal.cents(), 2000);
        assert_eq!(draft.discount.cents(), 200);
        assert_eq!(draft.total.cents(), 1800);
        assert_eq!(draft.change.cents(), 200);
        assert_eq!(draft.tenders.len(), 1);
        assert_eq!(draft.tenders[0].amount.cents(), 2000);
    }

    #[test]
    fn test_confirm_underpaid_split_rejected() {
        let mut s = session_with_cart(); // total 2000
        s.advance().unwrap();
        s.advance().unwrap();
        s.set_split_tenders(vec![
            PaymentTender::new(PaymentMethod::Cash, Money::from_cents(1000)),
            PaymentTender::new(PaymentMethod::BankTransfer, Money::from_cents(500)),
        ]);
        s.advance().unwrap();
        s.advance().unwrap();

        let err = s.confirm().unwrap_err();
        assert!(matches!(err, CheckoutError::Tender(_)));
        // Session unchanged: the cashier can correct and confirm again.
        assert_eq!(s.current_step(), CheckoutStep::Review);
    }

    #[test]
    fn test_confirm_split_overage_accepted_without_change() {
        let mut s = session_with_cart(); // total 2000
        s.advance().unwrap();
        s.advance().unwrap();
        s.set_split_tenders(vec![
            PaymentTender::new(PaymentMethod::Cash, Money::from_cents(1500)),
            PaymentTender::new(PaymentMethod::MobileMoney, Money::from_cents(1000)),
        ]);
        s.advance().unwrap();
        s.advance().unwrap();

        let draft = s.confirm().unwrap();
        assert_eq!(draft.change.cents(), 0);
        assert_eq!(draft.tenders.len(), 2);
    }

    #[test]
    fn test_draft_into_sale() {
        let s = session_at_review();
        let draft = s.confirm().unwrap();
        let staff = Staff {
            id: "staff-1".into(),
            name: "Ada".into(),
        };

        let sale = draft.into_sale("local-1".into(), &staff);
        assert_eq!(sale.local_id, "local-1");
        assert_eq!(sale.server_id, None);
        assert_eq!(sale.sync_state, SyncState::Pending);
        assert_eq!(sale.staff_name, "Ada");
        assert_eq!(sale.total.cents(), 2000);
        assert_eq!(sale.items.len(), 1);
    }
}
