//! Cart
//!
//! Ticket selections for a single checkout, in display order, plus the
//! discount unlocked by a promo code. Totals are derived on demand and never
//! stored, so they can't drift from the selections or the discount.

use decimal_percentage::Percentage;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    discounts::{DiscountError, discount_on, fraction, no_discount},
    promotions::{PromoError, PromoLedger},
};

/// Errors related to cart updates or totals.
#[derive(Debug, Error)]
pub enum CartError {
    /// A ticket's currency differs from the cart currency (ticket, ticket currency, cart currency).
    #[error("Ticket {0} is priced in {1}, but the cart is in {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// A ticket was given a negative unit price.
    #[error("Ticket {0} has a negative price")]
    NegativePrice(String),

    /// A quantity or total does not fit the supported range.
    #[error("Cart totals overflowed")]
    Overflow,

    /// The cart has no tickets to check out.
    #[error("Cart is empty")]
    Empty,

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// The checkout flow refused the hand-off.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// A ticket type and how many of it are in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketSelection {
    ticket_id: String,
    unit_price: Money<'static, Currency>,
    quantity: u32,
}

impl TicketSelection {
    /// Ticket type id
    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    /// Price of one ticket
    pub fn unit_price(&self) -> &Money<'static, Currency> {
        &self.unit_price
    }

    /// Number of tickets selected, always at least one
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the amount does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, CartError> {
        let minor = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::Overflow)?;

        Ok(Money::from_minor(minor, self.unit_price.currency()))
    }
}

/// Totals derived from the cart at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Sum of quantities
    pub total_tickets: u64,

    /// Sum of unit price × quantity
    pub subtotal: Money<'static, Currency>,

    /// Discount fraction in effect
    pub discount: Percentage,

    /// Amount taken off the subtotal
    pub discount_amount: Money<'static, Currency>,

    /// `subtotal × (1 − discount)`
    pub total: Money<'static, Currency>,
}

/// What the cart hands to the checkout flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    /// Amount to charge
    pub total: Money<'static, Currency>,

    /// Discount fraction already applied to `total`
    pub discount: Percentage,

    /// Number of tickets being bought
    pub total_tickets: u64,
}

/// Errors reported by a checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The checkout flow declined the request.
    #[error("checkout rejected: {0}")]
    Rejected(String),
}

/// The external checkout flow a cart forwards its total to.
#[automock]
pub trait CheckoutHandoff {
    /// Begin checkout for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout flow cannot accept the request.
    fn proceed_to_checkout(&self, request: CheckoutRequest) -> Result<(), CheckoutError>;
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    selections: SmallVec<[TicketSelection; 4]>,
    currency: &'static Currency,
    discount: Percentage,
}

impl Cart {
    /// Create an empty cart priced in `currency`.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            selections: SmallVec::new(),
            currency,
            discount: no_discount(),
        }
    }

    /// Add `delta` tickets of a type, or remove them when `delta` is negative.
    ///
    /// New ticket types are appended to the display order. A quantity that
    /// reaches zero, or would go below it, removes the ticket type. An
    /// existing ticket type takes on the latest `unit_price`.
    ///
    /// # Errors
    ///
    /// Returns an error if the price is negative or in another currency, or if
    /// the quantity overflows.
    pub fn add_or_update(
        &mut self,
        ticket_id: impl Into<String>,
        unit_price: Money<'static, Currency>,
        delta: i64,
    ) -> Result<(), CartError> {
        let ticket_id = ticket_id.into();

        if unit_price.currency() != self.currency {
            return Err(CartError::CurrencyMismatch(
                ticket_id,
                unit_price.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if unit_price.to_minor_units() < 0 {
            return Err(CartError::NegativePrice(ticket_id));
        }

        let Some(position) = self.position(&ticket_id) else {
            if delta > 0 {
                let quantity = u32::try_from(delta).map_err(|_err| CartError::Overflow)?;

                debug!(ticket_id = %ticket_id, quantity, "ticket added to cart");

                self.selections.push(TicketSelection {
                    ticket_id,
                    unit_price,
                    quantity,
                });
            }

            return Ok(());
        };

        let Some(current) = self.selections.get(position).map(TicketSelection::quantity) else {
            return Ok(());
        };

        let quantity = i64::from(current)
            .checked_add(delta)
            .ok_or(CartError::Overflow)?;

        if quantity <= 0 {
            debug!(ticket_id = %ticket_id, "ticket removed from cart");
            self.selections.remove(position);

            return Ok(());
        }

        let quantity = u32::try_from(quantity).map_err(|_err| CartError::Overflow)?;

        if let Some(selection) = self.selections.get_mut(position) {
            selection.quantity = quantity;
            selection.unit_price = unit_price;
        }

        debug!(ticket_id = %ticket_id, quantity, "ticket quantity updated");

        Ok(())
    }

    /// Remove a ticket type entirely. Removing an absent ticket is a no-op.
    pub fn remove(&mut self, ticket_id: &str) -> Option<TicketSelection> {
        let position = self.position(ticket_id)?;

        debug!(ticket_id, "ticket removed from cart");

        Some(self.selections.remove(position))
    }

    /// Validate `code` and, if accepted, apply its discount to the cart.
    ///
    /// A rejected code leaves any earlier discount in place.
    ///
    /// # Errors
    ///
    /// Returns the ledger's [`PromoError`] when the code is rejected.
    pub async fn apply_promo(
        &mut self,
        ledger: &PromoLedger,
        code: &str,
    ) -> Result<Percentage, PromoError> {
        let discount = ledger.apply(code).await?;

        self.discount = discount;

        info!(discount = %fraction(&discount), "discount applied to cart");

        Ok(discount)
    }

    /// Drop any applied discount.
    pub fn clear_discount(&mut self) {
        self.discount = no_discount();
    }

    /// Discount fraction currently in effect.
    pub fn discount(&self) -> Percentage {
        self.discount
    }

    /// Derive ticket count, subtotal and total from the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if a total overflows.
    pub fn snapshot(&self) -> Result<CartSnapshot, CartError> {
        let total_tickets = self
            .selections
            .iter()
            .map(|selection| u64::from(selection.quantity))
            .sum();

        let subtotal_minor = self.selections.iter().try_fold(0_i64, |acc, selection| {
            acc.checked_add(selection.line_total()?.to_minor_units())
                .ok_or(CartError::Overflow)
        })?;

        let subtotal = Money::from_minor(subtotal_minor, self.currency);
        let discount_amount = discount_on(&subtotal, &self.discount)?;
        let total = subtotal
            .sub(discount_amount)
            .map_err(DiscountError::from)?;

        Ok(CartSnapshot {
            total_tickets,
            subtotal,
            discount: self.discount,
            discount_amount,
            total,
        })
    }

    /// Hand the current total and discount to the checkout flow.
    ///
    /// The cart does not take payment itself.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] if there is nothing to buy, or the
    /// checkout flow's error if it refuses the request.
    pub fn proceed_to_checkout<H>(&self, handoff: &H) -> Result<CheckoutRequest, CartError>
    where
        H: CheckoutHandoff + ?Sized,
    {
        if self.is_empty() {
            return Err(CartError::Empty);
        }

        let snapshot = self.snapshot()?;

        let request = CheckoutRequest {
            total: snapshot.total,
            discount: snapshot.discount,
            total_tickets: snapshot.total_tickets,
        };

        handoff.proceed_to_checkout(request.clone())?;

        info!(total = %request.total, tickets = request.total_tickets, "handed off to checkout");

        Ok(request)
    }

    /// Iterate over selections in display order.
    pub fn iter(&self) -> impl Iterator<Item = &TicketSelection> {
        self.selections.iter()
    }

    /// Find a selection by ticket id.
    pub fn get(&self, ticket_id: &str) -> Option<&TicketSelection> {
        self.selections
            .iter()
            .find(|selection| selection.ticket_id == ticket_id)
    }

    /// Get the number of distinct ticket types in the cart.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn position(&self, ticket_id: &str) -> Option<usize> {
        self.selections
            .iter()
            .position(|selection| selection.ticket_id == ticket_id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    fn usd(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, USD)
    }

    fn two_ticket_cart() -> Result<Cart, CartError> {
        let mut cart = Cart::new(USD);

        cart.add_or_update("general", usd(5_000), 2)?;
        cart.add_or_update("early-bird", usd(3_000), 1)?;

        Ok(cart)
    }

    #[test]
    fn new_cart_is_empty() -> TestResult {
        let cart = Cart::new(USD);

        let snapshot = cart.snapshot()?;

        assert!(cart.is_empty());
        assert_eq!(cart.currency(), USD);
        assert_eq!(snapshot.total_tickets, 0);
        assert_eq!(snapshot.subtotal, usd(0));
        assert_eq!(snapshot.total, usd(0));

        Ok(())
    }

    #[test]
    fn snapshot_sums_quantities_and_prices() -> TestResult {
        let cart = two_ticket_cart()?;

        let snapshot = cart.snapshot()?;

        assert_eq!(snapshot.total_tickets, 3);
        assert_eq!(snapshot.subtotal, usd(13_000));
        assert_eq!(snapshot.discount_amount, usd(0));
        assert_eq!(snapshot.total, usd(13_000));

        Ok(())
    }

    #[test]
    fn selections_keep_insertion_order() -> TestResult {
        let mut cart = two_ticket_cart()?;

        cart.add_or_update("vip", usd(12_000), 1)?;
        cart.add_or_update("general", usd(5_000), 1)?;

        let ids: Vec<&str> = cart.iter().map(TicketSelection::ticket_id).collect();

        assert_eq!(ids, ["general", "early-bird", "vip"]);
        assert_eq!(cart.get("general").map(TicketSelection::quantity), Some(3));

        Ok(())
    }

    #[test]
    fn reaching_zero_removes_selection() -> TestResult {
        let mut cart = two_ticket_cart()?;

        cart.add_or_update("early-bird", usd(3_000), -1)?;

        assert!(cart.get("early-bird").is_none());
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn going_below_zero_removes_selection() -> TestResult {
        let mut cart = two_ticket_cart()?;

        cart.add_or_update("general", usd(5_000), -10)?;

        assert!(cart.get("general").is_none());

        Ok(())
    }

    #[test]
    fn negative_delta_for_absent_ticket_is_noop() -> TestResult {
        let mut cart = Cart::new(USD);

        cart.add_or_update("general", usd(5_000), -1)?;
        cart.add_or_update("general", usd(5_000), 0)?;

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn latest_unit_price_wins() -> TestResult {
        let mut cart = two_ticket_cart()?;

        cart.add_or_update("general", usd(4_500), 0)?;

        assert_eq!(
            cart.get("general").map(TicketSelection::unit_price),
            Some(&usd(4_500))
        );
        assert_eq!(cart.snapshot()?.subtotal, usd(12_000));

        Ok(())
    }

    #[test]
    fn currency_mismatch_errors() {
        let mut cart = Cart::new(USD);

        let result = cart.add_or_update("stalls", Money::from_minor(4_500, GBP), 1);

        match result {
            Err(CartError::CurrencyMismatch(ticket, ticket_currency, cart_currency)) => {
                assert_eq!(ticket, "stalls");
                assert_eq!(ticket_currency, GBP.iso_alpha_code);
                assert_eq!(cart_currency, USD.iso_alpha_code);
            }
            other => panic!("expected CurrencyMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn negative_price_errors() {
        let mut cart = Cart::new(USD);

        let result = cart.add_or_update("general", usd(-1), 1);

        assert!(matches!(result, Err(CartError::NegativePrice(id)) if id == "general"));
    }

    #[test]
    fn remove_is_idempotent() -> TestResult {
        let mut cart = two_ticket_cart()?;

        let removed = cart.remove("general");
        let after_once = cart.snapshot()?;

        let removed_again = cart.remove("general");
        let after_twice = cart.snapshot()?;

        assert!(removed.is_some());
        assert!(removed_again.is_none());
        assert_eq!(after_once, after_twice);

        Ok(())
    }

    #[tokio::test]
    async fn apply_promo_discounts_total() -> TestResult {
        let mut cart = two_ticket_cart()?;
        let ledger = PromoLedger::default();

        cart.apply_promo(&ledger, "SUMMER20").await?;

        let snapshot = cart.snapshot()?;

        assert_eq!(fraction(&snapshot.discount), Decimal::new(20, 2));
        assert_eq!(snapshot.discount_amount, usd(2_600));
        assert_eq!(snapshot.total, usd(10_400));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_promo_keeps_previous_discount() -> TestResult {
        let mut cart = two_ticket_cart()?;
        let ledger = PromoLedger::default();

        cart.apply_promo(&ledger, "WELCOME10").await?;

        let result = cart.apply_promo(&ledger, "FOOBAR").await;

        assert_eq!(result, Err(PromoError::InvalidCode("FOOBAR".to_string())));
        assert_eq!(fraction(&cart.discount()), Decimal::new(10, 2));

        Ok(())
    }

    #[tokio::test]
    async fn later_promo_overwrites_earlier_one() -> TestResult {
        let mut cart = two_ticket_cart()?;
        let ledger = PromoLedger::default();

        cart.apply_promo(&ledger, "SUMMER20").await?;
        cart.apply_promo(&ledger, "festival15").await?;

        assert_eq!(fraction(&cart.discount()), Decimal::new(15, 2));
        assert_eq!(cart.snapshot()?.total, usd(11_050));

        Ok(())
    }

    #[tokio::test]
    async fn clear_discount_restores_subtotal() -> TestResult {
        let mut cart = two_ticket_cart()?;

        cart.apply_promo(&PromoLedger::default(), "WELCOME10").await?;
        cart.clear_discount();

        let snapshot = cart.snapshot()?;

        assert_eq!(snapshot.total, snapshot.subtotal);

        Ok(())
    }

    #[test]
    fn line_total_multiplies_quantity() -> TestResult {
        let cart = two_ticket_cart()?;

        let Some(general) = cart.get("general") else {
            panic!("general should be in the cart");
        };

        assert_eq!(general.line_total()?, usd(10_000));

        Ok(())
    }

    #[test]
    fn proceed_to_checkout_forwards_total() -> TestResult {
        let cart = two_ticket_cart()?;
        let mut handoff = MockCheckoutHandoff::new();

        handoff
            .expect_proceed_to_checkout()
            .withf(|request| request.total == usd(13_000) && request.total_tickets == 3)
            .times(1)
            .returning(|_| Ok(()));

        let request = cart.proceed_to_checkout(&handoff)?;

        assert_eq!(request.total, usd(13_000));

        Ok(())
    }

    #[test]
    fn proceed_to_checkout_rejects_empty_cart() {
        let cart = Cart::new(USD);
        let mut handoff = MockCheckoutHandoff::new();

        handoff.expect_proceed_to_checkout().never();

        assert!(matches!(
            cart.proceed_to_checkout(&handoff),
            Err(CartError::Empty)
        ));
    }

    #[test]
    fn proceed_to_checkout_surfaces_rejection() -> TestResult {
        let cart = two_ticket_cart()?;
        let mut handoff = MockCheckoutHandoff::new();

        handoff
            .expect_proceed_to_checkout()
            .returning(|_| Err(CheckoutError::Rejected("sold out".to_string())));

        assert!(matches!(
            cart.proceed_to_checkout(&handoff),
            Err(CartError::Checkout(CheckoutError::Rejected(reason))) if reason == "sold out"
        ));

        Ok(())
    }
}
