//! Checkout totals
//!
//! Pure arithmetic over cart lines. Intermediate values keep full precision;
//! rounding to two decimal places happens only in [`CheckoutTotals::rounded`]
//! and [`round_money`], at the point of display or submission.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    discounts::{DiscountDescriptor, DiscountError},
    items::CartLineItem,
};

/// Decimal places used for displayed and submitted amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary amount for display or submission.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `Σ unit_price * quantity`
#[must_use]
pub fn subtotal(lines: &[CartLineItem]) -> Decimal {
    lines.iter().map(CartLineItem::line_total).sum()
}

/// Discount granted on `subtotal`, clamped to `[0, subtotal]`.
///
/// # Errors
///
/// Returns a [`DiscountError`] when the descriptor is invalid or the
/// percentage calculation overflows.
pub fn discount_amount(
    subtotal: Decimal,
    descriptor: &DiscountDescriptor,
) -> Result<Decimal, DiscountError> {
    let amount = descriptor.amount_off(subtotal)?;

    Ok(amount.min(subtotal).max(Decimal::ZERO))
}

/// `subtotal - min(discount, subtotal)`, never negative.
#[must_use]
pub fn after_discount_total(subtotal: Decimal, discount: Decimal) -> Decimal {
    (subtotal - discount.min(subtotal)).max(Decimal::ZERO)
}

/// `after_discount + delivery_charge`
#[must_use]
pub fn total(after_discount: Decimal, delivery_charge: Decimal) -> Decimal {
    after_discount + delivery_charge
}

/// Every amount shown on the checkout screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    /// Sum of line totals
    pub subtotal: Decimal,

    /// Discount actually applied
    pub discount: Decimal,

    /// Subtotal after discount
    pub after_discount: Decimal,

    /// Delivery zone charge
    pub delivery_charge: Decimal,

    /// Amount payable
    pub total: Decimal,
}

impl CheckoutTotals {
    /// Compute totals for `lines` with an optional discount and a delivery charge.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] when the discount cannot be computed.
    pub fn compute(
        lines: &[CartLineItem],
        discount: Option<&DiscountDescriptor>,
        delivery_charge: Decimal,
    ) -> Result<Self, DiscountError> {
        let subtotal = subtotal(lines);

        let discount = match discount {
            Some(descriptor) => discount_amount(subtotal, descriptor)?,
            None => Decimal::ZERO,
        };

        let after_discount = after_discount_total(subtotal, discount);

        Ok(Self {
            subtotal,
            discount,
            after_discount,
            delivery_charge,
            total: total(after_discount, delivery_charge),
        })
    }

    /// Each field rounded to [`MONEY_SCALE`] places.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_money(self.subtotal),
            discount: round_money(self.discount),
            after_discount: round_money(self.after_discount),
            delivery_charge: round_money(self.delivery_charge),
            total: round_money(self.total),
        }
    }
}
