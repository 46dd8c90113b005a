//! Discounts
//!
//! A coupon applied at checkout yields a [`DiscountDescriptor`]: either a
//! percentage of the subtotal or a fixed amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::CouponId;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation overflowed.
    #[error("percentage calculation overflowed")]
    Overflow,

    /// Discount amounts must not be negative.
    #[error("discount amount {0} is negative")]
    NegativeAmount(Decimal),
}

/// How a discount amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `amount` is a percentage of the subtotal (10 means 10%).
    Percentage,

    /// `amount` is subtracted from the subtotal as-is.
    Fixed,
}

/// Result of applying a coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDescriptor {
    /// Percentage or fixed amount, depending on `kind`
    pub amount: Decimal,

    /// How to interpret `amount`
    pub kind: DiscountKind,

    /// Coupon the discount came from
    pub source_id: CouponId,
}

impl DiscountDescriptor {
    /// A percentage discount.
    pub fn percentage(amount: Decimal, source_id: impl Into<CouponId>) -> Self {
        Self {
            amount,
            kind: DiscountKind::Percentage,
            source_id: source_id.into(),
        }
    }

    /// A fixed amount discount.
    pub fn fixed(amount: Decimal, source_id: impl Into<CouponId>) -> Self {
        Self {
            amount,
            kind: DiscountKind::Fixed,
            source_id: source_id.into(),
        }
    }

    /// Unclamped discount this descriptor grants on `subtotal`.
    ///
    /// # Errors
    ///
    /// - [`DiscountError::NegativeAmount`]: the descriptor amount is negative.
    /// - [`DiscountError::Overflow`]: the percentage calculation overflows.
    pub fn amount_off(&self, subtotal: Decimal) -> Result<Decimal, DiscountError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(DiscountError::NegativeAmount(self.amount));
        }

        match self.kind {
            DiscountKind::Fixed => Ok(self.amount),
            DiscountKind::Percentage => subtotal
                .checked_mul(self.amount)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .ok_or(DiscountError::Overflow),
        }
    }
}
