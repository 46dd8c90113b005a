//! Display Config

use clap::Args;
use rust_decimal::Decimal;
use rusty_money::{Money, iso};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown currency code {0:?}")]
pub struct UnknownCurrency(pub String);

/// Amount rendering settings.
#[derive(Debug, Args)]
pub struct DisplayConfig {
    /// ISO 4217 code used to render amounts
    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "BDT")]
    pub currency: String,
}

impl DisplayConfig {
    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns an error when the code is not an ISO 4217 currency.
    pub fn currency(&self) -> Result<&'static iso::Currency, UnknownCurrency> {
        iso::find(self.currency.trim()).ok_or_else(|| UnknownCurrency(self.currency.clone()))
    }
}

/// Render `amount` in `currency`, e.g. `৳220.00`.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &iso::Currency) -> String {
    Money::from_decimal(amount, currency).to_string()
}
