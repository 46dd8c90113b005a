//! Storefront
//!
//! Cart and checkout core of the storefront client: the persisted cart, checkout
//! totals and validation, order payloads and the guest order archive.

pub mod archive;
pub mod cart;
pub mod checkout;
pub mod discounts;
pub mod ids;
pub mod items;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod reference;
pub mod storage;
