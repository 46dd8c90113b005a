//! Storefront client
//!
//! Keeps the shopper's local cart in step with the remote cart of a signed-in
//! account and drives order placement for guests and members.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod context;
pub mod observability;
pub mod session;
pub mod sync;
