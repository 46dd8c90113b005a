//! Storefront backend

mod errors;
pub mod http;
mod models;
mod service;

pub use errors::ApiError;
pub use http::HttpStorefrontApi;
pub use models::*;
pub use service::*;
