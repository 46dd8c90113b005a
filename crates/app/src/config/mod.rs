//! Application configuration

use clap::Args;

use crate::config::{
    api::ApiConfig, display::DisplayConfig, logging::LoggingConfig, session::SessionConfig,
    storage::StorageConfig,
};

pub mod api;
pub mod display;
pub mod logging;
pub mod session;
pub mod storage;

/// Storefront client configuration, read from flags and the environment.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Backend settings.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Local storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Signed-in shopper, if any.
    #[command(flatten)]
    pub session: SessionConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// How amounts are rendered.
    #[command(flatten)]
    pub display: DisplayConfig,
}
