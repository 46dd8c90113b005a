//! Backend Config

use std::time::Duration;

use clap::Args;

/// Storefront backend settings.
#[derive(Debug, Args)]
pub struct ApiConfig {
    /// Backend base URL
    #[arg(
        long = "api-url",
        env = "STOREFRONT_API_URL",
        default_value = "http://localhost:8080"
    )]
    pub base_url: String,

    /// Request timeout in seconds; the HTTP client default applies when unset
    #[arg(long = "api-timeout-seconds", env = "STOREFRONT_API_TIMEOUT_SECONDS")]
    pub timeout_seconds: Option<u64>,
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
