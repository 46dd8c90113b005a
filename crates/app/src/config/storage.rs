//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Local storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory holding the persisted cart and guest orders
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    pub data_dir: PathBuf,
}
