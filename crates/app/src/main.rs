//! Storefront CLI

use std::process;

use storefront_app::observability;

mod cli;

#[tokio::main]
pub async fn main() {
    let cli = match cli::Cli::load() {
        Ok(cli) => cli,
        Err(error) => error.exit(),
    };

    if let Err(error) = observability::init_subscriber(cli.logging()) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
