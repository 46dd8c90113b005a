use clap::{Parser, Subcommand};
use rusty_money::iso;

use storefront_app::{
    config::{AppConfig, logging::LoggingConfig},
    context::Storefront,
};

mod cart;
mod catalog;
mod checkout;
mod orders;
mod table;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Cart(cart::CartCommand),
    Catalog(catalog::CatalogCommand),
    Checkout(checkout::CheckoutCommand),
    Orders(orders::OrdersCommand),
}

impl Cli {
    /// Parse flags, reading a `.env` file first when one exists.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.config.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let currency = self
            .config
            .display
            .currency()
            .map_err(|error| error.to_string())?;

        let mut storefront = Storefront::from_config(&self.config)
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Cart(command) => cart::run(command, &mut storefront, currency).await,
            Commands::Catalog(command) => catalog::run(command, &storefront, currency).await,
            Commands::Checkout(command) => checkout::run(command, &mut storefront, currency).await,
            Commands::Orders(command) => orders::run(command, &storefront, currency),
        }
    }
}

pub(crate) type Currency = &'static iso::Currency;
