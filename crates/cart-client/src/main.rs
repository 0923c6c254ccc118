//! # dairy-shop
//!
//! Command-line storefront for the dairy-cart API.
//!
//! ## Usage
//!
//! ```bash
//! # Point at the shop API (or set it in config/shop.toml)
//! export SHOP_API_URL=http://localhost:5000
//!
//! dairy-shop products --category milk
//! dairy-shop cart add 65f0c0ffee --quantity 2
//! dairy-shop validate
//!
//! # Paying needs the Stripe publishable key
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//! dairy-shop checkout --street "12 Dairy Lane" --city Anand --state Gujarat \
//!     --postal-code 388001 --payment-method pm_card_visa
//! ```

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    cli::Cli::parse().run().await
}
