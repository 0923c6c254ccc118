use cart_client::{ApiGateway, ClientConfig};
use cart_core::{CartStore, Currency, FileStore, Price, SharedStore};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::debug;

mod account;
mod cart;
mod catalog;
mod checkout;

#[derive(Debug, Parser)]
#[command(name = "dairy-shop", about = "Dairy storefront CLI", version, long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the shop API is up
    Health,
    /// Browse the catalog
    Products(catalog::ProductsArgs),
    /// Show one product
    Product(catalog::ProductArgs),
    /// Inspect and edit the cart
    Cart(cart::CartCommand),
    /// Inspect and edit the wishlist
    Wishlist(cart::WishlistCommand),
    /// Check the cart against current stock
    Validate,
    /// Sign in
    Login(account::LoginArgs),
    /// Sign out and clear the local cart
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your orders
    Orders,
    /// Place an order for the cart and pay for it
    Checkout(checkout::CheckoutArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> anyhow::Result<()> {
        let ctx = Context::load()?;
        match self.command {
            Commands::Health => catalog::health(&ctx).await,
            Commands::Products(args) => catalog::products(&ctx, args).await,
            Commands::Product(args) => catalog::product(&ctx, args).await,
            Commands::Cart(command) => cart::run(&ctx, command).await,
            Commands::Wishlist(command) => cart::run_wishlist(&ctx, command).await,
            Commands::Validate => cart::validate(&ctx).await,
            Commands::Login(args) => account::login(&ctx, args).await,
            Commands::Logout => account::logout(&ctx).await,
            Commands::Whoami => account::whoami(&ctx).await,
            Commands::Orders => account::orders(&ctx).await,
            Commands::Checkout(args) => checkout::run(&ctx, args).await,
        }
    }
}

/// Services shared by every command
pub(crate) struct Context {
    config: ClientConfig,
    gateway: Arc<ApiGateway>,
    cart: Arc<CartStore>,
}

impl Context {
    fn load() -> anyhow::Result<Self> {
        let config = ClientConfig::load()?;
        let storage: SharedStore = Arc::new(FileStore::open(&config.storage_dir)?);
        let gateway = Arc::new(ApiGateway::new(&config, storage.clone())?);
        let cart = Arc::new(CartStore::new(storage));
        debug!(api = %config.api_url, dir = %config.storage_dir.display(), "client ready");

        Ok(Self {
            config,
            gateway,
            cart,
        })
    }
}

fn money(amount: f64) -> String {
    Price::new(amount, Currency::default()).display()
}
