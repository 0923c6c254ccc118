use super::{money, Context};
use cart_core::validate_cart_live;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: Option<CartSubcommand>,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart (default)
    List,
    /// Add a product
    Add {
        id: String,
        #[arg(long, short, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of an entry; zero or less removes it
    Update {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove an entry
    Remove { id: String },
    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
pub(crate) struct WishlistCommand {
    #[command(subcommand)]
    command: Option<WishlistSubcommand>,
}

#[derive(Debug, Subcommand)]
enum WishlistSubcommand {
    /// Show the wishlist (default)
    List,
    /// Save a product for later
    Add { id: String },
    /// Forget a saved product
    Remove { id: String },
    /// Move a saved product into the cart
    Move { id: String },
}

pub(crate) async fn run(ctx: &Context, command: CartCommand) -> anyhow::Result<()> {
    match command.command.unwrap_or(CartSubcommand::List) {
        CartSubcommand::List => {}
        CartSubcommand::Add { id, quantity } => {
            let product = ctx.gateway.product(&id).await?;
            ctx.cart.add_to_cart(&product, quantity)?;
            println!("added {} x {}", quantity, product.name);
        }
        CartSubcommand::Update { id, quantity } => ctx.cart.update_quantity(&id, quantity)?,
        CartSubcommand::Remove { id } => ctx.cart.remove_from_cart(&id)?,
        CartSubcommand::Clear => ctx.cart.clear_cart()?,
    }
    print_cart(ctx);
    Ok(())
}

pub(crate) async fn run_wishlist(ctx: &Context, command: WishlistCommand) -> anyhow::Result<()> {
    match command.command.unwrap_or(WishlistSubcommand::List) {
        WishlistSubcommand::List => {}
        WishlistSubcommand::Add { id } => {
            let product = ctx.gateway.product(&id).await?;
            ctx.cart.add_to_wishlist(&product)?;
        }
        WishlistSubcommand::Remove { id } => ctx.cart.remove_from_wishlist(&id)?,
        WishlistSubcommand::Move { id } => {
            if ctx.cart.move_to_cart(&id)? {
                println!("moved {} to the cart", id);
            } else {
                println!("{} is not in the wishlist", id);
            }
        }
    }

    let saved = ctx.cart.wishlist();
    if saved.is_empty() {
        println!("wishlist is empty");
    }
    for product in saved {
        println!("{}  {:<30} {:>10}", product.id, product.name, money(product.price));
    }
    Ok(())
}

pub(crate) async fn validate(ctx: &Context) -> anyhow::Result<()> {
    let items = ctx.cart.items();
    let ids: Vec<String> = items.iter().map(|i| i.product_id().to_string()).collect();
    let live = ctx.gateway.products_by_id(&ids).await?;
    let result = validate_cart_live(&items, &live);

    for error in &result.errors {
        println!("error: {}", error.message);
    }
    for warning in &result.warnings {
        println!("warning: {}", warning.message);
    }
    if result.is_valid {
        println!("cart is ready for checkout");
    }
    Ok(())
}

fn print_cart(ctx: &Context) {
    let items = ctx.cart.items();
    if items.is_empty() {
        println!("cart is empty");
        return;
    }

    for item in &items {
        println!(
            "{}  {:<30} {:>3} x {:>10} = {:>10}",
            item.product_id(),
            item.product.name,
            item.quantity,
            money(item.product.price),
            money(item.line_total())
        );
    }

    let summary = ctx.cart.summary(&ctx.config.pricing);
    println!("subtotal: {}", money(summary.subtotal));
    if summary.has_free_delivery() {
        println!("delivery: free");
    } else {
        println!("delivery: {}", money(summary.delivery_fee));
    }
    println!("total: {}", money(summary.total));
}
