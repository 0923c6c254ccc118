use super::{money, Context};
use cart_core::ProductQuery;
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct ProductsArgs {
    /// Free-text search
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    brand: Option<String>,

    #[arg(long)]
    min_price: Option<f64>,

    #[arg(long)]
    max_price: Option<f64>,

    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Debug, Args)]
pub(crate) struct ProductArgs {
    /// Product id
    id: String,
}

pub(crate) async fn health(ctx: &Context) -> anyhow::Result<()> {
    let message = ctx.gateway.health().await?;
    println!("{}: {}", ctx.config.api_url, message);
    Ok(())
}

pub(crate) async fn products(ctx: &Context, args: ProductsArgs) -> anyhow::Result<()> {
    let mut query = ProductQuery::new()
        .price_range(args.min_price, args.max_price)
        .page(args.page, args.limit);
    if let Some(search) = args.search {
        query = query.search(search);
    }
    if let Some(category) = args.category {
        query = query.category(category);
    }
    if let Some(brand) = args.brand {
        query = query.brand(brand);
    }

    let page = ctx.gateway.products(&query).await?;
    if page.products.is_empty() {
        println!("no products found");
        return Ok(());
    }

    for product in &page.products {
        let stock = if product.in_stock() {
            format!("{} in stock", product.quantity)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{}  {:<30} {:>10}  {}",
            product.id,
            product.name,
            money(product.price),
            stock
        );
    }
    println!("page {} of {} ({} products)", page.page, page.pages, page.total);
    Ok(())
}

pub(crate) async fn product(ctx: &Context, args: ProductArgs) -> anyhow::Result<()> {
    let product = ctx.gateway.product(&args.id).await?;

    println!("id: {}", product.id);
    println!("name: {}", product.name);
    println!("price: {}", money(product.price));
    if let Some(unit) = &product.unit {
        println!("unit: {}", unit);
    }
    if let Some(brand) = &product.brand {
        println!("brand: {}", brand);
    }
    if let Some(category) = &product.category {
        println!("category: {}", category);
    }
    println!("stock: {}", product.quantity);
    println!("available: {}", product.is_available);
    println!("rating: {:.1} ({} reviews)", product.rating, product.num_reviews);
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }

    let reviews = ctx.gateway.product_reviews(&product.id).await?;
    for review in reviews.iter().filter(|r| r.is_approved) {
        println!();
        println!("{}/5  {}", review.rating, review.comment);
    }
    Ok(())
}
