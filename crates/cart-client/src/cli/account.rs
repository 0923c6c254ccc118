use super::Context;
use cart_client::AuthService;
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    email: String,

    /// Account password
    #[arg(long, env = "SHOP_PASSWORD", hide_env_values = true)]
    password: String,
}

fn auth(ctx: &Context) -> AuthService {
    AuthService::new(ctx.gateway.clone(), ctx.cart.clone())
}

pub(crate) async fn login(ctx: &Context, args: LoginArgs) -> anyhow::Result<()> {
    let user = auth(ctx).login(&args.email, &args.password).await?;
    println!("signed in as {} <{}>", user.name, user.email);
    Ok(())
}

pub(crate) async fn logout(ctx: &Context) -> anyhow::Result<()> {
    auth(ctx).logout().await?;
    println!("signed out");
    Ok(())
}

pub(crate) async fn whoami(ctx: &Context) -> anyhow::Result<()> {
    match auth(ctx).restore().await? {
        Some(user) => {
            println!("user_id: {}", user.id);
            println!("name: {}", user.name);
            println!("email: {}", user.email);
            println!("admin: {}", user.is_admin());
            if let Some(address) = user.default_address() {
                println!(
                    "address: {}, {}, {} {}",
                    address.street, address.city, address.state, address.postal_code
                );
            }
        }
        None => println!("not signed in"),
    }
    Ok(())
}

pub(crate) async fn orders(ctx: &Context) -> anyhow::Result<()> {
    let orders = ctx.gateway.my_orders().await?;
    if orders.is_empty() {
        println!("no orders yet");
        return Ok(());
    }

    for order in orders {
        println!("order_id: {}", order.id);
        println!("status: {}", order.status.as_str());
        println!("paid: {}", order.is_paid);
        println!("total: {}", super::money(order.total_price));
        println!(
            "created_at: {}",
            order
                .created_at
                .map_or_else(|| "unknown".to_string(), |value| value.to_string())
        );
        println!();
    }
    Ok(())
}
