use super::{money, Context};
use cart_client::{AuthService, CheckoutCallbacks, CheckoutService, SubmitOutcome};
use cart_core::{Address, PaymentIntent, ShopError};
use cart_stripe::{CardDetails, CardInput, StripeCardCapability};
use clap::Args;
use std::sync::Arc;

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Shipping street; the saved default address is used when omitted
    #[arg(long, requires_all = ["city", "state", "postal_code"])]
    street: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    postal_code: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    /// Saved Stripe payment method (pm_...)
    #[arg(long, conflicts_with = "card_number")]
    payment_method: Option<String>,

    #[arg(long, requires_all = ["exp_month", "exp_year", "cvc"])]
    card_number: Option<String>,

    #[arg(long)]
    exp_month: Option<u32>,

    #[arg(long)]
    exp_year: Option<i32>,

    #[arg(long, env = "SHOP_CARD_CVC", hide_env_values = true)]
    cvc: Option<String>,
}

impl CheckoutArgs {
    fn card(&self) -> anyhow::Result<CardInput> {
        if let Some(ref pm) = self.payment_method {
            return Ok(CardInput::PaymentMethod(pm.clone()));
        }
        match (&self.card_number, self.exp_month, self.exp_year, &self.cvc) {
            (Some(number), Some(month), Some(year), Some(cvc)) => Ok(CardInput::Card(
                CardDetails::new(number.clone(), month, year, cvc.clone()),
            )),
            _ => anyhow::bail!("pass --payment-method or --card-number with --exp-month, --exp-year and --cvc"),
        }
    }

    fn address(&self) -> Option<Address> {
        Some(Address {
            street: self.street.clone()?,
            city: self.city.clone()?,
            state: self.state.clone()?,
            postal_code: self.postal_code.clone()?,
            phone: self.phone.clone(),
            country: "India".to_string(),
            ..Default::default()
        })
    }
}

struct ConsoleCallbacks;

impl CheckoutCallbacks for ConsoleCallbacks {
    fn on_success(&self, intent: &PaymentIntent) {
        println!("payment {} succeeded", intent.id);
    }

    fn on_cancel(&self, error: &ShopError) {
        println!("checkout cancelled: {}", error.user_message());
    }
}

pub(crate) async fn run(ctx: &Context, args: CheckoutArgs) -> anyhow::Result<()> {
    let card = args.card()?;
    let address = match args.address() {
        Some(address) => address,
        None => {
            let auth = AuthService::new(ctx.gateway.clone(), ctx.cart.clone());
            let user = auth
                .restore()
                .await?
                .ok_or_else(|| anyhow::anyhow!("sign in first (dairy-shop login)"))?;
            user.default_address()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no saved address; pass --street, --city, --state and --postal-code"))?
        }
    };

    let service = CheckoutService::new(ctx.gateway.clone(), ctx.cart.clone(), ctx.config.pricing);
    let summary = service.summary();
    println!(
        "subtotal {}, delivery {}, total {}",
        money(summary.subtotal),
        money(summary.delivery_fee),
        money(summary.total)
    );

    let order = service.place_order(address).await?;
    println!("order {} placed", order.id);

    let stripe = Arc::new(StripeCardCapability::from_env()?);
    stripe.set_card(card);

    let checkout = service.orchestrator(
        stripe,
        Arc::new(ConsoleCallbacks),
        &ctx.config.return_url,
        ctx.config.success_grace(),
    );
    checkout.start(&order.id).await?;

    match checkout.submit().await? {
        SubmitOutcome::Succeeded(intent) => {
            let paid = service.complete_payment(&order, &intent).await?;
            println!("order {} is paid", paid.id);
        }
        SubmitOutcome::Pending(intent) => {
            println!(
                "payment {} needs more time ({:?}); check `dairy-shop orders` later",
                intent.id, intent.status
            );
            println!("after authenticating you will be sent to {}", checkout.return_url(&order.id));
        }
    }
    Ok(())
}
