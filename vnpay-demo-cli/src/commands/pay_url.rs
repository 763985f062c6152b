//! Pay-url command - build a signed payment page URL

use anyhow::Result;
use vnpay_lib::clock::gateway_timestamp;
use vnpay_lib::{GatewayConfig, OrderRequest, OrderRequestBuilder};

use crate::ui;

pub fn run(config: GatewayConfig, order: &OrderRequest, qr: bool, verbose: bool) -> Result<()> {
    let redirect = OrderRequestBuilder::new(config).build(order)?;

    ui::header("Payment Request");
    ui::key_value("Order", &order.order_ref);
    ui::key_value("Amount", &ui::vnd(order.amount));
    ui::key_value("Created", &gateway_timestamp(redirect.created_at));
    ui::key_value("Expires", &gateway_timestamp(redirect.expires_at));

    if verbose {
        ui::header("Signed Parameters");
        for (name, value) in redirect.params.iter() {
            ui::key_value(name, value);
        }
    }

    ui::separator();
    println!("{}", redirect.url);
    ui::separator();

    if qr {
        ui::qr_code(&redirect.url)?;
    }

    ui::success("Redirect the customer to the URL above");
    Ok(())
}
