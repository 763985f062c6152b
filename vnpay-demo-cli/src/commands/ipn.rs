//! Ipn command - run a notification through the settlement flow

use anyhow::Result;
use vnpay_lib::params::{fields, AMOUNT_SCALE};
use vnpay_lib::{GatewayConfig, InMemoryOrderStore, OrderStore, PaymentService};

use crate::ui;

/// Seed a pending order, process the IPN, and print the acknowledgment JSON.
///
/// The acknowledgment goes to stdout on its own line so it can be piped.
#[tracing::instrument(skip(config, input))]
pub async fn run(
    config: GatewayConfig,
    input: &str,
    expect_amount: Option<i64>,
    verbose: bool,
) -> Result<()> {
    let params = super::read_callback(input)?;

    let store = InMemoryOrderStore::new();
    if let Some(order_ref) = params.get(fields::TXN_REF) {
        let amount = match expect_amount {
            Some(amount) => amount,
            None => params
                .get(fields::AMOUNT)
                .and_then(|raw| raw.parse::<i64>().ok())
                .map(|amount| amount / AMOUNT_SCALE)
                .unwrap_or_default(),
        };
        store.insert_pending(order_ref, amount).await?;
        tracing::debug!("Seeded pending order {} for {} VND", order_ref, amount);
        if verbose {
            ui::info(&format!("Seeded pending order {} for {}", order_ref, ui::vnd(amount)));
        }
    }

    let service = PaymentService::new(config, store);
    let ack = service.process_ipn(&params).await;
    tracing::info!("IPN acknowledged with {} ({})", ack.rsp_code, ack.message);

    if verbose {
        if let Some(order_ref) = params.get(fields::TXN_REF) {
            if let Some(record) = service.store().find(order_ref).await? {
                ui::key_value("Order state", &format!("{:?}", record.state));
            }
        }
    }

    println!("{}", serde_json::to_string(&ack)?);
    Ok(())
}
