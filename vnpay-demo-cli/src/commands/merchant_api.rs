//! Query and refund commands - call the merchant API

use anyhow::Result;
use vnpay_lib::api::{ApiResponse, HttpGatewayClient, QueryRequest, RefundRequest, TransactionApi};
use vnpay_lib::GatewayConfig;

use crate::ui;

fn api(config: GatewayConfig) -> Result<TransactionApi<HttpGatewayClient>> {
    let client = HttpGatewayClient::from_config(&config)?;
    tracing::debug!("Merchant API endpoint {}", client.endpoint());
    Ok(TransactionApi::new(config, client))
}

/// Query a transaction's status
#[tracing::instrument(skip(config, request), fields(order_ref = %request.txn_ref))]
pub async fn query(config: GatewayConfig, request: &QueryRequest, verbose: bool) -> Result<()> {
    ui::header(&format!("Query: {}", request.txn_ref));
    let api = api(config)?;

    let spinner = ui::spinner("Contacting VNPAY...");
    let result = api.query(request).await;
    spinner.finish_and_clear();

    show(&log_failure(result)?, verbose)
}

/// Refund a transaction
#[tracing::instrument(skip(config, request), fields(order_ref = %request.txn_ref))]
pub async fn refund(config: GatewayConfig, request: &RefundRequest, verbose: bool) -> Result<()> {
    ui::header(&format!("Refund: {}", request.txn_ref));
    ui::key_value("Amount", &ui::vnd(request.amount));
    ui::key_value("Type", request.refund_type.as_str());
    let api = api(config)?;

    let spinner = ui::spinner("Contacting VNPAY...");
    let result = api.refund(request).await;
    spinner.finish_and_clear();

    show(&log_failure(result)?, verbose)
}

fn log_failure<T>(result: vnpay_lib::Result<T>) -> vnpay_lib::Result<T> {
    if let Err(e) = &result {
        tracing::error!("Merchant API call failed: {}", e);
    }
    result
}

fn show(response: &ApiResponse, verbose: bool) -> Result<()> {
    ui::key_value("Response", &response.response_code);
    ui::key_value("Message", &response.message);
    if let Some(status) = response.field("vnp_TransactionStatus") {
        ui::key_value("Transaction status", status);
    }

    if verbose {
        ui::separator();
        ui::json(&serde_json::to_value(&response.fields)?);
    }

    if response.is_success() {
        ui::success("Request accepted");
    } else {
        tracing::warn!("Gateway answered {}: {}", response.response_code, response.message);
        ui::warning("Gateway rejected the request");
    }
    Ok(())
}
