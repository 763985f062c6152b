//! Integration tests for the merchant API client.
//!
//! These tests run the query and refund calls against a mock HTTP server.
//!
//! ```bash
//! cargo test -p vnpay-lib --features http-client --test gateway_client
//! ```

#![cfg(feature = "http-client")]

use std::time::Duration;

use vnpay_lib::api::{
    GatewayClient, HttpGatewayClient, QueryRequest, RefundRequest, RefundType, TransactionApi,
};
use vnpay_lib::{GatewayConfig, VnpayError};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const API_PATH: &str = "/merchant_webapi/api/transaction";

fn config(server: &MockServer) -> GatewayConfig {
    GatewayConfig::new(
        "DEMO0001",
        "testkey",
        "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html",
        "https://shop.example/return",
    )
    .with_api_url(format!("{}{}", server.uri(), API_PATH))
}

fn api(server: &MockServer) -> TransactionApi<HttpGatewayClient> {
    let config = config(server);
    let client = HttpGatewayClient::from_config(&config).unwrap();
    TransactionApi::new(config, client)
}

// ============================================================================
// Query
// ============================================================================

#[tokio::test]
async fn test_query_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "vnp_Command": "querydr",
            "vnp_TmnCode": "DEMO0001",
            "vnp_TxnRef": "ORDER1",
            "vnp_TransactionDate": "20240501095500",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "vnp_ResponseId": "e7f5a1b2",
            "vnp_Command": "querydr",
            "vnp_ResponseCode": "00",
            "vnp_Message": "QueryDR Success",
            "vnp_TxnRef": "ORDER1",
            "vnp_Amount": "5000000",
            "vnp_TransactionNo": "14422574",
            "vnp_TransactionStatus": "00",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = api(&mock_server)
        .query(&QueryRequest::new("ORDER1", "20240501095500", "10.0.0.1"))
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.message, "QueryDR Success");
    assert_eq!(response.field("vnp_TransactionStatus"), Some("00"));
    assert_eq!(response.field("vnp_TransactionNo"), Some("14422574"));
}

#[tokio::test]
async fn test_query_gateway_error_code_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "vnp_ResponseCode": "91",
            "vnp_Message": "Transaction not found",
        })))
        .mount(&mock_server)
        .await;

    let response = api(&mock_server)
        .query(&QueryRequest::new("MISSING", "20240501095500", "10.0.0.1"))
        .await
        .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.response_code, "91");
}

// ============================================================================
// Refund
// ============================================================================

#[tokio::test]
async fn test_refund_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(serde_json::json!({
            "vnp_Command": "refund",
            "vnp_TransactionType": "02",
            "vnp_Amount": "5000000",
            "vnp_TransactionNo": "14422574",
            "vnp_CreateBy": "admin",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "vnp_ResponseCode": "00",
            "vnp_Message": "Refund success",
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = RefundRequest::new(
        "ORDER1",
        "14422574",
        50_000,
        RefundType::Full,
        "admin",
        "20240501095500",
        "10.0.0.1",
    );
    let response = api(&mock_server).refund(&request).await.unwrap();
    assert!(response.is_success());
}

// ============================================================================
// Transport errors
// ============================================================================

#[tokio::test]
async fn test_server_error_is_retryable_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let err = api(&mock_server)
        .query(&QueryRequest::new("ORDER1", "20240501095500", "10.0.0.1"))
        .await
        .unwrap_err();

    assert!(matches!(err, VnpayError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_reply_is_serialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let err = api(&mock_server)
        .query(&QueryRequest::new("ORDER1", "20240501095500", "10.0.0.1"))
        .await
        .unwrap_err();

    assert!(matches!(err, VnpayError::Serialization(_)));
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"vnp_ResponseCode": "00"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpGatewayClient::new(
        format!("{}{}", mock_server.uri(), API_PATH),
        Duration::from_millis(200),
    )
    .unwrap();

    let err = client.post_json(&serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, VnpayError::Transport(_)));
}

#[tokio::test]
async fn test_invalid_request_never_reaches_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = api(&mock_server)
        .query(&QueryRequest::new("ORDER1", "yesterday", "10.0.0.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, VnpayError::Validation { .. }));
}
