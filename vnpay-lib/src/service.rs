//! One-stop facade over request building, verification and outcome application.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::ipn::IpnResponse;
use crate::order::{OrderRequest, OrderRequestBuilder, PaymentRedirect};
use crate::outcome::{ApplyResult, OrderStore, OutcomeApplier};
use crate::params::ParameterSet;
use crate::verify::{PaymentOutcome, ReturnResult, ReturnVerifier};
use crate::{Result, VnpayError};

/// Verified return plus what happened to the order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    pub result: ReturnResult,
    /// `None` when no transition was attempted.
    pub applied: Option<ApplyResult>,
}

/// Merchant-side payment flow around one immutable [`GatewayConfig`].
///
/// ```
/// use vnpay_lib::{GatewayConfig, InMemoryOrderStore, OrderRequest, PaymentService};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> vnpay_lib::Result<()> {
/// let config = GatewayConfig::sandbox("DEMO0001", "testkey", "https://shop.example/return");
/// let service = PaymentService::new(config, InMemoryOrderStore::new());
///
/// let redirect = service
///     .create_payment(&OrderRequest::new("ORDER123", 50_000, "Order 123", "127.0.0.1"))
///     .await?;
/// assert!(redirect.url.starts_with("https://sandbox.vnpayment.vn/"));
/// # Ok(())
/// # }
/// ```
pub struct PaymentService<S> {
    config: Arc<GatewayConfig>,
    builder: OrderRequestBuilder,
    verifier: ReturnVerifier,
    applier: OutcomeApplier<S>,
    apply_failures: bool,
}

impl<S: OrderStore> PaymentService<S> {
    pub fn new(config: GatewayConfig, store: S) -> Self {
        let config = Arc::new(config);
        Self {
            builder: OrderRequestBuilder::from_shared(config.clone()),
            verifier: ReturnVerifier::new(&config),
            applier: OutcomeApplier::new(store),
            apply_failures: false,
            config,
        }
    }

    /// Replace the time source used for request timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.builder = self.builder.with_clock(clock);
        self
    }

    /// Also move orders to `Failed` on verified declines.
    pub fn with_failure_transitions(mut self, enabled: bool) -> Self {
        self.apply_failures = enabled;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.applier.store()
    }

    /// Sign a payment request and register the order as pending.
    ///
    /// # Errors
    ///
    /// Builder errors, [`VnpayError::Validation`] for a reused order
    /// reference, and store failures.
    #[tracing::instrument(skip(self, order), fields(order_ref = %order.order_ref))]
    pub async fn create_payment(&self, order: &OrderRequest) -> Result<PaymentRedirect> {
        let redirect = self.builder.build(order)?;
        if !self
            .store()
            .insert_pending(&order.order_ref, order.amount)
            .await?
        {
            return Err(VnpayError::validation(
                "order_ref",
                format!("'{}' is already registered", order.order_ref),
            ));
        }
        tracing::info!(amount = order.amount, "payment created");
        Ok(redirect)
    }

    /// Verify a browser return and apply it.
    #[tracing::instrument(skip(self, params))]
    pub async fn process_return(&self, params: &ParameterSet) -> Result<ReturnOutcome> {
        let result = self.verifier.verify(params)?;

        let applies = match result.outcome {
            PaymentOutcome::Success => true,
            PaymentOutcome::Declined => self.apply_failures,
            PaymentOutcome::InvalidSignature => false,
        };
        if !applies {
            return Ok(ReturnOutcome {
                result,
                applied: None,
            });
        }

        let applied = match result.order_ref.as_deref() {
            Some(order_ref) => {
                self.applier
                    .apply(order_ref, result.outcome, result.amount)
                    .await?
            }
            None => ApplyResult::NotFound,
        };
        Ok(ReturnOutcome {
            result,
            applied: Some(applied),
        })
    }

    /// Handle a server-to-server notification. Always produces an
    /// acknowledgment; internal failures become code `99`.
    #[tracing::instrument(skip(self, params))]
    pub async fn process_ipn(&self, params: &ParameterSet) -> IpnResponse {
        match self.process_return(params).await {
            Ok(ReturnOutcome {
                result:
                    ReturnResult {
                        outcome: PaymentOutcome::InvalidSignature,
                        ..
                    },
                ..
            }) => IpnResponse::invalid_signature(),
            Ok(ReturnOutcome {
                applied: Some(applied),
                ..
            }) => IpnResponse::from_apply(applied),
            Ok(ReturnOutcome { applied: None, .. }) => IpnResponse::confirmed(),
            Err(err) => {
                tracing::error!(error = %err, "IPN processing failed");
                IpnResponse::from_error(&err)
            }
        }
    }
}
