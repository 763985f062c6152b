//! Applying verified outcomes to order state.
//!
//! Storage is the host application's concern and is reached through the
//! [`OrderStore`] trait. The contract this module relies on:
//!
//! - `compare_and_set` is atomic per order reference, so concurrent
//!   duplicate notifications race to exactly one transition
//! - an order leaves `Pending` at most once; later requests are no-ops
//! - the stored expected amount is checked before any transition

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::params::AMOUNT_SCALE;
use crate::verify::PaymentOutcome;
use crate::{Result, VnpayError};

/// Lifecycle of a merchant order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Paid,
    Failed,
}

/// What the store knows about an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_ref: String,
    /// Expected amount in VND, as requested by the merchant.
    pub amount: i64,
    pub state: OrderState,
}

/// Result of an apply request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyResult {
    /// The order moved out of `Pending`.
    Applied,
    /// The order had already left `Pending`; nothing changed.
    AlreadyApplied,
    /// The callback amount differs from the stored amount; nothing changed.
    AmountMismatch,
    /// No such order.
    NotFound,
}

/// Order persistence capability.
///
/// This should be implemented by the host application (e.g., using a database
/// transaction or an optimistic-concurrency update for `compare_and_set`).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Register a new pending order. Returns `false` if the reference exists.
    async fn insert_pending(&self, order_ref: &str, amount: i64) -> Result<bool>;

    /// Look up an order.
    async fn find(&self, order_ref: &str) -> Result<Option<OrderRecord>>;

    /// Atomically move an order from `from` to `to`.
    ///
    /// Returns `false`, without changing anything, if the order is missing
    /// or its current state is not `from`.
    async fn compare_and_set(&self, order_ref: &str, from: OrderState, to: OrderState)
        -> Result<bool>;
}

/// In-memory order store for tests, demos and single-process deployments.
///
/// Thread-safe with RwLock; `compare_and_set` runs under the write lock.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<String, OrderRecord>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub fn count(&self) -> usize {
        self.orders.read().map(|orders| orders.len()).unwrap_or(0)
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> VnpayError {
        VnpayError::Storage(format!("Lock poisoned: {}", e))
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_pending(&self, order_ref: &str, amount: i64) -> Result<bool> {
        let mut orders = self.orders.write().map_err(Self::poisoned)?;
        if orders.contains_key(order_ref) {
            return Ok(false);
        }
        orders.insert(
            order_ref.to_string(),
            OrderRecord {
                order_ref: order_ref.to_string(),
                amount,
                state: OrderState::Pending,
            },
        );
        Ok(true)
    }

    async fn find(&self, order_ref: &str) -> Result<Option<OrderRecord>> {
        let orders = self.orders.read().map_err(Self::poisoned)?;
        Ok(orders.get(order_ref).cloned())
    }

    async fn compare_and_set(
        &self,
        order_ref: &str,
        from: OrderState,
        to: OrderState,
    ) -> Result<bool> {
        let mut orders = self.orders.write().map_err(Self::poisoned)?;
        match orders.get_mut(order_ref) {
            Some(record) if record.state == from => {
                record.state = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl<S: OrderStore + ?Sized> OrderStore for std::sync::Arc<S> {
    async fn insert_pending(&self, order_ref: &str, amount: i64) -> Result<bool> {
        (**self).insert_pending(order_ref, amount).await
    }

    async fn find(&self, order_ref: &str) -> Result<Option<OrderRecord>> {
        (**self).find(order_ref).await
    }

    async fn compare_and_set(
        &self,
        order_ref: &str,
        from: OrderState,
        to: OrderState,
    ) -> Result<bool> {
        (**self).compare_and_set(order_ref, from, to).await
    }
}

/// Applies verified outcomes to orders, idempotently.
pub struct OutcomeApplier<S> {
    store: S,
}

impl<S: OrderStore> OutcomeApplier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `outcome` to `order_ref`.
    ///
    /// `gateway_amount` is the callback's `vnp_Amount` (VND x 100). Checks run
    /// in gateway order: existence, amount, then state.
    ///
    /// # Errors
    ///
    /// Store failures, and a request to apply
    /// [`PaymentOutcome::InvalidSignature`], which has no state transition.
    #[tracing::instrument(skip(self), fields(outcome = outcome.as_str()))]
    pub async fn apply(
        &self,
        order_ref: &str,
        outcome: PaymentOutcome,
        gateway_amount: i64,
    ) -> Result<ApplyResult> {
        let target = match outcome {
            PaymentOutcome::Success => OrderState::Paid,
            PaymentOutcome::Declined => OrderState::Failed,
            PaymentOutcome::InvalidSignature => {
                return Err(VnpayError::validation(
                    "outcome",
                    "an unverified callback cannot change order state",
                ))
            }
        };

        let Some(record) = self.store.find(order_ref).await? else {
            tracing::warn!("callback for unknown order");
            return Ok(ApplyResult::NotFound);
        };

        if record.amount.checked_mul(AMOUNT_SCALE) != Some(gateway_amount) {
            tracing::warn!(
                expected = record.amount,
                gateway_amount,
                "callback amount does not match order"
            );
            return Ok(ApplyResult::AmountMismatch);
        }

        if record.state != OrderState::Pending {
            tracing::info!(state = ?record.state, "order already settled");
            return Ok(ApplyResult::AlreadyApplied);
        }

        if self
            .store
            .compare_and_set(order_ref, OrderState::Pending, target)
            .await?
        {
            tracing::info!(state = ?target, "order state updated");
            Ok(ApplyResult::Applied)
        } else {
            // Lost the race against a concurrent duplicate
            Ok(ApplyResult::AlreadyApplied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn applier_with(order_ref: &str, amount: i64) -> OutcomeApplier<InMemoryOrderStore> {
        let store = InMemoryOrderStore::new();
        assert!(store.insert_pending(order_ref, amount).await.unwrap());
        OutcomeApplier::new(store)
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let applier = applier_with("ORDER1", 50_000).await;

        let first = applier
            .apply("ORDER1", PaymentOutcome::Success, 5_000_000)
            .await
            .unwrap();
        let second = applier
            .apply("ORDER1", PaymentOutcome::Success, 5_000_000)
            .await
            .unwrap();

        assert_eq!(first, ApplyResult::Applied);
        assert_eq!(second, ApplyResult::AlreadyApplied);
        let record = applier.store().find("ORDER1").await.unwrap().unwrap();
        assert_eq!(record.state, OrderState::Paid);
    }

    #[tokio::test]
    async fn test_settled_order_never_flips() {
        let applier = applier_with("ORDER1", 10).await;
        applier
            .apply("ORDER1", PaymentOutcome::Declined, 1_000)
            .await
            .unwrap();
        let result = applier
            .apply("ORDER1", PaymentOutcome::Success, 1_000)
            .await
            .unwrap();

        assert_eq!(result, ApplyResult::AlreadyApplied);
        let record = applier.store().find("ORDER1").await.unwrap().unwrap();
        assert_eq!(record.state, OrderState::Failed);
    }

    #[tokio::test]
    async fn test_amount_mismatch_leaves_order_pending() {
        let applier = applier_with("ORDER1", 50_000).await;
        let result = applier
            .apply("ORDER1", PaymentOutcome::Success, 100)
            .await
            .unwrap();

        assert_eq!(result, ApplyResult::AmountMismatch);
        let record = applier.store().find("ORDER1").await.unwrap().unwrap();
        assert_eq!(record.state, OrderState::Pending);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let applier = OutcomeApplier::new(InMemoryOrderStore::new());
        let result = applier
            .apply("MISSING", PaymentOutcome::Success, 100)
            .await
            .unwrap();
        assert_eq!(result, ApplyResult::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_signature_cannot_be_applied() {
        let applier = applier_with("ORDER1", 1).await;
        let err = applier
            .apply("ORDER1", PaymentOutcome::InvalidSignature, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, VnpayError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_pending_rejected() {
        let store = InMemoryOrderStore::new();
        assert!(store.insert_pending("ORDER1", 1).await.unwrap());
        assert!(!store.insert_pending("ORDER1", 2).await.unwrap());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_apply_once() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.insert_pending("ORDER1", 50_000).await.unwrap();
        let applier = Arc::new(OutcomeApplier::new(store.clone()));

        let mut handles = vec![];
        for _ in 0..16 {
            let applier = applier.clone();
            handles.push(tokio::spawn(async move {
                applier
                    .apply("ORDER1", PaymentOutcome::Success, 5_000_000)
                    .await
                    .unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() == ApplyResult::Applied {
                applied += 1;
            }
        }
        assert_eq!(applied, 1, "exactly one delivery may transition the order");
    }
}
