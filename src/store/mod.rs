pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{NewOrder, OrderPatch, OrderRecord, OrderStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error("order is {actual}, expected {expected}")]
    Conflict {
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("order {id} not found")),
            StoreError::Conflict { .. } => AppError::Conflict(err.to_string()),
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Any,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// The persistence contract the ordering core relies on.
///
/// `conditional_update` is the single synchronization primitive: it applies a
/// patch only if the record's status still equals `expected` at apply time,
/// and fails with [`StoreError::Conflict`] otherwise, with no partial effect.
/// That is what makes concurrent acceptance of the same order yield exactly
/// one winner.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new pending order, assigning `id` and a `created_at` that is
    /// strictly greater than any previously assigned by this store.
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    async fn get(&self, id: Uuid) -> Result<OrderRecord, StoreError>;

    /// Current snapshot of matching orders, newest first.
    async fn query_by_status(&self, filter: StatusFilter)
        -> Result<Vec<OrderRecord>, StoreError>;

    /// Orders claimed by one delivery partner, any status, newest first.
    async fn query_by_partner(&self, partner_id: &str) -> Result<Vec<OrderRecord>, StoreError>;

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: OrderStatus,
        patch: OrderPatch,
    ) -> Result<OrderRecord, StoreError>;

    /// Snapshot-per-change subscription; dropping the handle unsubscribes.
    fn subscribe(&self, filter: StatusFilter) -> OrderSubscription;

    /// Raw change feed: every created or transitioned record, as it happens.
    fn watch(&self) -> broadcast::Receiver<OrderRecord>;
}

/// A live view over the order set. Each time any order changes, the next call
/// to [`OrderSubscription::recv`] yields a fresh snapshot of the records
/// matching the filter. Missed intermediate states coalesce into the latest
/// snapshot.
pub struct OrderSubscription {
    records: Arc<DashMap<Uuid, OrderRecord>>,
    rx: broadcast::Receiver<OrderRecord>,
    filter: StatusFilter,
}

impl OrderSubscription {
    pub(crate) fn new(
        records: Arc<DashMap<Uuid, OrderRecord>>,
        rx: broadcast::Receiver<OrderRecord>,
        filter: StatusFilter,
    ) -> Self {
        Self {
            records,
            rx,
            filter,
        }
    }

    /// Waits for the next change and returns the post-change snapshot, or
    /// `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<Vec<OrderRecord>> {
        match self.rx.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => Some(snapshot(&self.records, self.filter)),
            Err(RecvError::Closed) => None,
        }
    }
}

/// Filtered view of the record map, newest first.
pub(crate) fn snapshot(
    records: &DashMap<Uuid, OrderRecord>,
    filter: StatusFilter,
) -> Vec<OrderRecord> {
    let mut orders: Vec<OrderRecord> = records
        .iter()
        .filter(|entry| filter.matches(entry.value().status))
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}
