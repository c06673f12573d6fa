use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::models::order::{NewOrder, OrderPatch, OrderRecord, OrderStatus};
use crate::store::{snapshot, OrderStore, OrderSubscription, StatusFilter, StoreError};

/// Single-process order store: one map entry per order, a broadcast channel
/// for change events. Conditional updates are atomic because each mutation
/// happens under the entry's own shard lock.
pub struct MemoryOrderStore {
    records: Arc<DashMap<Uuid, OrderRecord>>,
    events_tx: broadcast::Sender<OrderRecord>,
    last_created_at: AsyncMutex<DateTime<Utc>>,
}

impl MemoryOrderStore {
    pub fn new(event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            records: Arc::new(DashMap::new()),
            events_tx,
            last_created_at: AsyncMutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Server-assigned creation timestamp, strictly greater than every one
    /// handed out before it.
    async fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self.last_created_at.lock().await;
        let mut now = Utc::now();
        if now <= *last {
            now = *last + Duration::microseconds(1);
        }
        *last = now;
        now
    }

    fn publish(&self, record: &OrderRecord) {
        // Nobody listening is fine.
        let _ = self.events_tx.send(record.clone());
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let record = OrderRecord {
            id: Uuid::new_v4(),
            customer_name: order.customer_name,
            address: order.address,
            email: order.email,
            phone: order.phone,
            items: order.items,
            total: order.total,
            status: OrderStatus::Pending,
            customer_location: order.customer_location,
            delivery_person: None,
            delivery_person_id: None,
            created_at: self.next_created_at().await,
            delivered_at: None,
            user_id: order.user_id,
            payment_method: order.payment_method,
        };

        self.records.insert(record.id, record.clone());
        self.publish(&record);
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<OrderRecord, StoreError> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn query_by_status(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(snapshot(&self.records, filter))
    }

    async fn query_by_partner(&self, partner_id: &str) -> Result<Vec<OrderRecord>, StoreError> {
        let mut orders: Vec<OrderRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().delivery_person_id.as_deref() == Some(partner_id))
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: OrderStatus,
        patch: OrderPatch,
    ) -> Result<OrderRecord, StoreError> {
        let updated = {
            let mut entry = self.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

            if entry.status != expected {
                return Err(StoreError::Conflict {
                    expected,
                    actual: entry.status,
                });
            }

            entry.apply(patch);
            entry.value().clone()
        };

        self.publish(&updated);
        Ok(updated)
    }

    fn subscribe(&self, filter: StatusFilter) -> OrderSubscription {
        OrderSubscription::new(self.records.clone(), self.events_tx.subscribe(), filter)
    }

    fn watch(&self) -> broadcast::Receiver<OrderRecord> {
        self.events_tx.subscribe()
    }
}
