use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{DeliveryContact, OrderPatch, OrderRecord, OrderStatus};
use crate::observability::metrics::Metrics;
use crate::store::{OrderStore, StatusFilter, StoreError};

/// Bound on read-decide-write cycles in [`AssignmentService::deliver`]. Racing
/// past this surfaces `AssignmentFailed` instead of livelocking.
const MAX_CAS_ATTEMPTS: u32 = 3;

/// The delivery partner attempting a transition, as reported by the auth
/// provider.
#[derive(Debug, Clone)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub phone: String,
}

impl Partner {
    pub fn contact(&self) -> DeliveryContact {
        DeliveryContact {
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Orchestrates the order lifecycle from the delivery side:
/// `pending --accept--> accepted --deliver--> delivered`.
///
/// Acceptance is arbitrated entirely by the store's conditional update: of any
/// number of partners claiming the same pending order, exactly one wins and
/// the rest see a conflict.
pub struct AssignmentService {
    store: Arc<dyn OrderStore>,
    metrics: Metrics,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn OrderStore>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    /// All orders still waiting for a partner, newest first. Read-only; safe
    /// to poll or subscribe.
    pub async fn list_assignable(&self) -> Result<Vec<OrderRecord>, AppError> {
        Ok(self
            .store
            .query_by_status(StatusFilter::Only(OrderStatus::Pending))
            .await?)
    }

    /// The partner's own claimed orders, any status, newest first.
    pub async fn list_mine(&self, partner_id: &str) -> Result<Vec<OrderRecord>, AppError> {
        Ok(self.store.query_by_partner(partner_id).await?)
    }

    /// Claims a pending order for one partner. A conflict means somebody else
    /// got there first; the caller should refresh its assignable list, never
    /// retry, because retrying a claim on an order already taken is never
    /// correct.
    pub async fn accept(
        &self,
        order_id: Uuid,
        partner: &Partner,
    ) -> Result<OrderRecord, AppError> {
        let patch = OrderPatch::accept(partner.id.clone(), partner.contact());

        match self
            .store
            .conditional_update(order_id, OrderStatus::Pending, patch)
            .await
        {
            Ok(order) => {
                self.metrics
                    .accept_attempts_total
                    .with_label_values(&["won"])
                    .inc();
                self.metrics.pending_orders.dec();

                info!(order_id = %order.id, partner_id = %partner.id, "order accepted");
                Ok(order)
            }
            Err(StoreError::Conflict { actual, .. }) => {
                self.metrics
                    .accept_attempts_total
                    .with_label_values(&["conflict"])
                    .inc();

                warn!(
                    order_id = %order_id,
                    partner_id = %partner.id,
                    status = %actual,
                    "order no longer available"
                );
                Err(AppError::Conflict(format!(
                    "order is already {actual}"
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Marks the partner's accepted order delivered. Calling it again on an
    /// order this partner already delivered is a no-op success, so duplicate
    /// taps and retried requests stay harmless. Another partner's order is
    /// forbidden territory.
    pub async fn deliver(
        &self,
        order_id: Uuid,
        partner_id: &str,
    ) -> Result<OrderRecord, AppError> {
        for _attempt in 0..MAX_CAS_ATTEMPTS {
            let order = self.store.get(order_id).await?;

            match order.status {
                OrderStatus::Pending => {
                    return Err(AppError::Conflict(
                        "order has not been accepted yet".to_string(),
                    ));
                }
                OrderStatus::Delivered => {
                    if order.delivery_person_id.as_deref() == Some(partner_id) {
                        return Ok(order);
                    }
                    return Err(self.forbidden(order_id, partner_id));
                }
                OrderStatus::Accepted => {
                    if order.delivery_person_id.as_deref() != Some(partner_id) {
                        return Err(self.forbidden(order_id, partner_id));
                    }

                    match self
                        .store
                        .conditional_update(
                            order_id,
                            OrderStatus::Accepted,
                            OrderPatch::deliver(Utc::now()),
                        )
                        .await
                    {
                        Ok(delivered) => {
                            if let Some(at) = delivered.delivered_at {
                                let secs = (at - delivered.created_at).num_milliseconds()
                                    as f64
                                    / 1000.0;
                                self.metrics.delivery_duration_seconds.observe(secs);
                            }

                            info!(
                                order_id = %delivered.id,
                                partner_id = %partner_id,
                                "order delivered"
                            );
                            return Ok(delivered);
                        }
                        // The record moved between our read and the write;
                        // re-read and decide again.
                        Err(StoreError::Conflict { .. }) => continue,
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        error!(
            order_id = %order_id,
            partner_id = %partner_id,
            attempts = MAX_CAS_ATTEMPTS,
            "delivery transition retries exhausted"
        );
        Err(AppError::AssignmentFailed(format!(
            "could not apply delivery transition after {MAX_CAS_ATTEMPTS} attempts"
        )))
    }

    fn forbidden(&self, order_id: Uuid, partner_id: &str) -> AppError {
        // Logged loudly: a partner poking at somebody else's order is a
        // potential integrity problem, not a user mistake.
        error!(
            order_id = %order_id,
            partner_id = %partner_id,
            "partner attempted to deliver an order assigned to someone else"
        );
        AppError::Forbidden("order belongs to another delivery partner".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::NewOrder;
    use crate::money::Money;
    use crate::store::memory::MemoryOrderStore;

    fn partner(id: &str, name: &str) -> Partner {
        Partner {
            id: id.to_string(),
            name: name.to_string(),
            phone: "555-0101".to_string(),
        }
    }

    fn new_order() -> NewOrder {
        NewOrder {
            customer_name: "Test Customer".to_string(),
            address: "123 Test Street".to_string(),
            email: Some("test@example.com".to_string()),
            phone: Some("555-123-4567".to_string()),
            items: vec![
                "Vanilla Ice Cream (2)".to_string(),
                "Chocolate Chip (1)".to_string(),
            ],
            total: Money::from_cents(1899),
            customer_location: None,
            user_id: "test-user-id".to_string(),
            payment_method: "card".to_string(),
        }
    }

    fn service() -> (AssignmentService, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new(64));
        let service = AssignmentService::new(store.clone(), Metrics::new());
        (service, store)
    }

    #[tokio::test]
    async fn accept_moves_order_out_of_assignable_into_mine() {
        let (service, store) = service();
        let order = store.create(new_order()).await.unwrap();

        assert_eq!(service.list_assignable().await.unwrap().len(), 1);

        let accepted = service
            .accept(order.id, &partner("delivery-1", "Asha"))
            .await
            .unwrap();

        assert_eq!(accepted.status, OrderStatus::Accepted);
        assert_eq!(accepted.delivery_person_id.as_deref(), Some("delivery-1"));
        assert_eq!(
            accepted.delivery_person.as_ref().map(|c| c.name.as_str()),
            Some("Asha")
        );

        assert!(service.list_assignable().await.unwrap().is_empty());

        let mine = service.list_mine("delivery-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, order.id);
        assert!(service.list_mine("delivery-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_accept_conflicts_and_keeps_the_winner() {
        let (service, store) = service();
        let order = store.create(new_order()).await.unwrap();

        service
            .accept(order.id, &partner("delivery-1", "Asha"))
            .await
            .unwrap();

        let err = service
            .accept(order.id, &partner("delivery-2", "Ravi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let current = store.get(order.id).await.unwrap();
        assert_eq!(current.delivery_person_id.as_deref(), Some("delivery-1"));
    }

    #[tokio::test]
    async fn concurrent_accepts_yield_exactly_one_winner() {
        let (service, store) = service();
        let service = Arc::new(service);
        let order = store.create(new_order()).await.unwrap();

        let a = {
            let service = service.clone();
            let id = order.id;
            tokio::spawn(async move { service.accept(id, &partner("delivery-a", "A")).await })
        };
        let b = {
            let service = service.clone();
            let id = order.id;
            tokio::spawn(async move { service.accept(id, &partner("delivery-b", "B")).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);

        let loser = results
            .iter()
            .find(|r| r.is_err())
            .and_then(|r| r.as_ref().err());
        assert!(matches!(loser, Some(AppError::Conflict(_))));

        // The order shows up in exactly one partner's view.
        let mine_a = service.list_mine("delivery-a").await.unwrap();
        let mine_b = service.list_mine("delivery-b").await.unwrap();
        assert_eq!(mine_a.len() + mine_b.len(), 1);
    }

    #[tokio::test]
    async fn deliver_is_idempotent_for_the_owning_partner() {
        let (service, store) = service();
        let order = store.create(new_order()).await.unwrap();
        let owner = partner("delivery-1", "Asha");

        service.accept(order.id, &owner).await.unwrap();

        let first = service.deliver(order.id, "delivery-1").await.unwrap();
        assert_eq!(first.status, OrderStatus::Delivered);
        assert!(first.delivered_at.is_some());

        let second = service.deliver(order.id, "delivery-1").await.unwrap();
        assert_eq!(second.delivered_at, first.delivered_at);
    }

    #[tokio::test]
    async fn deliver_by_another_partner_is_forbidden() {
        let (service, store) = service();
        let order = store.create(new_order()).await.unwrap();

        service
            .accept(order.id, &partner("delivery-1", "Asha"))
            .await
            .unwrap();

        let err = service.deliver(order.id, "delivery-2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Also after delivery: the completed order stays the owner's.
        service.deliver(order.id, "delivery-1").await.unwrap();
        let err = service.deliver(order.id, "delivery-2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn deliver_before_accept_conflicts() {
        let (service, store) = service();
        let order = store.create(new_order()).await.unwrap();

        let err = service.deliver(order.id, "delivery-1").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deliver_unknown_order_is_not_found() {
        let (service, _store) = service();

        let err = service
            .deliver(Uuid::new_v4(), "delivery-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// A store whose conditional updates always lose the race: every write
    /// reports a status mismatch even though reads keep showing `accepted`.
    struct StubbornStore {
        template: OrderRecord,
        events_tx: tokio::sync::broadcast::Sender<OrderRecord>,
        attempts: std::sync::atomic::AtomicU32,
    }

    #[async_trait::async_trait]
    impl crate::store::OrderStore for StubbornStore {
        async fn create(&self, _order: NewOrder) -> Result<OrderRecord, StoreError> {
            Err(StoreError::Unavailable("read-only stub".to_string()))
        }

        async fn get(&self, _id: Uuid) -> Result<OrderRecord, StoreError> {
            Ok(self.template.clone())
        }

        async fn query_by_status(
            &self,
            _filter: StatusFilter,
        ) -> Result<Vec<OrderRecord>, StoreError> {
            Ok(vec![self.template.clone()])
        }

        async fn query_by_partner(
            &self,
            _partner_id: &str,
        ) -> Result<Vec<OrderRecord>, StoreError> {
            Ok(vec![self.template.clone()])
        }

        async fn conditional_update(
            &self,
            _id: Uuid,
            expected: OrderStatus,
            _patch: OrderPatch,
        ) -> Result<OrderRecord, StoreError> {
            self.attempts
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(StoreError::Conflict {
                expected,
                actual: OrderStatus::Accepted,
            })
        }

        fn subscribe(&self, filter: StatusFilter) -> crate::store::OrderSubscription {
            crate::store::OrderSubscription::new(
                Arc::new(dashmap::DashMap::new()),
                self.events_tx.subscribe(),
                filter,
            )
        }

        fn watch(&self) -> tokio::sync::broadcast::Receiver<OrderRecord> {
            self.events_tx.subscribe()
        }
    }

    #[tokio::test]
    async fn deliver_surfaces_assignment_failed_when_retries_exhausted() {
        let template = OrderRecord {
            id: Uuid::new_v4(),
            customer_name: "Test Customer".to_string(),
            address: "123 Test Street".to_string(),
            email: None,
            phone: None,
            items: vec!["Classic Vanilla (1)".to_string()],
            total: Money::from_cents(698),
            status: OrderStatus::Accepted,
            customer_location: None,
            delivery_person: Some(DeliveryContact {
                name: "Asha".to_string(),
                phone: "555-0101".to_string(),
            }),
            delivery_person_id: Some("delivery-1".to_string()),
            created_at: Utc::now(),
            delivered_at: None,
            user_id: "test-user-id".to_string(),
            payment_method: "card".to_string(),
        };
        let order_id = template.id;

        let (events_tx, _rx) = tokio::sync::broadcast::channel(4);
        let store = Arc::new(StubbornStore {
            template,
            events_tx,
            attempts: std::sync::atomic::AtomicU32::new(0),
        });
        let service = AssignmentService::new(store.clone(), Metrics::new());

        let err = service.deliver(order_id, "delivery-1").await.unwrap_err();
        assert!(matches!(err, AppError::AssignmentFailed(_)));
        assert_eq!(
            store.attempts.load(std::sync::atomic::Ordering::SeqCst),
            MAX_CAS_ATTEMPTS
        );
    }
}
