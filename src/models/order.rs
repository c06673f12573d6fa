use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::money::Money;

/// Lifecycle state of an order. Transitions are monotonic:
/// pending -> accepted -> delivered, and never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Delivered,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// Contact snapshot of the accepting delivery partner, taken once at
/// acceptance and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryContact {
    pub name: String,
    pub phone: String,
}

/// One customer order as stored. Field names on the wire match the storefront
/// document schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: Uuid,
    pub customer_name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub items: Vec<String>,
    pub total: Money,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_location: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_person: Option<DeliveryContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_person_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub user_id: String,
    pub payment_method: String,
}

/// A validated order candidate, ready for the store to persist. The store
/// assigns `id` and `created_at`; status always starts at pending.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub items: Vec<String>,
    pub total: Money,
    pub customer_location: Option<Coordinate>,
    pub user_id: String,
    pub payment_method: String,
}

/// Fields a conditional update may set. Applied atomically as one transition.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub delivery_person: Option<DeliveryContact>,
    pub delivery_person_id: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OrderPatch {
    /// The pending -> accepted transition: claims the order for one partner.
    pub fn accept(partner_id: impl Into<String>, contact: DeliveryContact) -> Self {
        Self {
            status: Some(OrderStatus::Accepted),
            delivery_person: Some(contact),
            delivery_person_id: Some(partner_id.into()),
            delivered_at: None,
        }
    }

    /// The accepted -> delivered transition.
    pub fn deliver(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(OrderStatus::Delivered),
            delivery_person: None,
            delivery_person_id: None,
            delivered_at: Some(at),
        }
    }
}

impl OrderRecord {
    /// Applies a patch in place. Assignment fields are only ever set, never
    /// cleared, preserving the snapshot-at-acceptance invariant.
    pub fn apply(&mut self, patch: OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(contact) = patch.delivery_person {
            self.delivery_person = Some(contact);
        }
        if let Some(partner_id) = patch.delivery_person_id {
            self.delivery_person_id = Some(partner_id);
        }
        if let Some(at) = patch.delivered_at {
            self.delivered_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"delivered\""
        );
    }

    #[test]
    fn accept_patch_sets_all_assignment_fields() {
        let patch = OrderPatch::accept(
            "delivery-17",
            DeliveryContact {
                name: "Asha".to_string(),
                phone: "555-0101".to_string(),
            },
        );

        assert_eq!(patch.status, Some(OrderStatus::Accepted));
        assert_eq!(patch.delivery_person_id.as_deref(), Some("delivery-17"));
        assert!(patch.delivery_person.is_some());
        assert!(patch.delivered_at.is_none());
    }
}
