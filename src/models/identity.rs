use serde::{Deserialize, Serialize};

/// Sentinel user id for unauthenticated checkout.
pub const GUEST_USER_ID: &str = "guest";

/// Actor role, supplied by the external auth provider. Kept as a closed enum
/// so every authorization point matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Delivery,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" | "user" => Ok(Role::Customer),
            "delivery" => Ok(Role::Delivery),
            "admin" => Ok(Role::Admin),
            other => Err(format!(
                "unknown role: {other}, expected customer/delivery/admin"
            )),
        }
    }
}

/// The current actor as reported by the auth provider. The core treats this
/// as an opaque input; it never authenticates anyone itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn guest() -> Self {
        Self {
            id: GUEST_USER_ID.to_string(),
            display_name: None,
            phone: None,
            role: Role::Customer,
        }
    }
}
