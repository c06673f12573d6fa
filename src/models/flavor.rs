use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlavorCategory {
    Regular,
    Premium,
    Seasonal,
}

/// One menu entry. `available` is the scoop count left in the freezer, kept by
/// the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image: String,
    pub available: u32,
    pub category: FlavorCategory,
}
