use dashmap::DashMap;

use crate::error::AppError;
use crate::models::flavor::{FlavorCategory, FlavorItem};
use crate::money::Money;

/// The flavor menu. Customers read it; the admin dashboard adds flavors and
/// keeps freezer counts current.
pub struct Catalog {
    flavors: DashMap<String, FlavorItem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            flavors: DashMap::new(),
        }
    }

    /// The shop's standing menu.
    pub fn seeded() -> Self {
        let catalog = Self::new();
        for flavor in seed_flavors() {
            catalog.flavors.insert(flavor.id.clone(), flavor);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.flavors.len()
    }

    /// Menu listing, optionally narrowed to one category, sorted by name for
    /// a stable display order.
    pub fn list(&self, category: Option<FlavorCategory>) -> Vec<FlavorItem> {
        let mut flavors: Vec<FlavorItem> = self
            .flavors
            .iter()
            .filter(|entry| category.is_none_or(|c| entry.value().category == c))
            .map(|entry| entry.value().clone())
            .collect();

        flavors.sort_by(|a, b| a.name.cmp(&b.name));
        flavors
    }

    pub fn add(&self, flavor: FlavorItem) -> Result<FlavorItem, AppError> {
        if self.flavors.contains_key(&flavor.id) {
            return Err(AppError::Conflict(format!(
                "flavor {} already exists",
                flavor.id
            )));
        }

        self.flavors.insert(flavor.id.clone(), flavor.clone());
        Ok(flavor)
    }

    pub fn set_available(&self, id: &str, available: u32) -> Result<FlavorItem, AppError> {
        let mut flavor = self
            .flavors
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("flavor {id} not found")))?;

        flavor.available = available;
        Ok(flavor.clone())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

fn seed_flavors() -> Vec<FlavorItem> {
    vec![
        FlavorItem {
            id: "vanilla".to_string(),
            name: "Classic Vanilla".to_string(),
            description: "Smooth and creamy vanilla made with real Madagascar vanilla beans"
                .to_string(),
            price: Money::from_cents(399),
            image: "/placeholder.svg".to_string(),
            available: 24,
            category: FlavorCategory::Regular,
        },
        FlavorItem {
            id: "chocolate".to_string(),
            name: "Double Chocolate".to_string(),
            description: "Rich chocolate ice cream with chocolate chips throughout".to_string(),
            price: Money::from_cents(449),
            image: "/placeholder.svg".to_string(),
            available: 18,
            category: FlavorCategory::Regular,
        },
        FlavorItem {
            id: "strawberry".to_string(),
            name: "Fresh Strawberry".to_string(),
            description: "Made with local seasonal strawberries and a hint of lemon".to_string(),
            price: Money::from_cents(449),
            image: "/placeholder.svg".to_string(),
            available: 12,
            category: FlavorCategory::Regular,
        },
        FlavorItem {
            id: "mint-choc".to_string(),
            name: "Mint Chocolate Chip".to_string(),
            description: "Cool mint ice cream loaded with chocolate chips".to_string(),
            price: Money::from_cents(499),
            image: "/placeholder.svg".to_string(),
            available: 15,
            category: FlavorCategory::Premium,
        },
        FlavorItem {
            id: "cookie-dough".to_string(),
            name: "Cookie Dough".to_string(),
            description: "Vanilla ice cream with chunks of chocolate chip cookie dough"
                .to_string(),
            price: Money::from_cents(549),
            image: "/placeholder.svg".to_string(),
            available: 8,
            category: FlavorCategory::Premium,
        },
        FlavorItem {
            id: "mango-sorbet".to_string(),
            name: "Mango Tango Sorbet".to_string(),
            description: "Refreshing dairy-free mango sorbet with a hint of lime".to_string(),
            price: Money::from_cents(499),
            image: "/placeholder.svg".to_string(),
            available: 10,
            category: FlavorCategory::Seasonal,
        },
    ]
}
