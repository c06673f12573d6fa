use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One cart line: a flavor plus how many scoops of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub flavor_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Denormalized line descriptions in the order document, e.g.
    /// `"Classic Vanilla (2)"`.
    pub fn line_descriptions(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| format!("{} ({})", item.name, item.quantity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cart, CartItem};
    use crate::money::Money;

    fn cart() -> Cart {
        Cart {
            items: vec![
                CartItem {
                    flavor_id: "vanilla".to_string(),
                    name: "Classic Vanilla".to_string(),
                    unit_price: Money::from_cents(399),
                    quantity: 2,
                },
                CartItem {
                    flavor_id: "chocolate".to_string(),
                    name: "Double Chocolate".to_string(),
                    unit_price: Money::from_cents(449),
                    quantity: 1,
                },
            ],
        }
    }

    #[test]
    fn subtotal_sums_line_totals() {
        assert_eq!(cart().subtotal(), Money::from_cents(1247));
    }

    #[test]
    fn line_descriptions_include_quantity() {
        assert_eq!(
            cart().line_descriptions(),
            vec!["Classic Vanilla (2)", "Double Chocolate (1)"]
        );
    }
}
