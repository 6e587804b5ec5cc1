//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as offered to the cart, before it has a quantity.
///
/// This is what presentation code hands to `add_to_cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    /// Catalog product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price.
    pub price: Price,
}

impl NewLineItem {
    /// Attach a quantity, producing a cart line.
    #[must_use]
    pub fn with_quantity(self, quantity: u32) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

/// One product entry in the cart.
///
/// The serialized field names match the persisted cart layout:
/// `id`, `title`, `image_url`, `price`, `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product identifier, unique within a cart.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price.
    pub price: Price,
    /// Number of units. Always at least 1 while the line is in a cart.
    pub quantity: u32,
}
