//! The cart state machine.
//!
//! [`CartState`] owns the ordered list of [`LineItem`]s and is the only place
//! the cart invariants are enforced:
//!
//! - no two lines share a product id
//! - every line has a quantity of at least 1 (a line that would drop to 0
//!   is removed instead)
//!
//! It performs no I/O. Persistence and concurrency live in the cart crate.

use serde::{Deserialize, Serialize};

use super::{LineItem, NewLineItem, ProductId};

/// Errors raised when a list of lines violates the cart invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartStateError {
    /// Two lines share the same product id.
    #[error("duplicate product id in cart: {0}")]
    DuplicateId(ProductId),
    /// A line has a quantity of zero.
    #[error("line {0} has a quantity of zero")]
    ZeroQuantity(ProductId),
    /// A line has an empty product id.
    #[error("line at position {index} has an empty product id")]
    InvalidId {
        /// Position of the offending line.
        index: usize,
    },
    /// A line has a negative price.
    #[error("line {0} has a negative price")]
    NegativePrice(ProductId),
    /// Incrementing would overflow the quantity counter.
    #[error("quantity overflow for line {0}")]
    QuantityOverflow(ProductId),
}

/// What a cart operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartChange {
    /// A new line was appended with quantity 1.
    Added {
        /// The new line's product id.
        id: ProductId,
    },
    /// An existing line's quantity went up.
    Incremented {
        /// The line's product id.
        id: ProductId,
        /// Quantity after the change.
        quantity: u32,
    },
    /// An existing line's quantity went down and the line was kept.
    Decremented {
        /// The line's product id.
        id: ProductId,
        /// Quantity after the change.
        quantity: u32,
    },
    /// A line's quantity reached zero and it was removed.
    Removed {
        /// The removed line's product id.
        id: ProductId,
    },
    /// Nothing matched; the cart is as it was.
    Unchanged,
}

impl CartChange {
    /// Whether the operation modified the cart.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The in-memory cart: an ordered list of lines keyed by product id.
///
/// Lookups are linear scans. Carts hold tens of lines, not thousands.
///
/// ## Examples
///
/// ```
/// use go_marketplace_core::{CartChange, CartState, NewLineItem, Price, ProductId};
/// use rust_decimal::Decimal;
///
/// let mut cart = CartState::new();
/// let item = NewLineItem {
///     id: ProductId::parse("p1").unwrap(),
///     title: "Ceramic Mug".to_string(),
///     image_url: "https://example.com/p1.png".to_string(),
///     price: Price::new(Decimal::new(999, 2)).unwrap(),
/// };
///
/// cart.add(item.clone()).unwrap();
/// cart.add(item).unwrap();
/// assert_eq!(cart.get("p1").map(|line| line.quantity), Some(2));
///
/// cart.decrement("p1");
/// assert!(matches!(cart.decrement("p1"), CartChange::Removed { .. }));
/// assert!(cart.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from existing lines, checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStateError`] describing the first violation found.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, CartStateError> {
        Self::validate(&items)?;
        Ok(Self { items })
    }

    /// Check a list of lines against the cart invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStateError`] describing the first violation found.
    pub fn validate(items: &[LineItem]) -> Result<(), CartStateError> {
        for (index, item) in items.iter().enumerate() {
            if !item.id.is_valid() {
                return Err(CartStateError::InvalidId { index });
            }
            if item.quantity == 0 {
                return Err(CartStateError::ZeroQuantity(item.id.clone()));
            }
            if !item.price.is_valid() {
                return Err(CartStateError::NegativePrice(item.id.clone()));
            }
            let seen_before = items
                .iter()
                .take(index)
                .any(|earlier| earlier.id == item.id);
            if seen_before {
                return Err(CartStateError::DuplicateId(item.id.clone()));
            }
        }
        Ok(())
    }

    /// The lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities (the cart badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Add a product to the cart.
    ///
    /// A product already in the cart is incremented instead, exactly as
    /// [`increment`](Self::increment) would.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::QuantityOverflow`] if the existing line is
    /// already at `u32::MAX`.
    pub fn add(&mut self, item: NewLineItem) -> Result<CartChange, CartStateError> {
        if self.position(item.id.as_str()).is_some() {
            return self.increment(item.id.as_str());
        }
        let id = item.id.clone();
        self.items.push(item.with_quantity(1));
        Ok(CartChange::Added { id })
    }

    /// Increase a line's quantity by one. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::QuantityOverflow`] if the line is already at
    /// `u32::MAX`.
    pub fn increment(&mut self, id: &str) -> Result<CartChange, CartStateError> {
        let Some(item) = self.items.iter_mut().find(|item| item.id.as_str() == id) else {
            return Ok(CartChange::Unchanged);
        };
        item.quantity = item
            .quantity
            .checked_add(1)
            .ok_or_else(|| CartStateError::QuantityOverflow(item.id.clone()))?;
        Ok(CartChange::Incremented {
            id: item.id.clone(),
            quantity: item.quantity,
        })
    }

    /// Decrease a line's quantity by one, removing it when it reaches zero.
    ///
    /// Unknown ids, and lines already at zero, are a no-op.
    pub fn decrement(&mut self, id: &str) -> CartChange {
        let Some(index) = self.position(id) else {
            return CartChange::Unchanged;
        };
        let Some(item) = self.items.get_mut(index) else {
            return CartChange::Unchanged;
        };
        if item.quantity == 0 {
            return CartChange::Unchanged;
        }
        item.quantity -= 1;
        if item.quantity > 0 {
            return CartChange::Decremented {
                id: item.id.clone(),
                quantity: item.quantity,
            };
        }
        let removed = self.items.remove(index);
        CartChange::Removed { id: removed.id }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id.as_str() == id)
    }
}

impl TryFrom<Vec<LineItem>> for CartState {
    type Error = CartStateError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<CartState> for Vec<LineItem> {
    fn from(cart: CartState) -> Self {
        cart.items
    }
}
