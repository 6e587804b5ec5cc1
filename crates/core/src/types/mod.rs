//! Core types for the GoMarketplace cart.
//!
//! This module provides type-safe wrappers for the cart's domain concepts
//! and the state machine that enforces the cart invariants.

pub mod cart;
pub mod id;
pub mod line_item;
pub mod price;

pub use cart::{CartChange, CartState, CartStateError};
pub use id::*;
pub use line_item::{LineItem, NewLineItem};
pub use price::{Price, PriceError, PriceParseError};
