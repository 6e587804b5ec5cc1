//! GoMarketplace Core - Cart domain types.
//!
//! This crate provides the types shared by every GoMarketplace component:
//! - `cart` - The persisted cart store
//! - `cli` - Command-line front end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and the pure cart state machine - no
//! I/O, no storage access, no async runtime. This keeps it lightweight and
//! allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, line items and [`CartState`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
