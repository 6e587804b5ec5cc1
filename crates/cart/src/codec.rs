//! Snapshot codec for the persisted cart.
//!
//! The slot holds the whole cart as a JSON array of line items. Decoding is
//! also where persisted data is validated: a value that parses but breaks a
//! cart invariant (duplicate ids, zero quantities, empty ids, negative prices)
//! is rejected the same way as unparseable text.

use go_marketplace_core::{CartState, CartStateError, LineItem};
use thiserror::Error;

/// Errors raised while encoding or decoding a cart snapshot.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The persisted bytes are not a UTF-8 JSON list of line items.
    #[error("malformed cart data: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The persisted lines parse but violate the cart invariants.
    #[error("invalid cart data: {0}")]
    Invalid(#[from] CartStateError),

    /// The cart could not be serialized.
    #[error("could not serialize cart: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Serialize a cart to its persisted form.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode(cart: &CartState) -> Result<String, CodecError> {
    serde_json::to_string(cart.items()).map_err(CodecError::Encode)
}

/// Parse and validate a persisted cart.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] for bytes that are not a JSON list of
/// line items (invalid UTF-8 included) and [`CodecError::Invalid`] for lines
/// that break an invariant.
pub fn decode(raw: impl AsRef<[u8]>) -> Result<CartState, CodecError> {
    let items: Vec<LineItem> =
        serde_json::from_slice(raw.as_ref()).map_err(CodecError::Malformed)?;
    Ok(CartState::from_items(items)?)
}
