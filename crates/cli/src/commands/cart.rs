//! Cart commands.
//!
//! Each invocation opens the configured storage, loads the cart, applies at
//! most one change and prints the resulting cart.
//!
//! # Environment Variables
//!
//! - `CART_STORAGE_BACKEND` - `file` (default), `memory`, or `postgres`
//! - `CART_STORAGE_DIR` - Directory for the file backend
//! - `CART_STORAGE_KEY` - Slot key holding the cart

use std::fmt::Write as _;

use go_marketplace_cart::{CartChange, CartConfig, CartStore, LineItem, LoadOutcome, storage};
use go_marketplace_core::{NewLineItem, ProductId};
use tracing::{info, warn};

use super::CommandError;

/// A single cart operation requested on the command line.
#[derive(Debug)]
pub enum CartCommand {
    List,
    Add(NewLineItem),
    Increment(ProductId),
    Decrement(ProductId),
}

/// Run a cart command against the configured storage.
///
/// # Errors
///
/// Returns an error if configuration is invalid, storage cannot be opened,
/// or the change cannot be persisted.
pub async fn run(command: CartCommand) -> Result<(), CommandError> {
    let config = CartConfig::from_env()?;
    info!(storage = ?config.storage, key = %config.storage_key, "Opening cart");

    let backend = storage::connect(&config.storage).await?;
    let (store, outcome) = CartStore::open(backend, config.storage_key).await?;
    match &outcome {
        LoadOutcome::Corrupted { error } => warn!(%error, "Stored cart was discarded"),
        LoadOutcome::Unreadable { error } => warn!(%error, "Stored cart could not be read"),
        LoadOutcome::Empty | LoadOutcome::Restored { .. } => {}
    }

    let change = match command {
        CartCommand::List => None,
        CartCommand::Add(item) => Some(store.add_to_cart(item).await?),
        CartCommand::Increment(id) => Some(store.increment(id.as_str()).await?),
        CartCommand::Decrement(id) => Some(store.decrement(id.as_str()).await?),
    };

    if let Some(change) = change {
        info!("{}", describe(&change));
    }

    let listing = render(&store.products());
    #[allow(clippy::print_stdout)]
    print!("{listing}");

    Ok(())
}

/// One-line summary of a change.
fn describe(change: &CartChange) -> String {
    match change {
        CartChange::Added { id } => format!("Added {id}"),
        CartChange::Incremented { id, quantity } => format!("{id} quantity is now {quantity}"),
        CartChange::Decremented { id, quantity } => format!("{id} quantity is now {quantity}"),
        CartChange::Removed { id } => format!("Removed {id}"),
        CartChange::Unchanged => "No matching product in cart".to_string(),
    }
}

/// Render the cart as a plain-text table.
fn render(lines: &[LineItem]) -> String {
    if lines.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let id_width = lines
        .iter()
        .map(|line| line.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<id_width$}  {:>5}  {:>10}  TITLE", "ID", "QTY", "PRICE");
    for line in lines {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:>5}  {:>10}  {}",
            line.id.as_str(),
            line.quantity,
            line.price.to_string(),
            line.title
        );
    }
    let total: u64 = lines.iter().map(|line| u64::from(line.quantity)).sum();
    let _ = writeln!(out, "{total} item(s)");
    out
}
