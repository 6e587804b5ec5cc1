//! Cart lifecycle against real backends: load, mutate, restart, reload.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use go_marketplace_cart::config::DEFAULT_STORAGE_KEY;
use go_marketplace_cart::storage::{FileStorage, MemoryStorage};
use go_marketplace_cart::{CartChange, CartError, CartStore, LoadOutcome, SyncStatus, codec};
use go_marketplace_integration_tests::product;

#[tokio::test]
async fn test_file_cart_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let storage = FileStorage::create(tmp.path()).await.unwrap();
        let (store, outcome) = CartStore::open(Arc::new(storage), DEFAULT_STORAGE_KEY)
            .await
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Empty));

        store.add_to_cart(product("p1")).await.unwrap();
        store.add_to_cart(product("p2")).await.unwrap();
        store.increment("p2").await.unwrap();
        store.increment("p2").await.unwrap();
        store.decrement("p1").await.unwrap();
    }

    let storage = FileStorage::create(tmp.path()).await.unwrap();
    let (store, outcome) = CartStore::open(Arc::new(storage), DEFAULT_STORAGE_KEY)
        .await
        .unwrap();

    assert!(matches!(outcome, LoadOutcome::Restored { items: 1 }));
    let products = store.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id.as_str(), "p2");
    assert_eq!(products[0].quantity, 3);
    assert_eq!(products[0].title, "Product p2");
}

#[tokio::test]
async fn test_reload_preserves_order_and_fields() {
    let storage = MemoryStorage::new();
    let (store, _) = CartStore::open(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY)
        .await
        .unwrap();

    for id in ["c", "a", "b"] {
        store.add_to_cart(product(id)).await.unwrap();
    }
    store.increment("a").await.unwrap();

    let (reopened, _) = CartStore::open(Arc::new(storage), DEFAULT_STORAGE_KEY)
        .await
        .unwrap();
    assert_eq!(reopened.products(), store.products());

    let ids: Vec<_> = reopened
        .products()
        .iter()
        .map(|line| line.id.as_str().to_owned())
        .collect();
    assert_eq!(ids, ["c", "a", "b"]);
}

#[tokio::test]
async fn test_persisted_layout_is_json_array() {
    let storage = MemoryStorage::new();
    let (store, _) = CartStore::open(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY)
        .await
        .unwrap();

    store.add_to_cart(product("p1")).await.unwrap();

    let raw = storage.peek(DEFAULT_STORAGE_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let lines = value.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], "p1");
    assert_eq!(lines[0]["image_url"], "https://cdn.example.com/p1.png");
    assert_eq!(lines[0]["price"], 9.99);
    assert_eq!(lines[0]["quantity"], 1);
}

#[tokio::test]
async fn test_separate_keys_hold_separate_carts() {
    let storage = MemoryStorage::new();
    let (alice, _) = CartStore::open(Arc::new(storage.clone()), "cart:alice")
        .await
        .unwrap();
    let (bob, _) = CartStore::open(Arc::new(storage.clone()), "cart:bob")
        .await
        .unwrap();

    alice.add_to_cart(product("p1")).await.unwrap();
    bob.add_to_cart(product("p2")).await.unwrap();
    bob.add_to_cart(product("p2")).await.unwrap();

    let alice_saved = codec::decode(&storage.peek("cart:alice").unwrap()).unwrap();
    let bob_saved = codec::decode(&storage.peek("cart:bob").unwrap()).unwrap();
    assert_eq!(alice_saved.total_quantity(), 1);
    assert_eq!(bob_saved.total_quantity(), 2);
    assert!(bob_saved.get("p1").is_none());
}

#[tokio::test]
async fn test_full_walkthrough() {
    let storage = MemoryStorage::new();
    let store = CartStore::new(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY);

    assert!(matches!(
        store.add_to_cart(product("p1")).await,
        Err(CartError::NotInitialized)
    ));
    store.load().await.unwrap();

    assert_eq!(
        store.add_to_cart(product("p1")).await.unwrap(),
        CartChange::Added {
            id: product("p1").id
        }
    );
    assert!(matches!(
        store.increment("p1").await.unwrap(),
        CartChange::Incremented { quantity: 2, .. }
    ));
    assert!(matches!(
        store.decrement("p1").await.unwrap(),
        CartChange::Decremented { quantity: 1, .. }
    ));
    assert!(matches!(
        store.decrement("p1").await.unwrap(),
        CartChange::Removed { .. }
    ));

    assert!(store.products().is_empty());
    assert_eq!(storage.peek(DEFAULT_STORAGE_KEY).as_deref(), Some("[]"));
    assert_eq!(store.sync_status(), SyncStatus::Synced { version: 4 });
}

#[tokio::test]
async fn test_high_precision_price_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let mut item = product("p1");
    item.price = "0.123456789012345678".parse().unwrap();

    {
        let storage = FileStorage::create(tmp.path()).await.unwrap();
        let (store, _) = CartStore::open(Arc::new(storage), DEFAULT_STORAGE_KEY)
            .await
            .unwrap();
        store.add_to_cart(item.clone()).await.unwrap();
    }

    let storage = FileStorage::create(tmp.path()).await.unwrap();
    let (store, _) = CartStore::open(Arc::new(storage), DEFAULT_STORAGE_KEY)
        .await
        .unwrap();
    assert_eq!(store.get("p1").unwrap().price, item.price);
}
