//! Catalog page against the REST stand-in.

use storefront_cart::{CartEngine, CartError, Catalog, Decimal, ItemId};

use crate::support::MockApi;

#[tokio::test]
async fn catalog_preselects_cart_quantities() {
    let api = MockApi::with_items(vec![(1, "Lamp", 20.0, 5), (2, "Bulb", 2.0, 50)]);
    api.put_entry(2, 6);
    let client = api.start().await;

    let catalog = Catalog::load(&client, &client).await.unwrap();

    assert_eq!(catalog.items().len(), 2);
    assert_eq!(catalog.item(&ItemId::from(1)).unwrap().selected(), 1);
    assert_eq!(catalog.item(&ItemId::from(2)).unwrap().selected(), 6);
}

#[tokio::test]
async fn add_to_cart_sends_picked_quantity() {
    let api = MockApi::with_items(vec![(1, "Lamp", 20.0, 5)]);
    let client = api.start().await;
    let mut catalog = Catalog::load(&client, &client).await.unwrap();
    let lamp = ItemId::from(1);

    catalog.increment(&lamp).unwrap();
    catalog.increment(&lamp).unwrap();
    let added = catalog.add_to_cart(&client, &lamp).await.unwrap();

    assert_eq!(added, 3);
    assert_eq!(api.quantity_of(1), Some(3));
    assert_eq!(catalog.item(&lamp).unwrap().in_cart, Some(3));

    // The cart page sees what the catalog added.
    let mut cart = CartEngine::new(client.clone(), client);
    cart.load().await;
    assert_eq!(cart.grand_total(), Decimal::from(60));
}

#[tokio::test]
async fn add_to_cart_failure_surfaces_server_message() {
    let api = MockApi::with_items(vec![(1, "Lamp", 20.0, 5)]);
    let client = api.start().await;
    let mut catalog = Catalog::load(&client, &client).await.unwrap();

    // The item disappears from the server between listing and adding.
    api.with_state(|s| s.items.clear());
    let err = catalog
        .add_to_cart(&client, &ItemId::from(1))
        .await
        .unwrap_err();

    match err {
        CartError::Fetch(store) => {
            assert_eq!(store.status_code(), Some(404));
            assert!(store.to_string().contains("Item not found"));
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }
    assert_eq!(catalog.item(&ItemId::from(1)).unwrap().in_cart, None);
}
