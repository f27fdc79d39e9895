//! Integration tests for the order status machine and cancellation restock.
//!
//! Requires a running `PostgreSQL` database with migrations applied.

use rust_decimal::Decimal;

use thistle_core::{CartId, OrderId, OrderStatus, ProductId, ShippingMethod};
use thistle_integration_tests::{
    product_stock, seed_cart, seed_cart_item, seed_product, test_pool,
};
use thistle_storefront::db::{OrderError, OrderRepository};
use thistle_storefront::models::order::{
    AddressSnapshot, CheckoutItem, CreateOrder, PaymentSelection, ShippingSelection,
};

async fn place_order(pool: &sqlx::PgPool, product_id: ProductId, quantity: i32) -> OrderId {
    let cart_id: CartId = seed_cart(pool).await;
    seed_cart_item(pool, cart_id, product_id, None, 100_000, quantity).await;

    let input = CreateOrder {
        user_id: None,
        cart_id,
        shipping: ShippingSelection {
            method: ShippingMethod::Economy,
            fee: Decimal::from(20_000),
            address: AddressSnapshot {
                full_name: "Test Shopper".to_string(),
                phone: "0123".to_string(),
                address_line1: "1 Test Lane".to_string(),
                city: None,
                district: None,
                province: None,
            },
        },
        payment: PaymentSelection {
            method: "cod".to_string(),
            discount: Decimal::ZERO,
        },
        items: vec![CheckoutItem {
            product_id,
            variant_id: None,
            price_at: Decimal::from(100_000),
            quantity,
        }],
    };

    OrderRepository::new(pool).create(&input).await.unwrap().id
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_forward_chain_is_accepted() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let order_id = place_order(&pool, product_id, 1).await;

    let repo = OrderRepository::new(&pool);
    for status in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let order = repo.update_status(order_id, status).await.unwrap();
        assert_eq!(order.status, status);
    }
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_backward_and_skipping_transitions_are_refused() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let order_id = place_order(&pool, product_id, 1).await;

    let repo = OrderRepository::new(&pool);

    // new -> shipped skips processing
    let err = repo
        .update_status(order_id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::New,
            to: OrderStatus::Shipped,
        }
    ));

    repo.update_status(order_id, OrderStatus::Processing)
        .await
        .unwrap();

    // processing -> new walks backwards
    let err = repo
        .update_status(order_id, OrderStatus::New)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_cancellation_restocks_items() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let order_id = place_order(&pool, product_id, 4).await;
    assert_eq!(product_stock(&pool, product_id).await, 6);

    let repo = OrderRepository::new(&pool);
    let order = repo
        .update_status(order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    // Stock is back and the reversal is in the audit trail.
    assert_eq!(product_stock(&pool, product_id).await, 10);

    let (movements,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM inventory_movements WHERE product_id = $1 AND reason = 'cancellation' AND change = 4",
    )
    .bind(product_id.as_i32())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(movements, 1);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_transition_returns_fresh_updated_at() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let order_id = place_order(&pool, product_id, 1).await;

    let (before,): (chrono::DateTime<chrono::Utc>,) =
        sqlx::query_as("SELECT updated_at FROM orders WHERE id = $1")
            .bind(order_id.as_i32())
            .fetch_one(&pool)
            .await
            .unwrap();

    let order = OrderRepository::new(&pool)
        .update_status(order_id, OrderStatus::Processing)
        .await
        .unwrap();

    // The returned snapshot carries the transition's timestamp, not the
    // pre-update row's.
    let (stored,): (chrono::DateTime<chrono::Utc>,) =
        sqlx::query_as("SELECT updated_at FROM orders WHERE id = $1")
            .bind(order_id.as_i32())
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(order.updated_at, stored);
    assert!(order.updated_at >= before);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_terminal_states_refuse_every_exit() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;

    let repo = OrderRepository::new(&pool);

    // Cancelled is terminal
    let cancelled = place_order(&pool, product_id, 1).await;
    repo.update_status(cancelled, OrderStatus::Cancelled)
        .await
        .unwrap();
    let err = repo
        .update_status(cancelled, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Delivered is terminal, including against cancellation
    let delivered = place_order(&pool, product_id, 1).await;
    for status in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        repo.update_status(delivered, status).await.unwrap();
    }
    let err = repo
        .update_status(delivered, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_double_cancellation_does_not_restock_twice() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let order_id = place_order(&pool, product_id, 3).await;

    let repo = OrderRepository::new(&pool);
    repo.update_status(order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(product_stock(&pool, product_id).await, 10);

    // Second cancel is refused by the status machine, so no second restock.
    let err = repo
        .update_status(order_id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    assert_eq!(product_stock(&pool, product_id).await, 10);
}
