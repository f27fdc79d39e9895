//! Integration tests for the order transaction engine.
//!
//! These tests require a running `PostgreSQL` database with migrations
//! applied. Run with `cargo test -p thistle-integration-tests -- --ignored`.

use rust_decimal::Decimal;

use thistle_core::{CartId, PaymentStatus, ShippingMethod};
use thistle_integration_tests::{
    cart_item_count, product_stock, seed_cart, seed_cart_item, seed_product, seed_variant,
    test_pool, variant_stock,
};
use thistle_storefront::db::{OrderError, OrderRepository};
use thistle_storefront::models::order::{
    AddressSnapshot, CheckoutItem, CreateOrder, PaymentSelection, ShippingSelection,
};

fn snapshot() -> AddressSnapshot {
    AddressSnapshot {
        full_name: "Test Shopper".to_string(),
        phone: "0123".to_string(),
        address_line1: "1 Test Lane".to_string(),
        city: Some("Hanoi".to_string()),
        district: None,
        province: None,
    }
}

fn order_input(cart_id: CartId, items: Vec<CheckoutItem>, discount: i64) -> CreateOrder {
    CreateOrder {
        user_id: None,
        cart_id,
        shipping: ShippingSelection {
            method: ShippingMethod::Standard,
            fee: Decimal::from(32_000),
            address: snapshot(),
        },
        payment: PaymentSelection {
            method: "cod".to_string(),
            discount: Decimal::from(discount),
        },
        items,
    }
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_order_creation_decrements_stock_and_consumes_cart() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let cart_id = seed_cart(&pool).await;
    seed_cart_item(&pool, cart_id, product_id, None, 100_000, 3).await;

    let input = order_input(
        cart_id,
        vec![CheckoutItem {
            product_id,
            variant_id: None,
            price_at: Decimal::from(100_000),
            quantity: 3,
        }],
        0,
    );

    let order = OrderRepository::new(&pool).create(&input).await.unwrap();

    assert!(order.order_number.starts_with("TS"));
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.subtotal, Decimal::from(300_000));
    assert_eq!(order.grand_total, Decimal::from(332_000));

    assert_eq!(product_stock(&pool, product_id).await, 7);
    assert_eq!(cart_item_count(&pool, cart_id).await, 0);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_insufficient_stock_rolls_back_everything() {
    let pool = test_pool().await;
    let plentiful = seed_product(&pool, 50_000, 100).await;
    let scarce = seed_product(&pool, 80_000, 2).await;
    let cart_id = seed_cart(&pool).await;
    seed_cart_item(&pool, cart_id, plentiful, None, 50_000, 1).await;
    seed_cart_item(&pool, cart_id, scarce, None, 80_000, 5).await;

    let input = order_input(
        cart_id,
        vec![
            CheckoutItem {
                product_id: plentiful,
                variant_id: None,
                price_at: Decimal::from(50_000),
                quantity: 1,
            },
            CheckoutItem {
                product_id: scarce,
                variant_id: None,
                price_at: Decimal::from(80_000),
                quantity: 5,
            },
        ],
        0,
    );

    let err = OrderRepository::new(&pool).create(&input).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InsufficientStock { product_id, requested: 5, .. } if product_id == scarce
    ));

    // Nothing observable: the first item's decrement is rolled back too,
    // the cart is untouched, and no order row exists for this cart.
    assert_eq!(product_stock(&pool, plentiful).await, 100);
    assert_eq!(product_stock(&pool, scarce).await, 2);
    assert_eq!(cart_item_count(&pool, cart_id).await, 2);

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE cart_id = $1")
        .bind(cart_id.as_i32())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_variant_item_decrements_variant_not_product() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 120_000, 50).await;
    let variant_id = seed_variant(&pool, product_id, 8).await;
    let cart_id = seed_cart(&pool).await;
    seed_cart_item(&pool, cart_id, product_id, Some(variant_id), 120_000, 2).await;

    let input = order_input(
        cart_id,
        vec![CheckoutItem {
            product_id,
            variant_id: Some(variant_id),
            price_at: Decimal::from(120_000),
            quantity: 2,
        }],
        0,
    );

    OrderRepository::new(&pool).create(&input).await.unwrap();

    assert_eq!(variant_stock(&pool, variant_id).await, 6);
    assert_eq!(product_stock(&pool, product_id).await, 50);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_discount_is_reflected_in_grand_total() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let cart_id = seed_cart(&pool).await;
    seed_cart_item(&pool, cart_id, product_id, None, 100_000, 2).await;

    let input = order_input(
        cart_id,
        vec![CheckoutItem {
            product_id,
            variant_id: None,
            price_at: Decimal::from(100_000),
            quantity: 2,
        }],
        30_000,
    );

    let order = OrderRepository::new(&pool).create(&input).await.unwrap();
    assert_eq!(order.subtotal, Decimal::from(200_000));
    assert_eq!(order.discount_total, Decimal::from(30_000));
    // 200000 + 32000 - 30000
    assert_eq!(order.grand_total, Decimal::from(202_000));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_order_is_findable_by_number() {
    let pool = test_pool().await;
    let product_id = seed_product(&pool, 100_000, 10).await;
    let cart_id = seed_cart(&pool).await;
    seed_cart_item(&pool, cart_id, product_id, None, 100_000, 1).await;

    let input = order_input(
        cart_id,
        vec![CheckoutItem {
            product_id,
            variant_id: None,
            price_at: Decimal::from(100_000),
            quantity: 1,
        }],
        0,
    );

    let repo = OrderRepository::new(&pool);
    let order = repo.create(&input).await.unwrap();

    let found = repo
        .find_by_number(&order.order_number, None)
        .await
        .unwrap()
        .expect("order should be findable by number");
    assert_eq!(found.id, order.id);

    let details = repo.find_details(order.id).await.unwrap().unwrap();
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.items[0].item.quantity, 1);
}
