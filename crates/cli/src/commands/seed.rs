//! Seed the database with sample catalog data for local development.
//!
//! Inserts a handful of products, variants, and coupons. Idempotent via
//! `ON CONFLICT DO NOTHING` on the natural keys, so re-running is safe.

use rust_decimal::Decimal;

use super::CommandError;

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    price: i64,
    sale_price: Option<i64>,
    stock: i32,
    variants: &'static [(&'static str, i32)],
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Thistle Tea Sampler",
        slug: "thistle-tea-sampler",
        price: 180_000,
        sale_price: Some(150_000),
        stock: 40,
        variants: &[],
    },
    SeedProduct {
        name: "Ceramic Mug",
        slug: "ceramic-mug",
        price: 220_000,
        sale_price: None,
        stock: 0,
        variants: &[("Matte Black", 12), ("Glazed White", 8)],
    },
    SeedProduct {
        name: "Linen Tote",
        slug: "linen-tote",
        price: 320_000,
        sale_price: None,
        stock: 25,
        variants: &[],
    },
];

/// Seed the database.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Seeding catalog...");

    for product in PRODUCTS {
        let id: Option<(i32,)> = sqlx::query_as(
            r"
            INSERT INTO products (name, slug, price, sale_price, stock_quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id
            ",
        )
        .bind(product.name)
        .bind(product.slug)
        .bind(Decimal::from(product.price))
        .bind(product.sale_price.map(Decimal::from))
        .bind(product.stock)
        .fetch_optional(&pool)
        .await?;

        let Some((product_id,)) = id else {
            tracing::info!(slug = product.slug, "product already seeded, skipping");
            continue;
        };

        for (variant_name, stock) in product.variants {
            sqlx::query("INSERT INTO variants (product_id, variant_name, stock) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(variant_name)
                .bind(stock)
                .execute(&pool)
                .await?;
        }
    }

    sqlx::query(
        r"
        INSERT INTO coupons (code, type, value, min_order_value, active, start_at, end_at)
        VALUES
            ('WELCOME10', 'percent', 10, NULL, TRUE, NOW() - INTERVAL '1 day', NOW() + INTERVAL '90 days'),
            ('FREESHIP', 'fixed', 25000, 200000, TRUE, NOW() - INTERVAL '1 day', NOW() + INTERVAL '30 days'),
            ('EXPIRED20', 'percent', 20, NULL, TRUE, NOW() - INTERVAL '60 days', NOW() - INTERVAL '30 days')
        ON CONFLICT (code) DO NOTHING
        ",
    )
    .execute(&pool)
    .await?;

    tracing::info!("Seed complete");
    Ok(())
}
