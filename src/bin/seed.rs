use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
};

/// Starter catalog shown on the storefront home screen.
const CATALOG: &[(&str, &str, i64)] = &[
    ("1", "iPhone 15 Pro", 999),
    ("2", "MacBook Air M2", 1299),
    ("3", "Robe élégante", 49),
    ("4", "Chaussures de sport", 89),
    ("5", "Canapé confortable", 499),
    ("6", "MacBook Pro 16\"", 2499),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 1).await?;
    run_migrations(&pool).await?;

    let inserted = seed_products(&pool).await?;
    println!("Seed completed: {inserted} new products");
    Ok(())
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for (id, name, price) in CATALOG {
        let result = sqlx::query(
            r#"
            INSERT INTO products (id, name, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(*id)
        .bind(*name)
        .bind(Decimal::from(*price))
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}
