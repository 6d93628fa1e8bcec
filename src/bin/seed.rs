use rust_decimal::Decimal;
use storefront_checkout::db::{create_orm_conn, run_migrations};

// (item, base price, [(variant, price, stock)]); prices in minor units, stock None = untracked.
type SeedItem = (&'static str, i64, &'static [(&'static str, i64, Option<i32>)]);

const CATALOG: &[SeedItem] = &[
    (
        "Axum Hoodie",
        5500,
        &[("S", 5500, Some(10)), ("M", 5500, Some(20)), ("XL", 5900, Some(5))],
    ),
    ("Ferris Mug", 1200, &[("Standard", 1200, Some(100))]),
    ("Custom Sticker Pack", 500, &[("Standard", 500, None), ("Holographic", 850, None)]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // The seed only needs the database; payment and identity settings are not required here.
    let database_url = std::env::var("DATABASE_URL")?;

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    let pool = orm.get_postgres_connection_pool();

    for (name, base_price, variants) in CATALOG {
        let (item_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO items (name, base_price_minor)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET base_price_minor = EXCLUDED.base_price_minor
            RETURNING id
            "#,
        )
        .bind(*name)
        .bind(Decimal::from(*base_price))
        .fetch_one(pool)
        .await?;

        for (variant, price, stock) in variants.iter() {
            sqlx::query(
                r#"
                INSERT INTO variants (item_id, name, price_minor, stock)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (item_id, name) DO UPDATE
                SET price_minor = EXCLUDED.price_minor, stock = EXCLUDED.stock
                "#,
            )
            .bind(item_id)
            .bind(*variant)
            .bind(Decimal::from(*price))
            .bind(*stock)
            .execute(pool)
            .await?;
        }

        println!("Seeded {name} (id={item_id}, {} variants)", variants.len());
    }

    println!("Seed completed");
    Ok(())
}
