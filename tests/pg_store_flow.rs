use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use serde_json::json;
use storefront_checkout::{
    db::{create_orm_conn, run_migrations},
    entity::{items::ActiveModel as ItemActive, variants::ActiveModel as VariantActive},
    models::{NewOrder, OrderItem, OrderStatus},
    store::{CatalogStore, PgCatalogStore, StatusTransition},
};
use uuid::Uuid;

// Integration flow against Postgres: price reads -> order + items -> link intent -> paid -> replay.
#[tokio::test]
async fn order_lifecycle_against_postgres() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the store integration test."
            );
            return Ok(());
        }
    };

    let store = setup_store(&database_url).await?;

    let item = ItemActive {
        id: NotSet,
        name: Set("Test Hoodie".into()),
        base_price_minor: Set(Decimal::from(4500)),
        created_at: NotSet,
    }
    .insert(store.connection())
    .await?;
    let variant = VariantActive {
        id: NotSet,
        item_id: Set(item.id),
        name: Set("M".into()),
        price_minor: Set(Decimal::new(49995, 1)),
        stock: Set(Some(3)),
        created_at: NotSet,
    }
    .insert(store.connection())
    .await?;

    let variants = store.variants_by_ids(&[variant.id, 987_654]).await?;
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].price_minor, Decimal::new(49995, 1));
    assert_eq!(variants[0].stock, Some(3));
    assert_eq!(store.items_by_ids(&[item.id]).await?.len(), 1);

    let user_id = Uuid::new_v4();
    let order_id = store
        .insert_order(NewOrder {
            user_id,
            total_minor: 9999,
            currency: "eur".into(),
        })
        .await?;
    store
        .insert_order_items(vec![OrderItem {
            order_id,
            item_id: item.id,
            variant_id: variant.id,
            quantity: 2,
            unit_price_minor: variants[0].price_minor,
            customization: json!({ "gift": true }),
        }])
        .await?;

    assert!(store.attach_payment_intent(order_id, "pi_pg_1").await?);
    assert!(!store.attach_payment_intent(order_id, "pi_pg_2").await?);
    let linked = store.find_order_by_payment_intent("pi_pg_1").await?.expect("linked order");
    assert_eq!(linked.id, order_id);
    assert_eq!(linked.status, OrderStatus::Pending);

    let paid = store
        .transition_order_status(order_id, OrderStatus::Paid, Some("pi_pg_1"))
        .await?;
    assert!(matches!(paid, StatusTransition::Applied(ref o) if o.status == OrderStatus::Paid));

    let replay = store
        .transition_order_status(order_id, OrderStatus::Failed, Some("pi_pg_1"))
        .await?;
    assert!(matches!(replay, StatusTransition::Unchanged(ref o) if o.status == OrderStatus::Paid));

    let missing = store
        .transition_order_status(Uuid::new_v4(), OrderStatus::Paid, None)
        .await?;
    assert_eq!(missing, StatusTransition::NotFound);

    let items = store.order_items(order_id).await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].customization, json!({ "gift": true }));

    store
        .record_audit(storefront_checkout::store::AuditEntry {
            user_id: Some(user_id),
            action: "order_paid".into(),
            resource: Some("orders".into()),
            metadata: Some(json!({ "order_id": order_id })),
        })
        .await?;

    Ok(())
}

async fn setup_store(database_url: &str) -> anyhow::Result<PgCatalogStore> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, audit_logs, variants, items RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(PgCatalogStore::new(orm))
}
