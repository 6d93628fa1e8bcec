use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{
        items::{Column as ItemCol, Entity as Items, Model as ItemModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        variants::{Column as VariantCol, Entity as Variants, Model as VariantModel},
    },
    error::AppResult,
    models::{Item, NewOrder, Order, OrderItem, OrderStatus, Variant},
    store::{AuditEntry, CatalogStore, StatusTransition},
};

/// Postgres-backed store: sea-orm for entities, raw sqlx for the audit trail.
#[derive(Clone)]
pub struct PgCatalogStore {
    orm: DatabaseConnection,
}

impl PgCatalogStore {
    pub fn new(orm: DatabaseConnection) -> Self {
        Self { orm }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.orm
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn items_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Item>> {
        let items = Items::find()
            .filter(ItemCol::Id.is_in(ids.iter().copied()))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(item_from_entity)
            .collect();
        Ok(items)
    }

    async fn variants_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Variant>> {
        let variants = Variants::find()
            .filter(VariantCol::Id.is_in(ids.iter().copied()))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(variant_from_entity)
            .collect();
        Ok(variants)
    }

    async fn insert_order(&self, order: NewOrder) -> AppResult<Uuid> {
        let order = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(order.user_id),
            status: Set(OrderStatus::Pending),
            total_minor: Set(order.total_minor),
            currency: Set(order.currency),
            payment_intent_id: Set(None),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&self.orm)
        .await?;

        Ok(order.id)
    }

    async fn insert_order_items(&self, items: Vec<OrderItem>) -> AppResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let rows = items.into_iter().map(|item| OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(item.order_id),
            item_id: Set(item.item_id),
            variant_id: Set(item.variant_id),
            quantity: Set(item.quantity),
            unit_price_minor: Set(item.unit_price_minor),
            customization: Set(item.customization),
            created_at: NotSet,
        });

        OrderItems::insert_many(rows).exec(&self.orm).await?;
        Ok(())
    }

    async fn attach_payment_intent(&self, order_id: Uuid, payment_intent_id: &str) -> AppResult<bool> {
        let result = Orders::update_many()
            .col_expr(OrderCol::PaymentIntentId, Expr::val(payment_intent_id.to_string()).into())
            .col_expr(OrderCol::UpdatedAt, Expr::val(Utc::now()).into())
            .filter(
                Condition::all()
                    .add(OrderCol::Id.eq(order_id))
                    .add(OrderCol::PaymentIntentId.is_null()),
            )
            .exec(&self.orm)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn find_order_by_payment_intent(&self, payment_intent_id: &str) -> AppResult<Option<Order>> {
        let order = Orders::find()
            .filter(OrderCol::PaymentIntentId.eq(payment_intent_id))
            .one(&self.orm)
            .await?;
        Ok(order.map(order_from_entity))
    }

    async fn order_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .all(&self.orm)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();
        Ok(items)
    }

    async fn transition_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        payment_intent_id: Option<&str>,
    ) -> AppResult<StatusTransition> {
        let txn = self.orm.begin().await?;

        let order = Orders::find_by_id(order_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let order = match order {
            Some(o) => o,
            None => return Ok(StatusTransition::NotFound),
        };

        if order.status.is_terminal() {
            txn.commit().await?;
            return Ok(StatusTransition::Unchanged(order_from_entity(order)));
        }

        let needs_intent = order.payment_intent_id.is_none();
        let mut active: OrderActive = order.into();
        active.status = Set(target);
        if let (true, Some(intent_id)) = (needs_intent, payment_intent_id) {
            active.payment_intent_id = Set(Some(intent_id.to_string()));
        }
        active.updated_at = Set(Utc::now().into());
        let order = active.update(&txn).await?;

        txn.commit().await?;

        Ok(StatusTransition::Applied(order_from_entity(order)))
    }

    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        let pool = self.orm.get_postgres_connection_pool();
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, resource, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.resource)
        .bind(entry.metadata)
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn item_from_entity(model: ItemModel) -> Item {
    Item {
        id: model.id,
        name: model.name,
        base_price_minor: model.base_price_minor,
    }
}

fn variant_from_entity(model: VariantModel) -> Variant {
    Variant {
        id: model.id,
        item_id: model.item_id,
        name: model.name,
        price_minor: model.price_minor,
        stock: model.stock,
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        total_minor: model.total_minor,
        currency: model.currency,
        payment_intent_id: model.payment_intent_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        order_id: model.order_id,
        item_id: model.item_id,
        variant_id: model.variant_id,
        quantity: model.quantity,
        unit_price_minor: model.unit_price_minor,
        customization: model.customization,
    }
}
