use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Item, NewOrder, Order, OrderItem, OrderStatus, Variant},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgCatalogStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

/// Result of a conditional `pending -> terminal` status update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusTransition {
    Applied(Order),
    /// The order was already terminal; carries its current state.
    Unchanged(Order),
    NotFound,
}

/// Relational catalog/order storage consumed by checkout and reconciliation.
///
/// Reads are batched by id list. Writes are single statements (or a single
/// short transaction for status transitions); no call holds a lock across
/// another call.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn items_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Item>>;

    async fn variants_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Variant>>;

    /// Inserts a `pending` order and returns its id.
    async fn insert_order(&self, order: NewOrder) -> AppResult<Uuid>;

    async fn insert_order_items(&self, items: Vec<OrderItem>) -> AppResult<()>;

    /// Sets `payment_intent_id` only if the order has none yet. Returns whether a row changed.
    async fn attach_payment_intent(&self, order_id: Uuid, payment_intent_id: &str) -> AppResult<bool>;

    async fn find_order_by_payment_intent(&self, payment_intent_id: &str) -> AppResult<Option<Order>>;

    async fn order_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>>;

    /// Moves a `pending` order to `target`; terminal orders are left untouched.
    /// A missing `payment_intent_id` is backfilled from `payment_intent_id`.
    async fn transition_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        payment_intent_id: Option<&str>,
    ) -> AppResult<StatusTransition>;

    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()>;
}
