use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Item, NewOrder, Order, OrderItem, OrderStatus, Variant},
    store::{AuditEntry, CatalogStore, StatusTransition},
};

/// Store operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ReadItems,
    ReadVariants,
    InsertOrder,
    InsertOrderItems,
    AttachPaymentIntent,
    TransitionStatus,
    RecordAudit,
}

#[derive(Default)]
struct Tables {
    items: HashMap<i64, Item>,
    variants: HashMap<i64, Variant>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    audit: Vec<AuditEntry>,
    item_reads: usize,
    variant_reads: usize,
    failing: HashSet<StoreOp>,
}

/// Process-local store used by tests and local demos.
///
/// The mutex is only held for the synchronous body of each call, never across an await.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_item(self, item: Item) -> Self {
        self.tables().items.insert(item.id, item);
        self
    }

    pub fn with_variant(self, variant: Variant) -> Self {
        self.tables().variants.insert(variant.id, variant);
        self
    }

    pub fn fail_on(&self, op: StoreOp) {
        self.tables().failing.insert(op);
    }

    pub fn orders(&self) -> Vec<Order> {
        self.tables().orders.clone()
    }

    pub fn all_order_items(&self) -> Vec<OrderItem> {
        self.tables().order_items.clone()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.tables().audit.clone()
    }

    /// Number of (item, variant) batch reads served so far.
    pub fn read_counts(&self) -> (usize, usize) {
        let tables = self.tables();
        (tables.item_reads, tables.variant_reads)
    }

    /// Inserts an order row as-is, bypassing checkout.
    pub fn put_order(&self, order: Order) {
        self.tables().orders.push(order);
    }
}

fn check(tables: &Tables, op: StoreOp) -> AppResult<()> {
    if tables.failing.contains(&op) {
        return Err(AppError::Internal(anyhow::anyhow!("injected store failure: {op:?}")));
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn items_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Item>> {
        let mut tables = self.tables();
        check(&tables, StoreOp::ReadItems)?;
        tables.item_reads += 1;
        Ok(ids.iter().filter_map(|id| tables.items.get(id).cloned()).collect())
    }

    async fn variants_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Variant>> {
        let mut tables = self.tables();
        check(&tables, StoreOp::ReadVariants)?;
        tables.variant_reads += 1;
        Ok(ids.iter().filter_map(|id| tables.variants.get(id).cloned()).collect())
    }

    async fn insert_order(&self, order: NewOrder) -> AppResult<Uuid> {
        let mut tables = self.tables();
        check(&tables, StoreOp::InsertOrder)?;
        let id = Uuid::new_v4();
        tables.orders.push(Order {
            id,
            user_id: order.user_id,
            status: OrderStatus::Pending,
            total_minor: order.total_minor,
            currency: order.currency,
            payment_intent_id: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn insert_order_items(&self, items: Vec<OrderItem>) -> AppResult<()> {
        let mut tables = self.tables();
        check(&tables, StoreOp::InsertOrderItems)?;
        tables.order_items.extend(items);
        Ok(())
    }

    async fn attach_payment_intent(&self, order_id: Uuid, payment_intent_id: &str) -> AppResult<bool> {
        let mut tables = self.tables();
        check(&tables, StoreOp::AttachPaymentIntent)?;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.payment_intent_id.is_none());
        Ok(match order {
            Some(order) => {
                order.payment_intent_id = Some(payment_intent_id.to_string());
                true
            }
            None => false,
        })
    }

    async fn find_order_by_payment_intent(&self, payment_intent_id: &str) -> AppResult<Option<Order>> {
        Ok(self
            .tables()
            .orders
            .iter()
            .find(|o| o.payment_intent_id.as_deref() == Some(payment_intent_id))
            .cloned())
    }

    async fn order_items(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        Ok(self
            .tables()
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn transition_order_status(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        payment_intent_id: Option<&str>,
    ) -> AppResult<StatusTransition> {
        let mut tables = self.tables();
        check(&tables, StoreOp::TransitionStatus)?;
        let Some(order) = tables.orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(StatusTransition::NotFound);
        };
        if order.status.is_terminal() {
            return Ok(StatusTransition::Unchanged(order.clone()));
        }
        order.status = target;
        if order.payment_intent_id.is_none() {
            order.payment_intent_id = payment_intent_id.map(str::to_string);
        }
        Ok(StatusTransition::Applied(order.clone()))
    }

    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        let mut tables = self.tables();
        check(&tables, StoreOp::RecordAudit)?;
        tables.audit.push(entry);
        Ok(())
    }
}
