use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// One validated line of a client cart. Lives only for the duration of a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
    pub customization: Map<String, Value>,
}

/// A cart line with its authoritative, server-side unit price and stock.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub line: CartLine,
    pub unit_price_minor: Decimal,
    pub available_stock: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub base_price_minor: Decimal,
}

/// A purchasable variant. `stock` is `None` when stock is not tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub item_id: i64,
    pub name: String,
    pub price_minor: Decimal,
    pub stock: Option<i32>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_minor: i64,
    pub currency: String,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Frozen price/quantity snapshot of one order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub item_id: i64,
    pub variant_id: i64,
    pub quantity: i32,
    pub unit_price_minor: Decimal,
    pub customization: Value,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub role: String,
}
