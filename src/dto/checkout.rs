use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// ISO 4217 code; the store default applies when omitted.
    #[serde(default)]
    pub currency: Option<String>,
    /// Loosely-typed cart entries as sent by the storefront.
    #[serde(default, rename = "cartItems", alias = "cart_items", alias = "items")]
    #[schema(value_type = Vec<Object>)]
    pub cart_items: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub client_secret: String,
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WebhookAck {
    pub received: bool,
}
