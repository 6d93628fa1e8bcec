use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;

pub mod signature;
pub mod stripe;

pub use signature::parse_signed_event;
pub use stripe::StripeGateway;

/// Gateway-side payment attempt created for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Opaque correlation data attached to an intent and echoed back on its events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentMetadata {
    pub order_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl PaymentEventKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "payment_intent.succeeded" => PaymentEventKind::Succeeded,
            "payment_intent.payment_failed" => PaymentEventKind::Failed,
            "payment_intent.canceled" => PaymentEventKind::Canceled,
            other => PaymentEventKind::Other(other.to_string()),
        }
    }
}

/// An authenticated gateway notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub id: String,
    pub kind: PaymentEventKind,
    pub payment_intent_id: Option<String>,
    pub order_id: Option<Uuid>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates an intent for `amount_minor` in `currency`. Retries for the same
    /// order id must not create a second intent.
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> AppResult<PaymentIntent>;

    /// Fails with `InvalidSignature` unless `signature_header` authenticates `raw_body`.
    fn verify_and_parse_event(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        secret: &str,
    ) -> AppResult<PaymentEvent>;
}
