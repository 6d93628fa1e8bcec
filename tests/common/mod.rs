#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use storefront_checkout::{
    config::CheckoutSettings,
    error::{AppError, AppResult},
    middleware::auth::IdentityProvider,
    models::{Item, UserIdentity, Variant},
    notify::{OrderRecap, OwnerNotifier},
    payments::{
        IntentMetadata, PaymentEvent, PaymentGateway, PaymentIntent, parse_signed_event,
        signature::compute_signature,
    },
    state::AppState,
    store::InMemoryStore,
};
use uuid::Uuid;

pub const TOKEN: &str = "valid-token";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn user_id() -> Uuid {
    Uuid::from_u128(0x1111_2222_3333_4444_5555_6666_7777_8888)
}

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

pub struct StaticIdentity;

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn verify(&self, token: &str) -> Option<UserIdentity> {
        (token == TOKEN).then(|| UserIdentity {
            user_id: user_id(),
            role: "user".into(),
        })
    }
}

#[derive(Default)]
pub struct ScriptedGateway {
    pub calls: Mutex<Vec<(i64, String, IntentMetadata)>>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(i64, String, IntentMetadata)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> AppResult<PaymentIntent> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AppError::Gateway("card processor unavailable".into()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((amount_minor, currency.to_string(), metadata));
        let n = self.calls.lock().unwrap().len();
        Ok(PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: format!("pi_{n}_secret_abc"),
        })
    }

    fn verify_and_parse_event(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        secret: &str,
    ) -> AppResult<PaymentEvent> {
        parse_signed_event(
            raw_body,
            signature_header,
            secret,
            300,
            chrono::Utc::now().timestamp(),
        )
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub recaps: Mutex<Vec<OrderRecap>>,
    pub fail: bool,
    pub delay: Duration,
}

impl RecordingNotifier {
    /// Polls until `count` recaps arrived; notifications run on a spawned task.
    pub async fn wait_for(&self, count: usize) -> Vec<OrderRecap> {
        for _ in 0..100 {
            let recaps = self.recaps.lock().unwrap().clone();
            if recaps.len() >= count {
                return recaps;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.recaps.lock().unwrap().clone()
    }
}

#[async_trait]
impl OwnerNotifier for RecordingNotifier {
    async fn order_paid(&self, recap: &OrderRecap) -> AppResult<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.recaps.lock().unwrap().push(recap.clone());
        if self.fail {
            return Err(AppError::Internal(anyhow::anyhow!("smtp down")));
        }
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: AppState,
}

pub fn harness(store: InMemoryStore) -> Harness {
    harness_with(store, ScriptedGateway::default(), RecordingNotifier::default())
}

pub fn harness_with(
    store: InMemoryStore,
    gateway: ScriptedGateway,
    notifier: RecordingNotifier,
) -> Harness {
    let store = Arc::new(store);
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(notifier);
    let state = AppState {
        store: store.clone(),
        identity: Arc::new(StaticIdentity),
        gateway: gateway.clone(),
        notifier: notifier.clone(),
        settings: Arc::new(CheckoutSettings {
            default_currency: "eur".into(),
            webhook_secret: WEBHOOK_SECRET.into(),
            gateway_timeout: Duration::from_millis(200),
        }),
    };
    Harness {
        store,
        gateway,
        notifier,
        state,
    }
}

pub fn item(id: i64, base_price: i64) -> Item {
    Item {
        id,
        name: format!("item-{id}"),
        base_price_minor: Decimal::from(base_price),
    }
}

pub fn variant(id: i64, item_id: i64, price: Decimal, stock: Option<i32>) -> Variant {
    Variant {
        id,
        item_id,
        name: format!("variant-{id}"),
        price_minor: price,
        stock,
    }
}

/// Item 1 with variant 10 priced at 500 minor units.
pub fn catalog_with_stock(stock: i32) -> InMemoryStore {
    InMemoryStore::new()
        .with_item(item(1, 450))
        .with_variant(variant(10, 1, Decimal::from(500), Some(stock)))
}

pub fn sign(body: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let sig = compute_signature(WEBHOOK_SECRET, now, body.as_bytes()).unwrap();
    format!("t={now},v1={sig}")
}

pub fn intent_event(event_id: &str, event_type: &str, intent_id: &str, order_id: Option<Uuid>) -> String {
    let metadata = match order_id {
        Some(id) => serde_json::json!({ "order_id": id.to_string(), "user_id": user_id().to_string() }),
        None => serde_json::json!({}),
    };
    serde_json::json!({
        "id": event_id,
        "type": event_type,
        "data": { "object": { "id": intent_id, "object": "payment_intent", "metadata": metadata } }
    })
    .to_string()
}
