use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{Order, OrderItem},
};

/// Summary sent to the store owner once an order is paid.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecap {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[async_trait]
pub trait OwnerNotifier: Send + Sync {
    async fn order_paid(&self, recap: &OrderRecap) -> AppResult<()>;
}

/// Posts the recap as JSON to a configured hook (mail relay, chat webhook, ...).
pub struct HttpOwnerNotifier {
    client: Client,
    url: String,
}

impl HttpOwnerNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl OwnerNotifier for HttpOwnerNotifier {
    async fn order_paid(&self, recap: &OrderRecap) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(recap)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("owner notification failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "owner notification rejected with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Used when no notification hook is configured.
pub struct LogOwnerNotifier;

#[async_trait]
impl OwnerNotifier for LogOwnerNotifier {
    async fn order_paid(&self, recap: &OrderRecap) -> AppResult<()> {
        tracing::info!(
            order_id = %recap.order.id,
            total_minor = recap.order.total_minor,
            currency = %recap.order.currency,
            lines = recap.items.len(),
            "order paid"
        );
        Ok(())
    }
}
