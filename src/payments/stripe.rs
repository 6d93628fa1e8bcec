use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
    payments::{IntentMetadata, PaymentEvent, PaymentGateway, PaymentIntent, signature},
};

#[derive(Debug, Deserialize)]
struct CreateIntentResponse {
    id: String,
    client_secret: String,
}

/// Client for a Stripe-compatible payment intents API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
    tolerance_secs: i64,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            tolerance_secs: config.webhook_tolerance_secs,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> AppResult<PaymentIntent> {
        let order_id = metadata.order_id.to_string();
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .header("Idempotency-Key", format!("order-{order_id}"))
            .form(&[
                ("amount", amount_minor.to_string()),
                ("currency", currency.to_string()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
                ("metadata[order_id]", order_id.clone()),
                ("metadata[user_id]", metadata.user_id.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("create intent request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "create intent rejected with {status}: {error_text}"
            )));
        }

        let intent: CreateIntentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to parse intent response: {e}")))?;

        tracing::debug!(order_id = %order_id, payment_intent_id = %intent.id, "payment intent created");

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    fn verify_and_parse_event(
        &self,
        raw_body: &[u8],
        signature_header: &str,
        secret: &str,
    ) -> AppResult<PaymentEvent> {
        signature::parse_signed_event(
            raw_body,
            signature_header,
            secret,
            self.tolerance_secs,
            chrono::Utc::now().timestamp(),
        )
    }
}
