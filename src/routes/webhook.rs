use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::checkout::WebhookAck, error::AppResult, services::webhook_service, state::AppState,
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(payment_webhook))
}

/// The body is taken as raw bytes: the signature covers the exact payload.
#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, description = "Raw gateway event", content_type = "application/json"),
    params(
        ("stripe-signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")
    ),
    responses(
        (status = 200, description = "Event received (handled or ignored)", body = WebhookAck),
        (status = 400, description = "Invalid signature"),
        (status = 500, description = "Processing failed; the gateway will retry"),
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let ack = webhook_service::handle_webhook(&state, &body, signature).await?;
    Ok(Json(ack))
}
