use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::checkout::WebhookAck,
    error::{AppError, AppResult},
    models::{Order, OrderStatus},
    notify::OrderRecap,
    payments::{PaymentEvent, PaymentEventKind},
    state::AppState,
    store::StatusTransition,
};

/// What a single event did to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Transitioned(Order),
    /// Order already terminal; replays and late events land here.
    AlreadyTerminal(Order),
    OrderNotFound,
    Ignored,
}

/// Entry point for gateway callbacks. The signature is checked over the exact
/// raw bytes before anything else; an unauthenticated request never reaches
/// the store.
pub async fn handle_webhook(
    state: &AppState,
    raw_body: &[u8],
    signature_header: Option<&str>,
) -> AppResult<WebhookAck> {
    let signature_header = signature_header.ok_or(AppError::InvalidSignature)?;
    let event = state
        .gateway
        .verify_and_parse_event(raw_body, signature_header, &state.settings.webhook_secret)
        .inspect_err(|err| {
            if matches!(err, AppError::InvalidSignature) {
                tracing::warn!("webhook signature verification failed");
            }
        })?;

    let outcome = reconcile(state, &event).await?;
    tracing::debug!(event_id = %event.id, ?outcome, "webhook processed");

    Ok(WebhookAck { received: true })
}

/// Applies one authenticated event. Only `pending` orders move, so duplicate
/// and out-of-order deliveries are acknowledged without effect.
pub async fn reconcile(state: &AppState, event: &PaymentEvent) -> AppResult<ReconcileOutcome> {
    let target = match &event.kind {
        PaymentEventKind::Succeeded => OrderStatus::Paid,
        PaymentEventKind::Failed => OrderStatus::Failed,
        PaymentEventKind::Canceled => OrderStatus::Canceled,
        PaymentEventKind::Other(event_type) => {
            tracing::info!(event_id = %event.id, %event_type, "ignoring unhandled event type");
            return Ok(ReconcileOutcome::Ignored);
        }
    };

    let Some(order_id) = resolve_order_id(state, event).await? else {
        tracing::warn!(
            event_id = %event.id,
            payment_intent_id = ?event.payment_intent_id,
            "event does not reference a known order"
        );
        return Ok(ReconcileOutcome::OrderNotFound);
    };

    let transition = state
        .store
        .transition_order_status(order_id, target, event.payment_intent_id.as_deref())
        .await
        .inspect_err(|err| {
            tracing::error!(%order_id, event_id = %event.id, error = %err, "status update failed");
        })?;

    let order = match transition {
        StatusTransition::Applied(order) => order,
        StatusTransition::Unchanged(order) => {
            tracing::info!(
                %order_id,
                event_id = %event.id,
                status = order.status.as_str(),
                "order already terminal; event acknowledged"
            );
            return Ok(ReconcileOutcome::AlreadyTerminal(order));
        }
        StatusTransition::NotFound => {
            tracing::warn!(%order_id, event_id = %event.id, "order not found");
            return Ok(ReconcileOutcome::OrderNotFound);
        }
    };

    tracing::info!(%order_id, event_id = %event.id, status = target.as_str(), "order reconciled");

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(order.user_id),
        &format!("order_{}", target.as_str()),
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "event_id": event.id,
            "payment_intent_id": event.payment_intent_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    if target == OrderStatus::Paid {
        tokio::spawn(notify_owner(state.clone(), order.clone()));
    }

    Ok(ReconcileOutcome::Transitioned(order))
}

async fn resolve_order_id(state: &AppState, event: &PaymentEvent) -> AppResult<Option<Uuid>> {
    if let Some(order_id) = event.order_id {
        return Ok(Some(order_id));
    }
    match event.payment_intent_id.as_deref() {
        Some(intent_id) => Ok(state
            .store
            .find_order_by_payment_intent(intent_id)
            .await?
            .map(|order| order.id)),
        None => Ok(None),
    }
}

/// Runs detached from the webhook response; the status update is already durable.
async fn notify_owner(state: AppState, order: Order) {
    let items = match state.store.order_items(order.id).await {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(order_id = %order.id, error = %err, "could not load items for order recap");
            Vec::new()
        }
    };
    let order_id = order.id;
    let recap = OrderRecap { order, items };
    if let Err(err) = state.notifier.order_paid(&recap).await {
        tracing::warn!(%order_id, error = %err, "owner notification failed");
    }
}
