use serde_json::Value;

use crate::{
    audit::log_audit,
    dto::checkout::CheckoutResponse,
    error::{AppError, AppResult},
    middleware::auth::bearer_token,
    models::{CartLine, NewOrder, OrderItem, PricedLine, UserIdentity},
    payments::IntentMetadata,
    services::{
        cart_service,
        pricing_service::{self, PriceQuote},
    },
    state::AppState,
};

/// Turns a client cart into a pending order with a payment intent.
///
/// Steps run in a fixed order: authenticate, normalize, require variants,
/// price, re-validate, insert order, insert items, create intent, link.
/// Nothing is written before validation passes. A failure after the order
/// row exists leaves it `pending` with no intent, which is the recognisable
/// abandoned-attempt state; it is logged with the order id and not retried.
pub async fn checkout(
    state: &AppState,
    auth_header: Option<&str>,
    raw_cart: &Value,
    currency: Option<&str>,
) -> AppResult<CheckoutResponse> {
    let user = authenticate(state, auth_header).await?;
    let currency = normalize_currency(currency, &state.settings.default_currency)?;

    let lines = cart_service::normalize(raw_cart);
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    if let Some(line) = lines.iter().find(|line| line.variant_id.is_none()) {
        return Err(AppError::MissingVariant {
            item_id: line.item_id,
        });
    }

    let quote = pricing_service::resolve(state.store.as_ref(), &lines).await?;
    if quote.total_minor <= 0 {
        return Err(AppError::InvalidAmount);
    }

    let priced = validate_lines(&lines, &quote)?;
    let total_minor = quote.total_minor;

    let order_id = state
        .store
        .insert_order(NewOrder {
            user_id: user.user_id,
            total_minor,
            currency: currency.clone(),
        })
        .await
        .inspect_err(|err| {
            tracing::error!(user_id = %user.user_id, error = %err, "failed to insert order");
        })?;

    let order_items = priced
        .into_iter()
        .map(|p| OrderItem {
            order_id,
            item_id: p.line.item_id,
            variant_id: p.line.variant_id.unwrap_or_default(),
            quantity: p.line.quantity,
            unit_price_minor: p.unit_price_minor,
            customization: Value::Object(p.line.customization),
        })
        .collect::<Vec<_>>();
    let line_count = order_items.len();

    state
        .store
        .insert_order_items(order_items)
        .await
        .inspect_err(|err| {
            tracing::error!(%order_id, error = %err, "failed to insert order items; order left pending");
        })?;

    let metadata = IntentMetadata {
        order_id,
        user_id: user.user_id,
    };
    let intent = match tokio::time::timeout(
        state.settings.gateway_timeout,
        state.gateway.create_intent(total_minor, &currency, metadata),
    )
    .await
    {
        Ok(Ok(intent)) => intent,
        Ok(Err(err)) => {
            tracing::error!(%order_id, error = %err, "payment intent creation failed; order left pending");
            return Err(err);
        }
        Err(_) => {
            tracing::error!(%order_id, "payment intent creation timed out; order left pending");
            return Err(AppError::Gateway("payment intent creation timed out".into()));
        }
    };

    match state.store.attach_payment_intent(order_id, &intent.id).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(
            %order_id,
            payment_intent_id = %intent.id,
            "order already linked to a payment intent"
        ),
        Err(err) => tracing::warn!(
            %order_id,
            payment_intent_id = %intent.id,
            error = %err,
            "failed to link payment intent; webhook metadata will correlate"
        ),
    }

    if let Err(err) = log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order_id,
            "payment_intent_id": intent.id,
            "total_minor": total_minor,
            "currency": currency,
            "lines": line_count,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    tracing::info!(%order_id, user_id = %user.user_id, total_minor, %currency, "checkout created");

    Ok(CheckoutResponse {
        client_secret: intent.client_secret,
        order_id,
    })
}

/// Resolves the caller from an `Authorization: Bearer` header.
pub async fn authenticate(state: &AppState, auth_header: Option<&str>) -> AppResult<UserIdentity> {
    let token = bearer_token(auth_header).ok_or(AppError::Unauthenticated)?;
    state
        .identity
        .verify(token)
        .await
        .ok_or(AppError::Unauthenticated)
}

fn normalize_currency(requested: Option<&str>, default: &str) -> AppResult<String> {
    let currency = requested
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default)
        .to_ascii_lowercase();
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(AppError::InvalidCurrency(currency));
    }
    Ok(currency)
}

/// The gate before any write: pricing tolerated unknown ids, this does not.
///
/// Stock is checked, not reserved; concurrent checkouts may both pass.
pub fn validate_lines(lines: &[CartLine], quote: &PriceQuote) -> AppResult<Vec<PricedLine>> {
    lines
        .iter()
        .map(|line| {
            let variant_id = line.variant_id.ok_or(AppError::MissingVariant {
                item_id: line.item_id,
            })?;
            let variant = quote
                .variants_by_id
                .get(&variant_id)
                .ok_or(AppError::VariantNotFound(variant_id))?;
            if variant.item_id != line.item_id {
                return Err(AppError::VariantItemMismatch {
                    variant_id,
                    item_id: line.item_id,
                });
            }
            if let Some(available) = variant.stock {
                if available < line.quantity {
                    return Err(AppError::InsufficientStock {
                        variant_id,
                        requested: line.quantity,
                        available,
                    });
                }
            }

            Ok(PricedLine {
                line: line.clone(),
                unit_price_minor: quote.unit_price(line),
                available_stock: variant.stock,
            })
        })
        .collect()
}
