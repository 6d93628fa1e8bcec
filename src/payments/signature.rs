use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    payments::{PaymentEvent, PaymentEventKind},
};

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew for timestamps ahead of local time.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: Value,
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(anyhow::anyhow!("invalid webhook secret")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a `t=<unix>,v1=<hex>` header against the raw body.
///
/// Several `v1` entries may be present while a secret is being rotated; any match is accepted.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(s) = part.strip_prefix("v1=") {
            candidates.push(s);
        }
    }

    let timestamp: i64 = timestamp
        .and_then(|t| t.parse().ok())
        .ok_or(AppError::InvalidSignature)?;
    if candidates.is_empty() {
        return Err(AppError::InvalidSignature);
    }

    let age = now.checked_sub(timestamp).ok_or(AppError::InvalidSignature)?;
    if age > tolerance_secs || age < -MAX_FUTURE_SKEW_SECS {
        tracing::warn!(age, tolerance_secs, "webhook timestamp outside tolerance");
        return Err(AppError::InvalidSignature);
    }

    let expected = compute_signature(secret, timestamp, payload)?;
    let matched = candidates.iter().any(|candidate| {
        candidate.len() == expected.len() && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
    });
    if !matched {
        return Err(AppError::InvalidSignature);
    }
    Ok(())
}

/// Verifies the signature, then parses the body. Nothing is parsed for unauthenticated input.
pub fn parse_signed_event(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<PaymentEvent> {
    verify_signature(payload, signature_header, secret, tolerance_secs, now)?;

    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("invalid event payload: {e}")))?;

    let payment_intent_id = raw
        .data
        .object
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let order_id = raw
        .data
        .object
        .get("metadata")
        .and_then(|m| m.get("order_id"))
        .and_then(Value::as_str)
        .and_then(|id| match Uuid::parse_str(id) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(event_id = %raw.id, order_id = %id, "event carries malformed order_id");
                None
            }
        });

    Ok(PaymentEvent {
        kind: PaymentEventKind::from_event_type(&raw.event_type),
        id: raw.id,
        payment_intent_id,
        order_id,
    })
}
