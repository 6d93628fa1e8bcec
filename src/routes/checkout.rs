use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    routing::post,
};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutResponse},
    error::{AppError, AppResult},
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", post(checkout))
}

#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Pending order created; complete payment with the client secret", body = CheckoutResponse),
        (status = 400, description = "Malformed body, empty cart, missing or unknown variant, insufficient stock, invalid amount or currency"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<CheckoutResponse>> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            checkout_service::authenticate(&state, auth_header).await?;
            return Err(AppError::BadRequest(rejection.body_text()));
        }
    };
    let resp = checkout_service::checkout(
        &state,
        auth_header,
        &payload.cart_items,
        payload.currency.as_deref(),
    )
    .await?;
    Ok(Json(resp))
}
