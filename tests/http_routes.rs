mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use storefront_checkout::routes::create_api_router;
use tower::ServiceExt;

use common::{Harness, bearer, catalog_with_stock, harness, intent_event, sign};

fn app(h: &Harness) -> Router {
    create_api_router().with_state(h.state.clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn checkout_request(auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post("/checkout").header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn checkout_returns_client_secret_and_order_id() {
    let h = harness(catalog_with_stock(5));
    let body = json!({ "currency": "eur", "cartItems": [{ "itemId": 1, "variantId": 10, "quantity": 2 }] });

    let (status, body) = send(app(&h), checkout_request(Some(bearer().as_str()), body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientSecret"], "pi_1_secret_abc");
    assert_eq!(body["orderId"], h.store.orders()[0].id.to_string());
}

#[tokio::test]
async fn checkout_without_token_is_unauthorized() {
    let h = harness(catalog_with_stock(5));
    let body = json!({ "cartItems": [{ "itemId": 1, "variantId": 10 }] });

    let (status, _) = send(app(&h), checkout_request(None, body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validation_failures_are_bad_requests() {
    let h = harness(catalog_with_stock(1));
    let carts = [
        json!({ "cartItems": [] }),
        json!({ "cartItems": [{ "itemId": 1 }] }),
        json!({ "cartItems": [{ "itemId": 1, "variantId": 10, "quantity": 3 }] }),
        json!({ "cartItems": [{ "itemId": 1, "variantId": 77 }] }),
    ];

    for cart in carts {
        let (status, body) = send(app(&h), checkout_request(Some(bearer().as_str()), cart.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{cart}");
        assert!(body["data"]["error"].is_string());
    }
    assert!(h.store.orders().is_empty());
}

#[tokio::test]
async fn malformed_checkout_body_uses_error_envelope() {
    let h = harness(catalog_with_stock(5));
    let wrong_type = json!({ "currency": 42, "cartItems": [{ "itemId": 1, "variantId": 10 }] });

    let (status, body) = send(app(&h), checkout_request(Some(bearer().as_str()), wrong_type)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    let no_content_type = Request::post("/checkout")
        .header(header::AUTHORIZATION, bearer())
        .body(Body::from(r#"{"cartItems":[]}"#))
        .unwrap();
    let (status, body) = send(app(&h), no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    assert!(h.store.orders().is_empty());
}

#[tokio::test]
async fn malformed_checkout_body_without_token_is_unauthorized() {
    let h = harness(catalog_with_stock(5));
    let body = json!({ "currency": 42, "cartItems": [] });

    let (status, body) = send(app(&h), checkout_request(None, body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["data"]["error"].is_string());
}

#[tokio::test]
async fn gateway_failure_is_a_generic_server_error() {
    let h = common::harness_with(
        catalog_with_stock(5),
        common::ScriptedGateway::failing(),
        common::RecordingNotifier::default(),
    );
    let body = json!({ "cartItems": [{ "itemId": 1, "variantId": 10 }] });

    let (status, body) = send(app(&h), checkout_request(Some(bearer().as_str()), body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal Server Error");
}

fn webhook_request(body: &str, signature: &str) -> Request<Body> {
    Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn webhook_acknowledges_signed_events() {
    let h = harness(catalog_with_stock(5));
    let body = intent_event("evt_1", "customer.created", "cus_1", None);

    let (status, body) = send(app(&h), webhook_request(&body, &sign(&body))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
}

#[tokio::test]
async fn webhook_rejects_bad_signatures() {
    let h = harness(catalog_with_stock(5));
    let body = intent_event("evt_1", "payment_intent.succeeded", "pi_1", None);

    let (status, _) = send(app(&h), webhook_request(&body, "t=1,v1=abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_paths_get_json_not_found() {
    let h = harness(catalog_with_stock(5));
    let request = Request::get("/nope").body(Body::empty()).unwrap();

    let (status, body) = send(app(&h), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nope");
}
