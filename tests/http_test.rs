//! HTTP Tests - Admin Router
//!
//! Drives the axum router with `tower::ServiceExt::oneshot` over real
//! in-memory adapters: SQLite orders and offers, the memory session store
//! and the markup price calculator.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use order_admin::adapters::http::{router, AppState};
use order_admin::adapters::metrics::MetricsRegistry;
use order_admin::adapters::persistence::{connect_in_memory, SqlOfferCatalog, SqlOrderRepository};
use order_admin::adapters::pricing::MarkupPriceCalculator;
use order_admin::adapters::session::{MemorySessionStore, SessionCookie};
use order_admin::domain::Offer;
use order_admin::usecases::{AdminSettings, OrderAdmin};

const COOKIE_NAME: &str = "sid";

async fn app() -> (Router, Arc<MetricsRegistry>) {
    let pool = connect_in_memory().await.unwrap();
    let catalog = SqlOfferCatalog::new(pool.clone());
    catalog
        .upsert(&Offer {
            id: 1,
            sku: "TEA-GRN".to_string(),
            title: "Green tea".to_string(),
            price: dec!(10.00),
        })
        .await
        .unwrap();

    let admin = OrderAdmin::new(
        Arc::new(SqlOrderRepository::new(pool)),
        Arc::new(MemorySessionStore::new(Duration::from_secs(3600))),
        Arc::new(catalog),
        Arc::new(MarkupPriceCalculator::default()),
        AdminSettings::default(),
    );
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let state = Arc::new(AppState {
        admin: Arc::new(admin),
        metrics: Arc::clone(&metrics),
    });
    (router(state, SessionCookie::new(COOKIE_NAME)), metrics)
}

fn request(method: Method, uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header(COOKIE, format!("{COOKIE_NAME}={session}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn ajax(mut request: Request<Body>) -> Request<Body> {
    request
        .headers_mut()
        .insert("x-requested-with", "XMLHttpRequest".parse().unwrap());
    request
}

fn form(uri: &str, session: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(COOKIE, format!("{COOKIE_NAME}={session}"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Start a session and return its id from the `Set-Cookie` header.
async fn open_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/orders", None))
        .await
        .unwrap();
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    let pair = cookie.split(';').next().unwrap();
    pair.split_once('=').unwrap().1.to_string()
}

#[tokio::test]
async fn test_new_session_gets_cookie_and_known_session_does_not() {
    let (app, _) = app().await;
    let session = open_session(&app).await;
    assert!(!session.is_empty());

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/admin/orders", Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_unknown_order_is_404_with_standard_message() {
    let (app, _) = app().await;

    for uri in ["/admin/orders/999", "/admin/orders/999/update", "/admin/orders/items?order_id=999"] {
        let (status, body) = send(&app, request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "The requested page does not exist.");
    }

    let (status, _) = send(&app, request(Method::POST, "/admin/orders/999/delete", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_rejects_get() {
    let (app, _) = app().await;
    let (status, _) = send(&app, request(Method::GET, "/admin/orders/1/delete", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_items_view_is_fragment_only_for_ajax() {
    let (app, _) = app().await;
    let session = open_session(&app).await;

    let (status, page) = send(&app, request(Method::GET, "/admin/orders/items", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["view"], "_items");
    assert!(page.get("title").is_some());
    assert!(page["flashes"].is_array());

    let (status, fragment) = send(
        &app,
        ajax(request(Method::GET, "/admin/orders/items", Some(&session))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fragment["view"], "_items");
    assert!(fragment.get("title").is_none());
    assert_eq!(fragment["data"]["order_id"], 0);
}

#[tokio::test]
async fn test_offer_search_returns_fragment() {
    let (app, _) = app().await;
    let (status, body) = send(
        &app,
        request(Method::GET, "/admin/orders/offer-search?q=tea", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "offer-search");
    assert!(body.get("flashes").is_none());
    assert_eq!(body["data"]["offers"]["items"][0]["sku"], "TEA-GRN");
}

#[tokio::test]
async fn test_draft_flow_add_item_then_create() {
    let (app, metrics) = app().await;
    let session = open_session(&app).await;

    // A rejected form leaves the draft's extra rate at zero.
    let (status, _) = send(
        &app,
        form(
            "/admin/orders/create",
            &session,
            "customer_name=&extra_rate=10",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, items) = send(
        &app,
        ajax(request(
            Method::POST,
            "/admin/orders/add-item?offer_id=1&amount=2",
            Some(&session),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items["data"]["items"][0]["price"], "10.00");
    assert_eq!(items["data"]["total"], "20.00");

    let (status, created) = send(
        &app,
        form(
            "/admin/orders/create",
            &session,
            "customer_name=Ada&customer_email=ada%40example.com&extra_rate=0",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["data"]["saved"], true);
    assert_eq!(created["flashes"][0]["message"], "Order was created");
    let id = created["data"]["order"]["id"].as_i64().unwrap();
    assert_eq!(metrics.orders_created.get(), 1);

    let (status, view) = send(&app, request(Method::GET, &format!("/admin/orders/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["data"]["order"]["item_count"], 2);

    // The draft is gone from the session.
    let (_, draft) = send(
        &app,
        ajax(request(Method::GET, "/admin/orders/items", Some(&session))),
    )
    .await;
    assert_eq!(draft["data"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_offer_and_item_are_404() {
    let (app, _) = app().await;
    let session = open_session(&app).await;

    let (status, _) = send(
        &app,
        request(Method::POST, "/admin/orders/add-item?offer_id=42", Some(&session)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!(
        "/admin/orders/delete-item?item_id={}",
        uuid::Uuid::new_v4()
    );
    let (status, _) = send(&app, request(Method::POST, &uri, Some(&session))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_redirects_to_index() {
    let (app, _) = app().await;
    let session = open_session(&app).await;

    let (_, created) = send(
        &app,
        form("/admin/orders/create", &session, "customer_name=Ada"),
    )
    .await;
    let id = created["data"]["order"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            &format!("/admin/orders/{id}/delete"),
            Some(&session),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/admin/orders");

    let (status, _) = send(&app, request(Method::GET, &format!("/admin/orders/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_utilities_drops_only_with_truthy_flag() {
    let (app, _) = app().await;
    let session = open_session(&app).await;

    for name in ["Ada", "Grace"] {
        send(
            &app,
            form("/admin/orders/create", &session, &format!("customer_name={name}")),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        request(Method::GET, "/admin/orders/utilities?drop-all-orders=0", Some(&session)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["dropped"].is_null());

    let (_, index) = send(&app, request(Method::GET, "/admin/orders", Some(&session))).await;
    assert_eq!(index["data"]["orders"]["total"], 2);

    let (status, body) = send(
        &app,
        request(Method::GET, "/admin/orders/utilities?drop-all-orders=1", Some(&session)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dropped"], 2);
    assert_eq!(body["flashes"][0]["message"], "Orders clear");

    let (_, index) = send(&app, request(Method::GET, "/admin/orders", Some(&session))).await;
    assert_eq!(index["data"]["orders"]["total"], 0);
}

#[tokio::test]
async fn test_edit_item_form_and_submit() {
    let (app, _) = app().await;
    let session = open_session(&app).await;

    let (_, items) = send(
        &app,
        request(Method::POST, "/admin/orders/add-item?offer_id=1", Some(&session)),
    )
    .await;
    let item_id = items["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let (status, edit) = send(
        &app,
        request(
            Method::GET,
            &format!("/admin/orders/edit-item?id={item_id}"),
            Some(&session),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edit["view"], "edit-item");
    assert!(edit["flashes"].is_array());
    assert_eq!(edit["data"]["item"]["amount"], 1);

    let (status, edit) = send(
        &app,
        ajax(request(
            Method::GET,
            &format!("/admin/orders/edit-item?id={item_id}"),
            Some(&session),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(edit.get("title").is_none());
    assert_eq!(edit["data"]["item"]["id"], item_id.as_str());

    let uri = format!("/admin/orders/edit-item?id={item_id}&order_id=0");
    let (status, items) = send(&app, form(&uri, &session, "amount=3&price=9.50")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items["data"]["total"], "28.50");

    let (status, _) = send(&app, form(&uri, &session, "amount=0")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_item_id_is_404() {
    let (app, _) = app().await;
    let session = open_session(&app).await;

    for (method, uri) in [
        (Method::GET, "/admin/orders/edit-item?id=abc"),
        (Method::POST, "/admin/orders/delete-item?item_id=abc"),
    ] {
        let (status, body) = send(&app, request(method, uri, Some(&session))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "The requested page does not exist.");
    }

    let (status, _) = send(
        &app,
        form("/admin/orders/edit-item?id=abc", &session, "amount=2"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
