use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use super::common::*;
use crate::identity::domain::Role;
use crate::store::MemoryStore;

fn json_request(method: &str, uri: &str, token: Option<String>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn submit_route_returns_created_envelope() {
    let (service, store) = build_service();
    let consumer = enrol(&store, Role::Consumer);
    let router = router_with_service(service, store);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/vendor-applications",
            Some(bearer(&consumer)),
            serde_json::to_value(submission()).unwrap(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "vendor application submitted");
    assert_eq!(payload["data"]["status"], "pending");
    assert_eq!(payload["data"]["applicant"], consumer.user_id.0);
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let (service, store) = build_service();
    let router = router_with_service(service, store);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/vendor-applications",
            None,
            serde_json::to_value(submission()).unwrap(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"], "unauthenticated");
}

#[tokio::test]
async fn validation_errors_map_to_bad_request() {
    let (service, store) = build_service();
    let consumer = enrol(&store, Role::Consumer);
    let router = router_with_service(service, store);

    let mut incomplete = serde_json::to_value(submission()).unwrap();
    incomplete["business"]["tax_id"] = json!("");

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/vendor-applications",
            Some(bearer(&consumer)),
            incomplete,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "validation");
    assert!(payload["message"].as_str().unwrap().contains("tax_id"));
}

#[tokio::test]
async fn approve_route_promotes_and_rejects_non_admins() {
    let (service, store) = build_service();
    let consumer = enrol(&store, Role::Consumer);
    let admin = enrol(&store, Role::Admin);
    let application = service.submit(&consumer, submission()).expect("submitted");
    let router = router_with_service(service, store.clone());
    let uri = format!("/api/v1/vendor-applications/{}/approve", application.id.0);

    let denied = router
        .clone()
        .oneshot(json_request("POST", &uri, Some(bearer(&consumer)), json!({})))
        .await
        .expect("route executes");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let approved = router
        .oneshot(json_request("POST", &uri, Some(bearer(&admin)), json!({})))
        .await
        .expect("route executes");
    assert_eq!(approved.status(), StatusCode::OK);
    let payload = read_json_body(approved).await;
    assert_eq!(payload["data"]["status"], "approved");
    assert_eq!(stored_role(&store, &consumer), Role::Vendor);
}

#[tokio::test]
async fn reject_route_accepts_a_missing_body() {
    let (service, store) = build_service();
    let consumer = enrol(&store, Role::Consumer);
    let admin = enrol(&store, Role::Admin);
    let application = service.submit(&consumer, submission()).expect("submitted");
    let router = router_with_service(service, store.clone());

    let request = Request::post(format!(
        "/api/v1/vendor-applications/{}/reject",
        application.id.0
    ))
    .header(header::AUTHORIZATION, bearer(&admin))
    .body(Body::empty())
    .unwrap();
    let response = router.oneshot(request).await.expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["status"], "rejected");
    assert_eq!(stored_role(&store, &consumer), Role::Consumer);
}

#[tokio::test]
async fn unknown_application_returns_not_found() {
    let (service, store) = build_service();
    let admin = enrol(&store, Role::Admin);
    let router = router_with_service(service, store);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/vendor-applications/vapp-nope/approve",
            Some(bearer(&admin)),
            json!({}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_route_filters_by_status_query() {
    let (service, store) = build_service();
    let admin = enrol(&store, Role::Admin);
    let consumer = enrol(&store, Role::Consumer);
    service.submit(&consumer, submission()).expect("submitted");
    let router = router_with_service(service, store);

    let request = Request::get("/api/v1/vendor-applications?status=approved")
        .header(header::AUTHORIZATION, bearer(&admin))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn mine_handler_returns_callers_applications() {
    let (service, store) = build_service();
    let consumer = enrol(&store, Role::Consumer);
    service.submit(&consumer, submission()).expect("submitted");
    let service = Arc::new(service);

    let response = crate::vendors::router::mine_handler::<MemoryStore>(
        State(service),
        consumer,
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"].as_array().map(Vec::len), Some(1));
}
