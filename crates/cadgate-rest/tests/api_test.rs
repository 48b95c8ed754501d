//! End-to-end tests of the HTTP surface against a fake CAD.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use cadgate_core::{ShareToken, Tenant};
use cadgate_service::CadEvent;
use common::{guest_uri, json_request, FakeCad, TestApp, TOKEN};
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new(FakeCad::default());

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"], true);

    let (status, _) = app.get("/live").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_guest_view_is_cached() {
    let app = TestApp::new(FakeCad::with_record());

    let (status, body) = app.get(&guest_uri()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"], "pm");
    assert_eq!(body["guestShareId"], 42);
    assert_eq!(body["callService"]["call_status"], "En Route");
    assert!(body["geofences"].is_array());

    let (status, _) = app.get(&guest_uri()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.cad.call_service_calls(), 1);
    assert_eq!(app.cad.geofence_calls(), 1);
}

#[tokio::test]
async fn test_guest_view_missing_parameters_is_not_found() {
    let app = TestApp::new(FakeCad::with_record());

    for uri in ["/", "/?tenant=pm&id=42", "/?tenant=pm&token=abc123", "/?id=42&token=abc123"] {
        let (status, _) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
    assert_eq!(app.cad.call_service_calls(), 0);
}

#[tokio::test]
async fn test_guest_view_upstream_failure_is_generic() {
    let cad = FakeCad::with_record();
    cad.fail.store(true, Ordering::SeqCst);
    let app = TestApp::new(cad);

    let (status, body) = app.get(&guest_uri()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An error occurred while processing your request.");
    assert!(!body.to_string().contains(TOKEN));
}

#[tokio::test]
async fn test_clear_by_share_forces_refetch() {
    let app = TestApp::new(FakeCad::with_record());
    app.get(&guest_uri()).await;

    let (status, body) = app
        .post(
            "/webhooks/cad/cache/call-service/clear",
            json!({"tenant": "pm", "guestShareId": 42, "token": TOKEN}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cache cleared successfully");
    assert_eq!(body["guestShareId"], 42);

    app.get(&guest_uri()).await;
    assert_eq!(app.cad.call_service_calls(), 2);
}

#[tokio::test]
async fn test_clear_by_guid_forces_refetch() {
    let app = TestApp::new(FakeCad::with_record());
    app.get(&guest_uri()).await;

    let (status, body) = app
        .post(
            "/webhooks/cad/cache/call-service/clear",
            json!({"tenant": "pm", "callServiceGUID": "cs-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["callServiceGUID"], "cs-1");

    app.get(&guest_uri()).await;
    assert_eq!(app.cad.call_service_calls(), 2);
}

#[tokio::test]
async fn test_clear_without_target_is_unprocessable() {
    let app = TestApp::new(FakeCad::with_record());

    let (status, body) = app
        .post("/webhooks/cad/cache/call-service/clear", json!({"tenant": "pm"}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_webhook_body_is_bad_request() {
    let app = TestApp::new(FakeCad::with_record());

    let request = Request::post("/webhooks/cad/cache/geofence/clear")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
}

#[tokio::test]
async fn test_geofence_clear_only_refetches_geofences() {
    let app = TestApp::new(FakeCad::with_record());
    app.get(&guest_uri()).await;

    let (status, body) = app
        .post(
            "/webhooks/cad/cache/geofence/clear",
            json!({"tenant": "pm", "regionId": 7}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["regionId"], 7);

    app.get(&guest_uri()).await;
    assert_eq!(app.cad.call_service_calls(), 1);
    assert_eq!(app.cad.geofence_calls(), 2);
}

#[tokio::test]
async fn test_refresh_replaces_cached_record() {
    let app = TestApp::new(FakeCad::with_record());
    app.get(&guest_uri()).await;

    if let Some(record) = app.cad.record.lock().unwrap().as_mut() {
        record.call_status = Some("Arrived".to_string());
    }

    let (status, body) = app
        .post(
            "/webhooks/cad/cache/call-service/refresh",
            json!({"tenant": "pm", "guestShareId": 42, "token": TOKEN, "callServiceGUID": "cs-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], true);

    let (_, view) = app.get(&guest_uri()).await;
    assert_eq!(view["callService"]["call_status"], "Arrived");
    assert_eq!(app.cad.call_service_calls(), 2);
}

#[tokio::test]
async fn test_refresh_upstream_failure_is_server_error() {
    let app = TestApp::new(FakeCad::with_record());
    app.cad.fail.store(true, Ordering::SeqCst);

    let (status, body) = app
        .post(
            "/webhooks/cad/cache/call-service/refresh",
            json!({"tenant": "pm", "guestShareId": 42, "token": TOKEN, "callServiceGUID": "cs-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to refresh cache");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_webhook_secret_is_enforced() {
    let app = TestApp::with_secret(FakeCad::with_record(), Some("s3cret"));
    let body = json!({"tenant": "pm", "regionId": 7});

    let (status, _) = app.post("/webhooks/cad/cache/geofence/clear", body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = json_request("/webhooks/cad/cache/geofence/clear", body.clone());
    request
        .headers_mut()
        .insert("x-webhook-secret", "wrong".parse().unwrap());
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = json_request("/webhooks/cad/cache/geofence/clear", body);
    request
        .headers_mut()
        .insert("x-webhook-secret", "s3cret".parse().unwrap());
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    // Guest routes stay open.
    let (status, _) = app.get(&guest_uri()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_location_update() {
    let app = TestApp::new(FakeCad::with_record());
    let body = json!({
        "tenant": "pm", "guestShareId": 42, "token": TOKEN,
        "latitude": 26.1, "longitude": -80.1, "accuracy": 12.5
    });

    let (status, response) = app.post("/api/guest/location", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);

    app.cad.location_accepted.store(false, Ordering::SeqCst);
    let (status, response) = app.post("/api/guest/location", body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["success"], false);
    assert_eq!(response["message"], "Failed to update location");
}

#[tokio::test]
async fn test_location_out_of_range_is_unprocessable() {
    let app = TestApp::new(FakeCad::with_record());

    let (status, body) = app
        .post(
            "/api/guest/location",
            json!({"tenant": "pm", "guestShareId": 42, "token": TOKEN, "latitude": 95.0, "longitude": 0.0}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "latitude");
}

#[tokio::test]
async fn test_guest_logger() {
    let app = TestApp::new(FakeCad::default());

    let (status, body) = app
        .post(
            "/api/guest/logger",
            json!({"level": "warning", "message": "map failed to load", "context": {"token": TOKEN}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Log recorded successfully");
}

#[tokio::test]
async fn test_event_stream_delivers_matching_events() {
    let app = TestApp::new(FakeCad::with_record());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/guest/events?tenant=pm&id=42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let tenant = Tenant::parse("pm").unwrap();
    app.events.publish(CadEvent::GeofencesUpdated {
        tenant: tenant.clone(),
        region: 99,
    });
    app.events.publish(CadEvent::GuestShareUpdated {
        tenant,
        guest_share_id: 42,
        token_hash: ShareToken::new(TOKEN).hashed(),
    });

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("event within timeout")
        .expect("stream open")
        .expect("frame");
    let data = frame.into_data().expect("data frame");
    let text = String::from_utf8(data.to_vec()).unwrap();

    assert!(text.contains("event: guest-share.updated"));
    assert!(!text.contains("geofences"));
    assert!(!text.contains(TOKEN));
}
