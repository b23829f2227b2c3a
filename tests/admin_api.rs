//! Admin API end-to-end tests over an in-process router.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestApi;
use ipacl_store::config::FailurePolicy;
use ipacl_store::db::BlockOptions;
use serde_json::json;

#[tokio::test]
async fn block_lifecycle() {
    let api = TestApi::new().await;

    let (status, body) = api
        .send(
            Method::POST,
            "/api/v1/blocks",
            Some(json!({"ip": "203.0.113.5", "reason": "abuse", "created_by": "admin-1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ip_address"], "203.0.113.5");
    assert_eq!(body["reason"], "abuse");
    assert_eq!(body["created_by"], "admin-1");
    assert_eq!(body["created_by_name"], "Alice Admin");
    assert_eq!(body["active"], true);
    assert!(body["expires_at"].is_null());

    let (status, body) = api
        .send(Method::POST, "/api/v1/blocks", Some(json!({"ip": "203.0.113.5"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_BLOCK");

    let (status, body) = api.send(Method::GET, "/api/v1/check/203.0.113.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked"], true);

    let (status, body) = api
        .send(
            Method::PATCH,
            "/api/v1/blocks/203.0.113.5",
            Some(json!({"reason": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reason"].is_null());

    let (status, body) = api.send(Method::DELETE, "/api/v1/blocks/203.0.113.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);

    let (_, body) = api.send(Method::DELETE, "/api/v1/blocks/203.0.113.5", None).await;
    assert_eq!(body["removed"], false);

    let (status, body) = api.send(Method::GET, "/api/v1/blocks/203.0.113.5", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "BLOCK_NOT_FOUND");

    let (_, body) = api.send(Method::GET, "/api/v1/check/203.0.113.5", None).await;
    assert_eq!(body["blocked"], false);
}

#[tokio::test]
async fn malformed_input_is_rejected() {
    let api = TestApi::new().await;

    let (status, body) = api
        .send(Method::POST, "/api/v1/blocks", Some(json!({"ip": "999.1.1.1"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ADDRESS");

    let (status, body) = api.send(Method::GET, "/api/v1/check/not-an-ip", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ADDRESS");

    let past = Utc::now() - Duration::hours(1);
    let (status, body) = api
        .send(
            Method::POST,
            "/api/v1/blocks",
            Some(json!({"ip": "203.0.113.6", "expires_at": past})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = api
        .send(
            Method::POST,
            "/api/v1/blocks",
            Some(json!({"ip": "192.0.2.1", "expires_in_secs": 9_000_000_000_000_000i64})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = api
        .send(
            Method::PUT,
            "/api/v1/blocks/192.0.2.1",
            Some(json!({"expires_in_secs": 9_000_000_000_000_000i64})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api.send(Method::GET, "/api/v1/blocks?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = api
        .send(
            Method::PATCH,
            "/api/v1/blocks/203.0.113.99",
            Some(json!({"reason": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "BLOCK_NOT_FOUND");
}

#[tokio::test]
async fn list_filters_by_status() {
    let api = TestApi::new().await;
    let repo = api.db.blocks();
    let t = Utc::now() - Duration::minutes(10);

    repo.block_at(
        "192.0.2.1",
        BlockOptions::default().expires_at(t + Duration::minutes(1)),
        t,
    )
    .await
    .unwrap();
    repo.block("192.0.2.2", BlockOptions::default()).await.unwrap();
    repo.block(
        "192.0.2.3",
        BlockOptions::default().expires_in(Duration::hours(1)),
    )
    .await
    .unwrap();

    let (status, body) = api.send(Method::GET, "/api/v1/blocks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = api.send(Method::GET, "/api/v1/blocks?status=active", None).await;
    let active: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["ip_address"].as_str().unwrap())
        .collect();
    assert_eq!(active.len(), 2);
    assert!(!active.contains(&"192.0.2.1"));

    let (_, body) = api.send(Method::GET, "/api/v1/blocks?status=expired", None).await;
    let expired = body.as_array().unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0]["ip_address"], "192.0.2.1");
    assert_eq!(expired[0]["active"], false);

    let (_, body) = api.send(Method::GET, "/api/v1/blocks?limit=1&offset=1", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = api.send(Method::POST, "/api/v1/sweep", None).await;
    assert_eq!(body["removed"], 1);
    let (_, body) = api.send(Method::POST, "/api/v1/sweep", None).await;
    assert_eq!(body["removed"], 0);
}

#[tokio::test]
async fn replace_and_relative_expiry() {
    let api = TestApi::new().await;

    let (status, body) = api
        .send(
            Method::PUT,
            "/api/v1/blocks/2001:db8::7",
            Some(json!({"reason": "first", "expires_in_secs": 600})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ip_address"], "2001:db8::7");
    let id = body["id"].clone();
    assert!(body["expires_at"].is_string());

    let (status, body) = api
        .send(
            Method::PUT,
            "/api/v1/blocks/2001:0db8:0000:0000:0000:0000:0000:0007",
            Some(json!({"reason": "second"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["reason"], "second");
    assert!(body["expires_at"].is_null());

    let (status, _) = api
        .send(
            Method::PUT,
            "/api/v1/blocks/2001:db8::7",
            Some(json!({"expires_at": Utc::now() + Duration::hours(1), "expires_in_secs": 10})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admission_gate_protects_api() {
    let api = TestApi::gated(FailurePolicy::FailClosed).await;

    let (status, _) = api
        .send_from(
            "203.0.113.50",
            Method::POST,
            "/api/v1/blocks",
            Some(json!({"ip": "203.0.113.66"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = api
        .send_from("203.0.113.66", Method::GET, "/health", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ADDRESS_BLOCKED");

    let (status, _) = api
        .send_from("203.0.113.50", Method::GET, "/health", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let api = TestApi::new().await;
    api.db.close().await;

    let (status, body) = api.send(Method::GET, "/api/v1/check/192.0.2.1", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

    let (status, _) = api.send(Method::GET, "/api/v1/check/bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let gated = TestApi::gated(FailurePolicy::FailOpen).await;
    gated.db.close().await;
    let (status, _) = gated.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
