//! In-process admin API driven through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use ipacl_store::actors::ConfiguredActors;
use ipacl_store::config::{AdminBlock, FailurePolicy};
use ipacl_store::db::Database;
use ipacl_store::http::{self, AdmissionGate, AppState};
use ipacl_store::security::Admission;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

/// Admin API over an isolated database.
pub struct TestApi {
    pub db: Database,
    router: Router,
}

impl TestApi {
    /// Router without an admission gate, over an in-memory store.
    pub async fn new() -> Self {
        let db = Database::new(":memory:").await.expect("open database");
        Self::with_db(db, None)
    }

    /// Router gated by admission with the given policy.
    pub async fn gated(policy: FailurePolicy) -> Self {
        let db = Database::new(":memory:").await.expect("open database");
        Self::with_db(db, Some(policy))
    }

    pub fn with_db(db: Database, policy: Option<FailurePolicy>) -> Self {
        let actors = ConfiguredActors::from_blocks(&[AdminBlock {
            id: "admin-1".to_string(),
            name: Some("Alice Admin".to_string()),
        }]);
        let state = AppState {
            db: db.clone(),
            actors: Arc::new(actors),
            sweep_batch_size: 100,
        };
        let gate = policy.map(|policy| {
            Arc::new(AdmissionGate {
                admission: Admission::new(db.clone(), policy),
                trust_forwarded_for: false,
            })
        });
        Self {
            db,
            router: http::router(state, gate),
        }
    }

    /// Send a request from `198.51.100.77` and return status and JSON body.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_from("198.51.100.77", method, uri, body).await
    }

    /// Send a request with the given peer address.
    pub async fn send_from(
        &self,
        peer: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let mut req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let addr = SocketAddr::new(peer.parse().unwrap(), 50000);
        req.extensions_mut().insert(ConnectInfo(addr));

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
