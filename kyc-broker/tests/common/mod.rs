//! Common test utilities for broker integration tests

use std::sync::Arc;

use axum_test::TestServer;
use kyc_broker::{routes, AppState, Config, InMemoryAccountStore, InMemorySessionStore};
use serde_json::{json, Value};

/// Sample delimited document payload used across tests
pub const SAMPLE_QR: &str = "123456789012,Rohit Kumar,15/08/1995,M,12 MG Road,Chennai,600001";

/// Credentials derived from `SAMPLE_QR`
pub const SAMPLE_LOGIN_KEY: &str = "ROHI";
pub const SAMPLE_PASSWORD: &str = "ROHI150895";

pub fn test_config() -> Config {
    Config {
        rate_limiting: false,
        ..Config::default()
    }
}

/// Create a test server over in-memory stores
pub fn create_test_server() -> TestServer {
    create_test_server_with(test_config())
}

pub fn create_test_server_with(config: Config) -> TestServer {
    let sessions = Arc::new(InMemorySessionStore::new());
    let accounts = Arc::new(InMemoryAccountStore::new());
    let state = Arc::new(AppState::new(config, sessions, accounts));
    let app = routes::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Submit the sample document and complete registration, returning
/// the completion response body.
#[allow(dead_code)]
pub async fn register_sample_user(server: &TestServer) -> Value {
    let response = server
        .post("/kyc/qr")
        .json(&json!({ "qr_data": SAMPLE_QR }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let response = server
        .post("/kyc/complete")
        .json(&json!({ "session_id": session_id, "accept_terms": true }))
        .await;
    response.assert_status_ok();
    response.json()
}
