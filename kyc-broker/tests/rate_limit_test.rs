//! Rate limiting behavior at the HTTP boundary

mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::json;

const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

fn rate_limited_server() -> axum_test::TestServer {
    let config = kyc_broker::Config::default(); // rate limiting on
    common::create_test_server_with(config)
}

#[tokio::test]
async fn test_login_attempts_throttled_per_ip() {
    let server = rate_limited_server();

    for _ in 0..5 {
        let response = server
            .post("/auth/login")
            .add_header(FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"))
            .json(&json!({ "login_key": "ZZZZ", "password": "nope" }))
            .await;
        response.assert_status_unauthorized();
    }

    let response = server
        .post("/auth/login")
        .add_header(FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"))
        .json(&json!({ "login_key": "ZZZZ", "password": "nope" }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_other_callers_unaffected() {
    let server = rate_limited_server();

    for _ in 0..6 {
        server
            .post("/auth/login")
            .add_header(FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"))
            .json(&json!({ "login_key": "ZZZZ", "password": "nope" }))
            .await;
    }

    let response = server
        .post("/auth/login")
        .add_header(FORWARDED_FOR, HeaderValue::from_static("198.51.100.7"))
        .json(&json!({ "login_key": "ZZZZ", "password": "nope" }))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_toggle_disables_limiting() {
    let server = common::create_test_server();

    for _ in 0..10 {
        let response = server
            .post("/auth/login")
            .add_header(FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"))
            .json(&json!({ "login_key": "ZZZZ", "password": "nope" }))
            .await;
        response.assert_status_unauthorized();
    }
}
