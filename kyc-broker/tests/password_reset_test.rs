//! Password reset by re-scanning the document

mod common;

use common::{create_test_server, SAMPLE_LOGIN_KEY, SAMPLE_PASSWORD, SAMPLE_QR};
use serde_json::{json, Value};

#[tokio::test]
async fn test_reset_with_known_document() {
    let server = create_test_server();
    common::register_sample_user(&server).await;

    let response = server
        .post("/auth/password-reset")
        .json(&json!({ "qr_data": SAMPLE_QR }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["login_key"], SAMPLE_LOGIN_KEY);
    assert_eq!(body["password_hint"], "ROHI******");
    // Plaintext is never echoed back
    assert!(!body.to_string().contains(SAMPLE_PASSWORD));

    // The re-derived credential still authenticates
    let response = server
        .post("/auth/login")
        .json(&json!({ "login_key": SAMPLE_LOGIN_KEY, "password": SAMPLE_PASSWORD }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_reset_for_unregistered_document_is_404() {
    let server = create_test_server();

    let response = server
        .post("/auth/password-reset")
        .json(&json!({ "qr_data": SAMPLE_QR }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_reset_with_unreadable_payload_is_400() {
    let server = create_test_server();
    common::register_sample_user(&server).await;

    let response = server
        .post("/auth/password-reset")
        .json(&json!({ "qr_data": "%%%%%%" }))
        .await;
    response.assert_status_bad_request();
}
