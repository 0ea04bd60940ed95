#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for registration, login, logout and session state.
//!
//! These tests use the REAL server code - no mocks, no reimplementations.
//! They require a running PostgreSQL (see docker-compose.yml).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

mod common;
use common::{extract_cookies, response_json, run_test, shared_app, unique_id};

// =============================================================================
// Health Check Tests
// =============================================================================

#[test]
fn health_check_returns_healthy() {
    run_test(async {
        let app = shared_app().await;

        let response = app
            .request(Request::get("/health").body(Body::empty()).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["postgres"], true);
    });
}

// =============================================================================
// Registration Tests
// =============================================================================

#[test]
fn register_creates_account_and_session() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("register_{}@test.com", unique_id());

        let response = app
            .request(
                Request::post("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Pat Tester",
                            "email": email,
                            "password": "secret123"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let cookies = extract_cookies(&response);
        assert!(!cookies.is_empty(), "Registration should start a session");

        let body = response_json(response).await;
        assert_eq!(body["message"], "Registered successfully.");
        assert_eq!(body["user"]["name"], "Pat Tester");
        assert_eq!(body["user"]["email"], email);
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"]["id"].is_string());
        assert!(
            body["user"].get("password").is_none(),
            "Password hash must never be serialized"
        );

        // The session cookie from registration is immediately usable.
        let response = app
            .request_with_cookies(
                Request::get("/api/auth/me").body(Body::empty()).unwrap(),
                &cookies,
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["user"]["email"], email);
    });
}

#[test]
fn register_normalizes_name_and_email() {
    run_test(async {
        let app = shared_app().await;
        let id = unique_id();

        let response = app
            .request(
                Request::post("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "  Casey  ",
                            "email": format!("  MiXeD_{id}@Test.COM  "),
                            "password": "secret123"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response_json(response).await;
        assert_eq!(body["user"]["name"], "Casey");
        assert_eq!(body["user"]["email"], format!("mixed_{id}@test.com"));
    });
}

#[test]
fn register_with_missing_fields_returns_400() {
    run_test(async {
        let app = shared_app().await;

        for payload in [
            json!({}),
            json!({ "name": "No Email", "password": "secret123" }),
            json!({ "name": "  ", "email": "blank@test.com", "password": "secret123" }),
        ] {
            let response = app
                .request(
                    Request::post("/api/auth/register")
                        .header("content-type", "application/json")
                        .body(Body::from(payload.to_string()))
                        .unwrap(),
                )
                .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = response_json(response).await;
            assert_eq!(body["error"], "Name, email and password are required.");
        }
    });
}

#[test]
fn register_with_invalid_email_returns_400() {
    run_test(async {
        let app = shared_app().await;

        for email in ["not-an-email", "a@b", "two words@test.com"] {
            let response = app
                .request(
                    Request::post("/api/auth/register")
                        .header("content-type", "application/json")
                        .body(Body::from(
                            json!({
                                "name": "Bad Email",
                                "email": email,
                                "password": "secret123"
                            })
                            .to_string(),
                        ))
                        .unwrap(),
                )
                .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "email: {email}");
            let body = response_json(response).await;
            assert_eq!(body["error"], "Invalid email address.");
        }
    });
}

#[test]
fn register_with_duplicate_email_returns_409() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("dupe_{}@test.com", unique_id());

        let response = app
            .request(
                Request::post("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "name": "First", "email": email, "password": "secret123" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Same address with different case still collides.
        let response = app
            .request(
                Request::post("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Second",
                            "email": email.to_uppercase(),
                            "password": "secret123"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = response_json(response).await;
        assert_eq!(body["error"], "Email already exists.");
    });
}

// =============================================================================
// Login Tests
// =============================================================================

#[test]
fn login_with_valid_credentials_returns_success() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("login_ok_{}@test.com", unique_id());
        app.create_test_user("Login Ok", "testpass123", &email).await;

        let response = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "email": email, "password": "testpass123" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = extract_cookies(&response);
        assert!(!cookies.is_empty(), "Login should start a session");

        let body = response_json(response).await;
        assert_eq!(body["message"], "Logged in.");
        assert_eq!(body["user"]["email"], email);
    });
}

#[test]
fn login_email_is_case_insensitive() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("login_case_{}@test.com", unique_id());
        app.create_test_user("Login Case", "testpass123", &email).await;

        let response = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "email": email.to_uppercase(), "password": "testpass123" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    });
}

#[test]
fn login_failures_are_indistinguishable() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("login_fail_{}@test.com", unique_id());
        app.create_test_user("Login Fail", "rightpass", &email).await;

        let wrong_password = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "email": email, "password": "wrongpass" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

        let unknown_email = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "email": format!("nobody_{}@test.com", unique_id()),
                            "password": "rightpass"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

        // Same body for both failure modes, so callers learn nothing about
        // which addresses exist.
        let body_wrong = response_json(wrong_password).await;
        let body_unknown = response_json(unknown_email).await;
        assert_eq!(body_wrong, body_unknown);
        assert_eq!(body_wrong["error"], "Invalid credentials.");
    });
}

#[test]
fn login_with_missing_fields_returns_400() {
    run_test(async {
        let app = shared_app().await;

        let response = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({}).to_string()))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["error"], "Email and password are required.");
    });
}

#[test]
fn login_password_is_not_trimmed() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("login_trim_{}@test.com", unique_id());

        // Registration trims the password before hashing.
        let response = app
            .request(
                Request::post("/api/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Trim Test",
                            "email": email,
                            "password": "  padded  "
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // The trimmed form logs in.
        let response = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "email": email, "password": "padded" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        // The padded form is compared verbatim and fails.
        let response = app
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "email": email, "password": "  padded  " }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    });
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn me_without_session_returns_null_user() {
    run_test(async {
        let app = shared_app().await;

        let response = app
            .request(Request::get("/api/auth/me").body(Body::empty()).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert!(body["user"].is_null());
    });
}

#[test]
fn logout_clears_session() {
    run_test(async {
        let app = shared_app().await;
        let email = format!("logout_{}@test.com", unique_id());
        let cookies = app
            .create_and_login_user("Logout Test", "testpass123", &email)
            .await;

        let response = app
            .request_with_cookies(
                Request::post("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
                &cookies,
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["message"], "Logged out.");

        // The old cookie no longer resolves to a user.
        let response = app
            .request_with_cookies(
                Request::get("/api/auth/me").body(Body::empty()).unwrap(),
                &cookies,
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert!(body["user"].is_null());
    });
}

#[test]
fn logout_without_session_is_ok() {
    run_test(async {
        let app = shared_app().await;

        let response = app
            .request(
                Request::post("/api/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["message"], "Logged out.");
    });
}
