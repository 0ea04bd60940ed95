#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! This module provides test infrastructure that uses the REAL server code,
//! not mock implementations. This ensures tests verify actual behavior.
//!
//! A single [`TestApp`] instance is shared across all tests via [`shared_app`]
//! so every test binary opens one connection pool against the test database.
//!
//! ## Runtime Safety
//!
//! The shared `TestApp` is initialized on a long-lived, multi-threaded Tokio
//! runtime that outlives any individual test. All tests run on that runtime
//! via [`run_test`], so no pool connection is ever tied to a runtime that
//! shuts down mid-suite.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use officina_server::models::Role;
use officina_server::{AppState, Config, routes, session};

/// Shared Tokio runtime that outlives all individual test runtimes.
///
/// PgPool connections need an active I/O driver. By keeping this runtime
/// alive for the entire test binary, the shared `TestApp`'s connections
/// remain valid across all tests.
pub static SHARED_RT: std::sync::LazyLock<tokio::runtime::Runtime> =
    std::sync::LazyLock::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to build shared test runtime")
    });

/// Global shared test app, initialized once on the shared runtime and reused
/// by every test.
static SHARED_APP: std::sync::OnceLock<TestApp> = std::sync::OnceLock::new();

/// Get a reference to the shared [`TestApp`].
///
/// The app is lazily initialized on first call and reused thereafter.
/// Initialization runs on a dedicated multi-thread Tokio runtime (via
/// `SHARED_RT`) so that async resources survive across tests.
pub async fn shared_app() -> &'static TestApp {
    SHARED_APP.get_or_init(|| {
        // Use the shared runtime's handle to initialize inside a
        // separate OS thread (avoiding nested block_on).
        let handle = SHARED_RT.handle().clone();
        std::thread::spawn(move || handle.block_on(TestApp::new()))
            .join()
            .expect("TestApp init thread panicked")
    })
}

/// Run an async test body on [`SHARED_RT`].
///
/// Using a single runtime for all tests prevents the "Tokio context is being
/// shutdown" error that occurs when PgPool connections opened on one test
/// runtime are reused by another after the first shuts down.
pub fn run_test<F: std::future::Future<Output = ()> + Send>(f: F) {
    SHARED_RT.block_on(f);
}

/// Test application wrapper using the REAL server routes and state.
pub struct TestApp {
    router: Router,
    pub db: PgPool,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with full server initialization.
    pub async fn new() -> Self {
        // Load test environment
        dotenvy::dotenv().ok();

        // Tests run concurrently, so bump the default pool size to keep
        // slow tests from starving others of connections.
        if std::env::var("DATABASE_MAX_CONNECTIONS").is_err() {
            // SAFETY: set before the runtime spawns worker threads that read it
            unsafe { std::env::set_var("DATABASE_MAX_CONNECTIONS", "25") };
        }

        // Create config from environment
        let config = Config::from_env().expect("Failed to load config");

        // Initialize the REAL AppState (database pool, migrations)
        let state = AppState::new(&config)
            .await
            .expect("Failed to initialize AppState");

        let db = state.db().clone();

        // Create session layer
        let session_layer = session::create_session_layer(
            db.clone(),
            tower_sessions::cookie::SameSite::Strict,
        )
        .await
        .expect("Failed to create session layer");

        // Build the REAL router with all server routes (must match main.rs)
        let router = Router::new()
            .merge(routes::auth::router())
            .merge(routes::site::router())
            .merge(routes::template::router())
            .merge(routes::page::router())
            .merge(routes::post::router())
            .merge(routes::admin::router())
            .merge(routes::health::router())
            .layer(session_layer)
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(state.clone());

        // Note: no global cleanup here because it interferes with parallel
        // tests. Each test uses unique identifiers for its own data.

        Self { router, db, state }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with cookies from a previous response.
    pub async fn request_with_cookies(
        &self,
        mut request: Request<Body>,
        cookies: &str,
    ) -> Response {
        if !cookies.is_empty() {
            request.headers_mut().insert(
                header::COOKIE,
                cookies.parse().expect("Invalid cookie header"),
            );
        }
        self.request(request).await
    }

    /// Login via the JSON API and return session cookies.
    ///
    /// # Panics
    ///
    /// Panics if the login response is not 200 OK.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Request::post("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "email": email,
                            "password": password
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Login failed for '{email}' (status {})",
            response.status()
        );

        extract_cookies(&response)
    }

    /// Create a test user and return session cookies after logging in.
    pub async fn create_and_login_user(
        &self,
        name: &str,
        password: &str,
        email: &str,
    ) -> String {
        self.create_test_user(name, password, email).await;
        self.login(email, password).await
    }

    /// Create a test admin user and return session cookies after logging in.
    pub async fn create_and_login_admin(
        &self,
        name: &str,
        password: &str,
        email: &str,
    ) -> String {
        self.create_test_admin(name, password, email).await;
        self.login(email, password).await
    }

    /// Create a test admin user directly in the database, returning its id.
    pub async fn create_test_admin(&self, name: &str, password: &str, email: &str) -> Uuid {
        self.create_test_user_inner(name, password, email, Role::Admin)
            .await
    }

    /// Create a test user directly in the database, returning its id.
    pub async fn create_test_user(&self, name: &str, password: &str, email: &str) -> Uuid {
        self.create_test_user_inner(name, password, email, Role::User)
            .await
    }

    /// Create a site through the API and return its JSON representation.
    ///
    /// The slug is derived from the name by the server, so callers that need
    /// a unique site should pass a unique name.
    pub async fn create_site(&self, admin_cookies: &str, name: &str) -> Value {
        let response = self
            .request_with_cookies(
                Request::post("/api/sites")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({ "name": name }).to_string(),
                    ))
                    .unwrap(),
                admin_cookies,
            )
            .await;

        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "Failed to create site '{name}'"
        );

        let mut body = response_json(response).await;
        body["site"].take()
    }

    async fn create_test_user_inner(
        &self,
        name: &str,
        password: &str,
        email: &str,
        role: Role,
    ) -> Uuid {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        // Minimal Argon2 params for test speed. Production uses the crate
        // defaults, which are too slow for dozens of test users.
        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let params = argon2::Params::new(
                4 * 1024, // 4 MiB
                1,        // 1 iteration
                1,        // 1 lane
                None,
            )
            .expect("test Argon2 params are valid");
            let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .expect("Failed to hash password")
                .to_string()
        })
        .await
        .expect("Argon2 hashing task panicked");

        let id = Uuid::now_v7();

        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (id, name, email, password, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ((LOWER(email))) DO UPDATE SET password = $4, role = $5
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.db)
        .await
        .expect("Failed to create test user")
    }
}

/// Extract Set-Cookie headers from a response for use in subsequent requests.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Read a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}

/// Read a response body as text.
pub async fn response_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&body).to_string()
}

/// A short unique suffix for test identifiers, so parallel tests and repeat
/// runs never collide on unique columns.
pub fn unique_id() -> String {
    let id = Uuid::now_v7().simple().to_string();
    id[..12].to_string()
}
