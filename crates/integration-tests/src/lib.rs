//! Integration test harness for the catalog back-office.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the in-memory store
//! cargo test -p backoffice-integration-tests
//!
//! # PostgreSQL tests (needs a disposable database)
//! DATABASE_URL=postgres://... cargo test -p backoffice-integration-tests -- --ignored
//! ```
//!
//! [`TestContext`] drives the complete router, session layer included,
//! without binding a socket.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_sessions::cookie::Key;

use backoffice_admin::db::{self, MemoryStore, Store};
use backoffice_admin::middleware::session_layer;
use backoffice_admin::models::AdminForm;
use backoffice_admin::routes;
use backoffice_admin::services::access::{REFERENCE_PERMISSIONS, REFERENCE_ROLES};
use backoffice_admin::services::{Actor, AdminService};
use backoffice_admin::state::AppState;
use backoffice_core::RoleId;

/// Login identifier of the seeded super admin.
pub const ROOT_USER_ID: &str = "root";
/// Password of the seeded super admin.
pub const ROOT_PASSWORD: &str = "root-password-1";

/// A store with the reference roles and permissions and one super admin.
pub async fn seeded_memory_store() -> MemoryStore {
    let store = MemoryStore::with_grants(REFERENCE_ROLES, REFERENCE_PERMISSIONS);
    AdminService::new(&store)
        .create(
            &Actor::system(),
            &AdminForm {
                user_id: Some(ROOT_USER_ID.to_owned()),
                user_name: Some("Root".to_owned()),
                password: Some(ROOT_PASSWORD.to_owned()),
                roles: vec![RoleId::new(1)],
                ..AdminForm::default()
            },
        )
        .await
        .unwrap();
    store.clear_journal();
    store
}

/// Migrated pool for `DATABASE_URL`, or `None` when it is unset.
pub async fn postgres_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    sqlx::migrate!("../admin/migrations").run(&pool).await.unwrap();
    Some(pool)
}

/// The full router over a store, plus request helpers.
pub struct TestContext<S> {
    pub store: S,
    router: Router,
}

impl TestContext<MemoryStore> {
    /// Router over [`seeded_memory_store`].
    pub async fn memory() -> Self {
        Self::new(seeded_memory_store().await)
    }
}

impl<S: Store> TestContext<S> {
    pub fn new(store: S) -> Self {
        let router = routes::routes::<S>()
            .with_state(AppState::new(store.clone(), 10))
            .layer(session_layer(
                tower_sessions::MemoryStore::default(),
                false,
                Key::generate(),
            ));
        Self { store, router }
    }

    /// Log in and return the `Cookie` header for later requests.
    pub async fn login(&self, user_id: &str, password: &str) -> Option<String> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "userId": user_id, "password": password }).to_string(),
            ))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        if response.status() != StatusCode::OK {
            return None;
        }
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
    }

    pub async fn login_as_root(&self) -> String {
        self.login(ROOT_USER_ID, ROOT_PASSWORD).await.unwrap()
    }

    /// Send a request and decode the JSON response (`Null` for empty bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(cookie), Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(cookie), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(cookie), None).await
    }
}

/// Field names listed in a 422 body, in order.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
