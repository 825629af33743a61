//! In-process router harness for handler tests.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::cookie::Key;

use backoffice_core::RoleId;

use crate::db::MemoryStore;
use crate::middleware::session_layer;
use crate::models::AdminForm;
use crate::services::access::{REFERENCE_PERMISSIONS, REFERENCE_ROLES};
use crate::services::{Actor, AdminService};
use crate::state::AppState;

pub const ROOT_USER_ID: &str = "root";
pub const ROOT_PASSWORD: &str = "root-password-1";

/// Full router over a seeded in-memory store with one super admin.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub async fn new() -> Self {
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

        let router = super::routes::<MemoryStore>()
            .with_state(AppState::new(store.clone(), 10))
            .layer(session_layer(
                tower_sessions::MemoryStore::default(),
                false,
                Key::generate(),
            ));

        Self { router, store }
    }

    /// Log in and return the `Cookie` header value for later requests.
    pub async fn login(&self, user_id: &str, password: &str) -> Option<String> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "userId": user_id, "password": password }).to_string(),
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
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, cookie, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, cookie, None).await
    }
}
