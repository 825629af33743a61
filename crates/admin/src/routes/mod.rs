//! HTTP route handlers for the back-office JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! GET    /health/ready            - Readiness (store ping)
//!
//! # Auth
//! POST   /auth/login              - Password login
//! POST   /auth/logout             - Logout
//! GET    /auth/me                 - Current admin
//!
//! # Admins (admin.manage)
//! GET    /admins                  - List (page, per_page, keyword)
//! POST   /admins                  - Create
//! GET    /admins/{id}             - Detail with roles and permissions
//! PUT    /admins/{id}             - Edit
//! DELETE /admins/{id}             - Delete (hard)
//! PUT    /admins/{id}/grants      - Replace roles and permissions
//! GET    /roles                   - All roles
//! GET    /permissions             - All permissions
//!
//! # Catalog (category.manage, brand.manage, item.manage)
//! GET    /categories | POST /categories | GET/PUT/DELETE /categories/{id}
//! GET    /brands     | POST /brands     | GET/PUT/DELETE /brands/{id}
//! GET    /items      | POST /items      | GET/PUT/DELETE /items/{id}
//! ```

pub mod admins;
pub mod auth;
pub mod brands;
pub mod categories;
pub mod health;
pub mod items;

#[cfg(test)]
pub(crate) mod testing;

use axum::Router;
use serde::Deserialize;

use crate::db::Store;
use crate::models::PageRequest;
use crate::state::AppState;

/// Build the complete router.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(admins::router())
        .merge(categories::router())
        .merge(brands::router())
        .merge(items::router())
}

/// Query string accepted by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Admin list only: matched against login identifier and display name.
    pub keyword: Option<String>,
}

impl ListQuery {
    /// Page request, falling back to the configured page size.
    #[must_use]
    pub fn page_request(&self, default_per_page: u32) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(default_per_page),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let req = ListQuery::default().page_request(10);
        assert_eq!(req.page(), 1);
        assert_eq!(req.per_page(), 10);
    }

    #[test]
    fn test_list_query_clamps() {
        let query = ListQuery {
            page: Some(0),
            per_page: Some(500),
            keyword: None,
        };
        let req = query.page_request(10);
        assert_eq!(req.page(), 1);
        assert_eq!(req.per_page(), 100);
    }
}
