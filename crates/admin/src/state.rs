//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Store;
use crate::models::page::DEFAULT_PER_PAGE;

/// Application state shared across all handlers.
///
/// Generic over the store so the same router serves `PgStore` in production
/// and `MemoryStore` in tests.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    page_size: u32,
}

impl<S: Store> AppState<S> {
    #[must_use]
    pub fn new(store: S, page_size: u32) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, page_size }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Rows per page when a list request does not specify one.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }
}

impl<S: Store + Default> Default for AppState<S> {
    fn default() -> Self {
        Self::new(S::default(), DEFAULT_PER_PAGE)
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
