use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::TokenAuthority;
use crate::matching::dispatcher::ApplicationMatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenAuthority>,
    /// Batch screening engine; owns the Redis-backed criteria cache.
    pub matcher: Arc<ApplicationMatcher>,
}

impl FromRef<AppState> for Arc<TokenAuthority> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
