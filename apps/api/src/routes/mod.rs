pub mod health;

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::companies::handlers as companies;
use crate::errors::AppError;
use crate::jobs::handlers as jobs;
use crate::matching::handlers as matching;
use crate::state::AppState;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/signup", post(users::handle_signup))
        .route("/api/login", post(users::handle_login))
        // Companies
        .route(
            "/api/companies",
            post(companies::handle_create_company).get(companies::handle_list_companies),
        )
        .route("/api/companies/:id", get(companies::handle_get_company))
        // Jobs
        .route(
            "/api/companies/:id/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_company_jobs),
        )
        .route("/api/jobs", get(jobs::handle_list_jobs))
        .route("/api/jobs/:id", get(jobs::handle_get_job))
        // Screening
        .route(
            "/api/applications/process",
            post(matching::handle_process_applications),
        )
        .with_state(state);

    recover_panics(router)
}

/// Turns a panicking handler into a 500 response instead of a dropped connection.
fn recover_panics(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
