use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::state::AppState;

/// POST /api/applications/process
///
/// Screens a batch of applications against their job postings and returns the
/// ones that match. An empty result is reported as `NO_MATCHING_APPLICATIONS`.
pub async fn handle_process_applications(
    user: AuthUser,
    State(state): State<AppState>,
    Json(applications): Json<Vec<Application>>,
) -> Result<Json<Vec<Application>>, AppError> {
    if applications.is_empty() {
        return Err(AppError::Validation(
            "at least one application is required".to_string(),
        ));
    }

    tracing::info!(
        user_id = %user.user_id,
        batch_size = applications.len(),
        "screening application batch"
    );

    let accepted = state.matcher.process_applications(applications).await;
    if accepted.is_empty() {
        return Err(AppError::NoMatches);
    }

    Ok(Json(accepted))
}
