use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::companies::repository::get_company;
use crate::db::is_foreign_key_violation;
use crate::errors::AppError;
use crate::jobs::repository::{create_job, get_all_jobs, get_job, get_jobs_by_company};
use crate::models::job::{JobCreated, JobPosting, NewJob};
use crate::state::AppState;

/// POST /api/companies/:id/jobs
pub async fn handle_create_job(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
    Json(request): Json<NewJob>,
) -> Result<(StatusCode, Json<JobCreated>), AppError> {
    request.validate().map_err(AppError::Validation)?;

    if get_company(&state.db, company_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Company {company_id} not found")));
    }

    let created = create_job(&state.db, company_id, &request)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Validation("Job references an unknown reference id".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/companies/:id/jobs
pub async fn handle_list_company_jobs(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    if get_company(&state.db, company_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Company {company_id} not found")));
    }
    Ok(Json(get_jobs_by_company(&state.db, company_id).await?))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobPosting>, AppError> {
    let job = get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    Ok(Json(get_all_jobs(&state.db).await?))
}
