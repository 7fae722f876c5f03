use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::companies::repository::{create_company, get_all_companies, get_company};
use crate::errors::AppError;
use crate::models::company::{Company, NewCompany};
use crate::state::AppState;

/// POST /api/companies
pub async fn handle_create_company(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<NewCompany>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    if request.company_name.trim().is_empty() {
        return Err(AppError::Validation(
            "companyName cannot be empty".to_string(),
        ));
    }

    let company = create_company(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/companies/:id
pub async fn handle_get_company(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(company_id): Path<i64>,
) -> Result<Json<Company>, AppError> {
    let company = get_company(&state.db, company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {company_id} not found")))?;
    Ok(Json(company))
}

/// GET /api/companies
pub async fn handle_list_companies(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(get_all_companies(&state.db).await?))
}
