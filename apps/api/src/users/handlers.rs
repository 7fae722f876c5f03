use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthError;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::user::{LoginRequest, LoginResponse, SignupRequest, User};
use crate::state::AppState;
use crate::users::repository::{create_user, find_user_by_email};

/// POST /api/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validate_signup(&request)?;

    let password_hash = hash_password(request.password).await?;
    let email = request.email.trim().to_lowercase();

    let user = create_user(&state.db, request.username.trim(), &email, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("An account for {email} already exists"))
            } else {
                AppError::Database(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "emailID and password are required".to_string(),
        ));
    }

    let email = request.email.trim().to_lowercase();
    let user = find_user_by_email(&state.db, &email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.generate_token(&user.id.to_string())?;
    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse { token }))
}

fn validate_signup(request: &SignupRequest) -> Result<(), AppError> {
    if request.username.trim().is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "emailID must be a valid email address".to_string(),
        ));
    }
    if request.password.trim().is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_signup() {
        assert!(validate_signup(&signup("asha", "asha@example.com", "pw")).is_ok());
    }

    #[test]
    fn test_signup_requires_every_field() {
        assert!(validate_signup(&signup(" ", "asha@example.com", "pw")).is_err());
        assert!(validate_signup(&signup("asha", "not-an-email", "pw")).is_err());
        assert!(validate_signup(&signup("asha", "asha@example.com", "   ")).is_err());
    }
}
