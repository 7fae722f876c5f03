use crate::auth::AuthError;

/// Hashes a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    hash_password_with_cost(password, bcrypt::DEFAULT_COST).await
}

pub async fn hash_password_with_cost(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Checks a password against a stored bcrypt hash.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}
