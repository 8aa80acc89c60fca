use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_token, validate_token, verify_password, Claims, KIND_REFRESH};
use crate::database::manager::DatabaseManager;
use crate::database::users;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ObtainRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// POST /tokens/obtain/ - exchange credentials for an access/refresh pair
pub async fn obtain(Json(body): Json<ObtainRequest>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let user = users::fetch_by_email(&pool, &body.email)
        .await?
        .filter(|u| verify_password(&body.password, &u.password_digest))
        .ok_or_else(|| {
            ApiError::unauthorized("No active account found with the given credentials")
        })?;

    let access = generate_token(&Claims::access(user.id))?;
    let refresh = generate_token(&Claims::refresh(user.id))?;
    Ok(Json(json!({
        "success": true,
        "data": { "access": access, "refresh": refresh }
    })))
}

/// POST /tokens/refresh/ - exchange a refresh token for a new access token
pub async fn refresh(Json(body): Json<RefreshRequest>) -> Result<Json<Value>, ApiError> {
    let claims = validate_token(&body.refresh, KIND_REFRESH)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let access = generate_token(&Claims::access(claims.sub))?;
    Ok(Json(json!({
        "success": true,
        "data": { "access": access }
    })))
}
