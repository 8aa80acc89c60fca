use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::auth::{validate_token, KIND_ACCESS};
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::database::users;
use crate::error::ApiError;
use crate::roles::Role;

/// Request identity extracted by `identity_middleware`: the authenticated
/// user row, or None for anonymous callers.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn role(&self) -> Role {
        Role::classify(self.0.as_ref())
    }

    /// The authenticated user, or 401 for anonymous callers.
    pub fn require(&self) -> Result<&User, ApiError> {
        self.0
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}

/// Resolves the caller's identity and injects it into request extensions.
/// A missing Authorization header is an anonymous request; a present but
/// invalid token is rejected outright.
pub async fn identity_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match bearer_token(&headers)? {
        None => CurrentUser(None),
        Some(token) => {
            let claims = validate_token(&token, KIND_ACCESS)
                .map_err(|e| ApiError::unauthorized(e.to_string()))?;
            let pool = DatabaseManager::pool().await?;
            match users::fetch_by_id(&pool, claims.sub).await? {
                Some(user) => CurrentUser(Some(user)),
                None => return Err(ApiError::unauthorized("Token subject no longer exists")),
            }
        }
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extract a Bearer token from the Authorization header, if any.
fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get("authorization") else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.to_string())),
        Some(_) => Err(ApiError::unauthorized("Empty bearer token")),
        None => Err(ApiError::unauthorized(
            "Authorization header must use Bearer token format",
        )),
    }
}
