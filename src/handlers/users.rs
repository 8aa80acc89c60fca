use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::digest_password;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::database::users as users_db;
use crate::error::ApiError;
use crate::filter::{self, ListQuery};
use crate::guards::{SelfOrElevated, UserTarget};
use crate::middleware::CurrentUser;
use crate::services::deletion::{self, DeleteTarget};
use crate::views::{self, Mode, USERS_LIST, USER_DETAIL};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub personal_information: String,
    #[serde(default)]
    pub hide_private_info: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub screen_name: Option<String>,
    pub personal_information: Option<String>,
    pub hide_private_info: Option<bool>,
}

/// A password must be long enough and must not resemble the account's
/// username or email.
fn validate_password(password: &str, username: &str, email: &str) -> Result<(), ApiError> {
    if password.len() < 8 || password.len() > 250 {
        return Err(ApiError::invalid_argument(
            "password must be between 8 and 250 characters",
        ));
    }
    for (value, label) in [(username, "username"), (email, "email")] {
        if value.is_empty() {
            continue;
        }
        if password.contains(value) || value.contains(password) {
            return Err(ApiError::invalid_argument(format!(
                "Password is very close to {label}"
            )));
        }
    }
    Ok(())
}

fn map_unique_violation(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::invalid_argument(
                "A user with this email or username already exists.",
            );
        }
    }
    err.into()
}

/// GET /users/ - list users, role- and mode-gated
pub async fn list(
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let mode = USERS_LIST.resolve(current.role(), query.mode.as_deref())?;
    let limit = filter::parse_limit(query.limit.as_deref())?;
    let order = filter::apply_order(query.order.as_deref(), users_db::ORDERABLE)?;

    let pool = DatabaseManager::pool().await?;
    let rows = users_db::list(&pool, &order, limit).await?;
    let data: Vec<Value> = rows.iter().map(|u| views::users::project(u, mode)).collect();

    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /users/ - open registration; echoes the created record in default mode
pub async fn create(
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.email.is_empty() || !body.email.contains('@') {
        return Err(ApiError::invalid_argument("a valid <email> is required"));
    }
    if body.username.is_empty() {
        return Err(ApiError::invalid_argument("<username> can not be blank"));
    }
    validate_password(&body.password, &body.username, &body.email)?;

    let pool = DatabaseManager::pool().await?;
    let user = users_db::insert(
        &pool,
        &users_db::NewUser {
            email: body.email,
            username: body.username,
            password_digest: digest_password(&body.password),
            screen_name: body.screen_name,
            personal_information: body.personal_information,
            hide_private_info: body.hide_private_info,
            is_staff: false,
            is_superuser: false,
            is_support: false,
        },
    )
    .await
    .map_err(map_unique_violation)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": views::users::project(&user, Mode::Default) })),
    ))
}

async fn resolve_target(
    current: &CurrentUser,
    raw_id: &str,
) -> Result<(User, Mode), ApiError> {
    let caller = current.require()?;
    let target = UserTarget::parse(raw_id)?;
    let target_id = SelfOrElevated::resolve_detail(caller, current.role(), target)?;

    let pool = DatabaseManager::pool().await?;
    let user = users_db::fetch_by_id(&pool, target_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("User with id=({target_id}) does not exist."))
        })?;

    Ok((user, (USER_DETAIL.default_for)(current.role())))
}

/// GET /users/{id|me}/ - profile detail
pub async fn detail(
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (user, _) = resolve_target(&current, &raw_id).await?;
    let mode = USER_DETAIL.resolve(current.role(), query.mode.as_deref())?;
    Ok(Json(json!({ "success": true, "data": views::users::project(&user, mode) })))
}

/// PATCH /users/{id|me}/ - self-service profile update (or elevated)
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let (user, mode) = resolve_target(&current, &raw_id).await?;

    let password_digest = match &body.password {
        Some(password) => {
            validate_password(password, &user.username, &user.email)?;
            Some(digest_password(password))
        }
        None => None,
    };

    let pool = DatabaseManager::pool().await?;
    let updated = users_db::update_profile(
        &pool,
        user.id,
        &users_db::UserChanges {
            password_digest,
            screen_name: body.screen_name,
            personal_information: body.personal_information,
            hide_private_info: body.hide_private_info,
        },
    )
    .await?;

    Ok(Json(json!({ "success": true, "data": views::users::project(&updated, mode) })))
}

/// DELETE /users/{id|me}/ - deferred deletion; tickets and messages move to
/// the collector account
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (user, _) = resolve_target(&current, &raw_id).await?;

    deletion::submit(DeleteTarget::User(user.id));
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "success": true, "data": { "status": "accepted", "id": user.id } })),
    ))
}
