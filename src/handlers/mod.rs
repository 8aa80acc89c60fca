pub mod info;
pub mod messages;
pub mod tickets;
pub mod tokens;
pub mod users;

use std::collections::HashMap;

use sqlx::PgPool;

use crate::database::users as users_db;
use crate::error::ApiError;

/// Resolve a user's public display name, caching lookups for the duration of
/// one request. Users that vanished mid-request fall back to an opaque tag.
pub(crate) async fn display_name_for(
    pool: &PgPool,
    user_id: i64,
    cache: &mut HashMap<i64, String>,
) -> Result<String, ApiError> {
    if let Some(name) = cache.get(&user_id) {
        return Ok(name.clone());
    }
    let name = match users_db::fetch_by_id(pool, user_id).await? {
        Some(user) => user.display_name(),
        None => format!("user#{user_id}"),
    };
    cache.insert(user_id, name.clone());
    Ok(name)
}
