use sqlx::PgExecutor;

use super::models::User;

/// Columns a users listing may be ordered by. The first entry is the default
/// primary sort key; `order=` promotes another entry to the front.
pub const ORDERABLE: &[&str] = &["id", "date_joined", "opened_tickets_count", "unanswered_since"];

pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_digest: String,
    pub screen_name: String,
    pub personal_information: String,
    pub hide_private_info: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_support: bool,
}

/// Optional profile changes; `None` leaves the column untouched.
#[derive(Default)]
pub struct UserChanges {
    pub password_digest: Option<String>,
    pub screen_name: Option<String>,
    pub personal_information: Option<String>,
    pub hide_private_info: Option<bool>,
}

pub async fn fetch_by_id(exec: impl PgExecutor<'_>, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn fetch_by_email(
    exec: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(exec)
        .await
}

pub async fn list(
    exec: impl PgExecutor<'_>,
    order: &[String],
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    // `order` is validated against ORDERABLE before it reaches this point
    let order_sql = order
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT * FROM users ORDER BY {order_sql} LIMIT $1");
    sqlx::query_as::<_, User>(&sql).bind(limit).fetch_all(exec).await
}

pub async fn insert(exec: impl PgExecutor<'_>, new: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users \
            (email, username, password_digest, screen_name, personal_information, \
             hide_private_info, is_staff, is_superuser, is_support) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(&new.email)
    .bind(&new.username)
    .bind(&new.password_digest)
    .bind(&new.screen_name)
    .bind(&new.personal_information)
    .bind(new.hide_private_info)
    .bind(new.is_staff)
    .bind(new.is_superuser)
    .bind(new.is_support)
    .fetch_one(exec)
    .await
}

pub async fn update_profile(
    exec: impl PgExecutor<'_>,
    id: i64,
    changes: &UserChanges,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET \
            password_digest = COALESCE($2, password_digest), \
            screen_name = COALESCE($3, screen_name), \
            personal_information = COALESCE($4, personal_information), \
            hide_private_info = COALESCE($5, hide_private_info), \
            last_changes = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.password_digest)
    .bind(&changes.screen_name)
    .bind(&changes.personal_information)
    .bind(changes.hide_private_info)
    .fetch_one(exec)
    .await
}

pub async fn delete(exec: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Resolve the collector account id, creating the row if it does not exist.
/// Runs once at startup; request handling never materializes the collector.
pub async fn get_or_create_collector(
    exec: impl PgExecutor<'_>,
    username: &str,
    email: &str,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (email, username, password_digest, hide_private_info) \
         VALUES ($1, $2, '', TRUE) \
         ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username \
         RETURNING id",
    )
    .bind(email)
    .bind(username)
    .fetch_one(exec)
    .await?;
    Ok(id)
}

/// Move ticket ownership from a user being deleted onto the collector.
pub async fn reassign_tickets(
    exec: impl PgExecutor<'_>,
    from_user: i64,
    to_user: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE tickets SET opened_by = $2 WHERE opened_by = $1")
        .bind(from_user)
        .bind(to_user)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

/// Move message authorship from a user being deleted onto the collector.
pub async fn reassign_messages(
    exec: impl PgExecutor<'_>,
    from_user: i64,
    to_user: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE messages SET author_id = $2 WHERE author_id = $1")
        .bind(from_user)
        .bind(to_user)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}
