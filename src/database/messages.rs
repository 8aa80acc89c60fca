use sqlx::PgExecutor;

use super::models::Message;

/// Messages list in creation order; `order=` may only promote `creation_date`.
pub const ORDERABLE: &[&str] = &["id", "creation_date"];

pub async fn fetch_by_id(
    exec: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn list_for_ticket(
    exec: impl PgExecutor<'_>,
    ticket_id: i64,
    order: &[String],
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let order_sql = order
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let sql =
        format!("SELECT * FROM messages WHERE ticket_id = $1 ORDER BY {order_sql} LIMIT $2");
    sqlx::query_as::<_, Message>(&sql)
        .bind(ticket_id)
        .bind(limit)
        .fetch_all(exec)
        .await
}

/// All messages of a ticket in creation order, for embedding in expanded
/// ticket projections.
pub async fn all_for_ticket(
    exec: impl PgExecutor<'_>,
    ticket_id: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE ticket_id = $1 ORDER BY id")
        .bind(ticket_id)
        .fetch_all(exec)
        .await
}

pub async fn insert(
    exec: impl PgExecutor<'_>,
    ticket_id: i64,
    author_id: i64,
    body: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "INSERT INTO messages (ticket_id, author_id, body) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(ticket_id)
    .bind(author_id)
    .bind(body)
    .fetch_one(exec)
    .await
}

pub async fn update_body(
    exec: impl PgExecutor<'_>,
    id: i64,
    body: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>("UPDATE messages SET body = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(body)
        .fetch_one(exec)
        .await
}

/// Delete a message; returns its ticket id so the caller can resync.
pub async fn delete(exec: impl PgExecutor<'_>, id: i64) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("DELETE FROM messages WHERE id = $1 RETURNING ticket_id")
            .bind(id)
            .fetch_optional(exec)
            .await?;
    Ok(row.map(|(ticket_id,)| ticket_id))
}

pub async fn count_for_ticket(
    exec: impl PgExecutor<'_>,
    ticket_id: i64,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE ticket_id = $1")
        .bind(ticket_id)
        .fetch_one(exec)
        .await?;
    Ok(count)
}

/// Most recent message of a ticket, by creation order.
pub async fn latest_for_ticket(
    exec: impl PgExecutor<'_>,
    ticket_id: i64,
) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE ticket_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(ticket_id)
    .fetch_optional(exec)
    .await
}
