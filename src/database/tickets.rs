use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use super::models::Ticket;

/// Columns a tickets listing may be ordered by. The first entry is the
/// default primary sort key; `order=` promotes another entry to the front.
pub const ORDERABLE: &[&str] = &["id", "is_answered", "ticket_theme", "creation_date", "last_changes"];

pub struct NewTicket {
    pub ticket_theme: String,
    pub opened_by: i64,
    pub is_closed: bool,
    pub closed_by_id: Option<i64>,
}

/// Full replacement values for the mutable columns; handlers merge the
/// incoming PATCH onto the fetched row before calling `update`.
pub struct TicketUpdate {
    pub ticket_theme: String,
    pub is_closed: bool,
    pub is_frozen: bool,
    pub closed_by_id: Option<i64>,
    pub staff_note: String,
}

pub async fn fetch_by_id(
    exec: impl PgExecutor<'_>,
    id: i64,
) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn list(
    exec: impl PgExecutor<'_>,
    opened_by: Option<i64>,
    order: &[String],
    limit: i64,
) -> Result<Vec<Ticket>, sqlx::Error> {
    // `order` is validated against ORDERABLE before it reaches this point
    let order_sql = order
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");

    match opened_by {
        Some(owner) => {
            let sql = format!(
                "SELECT * FROM tickets WHERE opened_by = $1 ORDER BY {order_sql} LIMIT $2"
            );
            sqlx::query_as::<_, Ticket>(&sql)
                .bind(owner)
                .bind(limit)
                .fetch_all(exec)
                .await
        }
        None => {
            let sql = format!("SELECT * FROM tickets ORDER BY {order_sql} LIMIT $1");
            sqlx::query_as::<_, Ticket>(&sql).bind(limit).fetch_all(exec).await
        }
    }
}

pub async fn insert(exec: impl PgExecutor<'_>, new: &NewTicket) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets (ticket_theme, opened_by, is_closed, closed_by_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(&new.ticket_theme)
    .bind(new.opened_by)
    .bind(new.is_closed)
    .bind(new.closed_by_id)
    .fetch_one(exec)
    .await
}

pub async fn update(
    exec: impl PgExecutor<'_>,
    id: i64,
    update: &TicketUpdate,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "UPDATE tickets SET \
            ticket_theme = $2, \
            is_closed = $3, \
            is_frozen = $4, \
            closed_by_id = $5, \
            staff_note = $6, \
            last_changes = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&update.ticket_theme)
    .bind(update.is_closed)
    .bind(update.is_frozen)
    .bind(update.closed_by_id)
    .bind(&update.staff_note)
    .fetch_one(exec)
    .await
}

/// Delete a ticket row; linked messages cascade at the database level.
/// Returns the owner id so the caller can resync the owner's rollups.
pub async fn delete(exec: impl PgExecutor<'_>, id: i64) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("DELETE FROM tickets WHERE id = $1 RETURNING opened_by")
            .bind(id)
            .fetch_optional(exec)
            .await?;
    Ok(row.map(|(owner,)| owner))
}

/// Write the derived answer-state columns. Only the aggregate engine calls
/// this; `answerer_id` is preserved when `answerer_id` is None.
pub async fn write_answer_state(
    exec: impl PgExecutor<'_>,
    id: i64,
    messages_count: i64,
    is_answered: bool,
    user_question_date: Option<DateTime<Utc>>,
    answerer_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tickets SET \
            messages_count = $2, \
            is_answered = $3, \
            user_question_date = $4, \
            answerer_id = COALESCE($5, answerer_id), \
            last_changes = now() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(messages_count as i32)
    .bind(is_answered)
    .bind(user_question_date)
    .bind(answerer_id)
    .execute(exec)
    .await?;
    Ok(())
}
