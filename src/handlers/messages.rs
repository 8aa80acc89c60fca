use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::messages as messages_db;
use crate::database::models::{Message, Ticket};
use crate::database::tickets as tickets_db;
use crate::error::ApiError;
use crate::filter::{self, ListQuery};
use crate::guards::{MethodPolicy, TicketOwnership};
use crate::middleware::CurrentUser;
use crate::roles::Role;
use crate::services::aggregates::AggregateEngine;
use crate::services::deletion::{self, DeleteTarget};
use crate::views::{self, MESSAGES};

#[derive(Debug, Deserialize)]
pub struct WriteMessageRequest {
    pub message: String,
}

/// Resolve the parent ticket and run the collection-level guards.
async fn ticket_guarded(
    current: &CurrentUser,
    raw_ticket_id: &str,
    method: &Method,
) -> Result<(Ticket, Role), ApiError> {
    let caller = current.require()?;
    let role = current.role();
    let ticket_id = filter::parse_id(raw_ticket_id, "ticket")?;

    let pool = DatabaseManager::pool().await?;
    let ticket = TicketOwnership::check(
        caller,
        role,
        tickets_db::fetch_by_id(&pool, ticket_id).await?,
    )?;
    MethodPolicy::check_messages(role, ticket.opened_by == caller.id, method)?;
    Ok((ticket, role))
}

/// GET /tickets/{id}/messages/ - list a ticket's messages in creation order
pub async fn list(
    Extension(current): Extension<CurrentUser>,
    Path(raw_ticket_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (ticket, role) = ticket_guarded(&current, &raw_ticket_id, &Method::GET).await?;

    let mode = MESSAGES.resolve(role, query.mode.as_deref())?;
    let limit = filter::parse_limit(query.limit.as_deref())?;
    let order = filter::apply_order(query.order.as_deref(), messages_db::ORDERABLE)?;

    let pool = DatabaseManager::pool().await?;
    let rows = messages_db::list_for_ticket(&pool, ticket.id, &order, limit).await?;

    let mut names = HashMap::new();
    let mut data = Vec::with_capacity(rows.len());
    for message in &rows {
        let author_name = super::display_name_for(&pool, message.author_id, &mut names).await?;
        data.push(views::messages::project(message, &author_name, mode));
    }

    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /tickets/{id}/messages/ - append a message; the answered state and
/// every dependent rollup resync in the same transaction
pub async fn create(
    Extension(current): Extension<CurrentUser>,
    Path(raw_ticket_id): Path<String>,
    Json(body): Json<WriteMessageRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (ticket, role) = ticket_guarded(&current, &raw_ticket_id, &Method::POST).await?;
    let caller = current.require()?;

    if body.message.is_empty() {
        return Err(ApiError::invalid_argument("<message> field can not be blank."));
    }

    let pool = DatabaseManager::pool().await?;
    let mut tx = pool.begin().await?;
    let message = messages_db::insert(&mut *tx, ticket.id, caller.id, &body.message).await?;
    AggregateEngine::on_message_written(&mut tx, &ticket, caller.id).await?;
    tx.commit().await?;

    let mode = MESSAGES.resolve(role, None)?;
    let mut names = HashMap::new();
    let author_name = super::display_name_for(&pool, message.author_id, &mut names).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": views::messages::project(&message, &author_name, mode)
        })),
    ))
}

/// Resolve one message within its ticket, with detail-level guards.
async fn message_guarded(
    current: &CurrentUser,
    raw_ticket_id: &str,
    raw_message_id: &str,
    method: &Method,
) -> Result<(Ticket, Message, Role), ApiError> {
    let caller = current.require()?;
    let role = current.role();
    let ticket_id = filter::parse_id(raw_ticket_id, "ticket")?;
    let message_id = filter::parse_id(raw_message_id, "message")?;

    let pool = DatabaseManager::pool().await?;
    let ticket = TicketOwnership::check(
        caller,
        role,
        tickets_db::fetch_by_id(&pool, ticket_id).await?,
    )?;
    MethodPolicy::check_message_detail(role, method)?;

    let message = messages_db::fetch_by_id(&pool, message_id)
        .await?
        .filter(|m| m.ticket_id == ticket.id)
        .ok_or_else(|| ApiError::not_found("Message with this id does not exist"))?;

    Ok((ticket, message, role))
}

/// GET /tickets/{id}/messages/{id}/ - message detail
pub async fn detail(
    Extension(current): Extension<CurrentUser>,
    Path((raw_ticket_id, raw_message_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (_, message, role) =
        message_guarded(&current, &raw_ticket_id, &raw_message_id, &Method::GET).await?;
    let mode = MESSAGES.resolve(role, query.mode.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let mut names = HashMap::new();
    let author_name = super::display_name_for(&pool, message.author_id, &mut names).await?;
    Ok(Json(json!({
        "success": true,
        "data": views::messages::project(&message, &author_name, mode)
    })))
}

/// PATCH /tickets/{id}/messages/{id}/ - staff-only body edit; counts as a
/// write, so the derived state resyncs
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path((raw_ticket_id, raw_message_id)): Path<(String, String)>,
    Json(body): Json<WriteMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let (ticket, message, role) =
        message_guarded(&current, &raw_ticket_id, &raw_message_id, &Method::PATCH).await?;

    if body.message.is_empty() {
        return Err(ApiError::invalid_argument("<message> field can not be blank."));
    }

    let pool = DatabaseManager::pool().await?;
    let mut tx = pool.begin().await?;
    let updated = messages_db::update_body(&mut *tx, message.id, &body.message).await?;
    AggregateEngine::on_message_written(&mut tx, &ticket, updated.author_id).await?;
    tx.commit().await?;

    let mode = MESSAGES.resolve(role, None)?;
    let mut names = HashMap::new();
    let author_name = super::display_name_for(&pool, updated.author_id, &mut names).await?;
    Ok(Json(json!({
        "success": true,
        "data": views::messages::project(&updated, &author_name, mode)
    })))
}

/// DELETE /tickets/{id}/messages/{id}/ - deferred deletion
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path((raw_ticket_id, raw_message_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (_, message, _) =
        message_guarded(&current, &raw_ticket_id, &raw_message_id, &Method::DELETE).await?;

    deletion::submit(DeleteTarget::Message(message.id));
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "success": true, "data": { "status": "accepted", "id": message.id } })),
    ))
}
