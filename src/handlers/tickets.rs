use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Ticket, TicketTheme};
use crate::database::tickets as tickets_db;
use crate::database::users as users_db;
use crate::database::messages as messages_db;
use crate::error::ApiError;
use crate::filter::{self, ListQuery};
use crate::guards::{MethodPolicy, SelfOrElevated, TicketOwnership};
use crate::middleware::CurrentUser;
use crate::roles::Role;
use crate::services::aggregates::AggregateEngine;
use crate::services::deletion::{self, DeleteTarget};
use crate::views::{self, Mode, TICKETS_LIST, TICKET_DETAIL};

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub ticket_theme: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub ticket_theme: Option<String>,
    pub is_closed: Option<bool>,
    #[serde(default)]
    pub message: String,
    pub is_frozen: Option<bool>,
    pub staff_note: Option<String>,
}

/// Project one ticket, embedding its messages from `expanded` up.
pub(crate) async fn project_ticket(
    pool: &PgPool,
    ticket: &Ticket,
    mode: Mode,
    names: &mut HashMap<i64, String>,
) -> Result<Value, ApiError> {
    let owner_name = super::display_name_for(pool, ticket.opened_by, names).await?;

    let mut rendered_messages = Vec::new();
    if mode >= Mode::Expanded {
        let message_mode = if mode >= Mode::Full { Mode::Expanded } else { Mode::Basic };
        for message in messages_db::all_for_ticket(pool, ticket.id).await? {
            let author_name = super::display_name_for(pool, message.author_id, names).await?;
            rendered_messages.push(views::messages::project(&message, &author_name, message_mode));
        }
    }

    Ok(views::tickets::project(ticket, &owner_name, &rendered_messages, mode))
}

/// GET /tickets/ - list tickets, filterable by owner (`user_id=0` = caller)
pub async fn list(
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    list_inner(current, query).await
}

/// GET /tickets/my/ - the caller's own tickets
pub async fn list_own(
    Extension(current): Extension<CurrentUser>,
    Query(mut query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    query.user_id = Some("0".to_string());
    list_inner(current, query).await
}

async fn list_inner(current: CurrentUser, query: ListQuery) -> Result<Json<Value>, ApiError> {
    let caller = current.require()?;
    let role = current.role();

    let requested_owner = filter::parse_user_id(query.user_id.as_deref())?;
    let owner_filter = SelfOrElevated::resolve_list(caller, role, requested_owner)?;

    let mode = TICKETS_LIST.resolve(role, query.mode.as_deref())?;
    let limit = filter::parse_limit(query.limit.as_deref())?;
    let order = filter::apply_order(query.order.as_deref(), tickets_db::ORDERABLE)?;

    let pool = DatabaseManager::pool().await?;
    if let Some(owner_id) = owner_filter {
        if owner_id != caller.id && users_db::fetch_by_id(&pool, owner_id).await?.is_none() {
            return Err(ApiError::not_found(format!(
                "User with id=({owner_id}) does not exist."
            )));
        }
    }

    let rows = tickets_db::list(&pool, owner_filter, &order, limit).await?;
    let mut names = HashMap::new();
    let mut data = Vec::with_capacity(rows.len());
    for ticket in &rows {
        data.push(project_ticket(&pool, ticket, mode, &mut names).await?);
    }

    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /tickets/ - open a ticket; always creates the initial message
pub async fn create(
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let caller = current.require()?;

    if body.message.is_empty() {
        return Err(ApiError::invalid_argument(
            "<message> field can not be blank when create new ticket.",
        ));
    }
    let theme = TicketTheme::from_input(body.ticket_theme.as_deref().unwrap_or(""));

    let pool = DatabaseManager::pool().await?;
    let mut tx = pool.begin().await?;

    let ticket = tickets_db::insert(
        &mut *tx,
        &tickets_db::NewTicket {
            ticket_theme: theme.as_str().to_string(),
            opened_by: caller.id,
            is_closed: body.is_closed,
            closed_by_id: body.is_closed.then_some(caller.id),
        },
    )
    .await?;

    messages_db::insert(&mut *tx, ticket.id, caller.id, &body.message).await?;
    AggregateEngine::on_message_written(&mut tx, &ticket, caller.id).await?;

    // re-read so the echo carries the derived columns
    let ticket = tickets_db::fetch_by_id(&mut *tx, ticket.id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("ticket vanished mid-create"))?;
    tx.commit().await?;

    let mut names = HashMap::new();
    let data = project_ticket(&pool, &ticket, Mode::Default, &mut names).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": data }))))
}

async fn fetch_guarded(
    current: &CurrentUser,
    raw_id: &str,
    method: &Method,
) -> Result<(Ticket, Role), ApiError> {
    let caller = current.require()?;
    let role = current.role();
    let ticket_id = filter::parse_id(raw_id, "ticket")?;

    let pool = DatabaseManager::pool().await?;
    let ticket = TicketOwnership::check(
        caller,
        role,
        tickets_db::fetch_by_id(&pool, ticket_id).await?,
    )?;
    MethodPolicy::check_ticket(role, ticket.opened_by == caller.id, method)?;
    Ok((ticket, role))
}

/// GET /tickets/{id}/ - ticket detail
pub async fn detail(
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (ticket, role) = fetch_guarded(&current, &raw_id, &Method::GET).await?;
    let mode = TICKET_DETAIL.resolve(role, query.mode.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let mut names = HashMap::new();
    let data = project_ticket(&pool, &ticket, mode, &mut names).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// PATCH /tickets/{id}/ - update; flipping is_closed records closed_by_id,
/// a non-empty `message` appends a message
pub async fn update(
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<UpdateTicketRequest>,
) -> Result<Json<Value>, ApiError> {
    let (ticket, role) = fetch_guarded(&current, &raw_id, &Method::PATCH).await?;
    let caller = current.require()?;

    if (body.is_frozen.is_some() || body.staff_note.is_some()) && role < Role::Staff {
        return Err(ApiError::permission_denied(
            "Permission denied. Only staff may change is_frozen or staff_note.",
        ));
    }

    let new_is_closed = body.is_closed.unwrap_or(ticket.is_closed);
    let closed_by_id = if new_is_closed != ticket.is_closed {
        // record who closed it; clear on reopen
        new_is_closed.then_some(caller.id)
    } else {
        ticket.closed_by_id
    };

    let update = tickets_db::TicketUpdate {
        ticket_theme: body
            .ticket_theme
            .as_deref()
            .map(|raw| TicketTheme::from_input(raw).as_str().to_string())
            .unwrap_or_else(|| ticket.ticket_theme.clone()),
        is_closed: new_is_closed,
        is_frozen: body.is_frozen.unwrap_or(ticket.is_frozen),
        closed_by_id,
        staff_note: body.staff_note.unwrap_or_else(|| ticket.staff_note.clone()),
    };

    let pool = DatabaseManager::pool().await?;
    let mut tx = pool.begin().await?;

    let updated = tickets_db::update(&mut *tx, ticket.id, &update).await?;
    if !body.message.is_empty() {
        messages_db::insert(&mut *tx, updated.id, caller.id, &body.message).await?;
        AggregateEngine::on_message_written(&mut tx, &updated, caller.id).await?;
    } else {
        // is_closed may have flipped; the owner's open-ticket count follows
        AggregateEngine::on_ticket_written(&mut tx, updated.opened_by).await?;
    }

    let ticket = tickets_db::fetch_by_id(&mut *tx, updated.id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("ticket vanished mid-update"))?;
    tx.commit().await?;

    let mode = TICKET_DETAIL.resolve(role, None)?;
    let mut names = HashMap::new();
    let data = project_ticket(&pool, &ticket, mode, &mut names).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// DELETE /tickets/{id}/ - deferred deletion; messages cascade, the owner's
/// rollups resync once the task runs
pub async fn delete(
    Extension(current): Extension<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (ticket, _) = fetch_guarded(&current, &raw_id, &Method::DELETE).await?;

    deletion::submit(DeleteTarget::Ticket(ticket.id));
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "success": true, "data": { "status": "accepted", "id": ticket.id } })),
    ))
}
