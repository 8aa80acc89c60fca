//! Deferred deletion of users, tickets, and messages.
//!
//! The HTTP layer answers 202 Accepted and submits a fire-and-forget task;
//! the deletion and its aggregate cascade run asynchronously in one
//! transaction and may be observed as eventually consistent. There is no
//! cancellation and no return value; failures are logged.

use std::sync::OnceLock;

use tracing::{error, info, warn};

use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::{messages, tickets, users};
use crate::services::aggregates::AggregateEngine;

#[derive(Debug, Clone, Copy)]
pub enum DeleteTarget {
    User(i64),
    Ticket(i64),
    Message(i64),
}

static COLLECTOR_ID: OnceLock<i64> = OnceLock::new();

/// Resolve the collector account (creating it if absent) and remember its
/// id for the lifetime of the process. Called once at startup; request
/// handling never materializes the collector.
pub async fn init_collector() -> Result<i64, DatabaseError> {
    let pool = DatabaseManager::pool().await?;
    let collector = &config::config().collector;
    let id = users::get_or_create_collector(&pool, &collector.username, &collector.email).await?;
    let id = *COLLECTOR_ID.get_or_init(|| id);
    info!("collector account '{}' resolved to id {}", collector.username, id);
    Ok(id)
}

/// Submit a deferred deletion. Returns immediately; the work happens on a
/// background task.
pub fn submit(target: DeleteTarget) {
    tokio::spawn(async move {
        let Some(&collector_id) = COLLECTOR_ID.get() else {
            error!("deferred deletion of {target:?} dropped: collector not resolved");
            return;
        };
        if let Err(e) = run(target, collector_id).await {
            error!("deferred deletion of {target:?} failed: {e}");
        }
    });
}

/// Delete one record and resync every aggregate it feeds, atomically.
async fn run(target: DeleteTarget, collector_id: i64) -> Result<(), DatabaseError> {
    let pool = DatabaseManager::pool().await?;
    let mut tx = pool.begin().await?;

    match target {
        DeleteTarget::Message(id) => {
            // the message's ticket/owner must be captured before the row goes
            if let Some(message) = messages::fetch_by_id(&mut *tx, id).await? {
                let owner = tickets::fetch_by_id(&mut *tx, message.ticket_id)
                    .await?
                    .map(|t| t.opened_by)
                    .unwrap_or(collector_id);
                messages::delete(&mut *tx, id).await?;
                AggregateEngine::on_message_deleted(&mut tx, message.ticket_id, owner).await?;
            }
        }
        DeleteTarget::Ticket(id) => {
            // messages cascade with the ticket row; the owner resync runs
            // after the row is gone so counts reflect the post-delete state
            if let Some(owner) = tickets::delete(&mut *tx, id).await? {
                AggregateEngine::on_ticket_deleted(&mut tx, owner).await?;
            }
        }
        DeleteTarget::User(id) => {
            if id == collector_id {
                warn!("refusing to delete the collector account (id {id})");
                tx.rollback().await?;
                return Ok(());
            }
            // reassign, never null or cascade, then resync the collector
            users::reassign_tickets(&mut *tx, id, collector_id).await?;
            users::reassign_messages(&mut *tx, id, collector_id).await?;
            users::delete(&mut *tx, id).await?;
            AggregateEngine::on_ticket_written(&mut tx, collector_id).await?;
        }
    }

    tx.commit().await?;
    Ok(())
}
