//! Aggregate maintenance engine.
//!
//! Keeps the derived columns on tickets (`messages_count`, `is_answered`,
//! `user_question_date`, `answerer_id`) and the rollups on users
//! (`opened_tickets_count`, `unanswered_since`, `tickets_messages`)
//! consistent with the underlying rows. Handlers invoke the engine after
//! every ticket/message write, on the same transaction as that write, so a
//! failed recompute aborts the whole operation and partial aggregate
//! updates are never committed.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use crate::database::models::Ticket;
use crate::database::{messages, tickets};

/// Derived answer-state of a ticket. `answerer_id: None` preserves the
/// current answerer column instead of clearing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerState {
    pub is_answered: bool,
    pub user_question_date: Option<DateTime<Utc>>,
    pub answerer_id: Option<i64>,
}

/// Answer-state after a message is written. An owner message reopens the
/// question clock; any other author counts as a support-side answer.
pub fn derive_on_write(owner_id: i64, author_id: i64, now: DateTime<Utc>) -> AnswerState {
    if author_id == owner_id {
        AnswerState {
            is_answered: false,
            user_question_date: Some(now),
            answerer_id: None,
        }
    } else {
        AnswerState {
            is_answered: true,
            user_question_date: None,
            answerer_id: Some(author_id),
        }
    }
}

/// Answer-state re-derived from the most recent remaining message after a
/// deletion. With no messages left nothing awaits a reply.
pub fn rederive_after_delete(
    owner_id: i64,
    latest: Option<(i64, DateTime<Utc>)>,
) -> AnswerState {
    match latest {
        Some((author_id, written_at)) if author_id == owner_id => AnswerState {
            is_answered: false,
            user_question_date: Some(written_at),
            answerer_id: None,
        },
        Some((author_id, _)) => AnswerState {
            is_answered: true,
            user_question_date: None,
            answerer_id: Some(author_id),
        },
        None => AnswerState {
            is_answered: true,
            user_question_date: None,
            answerer_id: None,
        },
    }
}

pub struct AggregateEngine;

impl AggregateEngine {
    /// A message was created or updated on `ticket`. Recompute the ticket's
    /// derived columns, then the owner's rollups.
    pub async fn on_message_written(
        tx: &mut Transaction<'_, Postgres>,
        ticket: &Ticket,
        author_id: i64,
    ) -> Result<(), sqlx::Error> {
        let count = messages::count_for_ticket(&mut **tx, ticket.id).await?;
        let state = derive_on_write(ticket.opened_by, author_id, Utc::now());
        tickets::write_answer_state(
            &mut **tx,
            ticket.id,
            count,
            state.is_answered,
            state.user_question_date,
            state.answerer_id,
        )
        .await?;
        Self::on_ticket_written(tx, ticket.opened_by).await
    }

    /// A message was deleted. The ticket may have been deleted concurrently;
    /// in that case only the last known owner's rollups are resynced.
    pub async fn on_message_deleted(
        tx: &mut Transaction<'_, Postgres>,
        ticket_id: i64,
        last_known_owner: i64,
    ) -> Result<(), sqlx::Error> {
        let Some(ticket) = tickets::fetch_by_id(&mut **tx, ticket_id).await? else {
            return Self::on_ticket_written(tx, last_known_owner).await;
        };

        let count = messages::count_for_ticket(&mut **tx, ticket.id).await?;
        let latest = messages::latest_for_ticket(&mut **tx, ticket.id).await?;
        let state = rederive_after_delete(
            ticket.opened_by,
            latest.map(|m| (m.author_id, m.creation_date)),
        );
        tickets::write_answer_state(
            &mut **tx,
            ticket.id,
            count,
            state.is_answered,
            state.user_question_date,
            state.answerer_id,
        )
        .await?;
        Self::on_ticket_written(tx, ticket.opened_by).await
    }

    /// A ticket owned by `user_id` was created or updated: resync the
    /// owner's rollups from the current ticket/message rows.
    pub async fn on_ticket_written(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<(), sqlx::Error> {
        Self::sync_user(tx, user_id).await
    }

    /// A ticket owned by `user_id` is gone; counts must reflect the
    /// post-delete state, so this runs after the row is removed.
    pub async fn on_ticket_deleted(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<(), sqlx::Error> {
        Self::sync_user(tx, user_id).await
    }

    async fn sync_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET \
                tickets_messages = ( \
                    SELECT COUNT(*) FROM messages m \
                    JOIN tickets t ON m.ticket_id = t.id \
                    WHERE t.opened_by = $1), \
                opened_tickets_count = ( \
                    SELECT COUNT(*) FROM tickets WHERE opened_by = $1 AND NOT is_closed), \
                unanswered_since = ( \
                    SELECT MIN(user_question_date) FROM tickets \
                    WHERE opened_by = $1 AND NOT is_answered \
                      AND user_question_date IS NOT NULL), \
                last_changes = now() \
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_message_marks_ticket_unanswered() {
        let now = Utc::now();
        let state = derive_on_write(7, 7, now);
        assert!(!state.is_answered);
        assert_eq!(state.user_question_date, Some(now));
        // answerer is preserved, not cleared
        assert_eq!(state.answerer_id, None);
    }

    #[test]
    fn non_owner_message_answers_the_ticket() {
        let state = derive_on_write(7, 42, Utc::now());
        assert!(state.is_answered);
        assert_eq!(state.user_question_date, None);
        assert_eq!(state.answerer_id, Some(42));
    }

    #[test]
    fn rederive_uses_remaining_latest_message() {
        let written_at = Utc::now();

        // latest remaining message is from the owner: question clock restored
        // from that message's creation date, not from now()
        let state = rederive_after_delete(7, Some((7, written_at)));
        assert!(!state.is_answered);
        assert_eq!(state.user_question_date, Some(written_at));

        // latest remaining message is support-side
        let state = rederive_after_delete(7, Some((42, written_at)));
        assert!(state.is_answered);
        assert_eq!(state.answerer_id, Some(42));
    }

    #[test]
    fn empty_ticket_counts_as_answered() {
        let state = rederive_after_delete(7, None);
        assert!(state.is_answered);
        assert_eq!(state.user_question_date, None);
        assert_eq!(state.answerer_id, None);
    }
}
