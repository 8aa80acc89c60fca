use serde_json::{json, Value};

use super::{elapsed_since, readable_date, Mode};
use crate::database::models::Ticket;

/// How long the owner has been waiting for a support reply; zero when the
/// ticket is answered.
fn no_response_time(ticket: &Ticket) -> String {
    if ticket.is_answered {
        elapsed_since(None)
    } else {
        elapsed_since(ticket.user_question_date.as_ref())
    }
}

/// Render a ticket in the given mode. Fields accumulate from basic to full,
/// so every wider mode yields a strict superset of the narrower ones.
/// `messages` are pre-projected message values, embedded from `expanded` up.
pub fn project(ticket: &Ticket, owner_name: &str, messages: &[Value], mode: Mode) -> Value {
    let mut out = json!({
        "id": ticket.id,
        "ticket_theme": ticket.ticket_theme,
        "is_closed": ticket.is_closed,
        "no_response_time": no_response_time(ticket),
    });
    let fields = out.as_object_mut().expect("projection root is an object");

    if mode >= Mode::Default {
        fields.insert("opened_by_id".into(), json!(ticket.opened_by));
        fields.insert("screen_name".into(), json!(owner_name));
        fields.insert("creation_date".into(), json!(readable_date(&ticket.creation_date)));
        fields.insert("last_changes".into(), json!(readable_date(&ticket.last_changes)));
        fields.insert("messages_count".into(), json!(ticket.messages_count));
        fields.insert("is_answered".into(), json!(ticket.is_answered));
    }

    if mode >= Mode::Expanded {
        fields.insert(
            "user_question_date".into(),
            json!(ticket.user_question_date.as_ref().map(readable_date)),
        );
        fields.insert("is_frozen".into(), json!(ticket.is_frozen));
        fields.insert("answerer_id".into(), json!(ticket.answerer_id));
        fields.insert("staff_note".into(), json!(ticket.staff_note));
        fields.insert("messages".into(), json!(messages));
    }

    if mode >= Mode::Full {
        fields.insert("closed_by_id".into(), json!(ticket.closed_by_id));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn ticket() -> Ticket {
        Ticket {
            id: 3,
            ticket_theme: "soft".into(),
            opened_by: 7,
            is_closed: false,
            is_frozen: false,
            is_answered: false,
            user_question_date: Some(Utc::now()),
            answerer_id: None,
            messages_count: 2,
            closed_by_id: None,
            staff_note: String::new(),
            creation_date: Utc::now(),
            last_changes: Utc::now(),
        }
    }

    fn field_set(v: &Value) -> BTreeSet<String> {
        v.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn modes_form_a_strictly_increasing_field_chain() {
        let t = ticket();
        let basic = field_set(&project(&t, "alice", &[], Mode::Basic));
        let default = field_set(&project(&t, "alice", &[], Mode::Default));
        let expanded = field_set(&project(&t, "alice", &[], Mode::Expanded));
        let full = field_set(&project(&t, "alice", &[], Mode::Full));

        assert!(basic.is_subset(&default) && basic.len() < default.len());
        assert!(default.is_subset(&expanded) && default.len() < expanded.len());
        assert!(expanded.is_subset(&full) && expanded.len() < full.len());
    }

    #[test]
    fn staff_note_is_hidden_below_expanded() {
        let t = ticket();
        let default = project(&t, "alice", &[], Mode::Default);
        assert!(default.get("staff_note").is_none());
        let expanded = project(&t, "alice", &[], Mode::Expanded);
        assert!(expanded.get("staff_note").is_some());
    }

    #[test]
    fn answered_ticket_reports_zero_waiting_time() {
        let mut t = ticket();
        t.is_answered = true;
        t.user_question_date = None;
        let v = project(&t, "alice", &[], Mode::Basic);
        assert_eq!(v["no_response_time"], "0 second(s)");
    }
}
