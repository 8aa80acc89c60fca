use serde_json::{json, Value};

use super::{readable_date, Mode};
use crate::database::models::Message;

/// Render a message in the given mode. `author_name` is the author's public
/// display name, resolved by the caller.
pub fn project(message: &Message, author_name: &str, mode: Mode) -> Value {
    let mut out = json!({
        "id": message.id,
        "written_by": author_name,
        "creation_date": readable_date(&message.creation_date),
        "message": message.body,
    });
    let fields = out.as_object_mut().expect("projection root is an object");

    if mode >= Mode::Expanded {
        fields.insert("author_id".into(), json!(message.author_id));
        fields.insert("ticket_id".into(), json!(message.ticket_id));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message() -> Message {
        Message {
            id: 11,
            ticket_id: 3,
            author_id: 7,
            body: "help me".into(),
            creation_date: Utc::now(),
        }
    }

    #[test]
    fn basic_hides_raw_ids() {
        let v = project(&message(), "alice", Mode::Basic);
        assert_eq!(v["written_by"], "alice");
        assert!(v.get("author_id").is_none());
    }

    #[test]
    fn expanded_is_a_superset_of_basic() {
        let basic = project(&message(), "alice", Mode::Basic);
        let expanded = project(&message(), "alice", Mode::Expanded);
        for key in basic.as_object().unwrap().keys() {
            assert!(expanded.get(key).is_some(), "missing {key}");
        }
        assert!(expanded.get("author_id").is_some());
        assert!(expanded.get("ticket_id").is_some());
    }
}
