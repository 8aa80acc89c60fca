use serde_json::{json, Value};

use super::{elapsed_since, readable_date, Mode};
use crate::database::models::User;

/// Render a user in the given mode; field sets accumulate monotonically.
pub fn project(user: &User, mode: Mode) -> Value {
    let mut out = json!({
        "id": user.id,
        "screen_name": user.display_name(),
        "max_no_response_time": elapsed_since(user.unanswered_since.as_ref()),
        "opened_tickets_count": user.opened_tickets_count,
    });
    let fields = out.as_object_mut().expect("projection root is an object");

    if mode >= Mode::Default {
        fields.insert("email".into(), json!(user.email));
        fields.insert("username".into(), json!(user.username));
        fields.insert("creation_date".into(), json!(readable_date(&user.date_joined)));
        fields.insert("updated_at".into(), json!(readable_date(&user.last_changes)));
        fields.insert("personal_information".into(), json!(user.personal_information));
        fields.insert("hide_private_info".into(), json!(user.hide_private_info));
        fields.insert("tickets_messages".into(), json!(user.tickets_messages));
    }

    if mode >= Mode::Expanded {
        fields.insert("is_support".into(), json!(user.is_support));
        fields.insert("is_staff".into(), json!(user.is_staff));
        fields.insert(
            "unanswered_since".into(),
            json!(user.unanswered_since.as_ref().map(readable_date)),
        );
    }

    if mode >= Mode::Full {
        fields.insert("is_superuser".into(), json!(user.is_superuser));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn user() -> User {
        User {
            id: 5,
            email: "s@example.com".into(),
            username: "sam".into(),
            password_digest: "x".into(),
            is_staff: false,
            is_superuser: false,
            is_support: false,
            hide_private_info: false,
            screen_name: String::new(),
            personal_information: String::new(),
            opened_tickets_count: 1,
            unanswered_since: None,
            tickets_messages: 4,
            date_joined: Utc::now(),
            last_changes: Utc::now(),
        }
    }

    fn field_set(v: &Value) -> BTreeSet<String> {
        v.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn modes_form_a_strictly_increasing_field_chain() {
        let u = user();
        let basic = field_set(&project(&u, Mode::Basic));
        let default = field_set(&project(&u, Mode::Default));
        let expanded = field_set(&project(&u, Mode::Expanded));
        let full = field_set(&project(&u, Mode::Full));

        assert!(basic.is_subset(&default) && basic.len() < default.len());
        assert!(default.is_subset(&expanded) && default.len() < expanded.len());
        assert!(expanded.is_subset(&full) && expanded.len() < full.len());
    }

    #[test]
    fn email_is_hidden_in_basic_mode() {
        let v = project(&user(), Mode::Basic);
        assert!(v.get("email").is_none());
        assert!(v.get("screen_name").is_some());
    }

    #[test]
    fn role_flags_appear_from_expanded_up() {
        let u = user();
        assert!(project(&u, Mode::Default).get("is_staff").is_none());
        assert!(project(&u, Mode::Expanded).get("is_staff").is_some());
        assert!(project(&u, Mode::Expanded).get("is_superuser").is_none());
        assert!(project(&u, Mode::Full).get("is_superuser").is_some());
    }

    #[test]
    fn password_digest_never_leaves_the_server() {
        let v = project(&user(), Mode::Full);
        assert!(v.get("password_digest").is_none());
        assert!(v.get("password").is_none());
    }
}
