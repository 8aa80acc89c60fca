use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_support: bool,
    pub hide_private_info: bool,
    pub screen_name: String,
    pub personal_information: String,
    // Rollups below are owned by the aggregate engine; nothing else writes them.
    pub opened_tickets_count: i32,
    pub unanswered_since: Option<DateTime<Utc>>,
    pub tickets_messages: i32,
    pub date_joined: DateTime<Utc>,
    pub last_changes: DateTime<Utc>,
}

impl User {
    /// Public display name: explicit screen name, else username unless the
    /// user hides private info, with a role tail for support/admin accounts.
    pub fn display_name(&self) -> String {
        let tail = if self.is_staff {
            " (admin)"
        } else if self.is_support {
            " (support)"
        } else {
            ""
        };
        let base = if !self.screen_name.is_empty() {
            self.screen_name.clone()
        } else if !self.hide_private_info {
            self.username.clone()
        } else {
            format!("user#{}", self.id)
        };
        format!("{base}{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_user() -> User {
        User {
            id: 7,
            email: "a@example.com".into(),
            username: "alice".into(),
            password_digest: String::new(),
            is_staff: false,
            is_superuser: false,
            is_support: false,
            hide_private_info: false,
            screen_name: String::new(),
            personal_information: String::new(),
            opened_tickets_count: 0,
            unanswered_since: None,
            tickets_messages: 0,
            date_joined: Utc::now(),
            last_changes: Utc::now(),
        }
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(plain_user().display_name(), "alice");
    }

    #[test]
    fn display_name_respects_privacy_flag() {
        let mut u = plain_user();
        u.hide_private_info = true;
        assert_eq!(u.display_name(), "user#7");
    }

    #[test]
    fn display_name_prefers_screen_name_and_tags_roles() {
        let mut u = plain_user();
        u.screen_name = "Al".into();
        u.is_support = true;
        assert_eq!(u.display_name(), "Al (support)");

        // staff tail wins over support
        u.is_staff = true;
        assert_eq!(u.display_name(), "Al (admin)");
    }
}
