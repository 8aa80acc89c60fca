use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ticket subject area. Unknown input coerces to `Other` rather than failing,
/// so older clients with stale theme lists keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketTheme {
    Product,
    Soft,
    Security,
    Other,
}

impl TicketTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketTheme::Product => "product",
            TicketTheme::Soft => "soft",
            TicketTheme::Security => "security",
            TicketTheme::Other => "other",
        }
    }

    pub fn from_input(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "product" | "1" => TicketTheme::Product,
            "soft" | "2" => TicketTheme::Soft,
            "security" | "3" => TicketTheme::Security,
            _ => TicketTheme::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub ticket_theme: String,
    pub opened_by: i64,
    pub is_closed: bool,
    pub is_frozen: bool,
    // Derived columns below are owned by the aggregate engine.
    pub is_answered: bool,
    pub user_question_date: Option<DateTime<Utc>>,
    pub answerer_id: Option<i64>,
    pub messages_count: i32,
    pub closed_by_id: Option<i64>,
    pub staff_note: String,
    pub creation_date: DateTime<Utc>,
    pub last_changes: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parses_names_and_legacy_numbers() {
        assert_eq!(TicketTheme::from_input("security"), TicketTheme::Security);
        assert_eq!(TicketTheme::from_input("2"), TicketTheme::Soft);
        assert_eq!(TicketTheme::from_input("Product"), TicketTheme::Product);
    }

    #[test]
    fn unknown_theme_coerces_to_other() {
        assert_eq!(TicketTheme::from_input("hardware"), TicketTheme::Other);
        assert_eq!(TicketTheme::from_input(""), TicketTheme::Other);
    }
}
