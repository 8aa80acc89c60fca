pub mod messages;
pub mod tickets;
pub mod users;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::roles::Role;

/// Named output projection of an entity. Modes form a strictly increasing
/// chain of field sets: every wider mode renders a superset of the narrower
/// ones on the same resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Basic,
    Default,
    Expanded,
    Full,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Basic => "basic",
            Mode::Default => "default",
            Mode::Expanded => "expanded",
            Mode::Full => "full",
        }
    }

    fn parse(raw: &str) -> Option<Mode> {
        match raw {
            "basic" => Some(Mode::Basic),
            "default" => Some(Mode::Default),
            "expanded" => Some(Mode::Expanded),
            "full" => Some(Mode::Full),
            _ => None,
        }
    }
}

/// Declarative per-resource mode table: which modes exist, the minimum role
/// for each, and the default pick per role. Consulted by lookup; no
/// branching chains in handlers.
pub struct ModeCatalog {
    pub resource: &'static str,
    pub entries: &'static [(Mode, Role)],
    pub default_for: fn(Role) -> Mode,
}

impl ModeCatalog {
    /// Subset of the catalog available to `role`, narrowest first.
    pub fn permitted(&self, role: Role) -> Vec<Mode> {
        self.entries
            .iter()
            .filter(|(_, min_role)| role >= *min_role)
            .map(|(mode, _)| *mode)
            .collect()
    }

    /// Pick the output mode for this request. No explicit mode → the
    /// resource's default for the caller's role. An explicit mode must be a
    /// member of the permitted subset; anything else fails loudly, never
    /// silently falls back.
    pub fn resolve(&self, role: Role, requested: Option<&str>) -> Result<Mode, ApiError> {
        let permitted = self.permitted(role);
        if permitted.is_empty() {
            return Err(ApiError::permission_denied(format!(
                "Permission denied for {} listing. Obtain a token and retry with credentials.",
                self.resource
            )));
        }

        let Some(raw) = requested else {
            return Ok((self.default_for)(role));
        };

        let choices: Vec<&str> = permitted.iter().map(Mode::as_str).collect();
        match Mode::parse(raw) {
            Some(mode) if permitted.contains(&mode) => Ok(mode),
            _ => Err(ApiError::invalid_argument(format!(
                "mode <{raw}> not in available choices: {choices:?}"
            ))),
        }
    }
}

pub static USERS_LIST: ModeCatalog = ModeCatalog {
    resource: "users",
    entries: &[
        (Mode::Basic, Role::User),
        (Mode::Default, Role::User),
        (Mode::Expanded, Role::Support),
        (Mode::Full, Role::Staff),
    ],
    default_for: |_| Mode::Basic,
};

pub static USER_DETAIL: ModeCatalog = ModeCatalog {
    resource: "user profile",
    entries: &[
        (Mode::Default, Role::User),
        (Mode::Expanded, Role::Support),
        (Mode::Full, Role::Staff),
    ],
    default_for: |role| match role {
        Role::Support => Mode::Expanded,
        _ => Mode::Default,
    },
};

pub static TICKETS_LIST: ModeCatalog = ModeCatalog {
    resource: "tickets",
    entries: &[
        (Mode::Basic, Role::User),
        (Mode::Default, Role::User),
        (Mode::Expanded, Role::Support),
        (Mode::Full, Role::Staff),
    ],
    default_for: |_| Mode::Basic,
};

pub static TICKET_DETAIL: ModeCatalog = ModeCatalog {
    resource: "ticket",
    entries: &[
        (Mode::Default, Role::User),
        (Mode::Expanded, Role::Support),
        (Mode::Full, Role::Staff),
    ],
    default_for: |role| match role {
        Role::Support => Mode::Expanded,
        Role::Staff | Role::Superuser => Mode::Full,
        _ => Mode::Default,
    },
};

pub static MESSAGES: ModeCatalog = ModeCatalog {
    resource: "messages",
    entries: &[(Mode::Basic, Role::User), (Mode::Expanded, Role::Support)],
    default_for: |_| Mode::Basic,
};

/// Render a timestamp the way the API has always shown dates:
/// `d-m-yyyy (HH:MM)`.
pub fn readable_date(date: &DateTime<Utc>) -> String {
    format!(
        "{}-{}-{} ({:02}:{:02})",
        date.day(),
        date.month(),
        date.year(),
        date.hour(),
        date.minute()
    )
}

/// Render a second count as a coarse human-readable duration. Finer units
/// are dropped as the range grows.
pub fn readable_seconds(total: i64) -> String {
    let total = total.max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days} day(s) {hours} hour(s)")
    } else if hours > 0 {
        format!("{hours} hour(s) {minutes} minute(s)")
    } else if minutes > 0 {
        format!("{minutes} minute(s) {seconds} second(s)")
    } else {
        format!("{seconds} second(s)")
    }
}

/// Elapsed-time rendering for "awaiting a reply since" fields; None means
/// nothing is awaiting a reply.
pub fn elapsed_since(since: Option<&DateTime<Utc>>) -> String {
    match since {
        Some(start) => readable_seconds((Utc::now() - *start).num_seconds()),
        None => readable_seconds(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_user_list_mode_default_is_basic() {
        let mode = USERS_LIST.resolve(Role::User, None).unwrap();
        assert_eq!(mode, Mode::Basic);
    }

    #[test]
    fn plain_user_cannot_request_full() {
        let err = USERS_LIST.resolve(Role::User, Some("full")).unwrap_err();
        let msg = err.message().to_string();
        assert_eq!(err.status_code(), 400);
        assert!(msg.contains("basic"), "choices missing from: {msg}");
        assert!(msg.contains("default"), "choices missing from: {msg}");
        assert!(!msg.contains("expanded"), "expanded leaked into: {msg}");
    }

    #[test]
    fn staff_can_request_full() {
        let mode = USERS_LIST.resolve(Role::Staff, Some("full")).unwrap();
        assert_eq!(mode, Mode::Full);
    }

    #[test]
    fn unknown_mode_is_rejected_with_choices() {
        let err = USERS_LIST.resolve(Role::Staff, Some("everything")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("<everything>"));
    }

    #[test]
    fn anonymous_has_no_permitted_modes_on_users() {
        let err = USERS_LIST.resolve(Role::Anonymous, None).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn support_detail_default_is_expanded() {
        assert_eq!(USER_DETAIL.resolve(Role::Support, None).unwrap(), Mode::Expanded);
        assert_eq!(USER_DETAIL.resolve(Role::User, None).unwrap(), Mode::Default);
    }

    #[test]
    fn staff_ticket_detail_defaults_to_full() {
        assert_eq!(TICKET_DETAIL.resolve(Role::Staff, None).unwrap(), Mode::Full);
    }

    #[test]
    fn permitted_sets_grow_with_role() {
        let user = USERS_LIST.permitted(Role::User);
        let support = USERS_LIST.permitted(Role::Support);
        let staff = USERS_LIST.permitted(Role::Staff);
        assert!(user.len() < support.len());
        assert!(support.len() < staff.len());
        for m in &user {
            assert!(support.contains(m));
        }
        for m in &support {
            assert!(staff.contains(m));
        }
    }

    #[test]
    fn readable_seconds_drops_fine_units() {
        assert_eq!(readable_seconds(0), "0 second(s)");
        assert_eq!(readable_seconds(59), "59 second(s)");
        assert_eq!(readable_seconds(61), "1 minute(s) 1 second(s)");
        assert_eq!(readable_seconds(3 * 3600 + 120), "3 hour(s) 2 minute(s)");
        assert_eq!(readable_seconds(2 * 86400 + 3600), "2 day(s) 1 hour(s)");
    }
}
