use serde::{Deserialize, Serialize};

use crate::database::models::User;

/// Privilege rank of a request principal. A user row can carry several role
/// flags at once; classification always yields the highest applicable rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Anonymous,
    User,
    Support,
    Staff,
    Superuser,
}

impl Role {
    /// Total, side-effect-free classification. Flags are checked in strict
    /// priority order: is_superuser > is_staff > is_support.
    pub fn classify(principal: Option<&User>) -> Role {
        let Some(user) = principal else {
            return Role::Anonymous;
        };
        if user.is_superuser {
            Role::Superuser
        } else if user.is_staff {
            Role::Staff
        } else if user.is_support {
            Role::Support
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::User => "user",
            Role::Support => "support",
            Role::Staff => "staff",
            Role::Superuser => "superuser",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_flags(is_support: bool, is_staff: bool, is_superuser: bool) -> User {
        User {
            id: 1,
            email: "u@example.com".into(),
            username: "u".into(),
            password_digest: String::new(),
            is_staff,
            is_superuser,
            is_support,
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
    fn anonymous_without_identity() {
        assert_eq!(Role::classify(None), Role::Anonymous);
    }

    #[test]
    fn plain_user_without_flags() {
        let u = user_with_flags(false, false, false);
        assert_eq!(Role::classify(Some(&u)), Role::User);
    }

    #[test]
    fn superuser_flag_wins_regardless_of_other_flags() {
        let u = user_with_flags(true, true, true);
        assert_eq!(Role::classify(Some(&u)), Role::Superuser);
    }

    #[test]
    fn staff_outranks_support_when_both_set() {
        let u = user_with_flags(true, true, false);
        assert_eq!(Role::classify(Some(&u)), Role::Staff);
    }

    #[test]
    fn ranking_is_a_strict_hierarchy() {
        assert!(Role::Anonymous < Role::User);
        assert!(Role::User < Role::Support);
        assert!(Role::Support < Role::Staff);
        assert!(Role::Staff < Role::Superuser);
    }
}
