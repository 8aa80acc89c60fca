use axum::http::Method;

use crate::database::models::{Ticket, User};
use crate::error::ApiError;
use crate::roles::Role;

/// Target of a user-detail request. `me` and `0` are sentinels for the
/// caller's own record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTarget {
    Me,
    Id(i64),
}

impl UserTarget {
    /// Parse a path segment (`me`, `0`, or a record id).
    pub fn parse(raw: &str) -> Result<UserTarget, ApiError> {
        if raw == "me" {
            return Ok(UserTarget::Me);
        }
        match raw.parse::<i64>() {
            Ok(0) => Ok(UserTarget::Me),
            Ok(id) if id > 0 => Ok(UserTarget::Id(id)),
            _ => Err(ApiError::invalid_argument(format!(
                "Can not handle user id ({raw}). Please enter a valid id or \"me\"."
            ))),
        }
    }
}

/// A caller may act on a User record when it is their own, or when their
/// role is Support or above.
pub struct SelfOrElevated;

impl SelfOrElevated {
    /// Detail endpoints: resolve the effective target id or deny.
    pub fn resolve_detail(caller: &User, role: Role, target: UserTarget) -> Result<i64, ApiError> {
        let target_id = match target {
            UserTarget::Me => caller.id,
            UserTarget::Id(id) => id,
        };
        if target_id == caller.id || role >= Role::Support {
            return Ok(target_id);
        }
        Err(ApiError::permission_denied(format!(
            "Permission denied. Current user_id = {}. Use \"/users/me/\" or \"/users/{}/\" instead.",
            caller.id, caller.id
        )))
    }

    /// List endpoints: resolve the ownership filter. `Some(0)` means the
    /// caller; absence is only permitted for Support and above (meaning "no
    /// restriction"). Below Support the filter must resolve to the caller,
    /// and the denial names the query value that would succeed.
    pub fn resolve_list(
        caller: &User,
        role: Role,
        requested: Option<i64>,
    ) -> Result<Option<i64>, ApiError> {
        match requested {
            Some(0) => Ok(Some(caller.id)),
            Some(id) if id == caller.id || role >= Role::Support => Ok(Some(id)),
            None if role >= Role::Support => Ok(None),
            _ => Err(ApiError::permission_denied(format!(
                "Permission denied. Current user_id = {}. \
                 Use \"?user_id={}\" to get list of items or try another request method.",
                caller.id, caller.id
            ))),
        }
    }
}

/// A caller may view/act on a Ticket when their role is Support or above, or
/// when they own it. Unknown ids are NotFound for everyone, so existence
/// never leaks through a different error shape.
pub struct TicketOwnership;

impl TicketOwnership {
    pub fn check(
        caller: &User,
        role: Role,
        ticket: Option<Ticket>,
    ) -> Result<Ticket, ApiError> {
        let Some(ticket) = ticket else {
            return Err(ApiError::not_found("Ticket with this id does not exist"));
        };
        if role >= Role::Support || ticket.opened_by == caller.id {
            return Ok(ticket);
        }
        Err(ApiError::permission_denied(format!(
            "Permission denied. Current user is not a ticket owner. Current user_id = {}",
            caller.id
        )))
    }
}

/// Per-resource verb gate. Verbs outside the known set are a distinct error
/// kind from "recognized but forbidden".
pub struct MethodPolicy;

const KNOWN_METHODS: &[Method] = &[
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

impl MethodPolicy {
    fn recognized(method: &Method) -> Result<(), ApiError> {
        if KNOWN_METHODS.contains(method) {
            Ok(())
        } else {
            Err(ApiError::method_not_recognized(format!(
                "Method {method} is not recognized for this resource."
            )))
        }
    }

    fn insufficient(method: &Method) -> ApiError {
        ApiError::permission_denied(format!(
            "Permission denied. Insufficient permissions to use the method {method}."
        ))
    }

    /// Ticket detail: Staff+ may do anything; Support may read and update;
    /// the owner may read, update, and delete their own ticket.
    pub fn check_ticket(role: Role, is_owner: bool, method: &Method) -> Result<(), ApiError> {
        Self::recognized(method)?;
        if role >= Role::Staff {
            return Ok(());
        }
        let allowed = if *method == Method::GET {
            true
        } else if *method == Method::PATCH || *method == Method::PUT {
            role >= Role::Support || is_owner
        } else if *method == Method::DELETE {
            is_owner
        } else {
            false
        };
        if allowed {
            Ok(())
        } else {
            Err(Self::insufficient(method))
        }
    }

    /// Message collection under a ticket: reading follows ticket ownership;
    /// appending is for the owner and Support+ (support replies).
    pub fn check_messages(role: Role, is_owner: bool, method: &Method) -> Result<(), ApiError> {
        Self::recognized(method)?;
        let allowed = if *method == Method::GET {
            true
        } else if *method == Method::POST {
            role >= Role::Support || is_owner
        } else {
            role >= Role::Staff
        };
        if allowed {
            Ok(())
        } else {
            Err(Self::insufficient(method))
        }
    }

    /// Single message: anyone who can see the ticket can read; mutation is
    /// Staff+ only.
    pub fn check_message_detail(role: Role, method: &Method) -> Result<(), ApiError> {
        Self::recognized(method)?;
        if *method == Method::GET || role >= Role::Staff {
            Ok(())
        } else {
            Err(Self::insufficient(method))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64) -> User {
        User {
            id,
            email: format!("u{id}@example.com"),
            username: format!("u{id}"),
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

    fn ticket(id: i64, opened_by: i64) -> Ticket {
        Ticket {
            id,
            ticket_theme: "other".into(),
            opened_by,
            is_closed: false,
            is_frozen: false,
            is_answered: true,
            user_question_date: None,
            answerer_id: None,
            messages_count: 0,
            closed_by_id: None,
            staff_note: String::new(),
            creation_date: Utc::now(),
            last_changes: Utc::now(),
        }
    }

    #[test]
    fn target_parse_accepts_me_and_zero() {
        assert_eq!(UserTarget::parse("me").unwrap(), UserTarget::Me);
        assert_eq!(UserTarget::parse("0").unwrap(), UserTarget::Me);
        assert_eq!(UserTarget::parse("42").unwrap(), UserTarget::Id(42));
        assert!(UserTarget::parse("abc").is_err());
    }

    #[test]
    fn detail_allows_self_and_elevated() {
        let caller = user(3);
        assert_eq!(
            SelfOrElevated::resolve_detail(&caller, Role::User, UserTarget::Me).unwrap(),
            3
        );
        assert_eq!(
            SelfOrElevated::resolve_detail(&caller, Role::User, UserTarget::Id(3)).unwrap(),
            3
        );
        let denied =
            SelfOrElevated::resolve_detail(&caller, Role::User, UserTarget::Id(9)).unwrap_err();
        assert_eq!(denied.status_code(), 403);

        assert_eq!(
            SelfOrElevated::resolve_detail(&caller, Role::Support, UserTarget::Id(9)).unwrap(),
            9
        );
    }

    #[test]
    fn list_requires_self_filter_below_support() {
        let caller = user(3);
        // absent filter is denied with the exact query value that would succeed
        let err = SelfOrElevated::resolve_list(&caller, Role::User, None).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.message().contains("?user_id=3"), "bad message: {}", err.message());

        assert_eq!(
            SelfOrElevated::resolve_list(&caller, Role::User, Some(0)).unwrap(),
            Some(3)
        );
        assert_eq!(
            SelfOrElevated::resolve_list(&caller, Role::User, Some(3)).unwrap(),
            Some(3)
        );
        assert!(SelfOrElevated::resolve_list(&caller, Role::User, Some(9)).is_err());
    }

    #[test]
    fn list_is_unrestricted_for_support_and_above() {
        let caller = user(3);
        assert_eq!(SelfOrElevated::resolve_list(&caller, Role::Support, None).unwrap(), None);
        assert_eq!(
            SelfOrElevated::resolve_list(&caller, Role::Staff, Some(9)).unwrap(),
            Some(9)
        );
    }

    #[test]
    fn unknown_ticket_is_not_found_even_for_plain_users() {
        let caller = user(3);
        let err = TicketOwnership::check(&caller, Role::User, None).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn foreign_ticket_is_denied_below_support_but_visible_above() {
        let caller = user(3);
        let t = ticket(1, 9);
        let err = TicketOwnership::check(&caller, Role::User, Some(t.clone())).unwrap_err();
        assert_eq!(err.status_code(), 403);

        assert!(TicketOwnership::check(&caller, Role::Support, Some(t)).is_ok());
    }

    #[test]
    fn owner_may_delete_but_support_may_not() {
        assert!(MethodPolicy::check_ticket(Role::User, true, &Method::DELETE).is_ok());
        let err = MethodPolicy::check_ticket(Role::Support, false, &Method::DELETE).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(MethodPolicy::check_ticket(Role::Staff, false, &Method::DELETE).is_ok());
    }

    #[test]
    fn support_may_patch_but_not_plain_non_owner() {
        assert!(MethodPolicy::check_ticket(Role::Support, false, &Method::PATCH).is_ok());
        assert!(MethodPolicy::check_ticket(Role::User, false, &Method::PATCH).is_err());
        assert!(MethodPolicy::check_ticket(Role::User, true, &Method::PATCH).is_ok());
    }

    #[test]
    fn exotic_verbs_are_a_distinct_error_kind() {
        let err =
            MethodPolicy::check_ticket(Role::Superuser, true, &Method::TRACE).unwrap_err();
        assert_eq!(err.status_code(), 405);
        assert_eq!(err.error_code(), "METHOD_NOT_RECOGNIZED");
    }

    #[test]
    fn support_and_owner_may_append_messages() {
        assert!(MethodPolicy::check_messages(Role::Support, false, &Method::POST).is_ok());
        assert!(MethodPolicy::check_messages(Role::User, true, &Method::POST).is_ok());
        assert!(MethodPolicy::check_messages(Role::User, false, &Method::POST).is_err());
    }

    #[test]
    fn message_mutation_is_staff_only() {
        assert!(MethodPolicy::check_message_detail(Role::Staff, &Method::DELETE).is_ok());
        assert!(MethodPolicy::check_message_detail(Role::Support, &Method::DELETE).is_err());
        assert!(MethodPolicy::check_message_detail(Role::User, &Method::GET).is_ok());
    }
}
