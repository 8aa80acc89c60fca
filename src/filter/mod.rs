//! Validation of the list-endpoint query parameters: `limit`, `order`,
//! `user_id`. Invalid values fail with the valid choices enumerated; nothing
//! falls back silently.

use serde::Deserialize;

use crate::config;
use crate::error::ApiError;

/// Raw query string of every list/detail endpoint. All parameters are
/// optional; validation happens in the functions below.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub mode: Option<String>,
    pub limit: Option<String>,
    pub order: Option<String>,
    pub user_id: Option<String>,
}

/// Parse `limit`: a positive integer, capped by configuration.
pub fn parse_limit(raw: Option<&str>) -> Result<i64, ApiError> {
    let listing = &config::config().listing;
    let Some(raw) = raw else {
        return Ok(listing.default_limit);
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n.min(listing.max_limit)),
        _ => Err(ApiError::invalid_argument(format!(
            "invalid <limit> value ({raw}); expected a positive integer"
        ))),
    }
}

/// Apply `order` to a resource's default ordering: the named field is
/// promoted to primary sort key (swapping places with the previous primary)
/// and sort direction is preserved. A leading `-` is accepted as the promote
/// marker and stripped.
pub fn apply_order(raw: Option<&str>, defaults: &[&str]) -> Result<Vec<String>, ApiError> {
    let mut ordering: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    let Some(raw) = raw else {
        return Ok(ordering);
    };

    let field = raw.strip_prefix('-').unwrap_or(raw);
    match ordering.iter().position(|c| c == field) {
        Some(idx) => {
            ordering.swap(0, idx);
            Ok(ordering)
        }
        None => Err(ApiError::invalid_argument(format!(
            "kwarg <{raw}> not in available choices: {defaults:?}"
        ))),
    }
}

/// Parse `user_id`: a non-negative integer; `0` is the caller sentinel,
/// resolved by the self-or-elevated guard.
pub fn parse_user_id(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(raw) = raw else { return Ok(None) };
    match raw.parse::<i64>() {
        Ok(id) if id >= 0 => Ok(Some(id)),
        _ => Err(ApiError::invalid_argument(format!(
            "Can not handle user_id({raw}). Please enter a valid user_id."
        ))),
    }
}

/// Parse a path id segment for tickets/messages.
pub fn parse_id(raw: &str, resource: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_argument(format!(
            "Can not handle {resource}_id({raw}). Please enter a valid {resource}_id."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &[&str] = &["id", "is_answered", "ticket_theme"];

    #[test]
    fn missing_order_keeps_defaults() {
        assert_eq!(apply_order(None, DEFAULTS).unwrap(), DEFAULTS.to_vec());
    }

    #[test]
    fn order_promotes_named_field_to_front() {
        let got = apply_order(Some("ticket_theme"), DEFAULTS).unwrap();
        assert_eq!(got, vec!["ticket_theme", "is_answered", "id"]);
    }

    #[test]
    fn leading_dash_promotes_without_reversing() {
        // promote-to-primary, preserve direction: "-x" and "x" are equivalent
        assert_eq!(
            apply_order(Some("-is_answered"), DEFAULTS).unwrap(),
            apply_order(Some("is_answered"), DEFAULTS).unwrap()
        );
    }

    #[test]
    fn unknown_order_field_lists_choices() {
        let err = apply_order(Some("color"), DEFAULTS).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.message().contains("<color>"));
        assert!(err.message().contains("ticket_theme"));
    }

    #[test]
    fn limit_must_be_a_positive_integer() {
        assert!(parse_limit(Some("25")).unwrap() >= 1);
        assert!(parse_limit(Some("0")).is_err());
        assert!(parse_limit(Some("-3")).is_err());
        assert!(parse_limit(Some("many")).is_err());
    }

    #[test]
    fn limit_is_capped_by_config() {
        let max = crate::config::config().listing.max_limit;
        assert_eq!(parse_limit(Some("999999999")).unwrap(), max);
    }

    #[test]
    fn user_id_zero_is_preserved_as_sentinel() {
        assert_eq!(parse_user_id(Some("0")).unwrap(), Some(0));
        assert_eq!(parse_user_id(None).unwrap(), None);
        assert!(parse_user_id(Some("x")).is_err());
        assert!(parse_user_id(Some("-1")).is_err());
    }
}
