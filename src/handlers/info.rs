use axum::{http::Method, http::Uri, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;

/// GET / - static info document describing the API surface
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Support Desk API",
            "version": env!("CARGO_PKG_VERSION"),
            "This is a root page. Your next steps": {
                "tokens/": "token operations if have an account",
                "users/": "view users (if have credentials for) or create new",
                "tickets/": "to view tickets (if have credentials for) or create new",
            }
        }
    }))
}

/// Known route shapes, used only to improve 404 messages. `{id}` matches a
/// numeric segment or the `me` sentinel.
const ROUTES: &[&str] = &[
    "/",
    "/tokens/obtain/",
    "/tokens/refresh/",
    "/users/",
    "/users/{id}/",
    "/tickets/",
    "/tickets/my/",
    "/tickets/{id}/",
    "/tickets/{id}/messages/",
    "/tickets/{id}/messages/{id}/",
];

fn segment_matches(pattern: &str, segment: &str) -> bool {
    if pattern == "{id}" {
        segment == "me" || segment.parse::<i64>().is_ok()
    } else {
        pattern == segment
    }
}

fn route_exists(path: &str) -> bool {
    ROUTES.iter().any(|route| {
        let mut expected = route.split('/');
        let mut given = path.split('/');
        loop {
            match (expected.next(), given.next()) {
                (None, None) => return true,
                (Some(e), Some(g)) if segment_matches(e, g) => continue,
                _ => return false,
            }
        }
    })
}

/// Fallback for unmatched paths: structured 404, with a hint when the only
/// discrepancy is a missing trailing slash.
pub async fn unknown_route(uri: Uri) -> ApiError {
    let path = uri.path();
    let mut message = format!("path {path} does not exist.");
    if !path.ends_with('/') && route_exists(&format!("{path}/")) {
        message.push_str(" Could you have forgotten to add a slash?");
    }
    ApiError::not_found(message)
}

/// Fallback for verbs no resource knows about.
pub async fn unrecognized_method(method: Method) -> ApiError {
    ApiError::method_not_recognized(format!(
        "Method {method} is not recognized for this resource."
    ))
}
