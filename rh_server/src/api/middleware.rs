//! Actor identity middleware for protected endpoints.
//!
//! Authentication happens upstream; the gateway in front of this server forwards
//! the authenticated identity as two headers:
//!
//! ```text
//! x-actor-id: 42
//! x-actor-role: driver
//! ```
//!
//! The middleware parses them into an [`Actor`] and injects it into request
//! extensions. Handlers extract it with `Extension<Actor>`.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ride_hailing::booking::{Actor, ActorRole};

use super::error::{ApiError, ApiResult};
use crate::logging::log_rejected_identity;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Identity middleware that validates actor headers and injects the [`Actor`].
///
/// - **Success**: both headers parse → `Actor` in extensions → next handler
/// - **Missing or malformed header**: `401 Unauthorized`
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    match actor_from_headers(request.headers()) {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Err((reason, actor_id)) => {
            log_rejected_identity(reason, actor_id, request.uri().path());
            let mut err = ApiError::new("unauthorized", reason);
            err.code = StatusCode::UNAUTHORIZED;
            err.into_response()
        }
    }
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, (&'static str, Option<i64>)> {
    let id = headers
        .get(ACTOR_ID_HEADER)
        .ok_or(("missing x-actor-id", None))?
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(("malformed x-actor-id", None))?;

    let role = headers
        .get(ACTOR_ROLE_HEADER)
        .ok_or(("missing x-actor-role", Some(id)))?
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<ActorRole>().ok())
        .ok_or(("malformed x-actor-role", Some(id)))?;

    Ok(Actor { id, role })
}

/// Reject anyone but an admin
pub fn require_admin(actor: &Actor) -> ApiResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden(actor.role))
    }
}

/// Reject anyone but a driver
pub fn require_driver(actor: &Actor) -> ApiResult<()> {
    if actor.role == ActorRole::Driver {
        Ok(())
    } else {
        Err(ApiError::forbidden(actor.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&'static str>, role: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(id) = id {
            headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static(id));
        }
        if let Some(role) = role {
            headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static(role));
        }
        headers
    }

    #[test]
    fn test_parses_actor() {
        let actor = actor_from_headers(&headers(Some("42"), Some("Driver"))).unwrap();
        assert_eq!(actor, Actor::driver(42));
    }

    #[test]
    fn test_missing_headers() {
        assert!(actor_from_headers(&headers(None, Some("rider"))).is_err());
        let err = actor_from_headers(&headers(Some("7"), None)).unwrap_err();
        assert_eq!(err, ("missing x-actor-role", Some(7)));
    }

    #[test]
    fn test_malformed_headers() {
        assert!(actor_from_headers(&headers(Some("abc"), Some("rider"))).is_err());
        assert!(actor_from_headers(&headers(Some("-3"), Some("rider"))).is_err());
        assert!(actor_from_headers(&headers(Some("3"), Some("pilot"))).is_err());
    }

    #[test]
    fn test_role_guards() {
        assert!(require_admin(&Actor::admin(1)).is_ok());
        assert!(require_admin(&Actor::driver(1)).is_err());
        assert!(require_driver(&Actor::driver(1)).is_ok());
        assert!(require_driver(&Actor::rider(1)).is_err());
    }
}
