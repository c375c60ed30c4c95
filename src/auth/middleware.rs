//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::api::response::{ApiResponse, Envelope};
use crate::auth::{jwt::JwtHandler, models::AuthUser};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Auth middleware that validates JWT tokens.
///
/// On success the verified identity is available to handlers as
/// `Extension<AuthUser>` for the rest of this request only.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(GateError::MissingToken)?
        .to_str()
        .map_err(|_| GateError::InvalidFormat)?;

    let token = parse_bearer(value)?;

    let claims = jwt_handler.validate_token(token).map_err(|e| {
        debug!(reason = e.reason(), "Rejected bearer token: {}", e);
        GateError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}

/// Accepts exactly `Bearer <token>`: two space-separated parts, literal scheme.
pub fn parse_bearer(value: &str) -> Result<&str, GateError> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(GateError::InvalidFormat),
    }
}

/// Auth error types
#[derive(Debug, PartialEq, Eq)]
pub enum GateError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        debug!("Request rejected by auth gate: {:?}", self);

        // Same body for every reason
        Envelope(
            StatusCode::UNAUTHORIZED,
            ApiResponse::failure("unauthorized", Some(json!("invalid or missing token"))),
        )
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request as HttpRequest,
        middleware,
        routing::get,
        Extension, Json, Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const SECRET: &str = "gate-test-secret";

    fn app(jwt: Arc<JwtHandler>, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/protected",
                get(move |Extension(user): Extension<AuthUser>| {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "user_id": user.user_id, "email": user.email }))
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(jwt, auth_middleware))
    }

    async fn call(auth: Option<&str>) -> (StatusCode, Value, usize) {
        let jwt = Arc::new(JwtHandler::new(SECRET, Duration::hours(1)));
        call_with(jwt, auth).await
    }

    async fn call_with(jwt: Arc<JwtHandler>, auth: Option<&str>) -> (StatusCode, Value, usize) {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut req = HttpRequest::builder().uri("/protected");
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }

        let response = app(jwt, hits.clone())
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap();
        (status, json, hits.load(Ordering::SeqCst))
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(parse_bearer("Basic xyz"), Err(GateError::InvalidFormat));
        assert_eq!(parse_bearer("bearer abc"), Err(GateError::InvalidFormat));
        assert_eq!(parse_bearer("Bearer"), Err(GateError::InvalidFormat));
        assert_eq!(parse_bearer("Bearer "), Err(GateError::InvalidFormat));
        assert_eq!(parse_bearer("Bearer a b"), Err(GateError::InvalidFormat));
        assert_eq!(parse_bearer("Bearer  abc"), Err(GateError::InvalidFormat));
        assert_eq!(parse_bearer(""), Err(GateError::InvalidFormat));
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let (status, body, hits) = call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "unauthorized");
        assert_eq!(hits, 0);
    }

    #[tokio::test]
    async fn test_basic_scheme_rejected() {
        let (status, _, hits) = call(Some("Basic xyz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(hits, 0);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (status, _, hits) = call(Some("Bearer not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(hits, 0);
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let jwt = Arc::new(JwtHandler::new(SECRET, Duration::hours(1)));
        let token = jwt.issue_token(7, "alice@x.com").unwrap();

        let (status, body, hits) = call_with(jwt, Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], 7);
        assert_eq!(body["email"], "alice@x.com");
        assert_eq!(hits, 1);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let jwt = Arc::new(JwtHandler::new(SECRET, Duration::hours(1)));
        let token = jwt
            .issue_token_at(7, "alice@x.com", Utc::now() - Duration::hours(2))
            .unwrap();

        let (status, _, hits) = call_with(jwt, Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(hits, 0);
    }

    #[tokio::test]
    async fn test_foreign_secret_rejected() {
        let other = JwtHandler::new("someone-else", Duration::hours(1));
        let token = other.issue_token(7, "alice@x.com").unwrap();

        let (status, _, hits) = call(Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(hits, 0);
    }

    #[tokio::test]
    async fn test_rejections_share_one_body() {
        let (_, missing, _) = call(None).await;
        let (_, basic, _) = call(Some("Basic xyz")).await;
        let (_, bad, _) = call(Some("Bearer nope")).await;
        assert_eq!(missing, basic);
        assert_eq!(basic, bad);
    }
}
