//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use core_kernel::OperationMetadata;

use crate::auth::Claims;
use crate::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Validates the bearer token and attaches [`Claims`] and the caller's
/// [`OperationMetadata`] to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let Some(token) = token else {
        warn!("Missing or invalid Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = crate::auth::validate_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = %e, "Token validation failed");
        StatusCode::UNAUTHORIZED
    })?;
    let user_id = claims.user_id().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let actor = match request.headers().get(REQUEST_ID_HEADER).and_then(|h| h.to_str().ok()) {
        Some(request_id) => OperationMetadata::for_user(user_id).correlated(request_id),
        None => OperationMetadata::for_user(user_id),
    };

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Logs method, uri, user, status and duration of every API request
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();
    let response = next.run(request).await;
    let duration = Utc::now() - start;

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        status = response.status().as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
