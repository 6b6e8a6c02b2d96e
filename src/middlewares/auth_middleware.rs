use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::{debug, warn};

use crate::util::error::HandlerError;
use crate::util::jwt::JwtTokenUtils;
use crate::util::session::{Session, SessionRegistry};

pub struct AuthState {
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub sessions: Arc<SessionRegistry>,
}

/// Resolves the bearer token to a live [`Session`] and stores it, together
/// with the token claims, in the request extensions.
pub async fn require_session(
    State(state): State<Arc<AuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HandlerError::unauthorized("Missing authorization header"))?;

    let token = state
        .jwt_utils
        .extract_token_from_header(auth_header)
        .map_err(|e| HandlerError::unauthorized(e.to_string()))?;
    let claims = state
        .jwt_utils
        .validate_access_token(&token)
        .map_err(|e| HandlerError::unauthorized(e.to_string()))?;

    let session = match state.sessions.get(&claims.sid).await {
        Some(session) if session.user_id == claims.sub => session,
        _ => {
            warn!(user_id = %claims.sub, "Token refers to a closed session");
            return Err(HandlerError::unauthorized("Session has ended; sign in again"));
        }
    };
    debug!(user_id = %session.user_id, "Request authenticated");

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Must run after [`require_session`]. The role is read from the live
/// session, so a demotion takes effect without waiting for token expiry.
pub async fn require_admin(
    State(state): State<Arc<AuthState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    let session = req
        .extensions()
        .get::<Session>()
        .ok_or_else(|| HandlerError::unauthorized("Not authenticated"))?;

    if !state.jwt_utils.check_role_permission(session.role.as_str(), "admin") {
        warn!(user_id = %session.user_id, "Admin route refused");
        return Err(HandlerError::forbidden("Administrator role required"));
    }
    Ok(next.run(req).await)
}
