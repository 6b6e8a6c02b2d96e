use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::dto::user_dto::{
    CreateUserRequest, LoginRequest, RefreshTokenRequest, UpdateProfileRequest, UpdateUserRequest,
};
use crate::service::user_service::{UserService, UserServiceImpl, INVALID_CREDENTIALS};
use crate::util::error::HandlerError;
use crate::util::session::Session;

pub async fn login_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    // A malformed email is reported like any other failed login.
    if payload.validate().is_err() {
        return Err(HandlerError::unauthorized(INVALID_CREDENTIALS));
    }
    let res = service.login(&payload.email, &payload.password).await?;
    Ok(Json(res))
}

pub async fn refresh_token_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload.validate()?;
    Ok(Json(service.refresh_token(&payload.refresh_token).await?))
}

pub async fn logout_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HandlerError> {
    service.logout(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.current_user(&session).await?))
}

pub async fn update_profile_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Extension(session): Extension<Session>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload.validate()?;
    Ok(Json(service.update_profile(&session, payload).await?))
}

pub async fn list_users_handler(
    State(service): State<Arc<UserServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_users().await?))
}

pub async fn create_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload.validate()?;
    let user = service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload.validate()?;
    Ok(Json(service.update_user(&id, payload).await?))
}

pub async fn delete_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    service.delete_user(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
