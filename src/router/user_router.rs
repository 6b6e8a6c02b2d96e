use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handler::user_handler::{
    create_user_handler, current_user_handler, delete_user_handler, list_users_handler, login_handler,
    logout_handler, refresh_token_handler, update_profile_handler, update_user_handler,
};
use crate::middlewares::auth_middleware::{require_admin, require_session, AuthState};
use crate::service::user_service::UserServiceImpl;

pub fn user_router(service: Arc<UserServiceImpl>, auth_state: Arc<AuthState>) -> Router {
    let public = Router::new()
        .route("/users/login", post(login_handler))
        .route("/users/refresh-token", post(refresh_token_handler));

    let signed_in = Router::new()
        .route("/users/logout", post(logout_handler))
        .route("/users/me", get(current_user_handler).put(update_profile_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), require_session));

    // Layers run outermost-last: the session is resolved before the role check.
    let admin = Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/users/{id}", patch(update_user_handler).delete(delete_user_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(auth_state, require_session));

    public.merge(signed_in).merge(admin).with_state(service)
}
