use aquafarm_core::{User, UserId};
use axum::{Extension, Json, extract::State, http::StatusCode, response::Response};
use jiff::Timestamp;
use ulid::Ulid;

use crate::auth::{Claims, issue_token};
use crate::registry::UserRegistry;

use super::models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use super::{error_response, parse_id, registry_error_response, success_response};

pub async fn register<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<RegisterRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: UserRegistry,
{
    if payload.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Password is required".to_string());
    }

    let password_hash = match bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "failed to hash password");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process password".to_string(),
            );
        }
    };

    let user = User {
        id: UserId(Ulid::new()),
        name: payload.name.into(),
        email: payload.email.into(),
        password_hash: password_hash.into(),
        created_at: Timestamp::now(),
    };

    if let Err(e) = state.users.create_user(user.clone()).await {
        return registry_error_response("Failed to register user", e);
    }

    match issue_token(&state.auth, &user) {
        Ok(token) => success_response(
            StatusCode::CREATED,
            AuthResponse {
                token,
                user: user.into(),
            },
            Some("User registered successfully".to_string()),
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to issue token");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to issue token".to_string(),
            )
        }
    }
}

pub async fn login<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Json(payload): Json<LoginRequest>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: UserRegistry,
{
    let user = match state.users.find_by_email(&payload.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());
        }
        Err(e) => return registry_error_response("Failed to look up user", e),
    };

    match bcrypt::verify(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());
        }
    }

    match issue_token(&state.auth, &user) {
        Ok(token) => success_response(
            StatusCode::OK,
            AuthResponse {
                token,
                user: user.into(),
            },
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to issue token");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to issue token".to_string(),
            )
        }
    }
}

pub async fn me<C, S, M, U>(
    State(state): State<crate::AppState<C, S, M, U>>,
    Extension(claims): Extension<Claims>,
) -> Response
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: UserRegistry,
{
    let user_id = match parse_id(&claims.sub, "user") {
        Ok(id) => UserId(id),
        Err(response) => return response,
    };

    match state.users.get_user(user_id).await {
        Ok(Some(user)) => success_response(StatusCode::OK, UserResponse::from(user), None),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found".to_string()),
        Err(e) => registry_error_response("Failed to get user", e),
    }
}
