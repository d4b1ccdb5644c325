use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::authz::Role;
use crate::errors::AppError;
use crate::operations;
use crate::session::SessionCookie;
use crate::storage::{self, NewUser, User};
use crate::web::extract::{AppJson, CurrentActor};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub expires_at: i64,
    pub user: User,
}

pub async fn register_student(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = operations::register(&state.db, &input, Role::Student).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn register_lector(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = operations::register(&state.db, &input, Role::Lector).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_students(
    State(state): State<AppState>,
    CurrentActor(_): CurrentActor,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(operations::list_students(&state.db).await?))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = storage::verify_user_password(&state.db, &req.username, &req.password)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let session =
        storage::create_session(&state.db, user.id, state.settings.server.session_ttl_secs)
            .await?;
    tracing::info!(user_id = user.id, "User logged in");

    let cookie = SessionCookie::new(session.session_id.clone()).to_cookie_header(&state.settings);
    let body = LoginResponse {
        session_id: session.session_id,
        expires_at: session.expires_at,
        user,
    };
    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = SessionCookie::from_headers(&headers) {
        storage::delete_session(&state.db, &cookie.session_id).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, SessionCookie::delete_cookie_header())],
    ))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<User>, AppError> {
    let user = storage::get_user(&state.db, actor.id)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    Ok(Json(user))
}
