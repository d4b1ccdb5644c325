use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;

use crate::authz::Actor;
use crate::errors::AppError;
use crate::session::SessionCookie;
use crate::storage;
use crate::web::AppState;

/// The authenticated caller. Rejects anonymous requests with 401.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

/// The caller when one is logged in. A session id that is present but
/// unknown or expired is still a 401 rather than silently anonymous.
#[derive(Debug, Clone, Copy)]
pub struct MaybeActor(pub Option<Actor>);

async fn actor_from_parts(parts: &Parts, state: &AppState) -> Result<Option<Actor>, AppError> {
    let Some(cookie) = SessionCookie::from_headers(&parts.headers) else {
        return Ok(None);
    };

    let session = storage::get_session(&state.db, &cookie.session_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    let user = storage::get_user(&state.db, session.user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    tracing::debug!(user_id = user.id, role = %user.role, "resolved request actor");
    Ok(Some(Actor {
        id: user.id,
        role: user.role,
    }))
}

impl FromRequestParts<AppState> for MaybeActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        Ok(MaybeActor(actor_from_parts(parts, state).await?))
    }
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        actor_from_parts(parts, state)
            .await?
            .map(CurrentActor)
            .ok_or(AppError::Unauthenticated)
    }
}

/// `Json` whose rejections render as `AppError::Validation`.
#[derive(Debug, Clone, Copy)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, AppError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// `Path` whose rejections render as `AppError::Validation`.
#[derive(Debug, Clone, Copy)]
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, AppError> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(AppPath(value))
    }
}
