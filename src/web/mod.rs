//! HTTP surface. Handlers only extract the actor and path, then delegate to
//! `operations`; every failure is an `AppError` rendered as JSON.

pub mod accounts;
pub mod exercises;
pub mod extract;

use crate::settings::Settings;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseConnection,
}

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    // JSON only, nothing to load
    headers.insert(
        HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router(state: AppState) -> Router {
    use self::accounts as acc;
    use self::exercises as ex;

    const LECTION: &str = "/exercises/courses/{course_id}/lections/{lection_id}";

    let mut router = Router::new()
        .route("/healthz", get(health))
        .route("/accounts/login", post(acc::login))
        .route("/accounts/logout", post(acc::logout))
        .route("/accounts/me", get(acc::me))
        .route("/accounts/students/", get(acc::list_students))
        .route(
            "/exercises/courses/",
            get(ex::list_courses).post(ex::create_course),
        )
        .route("/exercises/courses/my", get(ex::my_courses))
        .route(
            "/exercises/courses/{course_id}",
            get(ex::get_course).delete(ex::delete_course),
        )
        .route(
            "/exercises/courses/{course_id}/add_student",
            post(ex::add_student),
        )
        .route(
            "/exercises/courses/{course_id}/remove_student",
            post(ex::remove_student),
        )
        .route(
            "/exercises/courses/{course_id}/add_lector",
            post(ex::add_lector),
        )
        .route(
            "/exercises/courses/{course_id}/lectors",
            get(ex::course_lectors),
        )
        .route(
            "/exercises/courses/{course_id}/students",
            get(ex::course_students),
        )
        .route(
            "/exercises/courses/{course_id}/lections",
            get(ex::list_lections),
        )
        .route(
            "/exercises/courses/{course_id}/lections/add_lection",
            post(ex::create_lection),
        )
        .route(LECTION, get(ex::get_lection))
        .route(
            &format!("{LECTION}/add_homework"),
            post(ex::create_homework),
        )
        .route(&format!("{LECTION}/homework"), get(ex::get_homework))
        .route(
            &format!("{LECTION}/homework/add_solution"),
            post(ex::add_solution),
        )
        .route(
            &format!("{LECTION}/homework/solutions"),
            get(ex::list_solutions),
        )
        .route(
            &format!("{LECTION}/homework/{{student_id}}"),
            get(ex::get_solution).post(ex::submit_solution),
        )
        .route(
            &format!("{LECTION}/homework/{{student_id}}/rate"),
            post(ex::rate_solution),
        )
        .route(
            &format!("{LECTION}/homework/{{student_id}}/comments"),
            get(ex::list_comments).post(ex::add_comment),
        );

    // Conditionally add public registration routes
    if state.settings.server.allow_public_registration {
        tracing::info!("Public registration is ENABLED");
        router = router
            .route("/accounts/students/register", post(acc::register_student))
            .route("/accounts/lectors/register", post(acc::register_lector));
    } else {
        tracing::info!("Public registration is DISABLED");
    }

    router
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let state = AppState {
        settings: Arc::new(settings),
        db,
    };

    let addr: SocketAddr = state
        .settings
        .listen_addr()
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    tracing::info!(%addr, "Coursework API listening");
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}
