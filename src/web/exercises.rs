use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::operations::{self, HomeworkView};
use crate::storage::{Comment, Course, Lection, NewItem, Solution, User};
use crate::web::extract::{AppJson, AppPath, CurrentActor, MaybeActor};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct CoursePath {
    pub course_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct LectionPath {
    pub course_id: i32,
    pub lection_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct SolutionPath {
    pub course_id: i32,
    pub lection_id: i32,
    pub student_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

// Courses

pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(operations::list_courses(&state.db).await?))
}

pub async fn create_course(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    AppJson(input): AppJson<NewItem>,
) -> Result<impl IntoResponse, AppError> {
    let course = operations::create_course(&state.db, actor.as_ref(), &input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn my_courses(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(operations::my_courses(&state.db, &actor).await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    AppPath(path): AppPath<CoursePath>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(operations::get_course(&state.db, path.course_id).await?))
}

pub async fn delete_course(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
) -> Result<StatusCode, AppError> {
    operations::delete_course(&state.db, &actor, path.course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_student(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
    AppJson(req): AppJson<MemberRequest>,
) -> Result<Json<Vec<User>>, AppError> {
    let students = operations::add_student(&state.db, &actor, path.course_id, req.user_id).await?;
    Ok(Json(students))
}

pub async fn remove_student(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
    AppJson(req): AppJson<MemberRequest>,
) -> Result<Json<Vec<User>>, AppError> {
    let students =
        operations::remove_student(&state.db, &actor, path.course_id, req.user_id).await?;
    Ok(Json(students))
}

pub async fn add_lector(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
    AppJson(req): AppJson<MemberRequest>,
) -> Result<Json<Vec<User>>, AppError> {
    let lectors = operations::add_lector(&state.db, &actor, path.course_id, req.user_id).await?;
    Ok(Json(lectors))
}

pub async fn course_lectors(
    State(state): State<AppState>,
    CurrentActor(_): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(operations::course_lectors(&state.db, path.course_id).await?))
}

pub async fn course_students(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(
        operations::course_students(&state.db, &actor, path.course_id).await?,
    ))
}

// Lections

pub async fn list_lections(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
) -> Result<Json<Vec<Lection>>, AppError> {
    Ok(Json(
        operations::list_lections(&state.db, &actor, path.course_id).await?,
    ))
}

pub async fn create_lection(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<CoursePath>,
    AppJson(input): AppJson<NewItem>,
) -> Result<impl IntoResponse, AppError> {
    let lection = operations::create_lection(&state.db, &actor, path.course_id, &input).await?;
    Ok((StatusCode::CREATED, Json(lection)))
}

pub async fn get_lection(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<LectionPath>,
) -> Result<Json<Lection>, AppError> {
    let lection =
        operations::get_lection(&state.db, &actor, path.course_id, path.lection_id).await?;
    Ok(Json(lection))
}

// Homework

pub async fn create_homework(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<LectionPath>,
    AppJson(input): AppJson<NewItem>,
) -> Result<impl IntoResponse, AppError> {
    let homework =
        operations::create_homework(&state.db, &actor, path.course_id, path.lection_id, &input)
            .await?;
    Ok((StatusCode::CREATED, Json(homework)))
}

pub async fn get_homework(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<LectionPath>,
) -> Result<Json<HomeworkView>, AppError> {
    let homework =
        operations::get_homework(&state.db, &actor, path.course_id, path.lection_id).await?;
    Ok(Json(homework))
}

// Solutions

/// Submits as the calling student.
pub async fn add_solution(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<LectionPath>,
    AppJson(req): AppJson<TextRequest>,
) -> Result<impl IntoResponse, AppError> {
    let solution = operations::submit_solution(
        &state.db,
        &actor,
        path.course_id,
        path.lection_id,
        actor.id,
        &req.text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(solution)))
}

pub async fn submit_solution(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<SolutionPath>,
    AppJson(req): AppJson<TextRequest>,
) -> Result<impl IntoResponse, AppError> {
    let solution = operations::submit_solution(
        &state.db,
        &actor,
        path.course_id,
        path.lection_id,
        path.student_id,
        &req.text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(solution)))
}

pub async fn get_solution(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<SolutionPath>,
) -> Result<Json<Solution>, AppError> {
    let solution = operations::get_solution(
        &state.db,
        &actor,
        path.course_id,
        path.lection_id,
        path.student_id,
    )
    .await?;
    Ok(Json(solution))
}

pub async fn list_solutions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<LectionPath>,
) -> Result<Json<Vec<Solution>>, AppError> {
    let solutions =
        operations::list_solutions(&state.db, &actor, path.course_id, path.lection_id).await?;
    Ok(Json(solutions))
}

pub async fn rate_solution(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<SolutionPath>,
    AppJson(req): AppJson<RatingRequest>,
) -> Result<Json<Solution>, AppError> {
    let solution = operations::rate_solution(
        &state.db,
        &actor,
        path.course_id,
        path.lection_id,
        path.student_id,
        req.rating,
    )
    .await?;
    Ok(Json(solution))
}

// Comments

pub async fn list_comments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<SolutionPath>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = operations::list_comments(
        &state.db,
        &actor,
        path.course_id,
        path.lection_id,
        path.student_id,
    )
    .await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    AppPath(path): AppPath<SolutionPath>,
    AppJson(req): AppJson<TextRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = operations::add_comment(
        &state.db,
        &actor,
        path.course_id,
        path.lection_id,
        path.student_id,
        &req.text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
