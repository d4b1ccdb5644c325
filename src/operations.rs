//! One function per endpoint: resolve the path, ask the predicate engine,
//! then touch the store. Each returns exactly one typed shape.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::authz::{engine, membership, Actor, CourseFilter, Role};
use crate::errors::AppError;
use crate::resolve;
use crate::storage::{self, Comment, Course, Homework, Lection, NewItem, NewUser, Solution, User};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

const MAX_USERNAME_LEN: usize = 20;
const MAX_PASSWORD_LEN: usize = 30;
const MAX_NAME_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// A homework with its owning lection, as returned to readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeworkView {
    #[serde(flatten)]
    pub homework: Homework,
    pub lection: Lection,
}

// ============================================================================
// Input validation
// ============================================================================

pub fn validate_new_user(input: &NewUser) -> Result<(), AppError> {
    let name_len = input.username.chars().count();
    if name_len == 0 || name_len > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "username must be 1 to {MAX_USERNAME_LEN} characters"
        )));
    }
    if !input.email.contains('@') {
        return Err(AppError::Validation("email address is malformed".into()));
    }
    let password_len = input.password.chars().count();
    if password_len == 0 || password_len > MAX_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be 1 to {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_item(input: &NewItem) -> Result<(), AppError> {
    let name_len = input.name.trim().chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    if input.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".into()));
    }
    Ok(())
}

/// Ratings are never clamped.
pub fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}

// ============================================================================
// Accounts
// ============================================================================

/// Anonymous self-registration. Staff accounts are only bootstrapped from
/// configuration.
pub async fn register(
    db: &DatabaseConnection,
    input: &NewUser,
    role: Role,
) -> Result<User, AppError> {
    if role == Role::Staff {
        return Err(AppError::Forbidden("staff accounts cannot be registered".into()));
    }
    validate_new_user(input)?;
    let user = storage::create_user(db, input, role).await?;
    tracing::info!(user_id = user.id, role = %role, "Registered user");
    Ok(user)
}

pub async fn list_students(db: &DatabaseConnection) -> Result<Vec<User>, AppError> {
    storage::list_users_by_role(db, Role::Student).await
}

// ============================================================================
// Courses
// ============================================================================

pub async fn list_courses(db: &DatabaseConnection) -> Result<Vec<Course>, AppError> {
    storage::list_courses(db, CourseFilter::All).await
}

pub async fn get_course(db: &DatabaseConnection, course_id: i32) -> Result<Course, AppError> {
    Ok(resolve::course(db, course_id).await?.course)
}

pub async fn create_course(
    db: &DatabaseConnection,
    actor: Option<&Actor>,
    input: &NewItem,
) -> Result<Course, AppError> {
    engine::create_course(actor)?;
    let actor = actor.ok_or(AppError::Unauthenticated)?;
    validate_item(input)?;

    let course = storage::create_course(db, actor.id, input).await?;
    tracing::info!(course_id = course.id, author_id = actor.id, "Created course");
    Ok(course)
}

pub async fn my_courses(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<Course>, AppError> {
    storage::list_courses(db, engine::my_courses(actor)).await
}

pub async fn delete_course(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
) -> Result<(), AppError> {
    let course = resolve::course(db, course_id).await?;
    engine::delete_course(actor, &course.scope)?;

    if !storage::delete_course(db, course_id).await? {
        return Err(AppError::NotFound(format!("course {course_id}")));
    }
    tracing::info!(course_id, actor_id = actor.id, "Deleted course");
    Ok(())
}

pub async fn add_student(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    user_id: i32,
) -> Result<Vec<User>, AppError> {
    let course = resolve::course(db, course_id).await?;
    let target = resolve::user(db, user_id).await?;
    engine::manage_membership(actor, &course.scope)?;
    membership::check_add_student(&course.scope, target.id, target.role)?;

    storage::add_student(db, course_id, target.id).await?;
    tracing::info!(course_id, student_id = target.id, "Enrolled student");
    course_students_unchecked(db, course_id).await
}

pub async fn remove_student(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    user_id: i32,
) -> Result<Vec<User>, AppError> {
    let course = resolve::course(db, course_id).await?;
    let target = resolve::user(db, user_id).await?;
    engine::manage_membership(actor, &course.scope)?;
    membership::check_remove_student(&course.scope, target.id, target.role)?;

    storage::remove_student(db, course_id, target.id).await?;
    tracing::info!(course_id, student_id = target.id, "Removed student");
    course_students_unchecked(db, course_id).await
}

pub async fn add_lector(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    user_id: i32,
) -> Result<Vec<User>, AppError> {
    let course = resolve::course(db, course_id).await?;
    let target = resolve::user(db, user_id).await?;
    engine::manage_membership(actor, &course.scope)?;
    membership::check_add_lector(&course.scope, target.id, target.role)?;

    storage::add_co_author(db, course_id, target.id).await?;
    tracing::info!(course_id, lector_id = target.id, "Added co-author");
    course_lectors(db, course_id).await
}

/// Author first, then co-authors.
pub async fn course_lectors(db: &DatabaseConnection, course_id: i32) -> Result<Vec<User>, AppError> {
    let course = resolve::course(db, course_id).await?;
    let mut ids = course.scope.co_authors.clone();
    ids.insert(course.scope.author_id);

    let mut lectors = storage::list_users_by_ids(db, &ids).await?;
    lectors.sort_by_key(|u| (u.id != course.scope.author_id, u.id));
    Ok(lectors)
}

pub async fn course_students(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
) -> Result<Vec<User>, AppError> {
    let course = resolve::course(db, course_id).await?;
    engine::list_course_students(actor, &course.scope)?;
    storage::list_users_by_ids(db, &course.scope.students).await
}

async fn course_students_unchecked(
    db: &DatabaseConnection,
    course_id: i32,
) -> Result<Vec<User>, AppError> {
    let ids = storage::student_ids(db, course_id).await?;
    storage::list_users_by_ids(db, &ids).await
}

// ============================================================================
// Lections
// ============================================================================

pub async fn create_lection(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    input: &NewItem,
) -> Result<Lection, AppError> {
    let course = resolve::course(db, course_id).await?;
    engine::create_lection(actor, &course.scope)?;
    validate_item(input)?;

    let lection = storage::create_lection(db, course_id, actor.id, input).await?;
    tracing::info!(course_id, lection_id = lection.id, "Created lection");
    Ok(lection)
}

pub async fn list_lections(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
) -> Result<Vec<Lection>, AppError> {
    let course = resolve::course(db, course_id).await?;
    let filter = engine::list_lections(actor, &course.scope)?;
    storage::list_lections(db, course_id, filter).await
}

pub async fn get_lection(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
) -> Result<Lection, AppError> {
    let lection = resolve::lection(db, course_id, lection_id).await?;
    engine::read_lection(actor, &lection.scope)?;
    Ok(lection.lection)
}

// ============================================================================
// Homework
// ============================================================================

pub async fn create_homework(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
    input: &NewItem,
) -> Result<Homework, AppError> {
    let lection = resolve::lection(db, course_id, lection_id).await?;
    engine::create_homework(actor, &lection.scope)?;
    validate_item(input)?;

    let homework = storage::create_homework(db, lection_id, input).await?;
    tracing::info!(lection_id, homework_id = homework.id, "Created homework");
    Ok(homework)
}

pub async fn get_homework(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
) -> Result<HomeworkView, AppError> {
    let homework = resolve::homework(db, course_id, lection_id).await?;
    engine::read_homework(actor, &homework.scope)?;
    Ok(HomeworkView {
        homework: homework.homework,
        lection: homework.lection,
    })
}

// ============================================================================
// Solutions
// ============================================================================

pub async fn submit_solution(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
    student_id: i32,
    text: &str,
) -> Result<Solution, AppError> {
    let homework = resolve::homework(db, course_id, lection_id).await?;
    engine::submit_solution(actor, student_id, &homework.scope)?;
    validate_text(text)?;

    let solution = storage::create_solution(db, homework.homework.id, student_id, text).await?;
    tracing::info!(
        homework_id = homework.homework.id,
        student_id,
        "Submitted solution"
    );
    Ok(solution)
}

pub async fn get_solution(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
    student_id: i32,
) -> Result<Solution, AppError> {
    let solution = resolve::solution(db, course_id, lection_id, student_id).await?;
    engine::read_solution(actor, &solution.scope)?;
    Ok(solution.solution)
}

pub async fn list_solutions(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
) -> Result<Vec<Solution>, AppError> {
    let homework = resolve::homework(db, course_id, lection_id).await?;
    engine::list_solutions(actor, &homework.scope)?;
    storage::list_solutions(db, homework.homework.id).await
}

pub async fn rate_solution(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
    student_id: i32,
    rating: i32,
) -> Result<Solution, AppError> {
    let solution = resolve::solution(db, course_id, lection_id, student_id).await?;
    engine::rate_solution(actor, &solution.scope)?;
    validate_rating(rating)?;

    let rated = storage::set_rating(db, solution.solution.id, rating).await?;
    tracing::info!(solution_id = rated.id, rating, "Rated solution");
    Ok(rated)
}

// ============================================================================
// Comments
// ============================================================================

pub async fn add_comment(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
    student_id: i32,
    text: &str,
) -> Result<Comment, AppError> {
    let solution = resolve::solution(db, course_id, lection_id, student_id).await?;
    engine::comment(actor, &solution.scope)?;
    validate_text(text)?;

    let homework_id = solution.scope.homework.homework_id;
    let comment = storage::create_comment(db, homework_id, actor.id, text).await?;
    tracing::info!(homework_id, author_id = actor.id, "Added comment");
    Ok(comment)
}

pub async fn list_comments(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i32,
    lection_id: i32,
    student_id: i32,
) -> Result<Vec<Comment>, AppError> {
    let solution = resolve::solution(db, course_id, lection_id, student_id).await?;
    engine::comment(actor, &solution.scope)?;
    storage::list_comments(db, solution.scope.homework.homework_id).await
}
