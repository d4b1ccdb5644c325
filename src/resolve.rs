//! Path resolution: load the addressed resource chain and check that each
//! child really belongs to the parent named in the same path. Anything
//! missing or misplaced is `NotFound`; permissions are checked afterwards.

use sea_orm::DatabaseConnection;

use crate::authz::{CourseScope, HomeworkScope, LectionScope, SolutionScope};
use crate::errors::AppError;
use crate::storage::{self, Course, Homework, Lection, Solution, User};

#[derive(Debug, Clone)]
pub struct ResolvedCourse {
    pub course: Course,
    pub scope: CourseScope,
}

#[derive(Debug, Clone)]
pub struct ResolvedLection {
    pub lection: Lection,
    pub scope: LectionScope,
}

#[derive(Debug, Clone)]
pub struct ResolvedHomework {
    pub homework: Homework,
    pub lection: Lection,
    pub scope: HomeworkScope,
}

#[derive(Debug, Clone)]
pub struct ResolvedSolution {
    pub solution: Solution,
    pub scope: SolutionScope,
}

pub async fn user(db: &DatabaseConnection, user_id: i32) -> Result<User, AppError> {
    storage::get_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
}

pub async fn course(db: &DatabaseConnection, course_id: i32) -> Result<ResolvedCourse, AppError> {
    let course = storage::get_course(db, course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {course_id}")))?;

    let scope = CourseScope {
        course_id: course.id,
        author_id: course.author_id,
        co_authors: storage::co_author_ids(db, course.id).await?,
        students: storage::student_ids(db, course.id).await?,
    };

    Ok(ResolvedCourse { course, scope })
}

pub async fn lection(
    db: &DatabaseConnection,
    course_id: i32,
    lection_id: i32,
) -> Result<ResolvedLection, AppError> {
    let course = course(db, course_id).await?;

    let lection = storage::get_lection(db, lection_id)
        .await?
        .filter(|l| l.course_id == course_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("lection {lection_id} in course {course_id}"))
        })?;

    let scope = LectionScope {
        lection_id: lection.id,
        author_id: lection.author_id,
        course: course.scope,
    };

    Ok(ResolvedLection { lection, scope })
}

pub async fn homework(
    db: &DatabaseConnection,
    course_id: i32,
    lection_id: i32,
) -> Result<ResolvedHomework, AppError> {
    let lection = lection(db, course_id, lection_id).await?;

    let homework = storage::get_homework_by_lection(db, lection_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("homework for lection {lection_id}")))?;

    let scope = HomeworkScope {
        homework_id: homework.id,
        lection: lection.scope,
    };

    Ok(ResolvedHomework {
        homework,
        lection: lection.lection,
        scope,
    })
}

/// Resolves an existing solution of `student_id` to the lection's homework.
pub async fn solution(
    db: &DatabaseConnection,
    course_id: i32,
    lection_id: i32,
    student_id: i32,
) -> Result<ResolvedSolution, AppError> {
    let homework = homework(db, course_id, lection_id).await?;

    let solution = storage::get_solution(db, homework.homework.id, student_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "solution of student {student_id} for lection {lection_id}"
            ))
        })?;

    let scope = SolutionScope {
        student_id,
        homework: homework.scope,
    };

    Ok(ResolvedSolution { solution, scope })
}
