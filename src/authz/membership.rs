//! Business rules on the target of a membership change. The caller's right to
//! change membership at all is checked by `engine::manage_membership`.

use crate::authz::types::{CourseScope, Role};
use crate::errors::AppError;

pub fn check_add_student(course: &CourseScope, user_id: i32, role: Role) -> Result<(), AppError> {
    if role != Role::Student {
        return Err(AppError::Validation(format!("user {user_id} is not a student")));
    }
    if course.is_student(user_id) {
        return Err(AppError::Validation(format!(
            "student {user_id} is already enrolled"
        )));
    }
    Ok(())
}

pub fn check_remove_student(
    course: &CourseScope,
    user_id: i32,
    role: Role,
) -> Result<(), AppError> {
    if role != Role::Student {
        return Err(AppError::Validation(format!("user {user_id} is not a student")));
    }
    if !course.is_student(user_id) {
        return Err(AppError::Validation(format!(
            "student {user_id} is not enrolled"
        )));
    }
    Ok(())
}

pub fn check_add_lector(course: &CourseScope, user_id: i32, role: Role) -> Result<(), AppError> {
    if role != Role::Lector {
        return Err(AppError::Validation(format!("user {user_id} is not a lector")));
    }
    if course.is_lector(user_id) {
        return Err(AppError::Validation(format!(
            "lector {user_id} already teaches this course"
        )));
    }
    Ok(())
}
