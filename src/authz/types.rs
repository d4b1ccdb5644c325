use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::AppError;

/// User role. Assigned at registration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Student,
    Lector,
}

impl Role {
    pub fn as_i32(self) -> i32 {
        match self {
            Role::Staff => 1,
            Role::Student => 2,
            Role::Lector => 3,
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Staff),
            2 => Ok(Role::Student),
            3 => Ok(Role::Lector),
            other => Err(AppError::Internal(format!("unknown role value {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Staff => "staff",
            Role::Student => "student",
            Role::Lector => "lector",
        };
        f.write_str(name)
    }
}

/// The authenticated identity a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}

/// Ownership and membership of a course, as loaded by the resolvers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseScope {
    pub course_id: i32,
    pub author_id: i32,
    pub co_authors: BTreeSet<i32>,
    pub students: BTreeSet<i32>,
}

impl CourseScope {
    /// Author or co-author.
    pub fn is_lector(&self, user_id: i32) -> bool {
        self.author_id == user_id || self.co_authors.contains(&user_id)
    }

    pub fn is_student(&self, user_id: i32) -> bool {
        self.students.contains(&user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LectionScope {
    pub lection_id: i32,
    pub author_id: i32,
    pub course: CourseScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeworkScope {
    pub homework_id: i32,
    pub lection: LectionScope,
}

impl HomeworkScope {
    /// The lector who owns the homework: the author of its lection.
    pub fn lector_id(&self) -> i32 {
        self.lection.author_id
    }

    pub fn course(&self) -> &CourseScope {
        &self.lection.course
    }
}

/// A student's solution slot under a homework, identified by the student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionScope {
    pub student_id: i32,
    pub homework: HomeworkScope,
}

/// Which courses "my courses" resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseFilter {
    /// Authored or co-authored by the user.
    Taught(i32),
    /// The user is enrolled.
    Enrolled(i32),
    All,
}

/// Which lections of a course an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LectionFilter {
    All,
    AuthoredBy(i32),
}
