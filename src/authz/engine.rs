//! Per-action permission predicates.
//!
//! Every function here is pure: it looks only at the actor and the already
//! resolved scope of the resource, never at the store. Staff may read
//! anything but never gains mutation rights through their role.

use crate::authz::errors::Denied;
use crate::authz::types::*;

pub type Decision = Result<(), Denied>;

fn allow_if(cond: bool, reason: &'static str) -> Decision {
    if cond {
        Ok(())
    } else {
        Err(Denied(reason))
    }
}

pub fn create_course(actor: Option<&Actor>) -> Decision {
    allow_if(
        matches!(actor, Some(a) if a.role == Role::Lector),
        "must be a lector",
    )
}

pub fn my_courses(actor: &Actor) -> CourseFilter {
    match actor.role {
        Role::Lector => CourseFilter::Taught(actor.id),
        Role::Student => CourseFilter::Enrolled(actor.id),
        Role::Staff => CourseFilter::All,
    }
}

/// Only the original author; co-authors cannot delete.
pub fn delete_course(actor: &Actor, course: &CourseScope) -> Decision {
    allow_if(
        course.author_id == actor.id,
        "only the course author may delete the course",
    )
}

/// Add/remove students and add co-lectors.
pub fn manage_membership(actor: &Actor, course: &CourseScope) -> Decision {
    allow_if(
        course.is_lector(actor.id),
        "must be the course author or a co-author",
    )
}

pub fn list_course_students(actor: &Actor, course: &CourseScope) -> Decision {
    allow_if(
        actor.is_staff() || course.is_lector(actor.id),
        "must be a lector of this course",
    )
}

pub fn create_lection(actor: &Actor, course: &CourseScope) -> Decision {
    allow_if(
        actor.role == Role::Lector && course.is_lector(actor.id),
        "must be the course author or a co-author",
    )
}

pub fn list_lections(actor: &Actor, course: &CourseScope) -> Result<LectionFilter, Denied> {
    match actor.role {
        Role::Staff => Ok(LectionFilter::All),
        Role::Student if course.is_student(actor.id) => Ok(LectionFilter::All),
        Role::Student => Err(Denied("must be enrolled in this course")),
        Role::Lector if course.is_lector(actor.id) => Ok(LectionFilter::All),
        Role::Lector => Ok(LectionFilter::AuthoredBy(actor.id)),
    }
}

pub fn read_lection(actor: &Actor, lection: &LectionScope) -> Decision {
    match actor.role {
        Role::Staff => Ok(()),
        Role::Lector => allow_if(
            lection.author_id == actor.id,
            "must be the author of this lection",
        ),
        Role::Student => allow_if(
            lection.course.is_student(actor.id),
            "must be enrolled in this course",
        ),
    }
}

pub fn create_homework(actor: &Actor, lection: &LectionScope) -> Decision {
    allow_if(
        actor.role == Role::Lector && lection.author_id == actor.id,
        "must be the author of this lection",
    )
}

pub fn read_homework(actor: &Actor, homework: &HomeworkScope) -> Decision {
    match actor.role {
        Role::Staff => Ok(()),
        Role::Lector => allow_if(
            homework.lector_id() == actor.id,
            "must be the author of this lection",
        ),
        Role::Student => allow_if(
            homework.course().is_student(actor.id),
            "must be enrolled in this course",
        ),
    }
}

/// `student_id` is the student named by the request path.
pub fn submit_solution(actor: &Actor, student_id: i32, homework: &HomeworkScope) -> Decision {
    allow_if(
        actor.role == Role::Student && actor.id == student_id,
        "only the student themselves may submit a solution",
    )?;
    allow_if(
        homework.course().is_student(actor.id),
        "must be enrolled in this course",
    )
}

pub fn read_solution(actor: &Actor, solution: &SolutionScope) -> Decision {
    allow_if(
        actor.is_staff()
            || actor.id == solution.student_id
            || actor.id == solution.homework.lector_id(),
        "must be the solution's student or the homework's lector",
    )
}

pub fn list_solutions(actor: &Actor, homework: &HomeworkScope) -> Decision {
    allow_if(
        actor.is_staff() || actor.id == homework.lector_id(),
        "must be the homework's lector",
    )
}

pub fn rate_solution(actor: &Actor, solution: &SolutionScope) -> Decision {
    allow_if(
        actor.role == Role::Lector && actor.id == solution.homework.lector_id(),
        "must be the homework's lector",
    )
}

/// Reading and writing comments share one rule.
pub fn comment(actor: &Actor, solution: &SolutionScope) -> Decision {
    read_solution(actor, solution)
}
