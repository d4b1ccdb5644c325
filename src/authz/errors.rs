use miette::Diagnostic;
use thiserror::Error;

use crate::errors::AppError;

/// A negative decision from the predicate engine, carrying the reason shown
/// to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Diagnostic)]
#[error("{0}")]
#[diagnostic(
    code(coursework::authz::denied),
    help("Course membership and authorship decide who may act on a course and everything beneath it")
)]
pub struct Denied(pub &'static str);

impl From<Denied> for AppError {
    fn from(denied: Denied) -> Self {
        AppError::Forbidden(denied.0.to_string())
    }
}
