pub mod engine;
pub mod errors;
pub mod membership;
pub mod types;

pub use engine::Decision;
pub use errors::Denied;
pub use types::{
    Actor, CourseFilter, CourseScope, HomeworkScope, LectionFilter, LectionScope, Role,
    SolutionScope,
};
