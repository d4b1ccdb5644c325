#![allow(dead_code)]

pub mod builders;
pub mod db;

pub use builders::{actor, CourseBuilder, LectionBuilder, UserBuilder};
pub use db::TestDb;
