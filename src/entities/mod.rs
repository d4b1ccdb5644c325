pub mod comment;
pub mod course;
pub mod course_co_author;
pub mod course_student;
pub mod homework;
pub mod homework_solution;
pub mod lection;
pub mod session;
pub mod user;

pub use comment::Entity as Comment;
pub use course::Entity as Course;
pub use course_co_author::Entity as CourseCoAuthor;
pub use course_student::Entity as CourseStudent;
pub use homework::Entity as Homework;
pub use homework_solution::Entity as HomeworkSolution;
pub use lection::Entity as Lection;
pub use session::Entity as Session;
pub use user::Entity as User;
