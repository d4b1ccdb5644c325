use coursework::authz::{Actor, Role};
use coursework::storage::{self, Course, Homework, Lection, NewItem, NewUser, User};
use sea_orm::DatabaseConnection;

/// Builder for creating test users
pub struct UserBuilder {
    username: String,
    password: String,
    email: Option<String>,
    role: Role,
}

impl UserBuilder {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            password: "password123".to_string(),
            email: None,
            role: Role::Student,
        }
    }

    pub fn lector(username: &str) -> Self {
        Self::new(username).with_role(Role::Lector)
    }

    pub fn student(username: &str) -> Self {
        Self::new(username).with_role(Role::Student)
    }

    pub fn staff(username: &str) -> Self {
        Self::new(username).with_role(Role::Staff)
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> User {
        let input = NewUser {
            email: self
                .email
                .unwrap_or_else(|| format!("{}@example.com", self.username)),
            username: self.username,
            password: self.password,
        };
        storage::create_user(db, &input, self.role)
            .await
            .expect("Failed to create test user")
    }
}

pub fn actor(user: &User) -> Actor {
    Actor {
        id: user.id,
        role: user.role,
    }
}

fn item(name: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        description: format!("{name} description"),
    }
}

/// Builder for creating test courses with their membership
pub struct CourseBuilder {
    name: String,
    author_id: i32,
    co_authors: Vec<i32>,
    students: Vec<i32>,
}

impl CourseBuilder {
    pub fn new(name: &str, author: &User) -> Self {
        Self {
            name: name.to_string(),
            author_id: author.id,
            co_authors: Vec::new(),
            students: Vec::new(),
        }
    }

    pub fn with_co_author(mut self, lector: &User) -> Self {
        self.co_authors.push(lector.id);
        self
    }

    pub fn with_student(mut self, student: &User) -> Self {
        self.students.push(student.id);
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> Course {
        let course = storage::create_course(db, self.author_id, &item(&self.name))
            .await
            .expect("Failed to create test course");
        for id in self.co_authors {
            storage::add_co_author(db, course.id, id)
                .await
                .expect("Failed to add co-author");
        }
        for id in self.students {
            storage::add_student(db, course.id, id)
                .await
                .expect("Failed to enrol student");
        }
        course
    }
}

/// Builder for a lection, optionally with its homework
pub struct LectionBuilder {
    name: String,
    course_id: i32,
    author_id: i32,
    homework: Option<String>,
}

impl LectionBuilder {
    pub fn new(name: &str, course: &Course, author: &User) -> Self {
        Self {
            name: name.to_string(),
            course_id: course.id,
            author_id: author.id,
            homework: None,
        }
    }

    pub fn with_homework(mut self, name: &str) -> Self {
        self.homework = Some(name.to_string());
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> (Lection, Option<Homework>) {
        let lection = storage::create_lection(db, self.course_id, self.author_id, &item(&self.name))
            .await
            .expect("Failed to create test lection");
        let homework = match self.homework {
            Some(name) => Some(
                storage::create_homework(db, lection.id, &item(&name))
                    .await
                    .expect("Failed to create test homework"),
            ),
            None => None,
        };
        (lection, homework)
    }
}
