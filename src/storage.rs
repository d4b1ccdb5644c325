use crate::authz::{CourseFilter, LectionFilter, Role};
use crate::entities;
use crate::errors::AppError;
use crate::settings::Database as DbCfg;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm_migration::MigratorTrait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Public view of a user. The password hash never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: i32,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub author_id: i32,
}

/// Name and description shared by courses, lections and homework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lection {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub author_id: i32,
    pub course_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Homework {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub lection_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub id: i32,
    pub author_id: i32,
    pub homework_id: i32,
    pub text: String,
    pub rating: Option<i32>,
    pub submitted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub author_id: i32,
    pub homework_id: i32,
    pub text: String,
    pub created_at: i64,
}

impl TryFrom<entities::user::Model> for User {
    type Error = AppError;

    fn try_from(model: entities::user::Model) -> Result<Self, AppError> {
        Ok(User {
            id: model.id,
            username: model.username,
            email: model.email,
            role: Role::try_from(model.role)?,
            created_at: model.created_at,
        })
    }
}

impl From<entities::course::Model> for Course {
    fn from(model: entities::course::Model) -> Self {
        Course {
            id: model.id,
            name: model.name,
            description: model.description,
            author_id: model.author_id,
        }
    }
}

impl From<entities::lection::Model> for Lection {
    fn from(model: entities::lection::Model) -> Self {
        Lection {
            id: model.id,
            name: model.name,
            description: model.description,
            author_id: model.author_id,
            course_id: model.course_id,
        }
    }
}

impl From<entities::homework::Model> for Homework {
    fn from(model: entities::homework::Model) -> Self {
        Homework {
            id: model.id,
            name: model.name,
            description: model.description,
            lection_id: model.lection_id,
        }
    }
}

impl From<entities::homework_solution::Model> for Solution {
    fn from(model: entities::homework_solution::Model) -> Self {
        Solution {
            id: model.id,
            author_id: model.author_id,
            homework_id: model.homework_id,
            text: model.text,
            rating: model.rating,
            submitted_at: model.submitted_at,
        }
    }
}

impl From<entities::comment::Model> for Comment {
    fn from(model: entities::comment::Model) -> Self {
        Comment {
            id: model.id,
            author_id: model.author_id,
            homework_id: model.homework_id,
            text: model.text,
            created_at: model.created_at,
        }
    }
}

/// Connects and brings the schema up to date.
pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, AppError> {
    let db = Database::connect(&cfg.url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

// User management functions

pub async fn create_user(
    db: &DatabaseConnection,
    input: &NewUser,
    role: Role,
) -> Result<User, AppError> {
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::{Argon2, PasswordHasher};
    use entities::user::{Column, Entity};

    // Usernames and emails are unique across every role
    let taken = Entity::find()
        .filter(
            Condition::any()
                .add(Column::Username.eq(input.username.as_str()))
                .add(Column::Email.eq(input.email.as_str())),
        )
        .one(db)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.username == input.username {
            "username"
        } else {
            "email"
        };
        return Err(AppError::Validation(format!("{field} is already registered")));
    }

    let created_at = Utc::now().timestamp();

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(input.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?
        .to_string();

    let user = entities::user::ActiveModel {
        username: Set(input.username.clone()),
        email: Set(input.email.clone()),
        password_hash: Set(password_hash),
        role: Set(role.as_i32()),
        created_at: Set(created_at),
        ..Default::default()
    };

    let model = user
        .insert(db)
        .await
        .map_err(|e| AppError::from_write(e, "username or email is already registered"))?;

    User::try_from(model)
}

pub async fn get_user(db: &DatabaseConnection, id: i32) -> Result<Option<User>, AppError> {
    entities::User::find_by_id(id)
        .one(db)
        .await?
        .map(User::try_from)
        .transpose()
}

pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<User>, AppError> {
    use entities::user::{Column, Entity};

    Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Returns the user when the password matches.
pub async fn verify_user_password(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    use entities::user::{Column, Entity};

    let model = match Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?
    {
        Some(m) => m,
        None => return Ok(None),
    };

    let parsed_hash = PasswordHash::new(&model.password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(Some(User::try_from(model)?))
    } else {
        Ok(None)
    }
}

pub async fn list_users_by_role(db: &DatabaseConnection, role: Role) -> Result<Vec<User>, AppError> {
    use entities::user::{Column, Entity};

    Entity::find()
        .filter(Column::Role.eq(role.as_i32()))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

pub async fn list_users_by_ids(
    db: &DatabaseConnection,
    ids: &BTreeSet<i32>,
) -> Result<Vec<User>, AppError> {
    use entities::user::{Column, Entity};

    Entity::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

// Session management functions

pub async fn create_session(
    db: &DatabaseConnection,
    user_id: i32,
    ttl_secs: i64,
) -> Result<Session, AppError> {
    let session_id = random_id();
    let now = Utc::now().timestamp();
    let expires_at = now + ttl_secs;

    let session = entities::session::ActiveModel {
        session_id: Set(session_id.clone()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(expires_at),
    };

    session.insert(db).await?;

    Ok(Session {
        session_id,
        user_id,
        created_at: now,
        expires_at,
    })
}

/// Expired sessions are treated as absent.
pub async fn get_session(
    db: &DatabaseConnection,
    session_id: &str,
) -> Result<Option<Session>, AppError> {
    use entities::session::{Column, Entity};

    if let Some(model) = Entity::find()
        .filter(Column::SessionId.eq(session_id))
        .one(db)
        .await?
    {
        let now = Utc::now().timestamp();
        if now > model.expires_at {
            return Ok(None);
        }

        Ok(Some(Session {
            session_id: model.session_id,
            user_id: model.user_id,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }))
    } else {
        Ok(None)
    }
}

pub async fn delete_session(db: &DatabaseConnection, session_id: &str) -> Result<(), AppError> {
    use entities::session::{Column, Entity};

    Entity::delete_many()
        .filter(Column::SessionId.eq(session_id))
        .exec(db)
        .await?;

    Ok(())
}

pub async fn cleanup_expired_sessions(db: &DatabaseConnection) -> Result<u64, AppError> {
    use entities::session::{Column, Entity};

    let now = Utc::now().timestamp();
    let result = Entity::delete_many()
        .filter(Column::ExpiresAt.lt(now))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

// Course functions

pub async fn create_course(
    db: &DatabaseConnection,
    author_id: i32,
    input: &NewItem,
) -> Result<Course, AppError> {
    let course = entities::course::ActiveModel {
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        author_id: Set(author_id),
        ..Default::default()
    };

    Ok(course.insert(db).await?.into())
}

pub async fn get_course(db: &DatabaseConnection, id: i32) -> Result<Option<Course>, AppError> {
    Ok(entities::Course::find_by_id(id).one(db).await?.map(Course::from))
}

pub async fn list_courses(
    db: &DatabaseConnection,
    filter: CourseFilter,
) -> Result<Vec<Course>, AppError> {
    use entities::course::{Column, Entity};

    let condition = match filter {
        CourseFilter::All => Condition::all(),
        CourseFilter::Taught(user_id) => {
            let co_authored = course_ids_of::<entities::CourseCoAuthor>(db, user_id).await?;
            Condition::any()
                .add(Column::AuthorId.eq(user_id))
                .add(Column::Id.is_in(co_authored))
        }
        CourseFilter::Enrolled(user_id) => {
            let enrolled = course_ids_of::<entities::CourseStudent>(db, user_id).await?;
            Condition::all().add(Column::Id.is_in(enrolled))
        }
    };

    Ok(Entity::find()
        .filter(condition)
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Course::from)
        .collect())
}

/// Course ids a user appears in for one of the two membership tables.
async fn course_ids_of<E>(db: &DatabaseConnection, user_id: i32) -> Result<Vec<i32>, AppError>
where
    E: MembershipTable,
{
    Ok(E::find()
        .select_only()
        .column(E::course_column())
        .filter(E::user_column().eq(user_id))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

/// Deletes the course; lections, homework, solutions, comments and membership
/// rows go with it. Returns false when there was no such course.
pub async fn delete_course(db: &DatabaseConnection, id: i32) -> Result<bool, AppError> {
    let result = entities::Course::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

// Membership functions

/// The two (course_id, user_id) join tables.
pub trait MembershipTable: EntityTrait {
    fn course_column() -> Self::Column;
    fn user_column() -> Self::Column;
}

impl MembershipTable for entities::CourseCoAuthor {
    fn course_column() -> Self::Column {
        entities::course_co_author::Column::CourseId
    }
    fn user_column() -> Self::Column {
        entities::course_co_author::Column::UserId
    }
}

impl MembershipTable for entities::CourseStudent {
    fn course_column() -> Self::Column {
        entities::course_student::Column::CourseId
    }
    fn user_column() -> Self::Column {
        entities::course_student::Column::UserId
    }
}

async fn member_ids<E: MembershipTable>(
    db: &DatabaseConnection,
    course_id: i32,
) -> Result<BTreeSet<i32>, AppError> {
    let ids: Vec<i32> = E::find()
        .select_only()
        .column(E::user_column())
        .filter(E::course_column().eq(course_id))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

pub async fn co_author_ids(
    db: &DatabaseConnection,
    course_id: i32,
) -> Result<BTreeSet<i32>, AppError> {
    member_ids::<entities::CourseCoAuthor>(db, course_id).await
}

pub async fn student_ids(db: &DatabaseConnection, course_id: i32) -> Result<BTreeSet<i32>, AppError> {
    member_ids::<entities::CourseStudent>(db, course_id).await
}

/// Enrols a student. A concurrent duplicate hits the primary key and
/// surfaces as `Conflict`.
pub async fn add_student(
    db: &DatabaseConnection,
    course_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let row = entities::course_student::ActiveModel {
        course_id: Set(course_id),
        user_id: Set(user_id),
    };
    entities::CourseStudent::insert(row)
        .exec_without_returning(db)
        .await
        .map_err(|e| AppError::from_write(e, format!("student {user_id} is already enrolled")))?;
    Ok(())
}

pub async fn remove_student(
    db: &DatabaseConnection,
    course_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    use entities::course_student::{Column, Entity};

    let result = Entity::delete_many()
        .filter(Column::CourseId.eq(course_id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    // Another request removed the row since it was resolved
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "student {user_id} was already removed"
        )));
    }
    Ok(())
}

pub async fn add_co_author(
    db: &DatabaseConnection,
    course_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let row = entities::course_co_author::ActiveModel {
        course_id: Set(course_id),
        user_id: Set(user_id),
    };
    entities::CourseCoAuthor::insert(row)
        .exec_without_returning(db)
        .await
        .map_err(|e| {
            AppError::from_write(e, format!("lector {user_id} already teaches this course"))
        })?;
    Ok(())
}

// Lection functions

pub async fn create_lection(
    db: &DatabaseConnection,
    course_id: i32,
    author_id: i32,
    input: &NewItem,
) -> Result<Lection, AppError> {
    let lection = entities::lection::ActiveModel {
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        author_id: Set(author_id),
        course_id: Set(course_id),
        ..Default::default()
    };

    Ok(lection.insert(db).await?.into())
}

pub async fn get_lection(db: &DatabaseConnection, id: i32) -> Result<Option<Lection>, AppError> {
    Ok(entities::Lection::find_by_id(id).one(db).await?.map(Lection::from))
}

pub async fn list_lections(
    db: &DatabaseConnection,
    course_id: i32,
    filter: LectionFilter,
) -> Result<Vec<Lection>, AppError> {
    use entities::lection::{Column, Entity};

    let mut query = Entity::find().filter(Column::CourseId.eq(course_id));
    if let LectionFilter::AuthoredBy(author_id) = filter {
        query = query.filter(Column::AuthorId.eq(author_id));
    }

    Ok(query
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Lection::from)
        .collect())
}

// Homework functions

/// At most one homework per lection; a second one is a `Conflict`.
pub async fn create_homework(
    db: &DatabaseConnection,
    lection_id: i32,
    input: &NewItem,
) -> Result<Homework, AppError> {
    let homework = entities::homework::ActiveModel {
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        lection_id: Set(lection_id),
        ..Default::default()
    };

    let model = homework
        .insert(db)
        .await
        .map_err(|e| AppError::from_write(e, "lection already has homework"))?;
    Ok(model.into())
}

pub async fn get_homework_by_lection(
    db: &DatabaseConnection,
    lection_id: i32,
) -> Result<Option<Homework>, AppError> {
    use entities::homework::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::LectionId.eq(lection_id))
        .one(db)
        .await?
        .map(Homework::from))
}

// Solution functions

/// One solution per (student, homework), enforced by a unique index.
pub async fn create_solution(
    db: &DatabaseConnection,
    homework_id: i32,
    student_id: i32,
    text: &str,
) -> Result<Solution, AppError> {
    let solution = entities::homework_solution::ActiveModel {
        author_id: Set(student_id),
        homework_id: Set(homework_id),
        text: Set(text.to_string()),
        rating: Set(None),
        submitted_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    let model = solution
        .insert(db)
        .await
        .map_err(|e| AppError::from_write(e, "solution already submitted"))?;
    Ok(model.into())
}

pub async fn get_solution(
    db: &DatabaseConnection,
    homework_id: i32,
    student_id: i32,
) -> Result<Option<Solution>, AppError> {
    use entities::homework_solution::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::HomeworkId.eq(homework_id))
        .filter(Column::AuthorId.eq(student_id))
        .one(db)
        .await?
        .map(Solution::from))
}

pub async fn list_solutions(
    db: &DatabaseConnection,
    homework_id: i32,
) -> Result<Vec<Solution>, AppError> {
    use entities::homework_solution::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::HomeworkId.eq(homework_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Solution::from)
        .collect())
}

pub async fn set_rating(
    db: &DatabaseConnection,
    solution_id: i32,
    rating: i32,
) -> Result<Solution, AppError> {
    let model = entities::HomeworkSolution::find_by_id(solution_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("solution {solution_id}")))?;

    let mut active: entities::homework_solution::ActiveModel = model.into();
    active.rating = Set(Some(rating));
    Ok(active.update(db).await?.into())
}

// Comment functions

pub async fn create_comment(
    db: &DatabaseConnection,
    homework_id: i32,
    author_id: i32,
    text: &str,
) -> Result<Comment, AppError> {
    let comment = entities::comment::ActiveModel {
        author_id: Set(author_id),
        homework_id: Set(homework_id),
        text: Set(text.to_string()),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    Ok(comment.insert(db).await?.into())
}

pub async fn list_comments(
    db: &DatabaseConnection,
    homework_id: i32,
) -> Result<Vec<Comment>, AppError> {
    use entities::comment::{Column, Entity};

    Ok(Entity::find()
        .filter(Column::HomeworkId.eq(homework_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Comment::from)
        .collect())
}
