use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn cascade_to(
    name: &str,
    from: (impl IntoIden + 'static, impl IntoIden + 'static),
    to: (impl IntoIden + 'static, impl IntoIden + 'static),
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from.0, from.1)
        .to(to.0, to.1)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Enable foreign keys for SQLite
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
            manager
                .get_connection()
                .execute_unprepared("PRAGMA foreign_keys = ON")
                .await?;
        }

        // Role: 1 = staff, 2 = student, 3 = lector
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(string_uniq(Users::Username))
                    .col(string_uniq(Users::Email))
                    .col(string(Users::PasswordHash))
                    .col(integer(Users::Role))
                    .col(big_integer(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(id_col(Courses::Id))
                    .col(string(Courses::Name))
                    .col(text(Courses::Description))
                    .col(integer(Courses::AuthorId))
                    .foreign_key(&mut cascade_to(
                        "fk_courses_author",
                        (Courses::Table, Courses::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        // Membership tables: the composite primary key is the uniqueness
        // guarantee for concurrent add requests.
        manager
            .create_table(
                Table::create()
                    .table(CourseCoAuthors::Table)
                    .if_not_exists()
                    .col(integer(CourseCoAuthors::CourseId))
                    .col(integer(CourseCoAuthors::UserId))
                    .primary_key(
                        Index::create()
                            .col(CourseCoAuthors::CourseId)
                            .col(CourseCoAuthors::UserId),
                    )
                    .foreign_key(&mut cascade_to(
                        "fk_course_co_authors_course",
                        (CourseCoAuthors::Table, CourseCoAuthors::CourseId),
                        (Courses::Table, Courses::Id),
                    ))
                    .foreign_key(&mut cascade_to(
                        "fk_course_co_authors_user",
                        (CourseCoAuthors::Table, CourseCoAuthors::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseStudents::Table)
                    .if_not_exists()
                    .col(integer(CourseStudents::CourseId))
                    .col(integer(CourseStudents::UserId))
                    .primary_key(
                        Index::create()
                            .col(CourseStudents::CourseId)
                            .col(CourseStudents::UserId),
                    )
                    .foreign_key(&mut cascade_to(
                        "fk_course_students_course",
                        (CourseStudents::Table, CourseStudents::CourseId),
                        (Courses::Table, Courses::Id),
                    ))
                    .foreign_key(&mut cascade_to(
                        "fk_course_students_user",
                        (CourseStudents::Table, CourseStudents::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lections::Table)
                    .if_not_exists()
                    .col(id_col(Lections::Id))
                    .col(string(Lections::Name))
                    .col(text(Lections::Description))
                    .col(integer(Lections::AuthorId))
                    .col(integer(Lections::CourseId))
                    .foreign_key(&mut cascade_to(
                        "fk_lections_author",
                        (Lections::Table, Lections::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade_to(
                        "fk_lections_course",
                        (Lections::Table, Lections::CourseId),
                        (Courses::Table, Courses::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lections_course")
                    .table(Lections::Table)
                    .col(Lections::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Homework::Table)
                    .if_not_exists()
                    .col(id_col(Homework::Id))
                    .col(string(Homework::Name))
                    .col(text(Homework::Description))
                    .col(integer_uniq(Homework::LectionId))
                    .foreign_key(&mut cascade_to(
                        "fk_homework_lection",
                        (Homework::Table, Homework::LectionId),
                        (Lections::Table, Lections::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HomeworkSolutions::Table)
                    .if_not_exists()
                    .col(id_col(HomeworkSolutions::Id))
                    .col(integer(HomeworkSolutions::AuthorId))
                    .col(integer(HomeworkSolutions::HomeworkId))
                    .col(text(HomeworkSolutions::Text))
                    .col(integer_null(HomeworkSolutions::Rating))
                    .col(big_integer(HomeworkSolutions::SubmittedAt))
                    .foreign_key(&mut cascade_to(
                        "fk_homework_solutions_author",
                        (HomeworkSolutions::Table, HomeworkSolutions::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade_to(
                        "fk_homework_solutions_homework",
                        (HomeworkSolutions::Table, HomeworkSolutions::HomeworkId),
                        (Homework::Table, Homework::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        // One solution per (student, homework)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_homework_solutions_author_homework")
                    .table(HomeworkSolutions::Table)
                    .col(HomeworkSolutions::AuthorId)
                    .col(HomeworkSolutions::HomeworkId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(id_col(Comments::Id))
                    .col(integer(Comments::AuthorId))
                    .col(integer(Comments::HomeworkId))
                    .col(text(Comments::Text))
                    .col(big_integer(Comments::CreatedAt))
                    .foreign_key(&mut cascade_to(
                        "fk_comments_author",
                        (Comments::Table, Comments::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade_to(
                        "fk_comments_homework",
                        (Comments::Table, Comments::HomeworkId),
                        (Homework::Table, Homework::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_homework")
                    .table(Comments::Table)
                    .col(Comments::HomeworkId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HomeworkSolutions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Homework::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseStudents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseCoAuthors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Name,
    Description,
    AuthorId,
}

#[derive(DeriveIden)]
enum CourseCoAuthors {
    Table,
    CourseId,
    UserId,
}

#[derive(DeriveIden)]
enum CourseStudents {
    Table,
    CourseId,
    UserId,
}

#[derive(DeriveIden)]
enum Lections {
    Table,
    Id,
    Name,
    Description,
    AuthorId,
    CourseId,
}

#[derive(DeriveIden)]
enum Homework {
    Table,
    Id,
    Name,
    Description,
    LectionId,
}

#[derive(DeriveIden)]
enum HomeworkSolutions {
    Table,
    Id,
    AuthorId,
    HomeworkId,
    Text,
    Rating,
    SubmittedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    AuthorId,
    HomeworkId,
    Text,
    CreatedAt,
}
