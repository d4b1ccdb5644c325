mod helpers;

use coursework::authz::Role;
use coursework::errors::AppError;
use coursework::operations;
use coursework::storage::{self, NewItem, NewUser};
use helpers::{actor, CourseBuilder, LectionBuilder, TestDb, UserBuilder};

fn item(name: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        description: String::new(),
    }
}

// ============================================================================
// End-to-end workflow
// ============================================================================

#[tokio::test]
async fn test_course_workflow_end_to_end() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let lector = UserBuilder::lector("lector").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let other = UserBuilder::student("other").create(db).await;
    let staff = UserBuilder::staff("staff").create(db).await;
    let l = actor(&lector);
    let s = actor(&student);

    let course = operations::create_course(db, Some(&l), &item("Algorithms"))
        .await
        .expect("lector creates course");
    assert_eq!(course.author_id, lector.id);

    let students = operations::add_student(db, &l, course.id, student.id)
        .await
        .expect("author enrols student");
    assert_eq!(students.iter().map(|u| u.id).collect::<Vec<_>>(), vec![student.id]);

    let lection = operations::create_lection(db, &l, course.id, &item("Sorting"))
        .await
        .expect("author adds lection");
    let homework = operations::create_homework(
        db,
        &l,
        course.id,
        lection.id,
        &item("Implement quicksort"),
    )
    .await
    .expect("lection author adds homework");
    assert_eq!(homework.lection_id, lection.id);

    let view = operations::get_homework(db, &s, course.id, lection.id)
        .await
        .expect("enrolled student reads homework");
    assert_eq!(view.lection.id, lection.id);

    operations::submit_solution(db, &s, course.id, lection.id, student.id, "fn quicksort() {}")
        .await
        .expect("student submits");
    operations::rate_solution(db, &l, course.id, lection.id, student.id, 4)
        .await
        .expect("lector rates");

    let seen = operations::get_solution(db, &s, course.id, lection.id, student.id)
        .await
        .expect("student reads own solution");
    assert_eq!(seen.text, "fn quicksort() {}");
    assert_eq!(seen.rating, Some(4));

    let denied =
        operations::get_solution(db, &actor(&other), course.id, lection.id, student.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let by_staff =
        operations::get_solution(db, &actor(&staff), course.id, lection.id, student.id)
            .await
            .expect("staff reads any solution");
    assert_eq!(by_staff.rating, Some(4));
}

#[tokio::test]
async fn test_my_courses_per_role() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let author = UserBuilder::lector("author").create(db).await;
    let co = UserBuilder::lector("co").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let staff = UserBuilder::staff("staff").create(db).await;

    let algorithms = CourseBuilder::new("Algorithms", &author)
        .with_co_author(&co)
        .with_student(&student)
        .create(db)
        .await;
    let _networks = CourseBuilder::new("Networks", &author).create(db).await;

    let mine = operations::my_courses(db, &actor(&author)).await.unwrap();
    assert_eq!(mine.len(), 2);

    let co_mine = operations::my_courses(db, &actor(&co)).await.unwrap();
    assert_eq!(co_mine, vec![algorithms.clone()]);

    let enrolled = operations::my_courses(db, &actor(&student)).await.unwrap();
    assert_eq!(enrolled, vec![algorithms]);

    let all = operations::my_courses(db, &actor(&staff)).await.unwrap();
    assert_eq!(all.len(), 2);
}

// ============================================================================
// Course creation and membership
// ============================================================================

#[tokio::test]
async fn test_non_lectors_cannot_create_courses() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let student = UserBuilder::student("student").create(db).await;
    let staff = UserBuilder::staff("staff").create(db).await;

    for who in [None, Some(actor(&student)), Some(actor(&staff))] {
        let result = operations::create_course(db, who.as_ref(), &item("Nope")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
    assert!(operations::list_courses(db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_co_author_cannot_add_student() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let stranger = UserBuilder::lector("stranger").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner).create(db).await;

    let result = operations::add_student(db, &actor(&stranger), course.id, student.id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(storage::student_ids(db, course.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_student_rejects_non_students_and_duplicates() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let other_lector = UserBuilder::lector("other").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&student)
        .create(db)
        .await;
    let o = actor(&owner);

    let again = operations::add_student(db, &o, course.id, student.id).await;
    assert!(matches!(again, Err(AppError::Validation(_))));

    let lector = operations::add_student(db, &o, course.id, other_lector.id).await;
    assert!(matches!(lector, Err(AppError::Validation(_))));

    let missing = operations::add_student(db, &o, course.id, 9999).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_remove_unenrolled_student_leaves_set_unchanged() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let enrolled = UserBuilder::student("enrolled").create(db).await;
    let outsider = UserBuilder::student("outsider").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&enrolled)
        .create(db)
        .await;

    let before = storage::student_ids(db, course.id).await.unwrap();
    let result = operations::remove_student(db, &actor(&owner), course.id, outsider.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(storage::student_ids(db, course.id).await.unwrap(), before);

    let remaining = operations::remove_student(db, &actor(&owner), course.id, enrolled.id)
        .await
        .expect("remove enrolled student");
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_add_lector_rules() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let helper = UserBuilder::lector("helper").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner).create(db).await;
    let o = actor(&owner);

    let lectors = operations::add_lector(db, &o, course.id, helper.id)
        .await
        .expect("add co-author");
    assert_eq!(
        lectors.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![owner.id, helper.id]
    );

    // Author and existing co-author are both rejected
    let author = operations::add_lector(db, &o, course.id, owner.id).await;
    assert!(matches!(author, Err(AppError::Validation(_))));
    let dup = operations::add_lector(db, &actor(&helper), course.id, helper.id).await;
    assert!(matches!(dup, Err(AppError::Validation(_))));

    let not_lector = operations::add_lector(db, &o, course.id, student.id).await;
    assert!(matches!(not_lector, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_concurrent_enrolment_stores_one_row() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner).create(db).await;

    let (a, b) = tokio::join!(
        storage::add_student(db, course.id, student.id),
        storage::add_student(db, course.id, student.id),
    );
    assert!(a.is_ok() != b.is_ok(), "exactly one enrolment succeeds");
    assert!(matches!(a.err().or(b.err()), Some(AppError::Conflict(_))));
    assert_eq!(storage::student_ids(db, course.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_removal_deletes_once() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&student)
        .create(db)
        .await;

    let (a, b) = tokio::join!(
        storage::remove_student(db, course.id, student.id),
        storage::remove_student(db, course.id, student.id),
    );
    assert!(a.is_ok() != b.is_ok(), "exactly one removal succeeds");
    assert!(matches!(a.err().or(b.err()), Some(AppError::Conflict(_))));
    assert!(storage::student_ids(db, course.id).await.unwrap().is_empty());
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_duplicate_registration_across_roles() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let lector = operations::register(
        db,
        &NewUser {
            username: "taken".into(),
            email: "lector@example.com".into(),
            password: "secret".into(),
        },
        Role::Lector,
    )
    .await
    .expect("register lector");

    let result = operations::register(
        db,
        &NewUser {
            username: "taken".into(),
            email: "student@example.com".into(),
            password: "secret".into(),
        },
        Role::Student,
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    assert!(storage::list_users_by_role(db, Role::Student)
        .await
        .unwrap()
        .is_empty());
    let kept = storage::get_user_by_username(db, "taken").await.unwrap().unwrap();
    assert_eq!(kept, lector);
}

#[tokio::test]
async fn test_staff_cannot_self_register() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let result = operations::register(
        db,
        &NewUser {
            username: "boss".into(),
            email: "boss@example.com".into(),
            password: "secret".into(),
        },
        Role::Staff,
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

// ============================================================================
// Lections and homework
// ============================================================================

#[tokio::test]
async fn test_student_reads_lections_only_when_enrolled() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let enrolled = UserBuilder::student("enrolled").create(db).await;
    let outsider = UserBuilder::student("outsider").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&enrolled)
        .create(db)
        .await;
    let (lection, _) = LectionBuilder::new("Sorting", &course, &owner).create(db).await;

    let listed = operations::list_lections(db, &actor(&enrolled), course.id)
        .await
        .unwrap();
    assert_eq!(listed, vec![lection.clone()]);
    assert!(operations::get_lection(db, &actor(&enrolled), course.id, lection.id)
        .await
        .is_ok());

    let listed = operations::list_lections(db, &actor(&outsider), course.id).await;
    assert!(matches!(listed, Err(AppError::Forbidden(_))));
    let read = operations::get_lection(db, &actor(&outsider), course.id, lection.id).await;
    assert!(matches!(read, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_outside_lector_sees_only_own_lections() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let guest = UserBuilder::lector("guest").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner).create(db).await;
    LectionBuilder::new("Sorting", &course, &owner).create(db).await;

    let listed = operations::list_lections(db, &actor(&guest), course.id)
        .await
        .unwrap();
    assert!(listed.is_empty());

    let owner_view = operations::list_lections(db, &actor(&owner), course.id)
        .await
        .unwrap();
    assert_eq!(owner_view.len(), 1);
}

#[tokio::test]
async fn test_lection_outside_course_is_not_found() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let first = CourseBuilder::new("Algorithms", &owner).create(db).await;
    let second = CourseBuilder::new("Networks", &owner).create(db).await;
    let (lection, _) = LectionBuilder::new("Sorting", &first, &owner).create(db).await;

    let result = operations::get_lection(db, &actor(&owner), second.id, lection.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_only_lection_author_creates_homework() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let co = UserBuilder::lector("co").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_co_author(&co)
        .create(db)
        .await;
    let (lection, _) = LectionBuilder::new("Sorting", &course, &co).create(db).await;

    let by_owner =
        operations::create_homework(db, &actor(&owner), course.id, lection.id, &item("HW")).await;
    assert!(matches!(by_owner, Err(AppError::Forbidden(_))));

    operations::create_homework(db, &actor(&co), course.id, lection.id, &item("HW"))
        .await
        .expect("lection author creates homework");
    let second =
        operations::create_homework(db, &actor(&co), course.id, lection.id, &item("HW2")).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

// ============================================================================
// Solutions, ratings and comments
// ============================================================================

#[tokio::test]
async fn test_concurrent_duplicate_submission() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&student)
        .create(db)
        .await;
    let (lection, homework) = LectionBuilder::new("Sorting", &course, &owner)
        .with_homework("Quicksort")
        .create(db)
        .await;
    let s = actor(&student);

    let (a, b) = tokio::join!(
        operations::submit_solution(db, &s, course.id, lection.id, student.id, "first"),
        operations::submit_solution(db, &s, course.id, lection.id, student.id, "second"),
    );
    assert!(a.is_ok() != b.is_ok(), "exactly one submission succeeds");
    assert!(matches!(a.err().or(b.err()), Some(AppError::Conflict(_))));

    let homework = homework.expect("homework created");
    let stored = storage::list_solutions(db, homework.id).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_student_cannot_submit_for_someone_else() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let alice = UserBuilder::student("alice").create(db).await;
    let bob = UserBuilder::student("bob").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&alice)
        .with_student(&bob)
        .create(db)
        .await;
    let (lection, _) = LectionBuilder::new("Sorting", &course, &owner)
        .with_homework("Quicksort")
        .create(db)
        .await;

    let result =
        operations::submit_solution(db, &actor(&alice), course.id, lection.id, bob.id, "x").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_rating_bounds_are_enforced() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let staff = UserBuilder::staff("staff").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&student)
        .create(db)
        .await;
    let (lection, _) = LectionBuilder::new("Sorting", &course, &owner)
        .with_homework("Quicksort")
        .create(db)
        .await;
    operations::submit_solution(db, &actor(&student), course.id, lection.id, student.id, "x")
        .await
        .unwrap();
    let o = actor(&owner);

    for bad in [0, 6] {
        let result = operations::rate_solution(db, &o, course.id, lection.id, student.id, bad).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
    let unrated = operations::get_solution(db, &o, course.id, lection.id, student.id)
        .await
        .unwrap();
    assert_eq!(unrated.rating, None);

    for good in 1..=5 {
        let rated = operations::rate_solution(db, &o, course.id, lection.id, student.id, good)
            .await
            .unwrap();
        assert_eq!(rated.rating, Some(good));
        let stored = operations::get_solution(db, &o, course.id, lection.id, student.id)
            .await
            .unwrap();
        assert_eq!(stored.rating, Some(good));
    }

    // Staff reads everything but never rates
    let by_staff =
        operations::rate_solution(db, &actor(&staff), course.id, lection.id, student.id, 3).await;
    assert!(matches!(by_staff, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_comments_between_student_and_lector() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let other = UserBuilder::student("other").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&student)
        .with_student(&other)
        .create(db)
        .await;
    let (lection, _) = LectionBuilder::new("Sorting", &course, &owner)
        .with_homework("Quicksort")
        .create(db)
        .await;
    let (c, l, sid) = (course.id, lection.id, student.id);

    // No solution yet
    let early = operations::add_comment(db, &actor(&owner), c, l, sid, "hello").await;
    assert!(matches!(early, Err(AppError::NotFound(_))));

    operations::submit_solution(db, &actor(&student), c, l, sid, "x")
        .await
        .unwrap();
    operations::add_comment(db, &actor(&owner), c, l, sid, "use a random pivot")
        .await
        .unwrap();
    operations::add_comment(db, &actor(&student), c, l, sid, "thanks")
        .await
        .unwrap();

    let intruder = operations::add_comment(db, &actor(&other), c, l, sid, "hi").await;
    assert!(matches!(intruder, Err(AppError::Forbidden(_))));

    let empty = operations::add_comment(db, &actor(&student), c, l, sid, "  ").await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let thread = operations::list_comments(db, &actor(&student), c, l, sid)
        .await
        .unwrap();
    let texts: Vec<_> = thread.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["use a random pivot", "thanks"]);
}

#[tokio::test]
async fn test_list_solutions_for_homework_lector() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let a = UserBuilder::student("a").create(db).await;
    let b = UserBuilder::student("b").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_student(&a)
        .with_student(&b)
        .create(db)
        .await;
    let (lection, _) = LectionBuilder::new("Sorting", &course, &owner)
        .with_homework("Quicksort")
        .create(db)
        .await;
    for s in [&a, &b] {
        operations::submit_solution(db, &actor(s), course.id, lection.id, s.id, "x")
            .await
            .unwrap();
    }

    let all = operations::list_solutions(db, &actor(&owner), course.id, lection.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let by_student = operations::list_solutions(db, &actor(&a), course.id, lection.id).await;
    assert!(matches!(by_student, Err(AppError::Forbidden(_))));
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_delete_course_by_author_cascades() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner = UserBuilder::lector("owner").create(db).await;
    let co = UserBuilder::lector("co").create(db).await;
    let student = UserBuilder::student("student").create(db).await;
    let course = CourseBuilder::new("Algorithms", &owner)
        .with_co_author(&co)
        .with_student(&student)
        .create(db)
        .await;
    let (lection, homework) = LectionBuilder::new("Sorting", &course, &owner)
        .with_homework("Quicksort")
        .create(db)
        .await;
    operations::submit_solution(db, &actor(&student), course.id, lection.id, student.id, "x")
        .await
        .unwrap();

    let by_co = operations::delete_course(db, &actor(&co), course.id).await;
    assert!(matches!(by_co, Err(AppError::Forbidden(_))));

    operations::delete_course(db, &actor(&owner), course.id)
        .await
        .expect("author deletes course");

    let gone = operations::get_course(db, course.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    assert!(storage::get_lection(db, lection.id).await.unwrap().is_none());
    let homework = homework.expect("homework created");
    assert!(storage::list_solutions(db, homework.id).await.unwrap().is_empty());
    assert!(storage::co_author_ids(db, course.id).await.unwrap().is_empty());
}
