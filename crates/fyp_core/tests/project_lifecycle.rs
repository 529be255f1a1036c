use fyp_core::db::open_db_in_memory;
use fyp_core::{
    CredentialHash, LifecycleError, LifecycleStep, Outcome, ProjectDetails, ProjectRepository,
    ProjectService, ProjectServiceError, ProjectStatus, Role, SqliteProjectRepository,
    SqliteTaskRepository, SqliteUserRepository, TitleRejection, User, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn service(conn: &Connection) -> ProjectService<SqliteProjectRepository<'_>, SqliteTaskRepository<'_>> {
    ProjectService::new(
        SqliteProjectRepository::try_new(conn).unwrap(),
        SqliteTaskRepository::try_new(conn).unwrap(),
    )
}

fn stored_user(conn: &Connection, role: Role, email: &str) -> User {
    let user = User::new(
        "LIFECYCLE USER",
        email,
        CredentialHash::derive("pw"),
        role,
        true,
    );
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(&user)
        .unwrap();
    user
}

fn details(frontend: &str, backend: &str, documentation: &str) -> ProjectDetails {
    ProjectDetails::new(
        Some(frontend.to_string()),
        Some(backend.to_string()),
        Some(documentation.to_string()),
    )
}

#[test]
fn submit_persists_pending_project_with_score() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let service = service(&conn);

    let project = service
        .submit(&student, "  Online Library Management System ")
        .unwrap();
    assert_eq!(project.status, ProjectStatus::Pending);
    assert_eq!(project.score, 4);
    assert_eq!(project.title, "Online Library Management System");

    let stored = service.require(project.id).unwrap();
    assert_eq!(stored, project);
}

#[test]
fn rejected_title_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let service = service(&conn);

    let err = service.submit(&student, "App").unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Validation {
            rejection: TitleRejection::TooShort { .. },
            score: 0
        }
    ));
    assert!(service.list_for_student(student.id).unwrap().is_empty());
}

#[test]
fn second_decide_fails_and_keeps_status() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let admin = stored_user(&conn, Role::Admin, "admin@college.edu");
    let service = service(&conn);
    let project = service
        .submit(&student, "College Attendance Portal")
        .unwrap();

    let rejected = service.decide(&admin, project.id, Outcome::Reject).unwrap();
    assert_eq!(rejected.status, ProjectStatus::Rejected);

    let err = service
        .decide(&admin, project.id, Outcome::Accept)
        .unwrap_err();
    match err {
        ProjectServiceError::Lifecycle(LifecycleError::InvalidTransition {
            project_id,
            from,
            attempted,
        }) => {
            assert_eq!(project_id, project.id);
            assert_eq!(from, ProjectStatus::Rejected);
            assert_eq!(attempted, LifecycleStep::Decide(Outcome::Accept));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        service.require(project.id).unwrap().status,
        ProjectStatus::Rejected
    );
}

#[test]
fn guarded_transition_reports_false_when_already_decided() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let service = service(&conn);
    let project = service
        .submit(&student, "Student Attendance Automation")
        .unwrap();

    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    assert!(repo
        .transition_status(project.id, ProjectStatus::Pending, ProjectStatus::Accepted)
        .unwrap());
    assert!(!repo
        .transition_status(project.id, ProjectStatus::Pending, ProjectStatus::Rejected)
        .unwrap());
    assert_eq!(
        repo.get_project(project.id).unwrap().unwrap().status,
        ProjectStatus::Accepted
    );
}

#[test]
fn decide_on_missing_project_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let admin = stored_user(&conn, Role::Admin, "admin@college.edu");
    let missing = Uuid::new_v4();

    let err = service(&conn)
        .decide(&admin, missing, Outcome::Accept)
        .unwrap_err();
    assert!(matches!(err, ProjectServiceError::NotFound(id) if id == missing));
}

#[test]
fn record_details_replaces_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let admin = stored_user(&conn, Role::Admin, "admin@college.edu");
    let service = service(&conn);
    let project = service
        .submit(&student, "Online Library Management System")
        .unwrap();
    service.decide(&admin, project.id, Outcome::Accept).unwrap();

    service
        .record_details(&student, project.id, details("Flutter", "Rust", "docs/v1"))
        .unwrap();
    let updated = service
        .record_details(
            &student,
            project.id,
            ProjectDetails::new(Some("React".to_string()), None, Some("  ".to_string())),
        )
        .unwrap();

    assert_eq!(updated.details.frontend.as_deref(), Some("React"));
    assert_eq!(updated.details.backend, None);
    assert_eq!(updated.details.documentation, None);
    assert_eq!(service.require(project.id).unwrap().details, updated.details);
}

#[test]
fn record_details_by_another_student_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let owner = stored_user(&conn, Role::Student, "a@college.edu");
    let intruder = stored_user(&conn, Role::Student, "b@college.edu");
    let admin = stored_user(&conn, Role::Admin, "admin@college.edu");
    let service = service(&conn);
    let project = service
        .submit(&owner, "Online Library Management System")
        .unwrap();
    service.decide(&admin, project.id, Outcome::Accept).unwrap();
    service
        .record_details(&owner, project.id, details("Flutter", "Rust", "docs/v1"))
        .unwrap();
    let before = service.require(project.id).unwrap();

    let err = service
        .record_details(&intruder, project.id, details("x", "y", "z"))
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Unauthorized(fyp_core::DenyReason::NotOwner)
    ));
    assert_eq!(service.require(project.id).unwrap(), before);
}

#[test]
fn record_details_on_pending_project_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let owner = stored_user(&conn, Role::Student, "a@college.edu");
    let service = service(&conn);
    let project = service
        .submit(&owner, "Online Library Management System")
        .unwrap();

    let err = service
        .record_details(&owner, project.id, details("x", "y", "z"))
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Unauthorized(fyp_core::DenyReason::ProjectNotAccepted)
    ));
    assert_eq!(service.require(project.id).unwrap().details, ProjectDetails::default());
}

#[test]
fn in_memory_lifecycle_rejects_detail_write_before_acceptance() {
    let owner = Uuid::new_v4();
    let mut project = fyp_core::Project::submitted(owner, "Online Library Management System", 4);

    let err = project
        .record_details(owner, details("x", "y", "z"))
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            from: ProjectStatus::Pending,
            attempted: LifecycleStep::RecordDetails,
            ..
        }
    ));
    assert_eq!(project.details, ProjectDetails::default());
}

#[test]
fn tasks_are_listed_in_assignment_order() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let faculty = stored_user(&conn, Role::Faculty, "f@college.edu");
    let admin = stored_user(&conn, Role::Admin, "admin@college.edu");
    let service = service(&conn);
    let project = service
        .submit(&student, "Online Library Management System")
        .unwrap();

    let err = service
        .assign_task(&faculty, project.id, "Draft the ER diagram")
        .unwrap_err();
    assert!(matches!(
        err,
        ProjectServiceError::Unauthorized(fyp_core::DenyReason::ProjectNotAccepted)
    ));

    service.decide(&admin, project.id, Outcome::Accept).unwrap();
    let first = service
        .assign_task(&faculty, project.id, "Draft the ER diagram")
        .unwrap();
    let second = service
        .assign_task(&admin, project.id, "  Write the test plan ")
        .unwrap();
    assert_eq!(second.description, "Write the test plan");
    assert!(matches!(
        service.assign_task(&faculty, project.id, "   "),
        Err(ProjectServiceError::BlankTaskDescription)
    ));

    let tasks = service.list_tasks(&student, project.id).unwrap();
    let ids: Vec<Uuid> = tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(tasks[0].assigned_by, Some(faculty.id));
}

#[test]
fn top_accepted_orders_by_score_and_caps_at_ten() {
    let conn = open_db_in_memory().unwrap();
    let student = stored_user(&conn, Role::Student, "a@college.edu");
    let admin = stored_user(&conn, Role::Admin, "admin@college.edu");
    let service = service(&conn);

    let low = service.submit(&student, "Smart Exam Apps").unwrap();
    service.decide(&admin, low.id, Outcome::Accept).unwrap();
    for _ in 0..10 {
        let project = service
            .submit(&student, "Online Library Management System")
            .unwrap();
        service.decide(&admin, project.id, Outcome::Accept).unwrap();
    }
    let pending = service.submit(&student, "Online College Portal").unwrap();

    let top = service.list_top_accepted().unwrap();
    assert_eq!(top.len(), 10);
    assert!(top.iter().all(|project| project.score == 4));
    assert!(top.iter().all(|project| project.id != low.id));

    let pending_list = service.list_pending().unwrap();
    assert_eq!(pending_list.len(), 1);
    assert_eq!(pending_list[0].id, pending.id);

    let mine = service.list_for_student(student.id).unwrap();
    assert_eq!(mine.len(), 12);
    assert_eq!(mine[0].id, pending.id);
}
