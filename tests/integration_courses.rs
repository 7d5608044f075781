mod common;

use axum::http::StatusCode;
use common::{create_active_course, create_user, enroll, login, request, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

fn course_body(code: &str) -> serde_json::Value {
    json!({
        "name": "Data Structures",
        "code": code,
        "description": "Lists, trees and graphs",
        "credits": 4
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_faculty_course_needs_approval(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let faculty_token = login(&app, &faculty.email).await;
    let admin_token = login(&app, &admin.email).await;

    let (status, course) = send(
        &app,
        request("POST", "/api/courses", Some(&faculty_token), Some(course_body("CS201"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["status"], "pending");
    assert_eq!(course["approve_request"], true);
    assert_eq!(course["approved_by_admin"], false);
    assert_eq!(course["instructor_id"], faculty.id.to_string());

    let id = course["id"].as_str().unwrap();
    let (status, approved) = send(
        &app,
        request("PUT", &format!("/api/courses/{id}/approve"), Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "active");
    assert_eq!(approved["approved_by_admin"], true);
    assert_eq!(approved["approve_request"], false);

    let (_, unread) = send(
        &app,
        request("GET", "/api/notifications/unread-count", Some(&faculty_token), None),
    )
    .await;
    assert_eq!(unread["unread"], 1);

    // no longer awaiting approval
    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/courses/{id}/approve"), Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_course_is_active_immediately(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let token = login(&app, &admin.email).await;

    let mut body = course_body("MATH101");
    body["instructor_id"] = json!(faculty.id);
    let (status, course) = send(&app, request("POST", "/api/courses", Some(&token), Some(body))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["status"], "active");
    assert_eq!(course["approved_by_admin"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_code_rules(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let token = login(&app, &faculty.email).await;

    for bad in ["cs101", "C101", "CS1", "CSABCD12345"] {
        let (status, _) = send(
            &app,
            request("POST", "/api/courses", Some(&token), Some(course_body(bad))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "code {bad} should be rejected");
    }

    let (status, _) = send(
        &app,
        request("POST", "/api/courses", Some(&token), Some(course_body("EE300"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request("POST", "/api/courses", Some(&token), Some(course_body("EE300"))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_cannot_create_courses(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let student = create_user(&pool, "student").await;
    let token = login(&app, &student.email).await;

    let (status, _) = send(
        &app,
        request("POST", "/api/courses", Some(&token), Some(course_body("CS999"))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_double_enrollment_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "PHY110").await;
    let token = login(&app, &student.email).await;
    let uri = format!("/api/courses/{course_id}/enroll");

    let (status, body) = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_id"], student.id.to_string());

    let (status, body) = send(&app, request("POST", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already enrolled"));

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM course_enrollments WHERE course_id = $1 AND student_id = $2",
    )
    .bind(course_id)
    .bind(student.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pending_course_not_open_for_enrollment(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let faculty_token = login(&app, &faculty.email).await;
    let student_token = login(&app, &student.email).await;

    let (_, course) = send(
        &app,
        request("POST", "/api/courses", Some(&faculty_token), Some(course_body("BIO120"))),
    )
    .await;
    let id = course["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/courses/{id}/enroll"), Some(&student_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_instructor_sees_enrolled_students(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let other_faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CHEM210").await;
    enroll(&pool, course_id, student.id).await;

    let token = login(&app, &faculty.email).await;
    let uri = format!("/api/courses/{course_id}/students");
    let (status, body) = send(&app, request("GET", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let other = login(&app, &other_faculty.email).await;
    let (status, _) = send(&app, request("GET", &uri, Some(&other), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_request_reaches_every_admin(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let first_admin = create_user(&pool, "admin").await;
    let second_admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let faculty_token = login(&app, &faculty.email).await;

    let (status, _) = send(
        &app,
        request("POST", "/api/courses", Some(&faculty_token), Some(course_body("CS301"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for admin in [&first_admin, &second_admin] {
        let token = login(&app, &admin.email).await;
        let (_, unread) = send(
            &app,
            request("GET", "/api/notifications/unread-count", Some(&token), None),
        )
        .await;
        assert_eq!(unread["unread"], 1);

        let (status, pending) =
            send(&app, request("GET", "/api/courses/pending", Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);
        assert_eq!(pending[0]["code"], "CS301");
    }

    // the requester is not notified about their own request
    let (_, unread) = send(
        &app,
        request("GET", "/api/notifications/unread-count", Some(&faculty_token), None),
    )
    .await;
    assert_eq!(unread["unread"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rejected_course_stays_closed(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let faculty_token = login(&app, &faculty.email).await;
    let admin_token = login(&app, &admin.email).await;
    let student_token = login(&app, &student.email).await;

    let (_, course) = send(
        &app,
        request("POST", "/api/courses", Some(&faculty_token), Some(course_body("CS302"))),
    )
    .await;
    let id = course["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/courses/{id}/reject"), Some(&faculty_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rejected) = send(
        &app,
        request("PUT", &format!("/api/courses/{id}/reject"), Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["approve_request"], false);
    assert_eq!(rejected["approved_by_admin"], false);

    let (_, unread) = send(
        &app,
        request("GET", "/api/notifications/unread-count", Some(&faculty_token), None),
    )
    .await;
    assert_eq!(unread["unread"], 1);

    // a rejected course can be neither approved nor rejected again
    for action in ["approve", "reject"] {
        let (status, _) = send(
            &app,
            request("PUT", &format!("/api/courses/{id}/{action}"), Some(&admin_token), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/courses/{id}/enroll"), Some(&student_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/courses/{}/reject", uuid::Uuid::new_v4()),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_other_faculty_cannot_change_a_course(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let instructor = create_user(&pool, "faculty").await;
    let other = create_user(&pool, "faculty").await;
    let admin = create_user(&pool, "admin").await;
    let course_id = create_active_course(&pool, instructor.id, "CS303").await;
    let uri = format!("/api/courses/{course_id}");
    let other_token = login(&app, &other.email).await;

    let (status, _) = send(
        &app,
        request("PUT", &uri, Some(&other_token), Some(json!({ "name": "Hijacked" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("DELETE", &uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let instructor_token = login(&app, &instructor.email).await;
    let (status, course) = send(&app, request("GET", &uri, Some(&instructor_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["name"], "Course CS303");

    // the instructor may edit but not hand the course to someone else
    let (status, updated) = send(
        &app,
        request("PUT", &uri, Some(&instructor_token), Some(json!({ "name": "Algorithms" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Algorithms");

    let (status, _) = send(
        &app,
        request("PUT", &uri, Some(&instructor_token), Some(json!({ "instructor_id": other.id }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = login(&app, &admin.email).await;
    let (status, _) = send(&app, request("DELETE", &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, request("GET", &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
