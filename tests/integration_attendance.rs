mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_active_course, create_user, enroll, login, request, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_attendance_skips_existing_records(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let present = create_user(&pool, "student").await;
    let absent = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS301").await;
    enroll(&pool, course_id, present.id).await;
    enroll(&pool, course_id, absent.id).await;
    let token = login(&app, &faculty.email).await;

    let today = Utc::now().date_naive();
    let body = json!({
        "course_id": course_id,
        "date": today,
        "records": [
            { "student_id": present.id, "status": "Present" },
            { "student_id": absent.id, "status": "Absent" }
        ]
    });

    let (status, first) = send(
        &app,
        request("POST", "/api/attendance", Some(&token), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created"].as_array().unwrap().len(), 2);
    assert!(first["skipped"].as_array().unwrap().is_empty());

    let (status, second) = send(&app, request("POST", "/api/attendance", Some(&token), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(second["created"].as_array().unwrap().is_empty());
    assert_eq!(second["skipped"].as_array().unwrap().len(), 2);

    let student_token = login(&app, &present.email).await;
    let (status, mine) = send(&app, request("GET", "/api/attendance/my", Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["records"].as_array().unwrap().len(), 1);
    assert_eq!(mine["summary"][0]["present"], 1);
    assert_eq!(mine["summary"][0]["total"], 1);
    assert_eq!(mine["summary"][0]["percentage"], 100.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_attendance_requires_enrollment(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let outsider = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS302").await;
    let token = login(&app, &faculty.email).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/attendance",
            Some(&token),
            Some(json!({
                "course_id": course_id,
                "date": Utc::now().date_naive(),
                "records": [{ "student_id": outsider.id, "status": "Present" }]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not enrolled"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_future_dates_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS303").await;
    enroll(&pool, course_id, student.id).await;
    let token = login(&app, &faculty.email).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/attendance",
            Some(&token),
            Some(json!({
                "course_id": course_id,
                "date": Utc::now().date_naive() + Duration::days(2),
                "records": [{ "student_id": student.id, "status": "Present" }]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
