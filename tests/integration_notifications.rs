mod common;

use axum::http::StatusCode;
use common::{create_user, login, request, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_broadcast_reaches_role(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let first = create_user(&pool, "student").await;
    let second = create_user(&pool, "student").await;
    let faculty = create_user(&pool, "faculty").await;
    let admin_token = login(&app, &admin.email).await;

    let (status, created) = send(
        &app,
        request(
            "POST",
            "/api/notifications",
            Some(&admin_token),
            Some(json!({
                "title": "Exam week",
                "message": "Exams start Monday",
                "roles": ["student"]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].is_string());

    for student in [&first, &second] {
        let token = login(&app, &student.email).await;
        let (_, count) = send(&app, request("GET", "/api/notifications/unread-count", Some(&token), None)).await;
        assert_eq!(count["unread"], 1);
    }

    let faculty_token = login(&app, &faculty.email).await;
    let (_, count) = send(
        &app,
        request("GET", "/api/notifications/unread-count", Some(&faculty_token), None),
    )
    .await;
    assert_eq!(count["unread"], 0);

    let (status, sent) = send(&app, request("GET", "/api/notifications/sent", Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_read_and_read_all(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let student = create_user(&pool, "student").await;
    let admin_token = login(&app, &admin.email).await;

    for title in ["One", "Two", "Three"] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/notifications",
                Some(&admin_token),
                Some(json!({ "title": title, "message": "body", "receiver_ids": [student.id] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let token = login(&app, &student.email).await;
    let (status, inbox) = send(&app, request("GET", "/api/notifications", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let inbox = inbox.as_array().unwrap();
    assert_eq!(inbox.len(), 3);
    assert_eq!(inbox[0]["is_read"], false);

    let first_id = inbox[0]["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/notifications/{first_id}/read"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, count) = send(&app, request("GET", "/api/notifications/unread-count", Some(&token), None)).await;
    assert_eq!(count["unread"], 2);

    let (status, marked) = send(&app, request("PUT", "/api/notifications/read-all", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 2);

    let (_, count) = send(&app, request("GET", "/api/notifications/unread-count", Some(&token), None)).await;
    assert_eq!(count["unread"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_faculty_can_only_notify_students(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let colleague = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let token = login(&app, &faculty.email).await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/notifications",
            Some(&token),
            Some(json!({ "title": "Hi", "message": "Staff meeting", "receiver_ids": [colleague.id] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/notifications",
            Some(&token),
            Some(json!({ "title": "Hi", "message": "Quiz tomorrow", "receiver_ids": [student.id] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, request("GET", "/api/notifications/unread-count", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
