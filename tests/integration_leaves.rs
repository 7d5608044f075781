mod common;

use axum::http::StatusCode;
use common::{create_user, login, request, send, setup_test_app};
use serde_json::{Value, json};
use sqlx::PgPool;

fn leave_body() -> Value {
    json!({
        "start_date": "2030-03-10",
        "end_date": "2030-03-12",
        "reason": "Family event",
        "leave_type": "personal"
    })
}

async fn submit(app: &common::TestApp, token: &str) -> String {
    let (status, leave) = send(
        app,
        request("POST", "/api/leave", Some(token), Some(leave_body())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(leave["status"], "pending");
    leave["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_leave_approval_flow(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let student = create_user(&pool, "student").await;
    let admin_token = login(&app, &admin.email).await;
    let student_token = login(&app, &student.email).await;

    let id = submit(&app, &student_token).await;

    let (status, pending) = send(
        &app,
        request("GET", "/api/leave?status=pending", Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, approved) = send(
        &app,
        request(
            "PUT",
            &format!("/api/leave/{id}/approve"),
            Some(&admin_token),
            Some(json!({ "note": "Enjoy" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["decided_by"], admin.id.to_string());

    // terminal states cannot move again
    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/leave/{id}/reject"), Some(&admin_token), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/leave/{id}/cancel"), Some(&student_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mine) = send(&app, request("GET", "/api/leave/my", Some(&student_token), None)).await;
    assert_eq!(mine[0]["status"], "approved");

    let (_, unread) = send(
        &app,
        request("GET", "/api/notifications/unread-count", Some(&student_token), None),
    )
    .await;
    assert_eq!(unread["unread"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_requester_cancels_pending_leave(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let other = create_user(&pool, "student").await;
    let token = login(&app, &faculty.email).await;
    let other_token = login(&app, &other.email).await;

    let id = submit(&app, &token).await;
    let uri = format!("/api/leave/{id}/cancel");

    let (status, _) = send(&app, request("PUT", &uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancelled) = send(&app, request("PUT", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (_, mine) = send(&app, request("GET", "/api/leave/my", Some(&token), None)).await;
    assert_eq!(mine[0]["status"], "cancelled");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_leave_dates_must_be_ordered(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let student = create_user(&pool, "student").await;
    let token = login(&app, &student.email).await;

    let mut body = leave_body();
    body["end_date"] = json!("2030-03-01");
    let (status, _) = send(&app, request("POST", "/api/leave", Some(&token), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admins_do_not_request_leave(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let token = login(&app, &admin.email).await;

    let (status, _) = send(&app, request("POST", "/api/leave", Some(&token), Some(leave_body()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rejected_leave_cannot_be_cancelled(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let admin_token = login(&app, &admin.email).await;
    let token = login(&app, &faculty.email).await;

    let id = submit(&app, &token).await;

    let (status, rejected) = send(
        &app,
        request(
            "PUT",
            &format!("/api/leave/{id}/reject"),
            Some(&admin_token),
            Some(json!({ "note": "Exam week" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");

    let (status, body) = send(
        &app,
        request("PUT", &format!("/api/leave/{id}/cancel"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("rejected"));

    let (_, mine) = send(&app, request("GET", "/api/leave/my", Some(&token), None)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["status"], "rejected");
    assert_eq!(mine[0]["decided_by"], admin.id.to_string());

    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/leave/{id}/approve"), Some(&admin_token), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
