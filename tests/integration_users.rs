mod common;

use axum::http::StatusCode;
use common::{PASSWORD, create_active_course, create_user, login, request, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_user_listing_is_admin_only(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let student = create_user(&pool, "student").await;
    create_user(&pool, "faculty").await;

    let admin_token = login(&app, &admin.email).await;
    let (status, page) = send(
        &app,
        request("GET", "/api/users?role=faculty", Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["meta"]["total"], 1);

    let student_token = login(&app, &student.email).await;
    let (status, _) = send(&app, request("GET", "/api/users", Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_profile_update_and_password_change(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let student = create_user(&pool, "student").await;
    let token = login(&app, &student.email).await;

    let (status, profile) = send(
        &app,
        request(
            "PUT",
            "/api/users/profile",
            Some(&token),
            Some(json!({ "name": "Grace Hopper", "phone": "555-0100" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Grace Hopper");
    assert_eq!(profile["phone"], "555-0100");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/users/profile/change-password",
            Some(&token),
            Some(json!({ "current_password": "not-it", "new_password": "newsecret1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/users/profile/change-password",
            Some(&token),
            Some(json!({ "current_password": PASSWORD, "new_password": "newsecret1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": student.email, "password": "newsecret1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_deactivates_account(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let student = create_user(&pool, "student").await;
    let admin_token = login(&app, &admin.email).await;

    let (status, user) = send(
        &app,
        request(
            "PUT",
            &format!("/api/users/{}/status", student.id),
            Some(&admin_token),
            Some(json!({ "account_status": "inactive" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["account_status"], "inactive");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": student.email, "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/users/{}/status", admin.id),
            Some(&admin_token),
            Some(json!({ "account_status": "inactive" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_instructor_cannot_be_deleted(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    create_active_course(&pool, faculty.id, "HIST200").await;
    let token = login(&app, &admin.email).await;

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/users/{}", faculty.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/users/{}", student.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/users/{}", admin.id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
