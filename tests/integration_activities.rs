mod common;

use axum::http::StatusCode;
use common::{create_user, login, request, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_reads_the_activity_log(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let token = login(&app, &admin.email).await;

    for code in ["ART", "LAW"] {
        let body = json!({ "name": format!("Department of {code}"), "code": code });
        let (status, _) =
            send(&app, request("POST", "/api/departments", Some(&token), Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = send(
        &app,
        request("GET", "/api/activity?activity_type=department", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 2);
    let entries = page["data"].as_array().unwrap();
    // newest first
    assert_eq!(entries[0]["action"], "Created department LAW");
    assert_eq!(entries[1]["action"], "Created department ART");
    assert_eq!(entries[0]["actor_id"], admin.id.to_string());
    assert_eq!(entries[0]["actor_role"], "admin");

    let (_, page) = send(
        &app,
        request("GET", "/api/activity?activity_type=department&limit=1", Some(&token), None),
    )
    .await;
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["meta"]["has_more"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_activity_log_is_admin_only(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;

    let (status, _) = send(&app, request("GET", "/api/activity", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for user in [&faculty, &student] {
        let token = login(&app, &user.email).await;
        let (status, _) = send(&app, request("GET", "/api/activity", Some(&token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_users_see_only_their_own_activity(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let student = create_user(&pool, "student").await;
    let admin_token = login(&app, &admin.email).await;
    let student_token = login(&app, &student.email).await;

    let body = json!({ "name": "History", "code": "HIS" });
    send(&app, request("POST", "/api/departments", Some(&admin_token), Some(body))).await;

    let (status, page) =
        send(&app, request("GET", "/api/activity/my", Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = page["data"].as_array().unwrap();
    assert!(!entries.is_empty());
    assert!(
        entries
            .iter()
            .all(|entry| entry["actor_id"] == student.id.to_string())
    );
    assert!(
        !entries
            .iter()
            .any(|entry| entry["activity_type"] == "department")
    );
}
