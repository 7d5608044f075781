mod common;

use axum::http::StatusCode;
use common::{
    TestApp, create_active_course, create_user, login, multipart_request, request, send,
    setup_test_app, setup_test_app_with_upload_limit,
};
use serde_json::Value;
use sqlx::PgPool;

const NOTES: &[u8] = b"Week 1: ownership and borrowing";

async fn upload(app: &TestApp, token: &str, course_id: &str, bytes: &[u8]) -> (StatusCode, Value) {
    send(
        app,
        multipart_request(
            "/api/documents",
            Some(token),
            &[("course_id", course_id), ("title", "Week 1 notes"), ("type", "notes")],
            Some(("week1.txt", "text/plain", bytes)),
        ),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_instructor_uploads_lists_and_deletes(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS201").await.to_string();
    let faculty_token = login(&app, &faculty.email).await;
    let student_token = login(&app, &student.email).await;

    let (status, document) = upload(&app, &faculty_token, &course_id, NOTES).await;
    assert_eq!(status, StatusCode::CREATED, "{document}");
    assert_eq!(document["title"], "Week 1 notes");
    assert_eq!(document["doc_type"], "notes");
    assert_eq!(document["size_bytes"], NOTES.len());
    assert_eq!(document["original_name"], "week1.txt");
    assert!(document.get("storage_key").is_none());
    let file_url = document["file_url"].as_str().unwrap();
    assert!(file_url.starts_with(&format!("http://localhost/files/documents/{course_id}/")));
    let document_id = document["id"].as_str().unwrap().to_string();

    let list_uri = format!("/api/documents/course/{course_id}");
    let (status, listed) = send(&app, request("GET", &list_uri, Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], document_id.as_str());

    let delete_uri = format!("/api/documents/{document_id}");
    let (status, _) = send(&app, request("DELETE", &delete_uri, Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request("DELETE", &delete_uri, Some(&faculty_token), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = send(&app, request("GET", &list_uri, Some(&student_token), None)).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, _) = send(&app, request("DELETE", &delete_uri, Some(&faculty_token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_the_instructor_uploads(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let instructor = create_user(&pool, "faculty").await;
    let other_faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, instructor.id, "CS202").await.to_string();

    let token = login(&app, &student.email).await;
    let (status, _) = upload(&app, &token, &course_id, NOTES).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = login(&app, &other_faculty.email).await;
    let (status, body) = upload(&app, &token, &course_id, NOTES).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, _) = upload(&app, &token, &uuid::Uuid::new_v4().to_string(), NOTES).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upload_form_is_validated(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let course_id = create_active_course(&pool, faculty.id, "CS203").await.to_string();
    let token = login(&app, &faculty.email).await;

    // no file part
    let (status, _) = send(
        &app,
        multipart_request(
            "/api/documents",
            Some(&token),
            &[("course_id", course_id.as_str()), ("title", "Syllabus"), ("type", "syllabus")],
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        multipart_request(
            "/api/documents",
            Some(&token),
            &[("course_id", course_id.as_str()), ("title", "Syllabus"), ("type", "poster")],
            Some(("s.txt", "text/plain", NOTES)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        multipart_request(
            "/api/documents",
            Some(&token),
            &[("course_id", course_id.as_str()), ("title", "Syllabus"), ("type", "syllabus")],
            Some(("run.sh", "application/x-sh", NOTES)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_oversized_uploads_are_refused(pool: PgPool) {
    let app = setup_test_app_with_upload_limit(pool.clone(), 1024);
    let faculty = create_user(&pool, "faculty").await;
    let course_id = create_active_course(&pool, faculty.id, "CS204").await.to_string();
    let token = login(&app, &faculty.email).await;

    let (status, _) = upload(&app, &token, &course_id, &[b'a'; 1024]).await;
    assert_eq!(status, StatusCode::CREATED);

    // over the file limit, inside the request body limit
    let (status, body) = upload(&app, &token, &course_id, &[b'a'; 2048]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{body}");

    // over the request body limit itself
    let (status, _) = upload(&app, &token, &course_id, &vec![b'a'; 200 * 1024]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
