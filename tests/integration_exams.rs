mod common;

use axum::http::StatusCode;
use campusdesk::utils::expiry::purge_expired;
use chrono::{Duration, Utc};
use common::{
    TestApp, TestUser, create_active_course, create_user, enroll, login, request, send,
    setup_test_app,
};
use serde_json::{Value, json};
use sqlx::PgPool;

fn exam_body(course_id: uuid::Uuid) -> Value {
    json!({
        "course_id": course_id,
        "title": "Midterm",
        "expires_at": Utc::now() + Duration::days(1),
        "questions": [
            { "question_text": "2 + 2?", "options": ["3", "4"], "correct_answer": "4" },
            { "question_text": "Capital of France?", "options": ["Paris", "Rome"], "correct_answer": "Paris" },
            { "question_text": "Largest planet?", "options": ["Mars", "Jupiter"], "correct_answer": "Jupiter" }
        ]
    })
}

/// Creates the standard exam as `faculty` and has `student` answer every
/// question correctly. Returns the exam id and the result id.
async fn sit_exam(
    app: &TestApp,
    course_id: uuid::Uuid,
    faculty: &TestUser,
    student: &TestUser,
) -> (String, String) {
    let faculty_token = login(app, &faculty.email).await;
    let student_token = login(app, &student.email).await;

    let (status, exam) = send(
        app,
        request("POST", "/api/exams", Some(&faculty_token), Some(exam_body(course_id))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let exam_id = exam["id"].as_str().unwrap().to_string();

    let answers: Vec<Value> = exam["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| json!({ "question_id": q["id"], "selected_option": q["correct_answer"] }))
        .collect();
    let (status, result) = send(
        app,
        request(
            "POST",
            &format!("/api/exams/{exam_id}/submit"),
            Some(&student_token),
            Some(json!({ "answers": answers })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (exam_id, result["id"].as_str().unwrap().to_string())
}

fn question_ids(exam: &Value) -> Vec<String> {
    exam["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_exam_scoring_and_single_submission(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS101").await;
    enroll(&pool, course_id, student.id).await;

    let faculty_token = login(&app, &faculty.email).await;
    let student_token = login(&app, &student.email).await;

    let (status, exam) = send(
        &app,
        request("POST", "/api/exams", Some(&faculty_token), Some(exam_body(course_id))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let exam_id = exam["id"].as_str().unwrap().to_string();

    // students never see the answer key
    let (status, visible) = send(
        &app,
        request("GET", &format!("/api/exams/{exam_id}"), Some(&student_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(visible["questions"][0].get("correct_answer").is_none());

    let ids = question_ids(&visible);
    let answers = json!({
        "answers": [
            { "question_id": ids[0], "selected_option": "4" },
            { "question_id": ids[1], "selected_option": "Rome" },
            { "question_id": ids[2], "selected_option": "Jupiter" }
        ]
    });
    let submit_uri = format!("/api/exams/{exam_id}/submit");

    let (status, result) = send(
        &app,
        request("POST", &submit_uri, Some(&student_token), Some(answers.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(result["score"], 2);
    assert_eq!(result["total_questions"], 3);
    let breakdown = result["answers"].as_array().unwrap();
    assert_eq!(breakdown.len(), 3);
    let correct = breakdown.iter().filter(|a| a["is_correct"] == true).count();
    assert_eq!(correct, 2);

    let (status, _) = send(
        &app,
        request("POST", &submit_uri, Some(&student_token), Some(answers)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, mine) =
        send(&app, request("GET", "/api/result/my", Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, roster) = send(
        &app,
        request("GET", &format!("/api/result/exam/{exam_id}"), Some(&faculty_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster[0]["student_email"], student.email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_only_the_instructor_creates_exams(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let other = create_user(&pool, "faculty").await;
    let course_id = create_active_course(&pool, faculty.id, "CS102").await;
    let token = login(&app, &other.email).await;

    let (status, _) = send(
        &app,
        request("POST", "/api/exams", Some(&token), Some(exam_body(course_id))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_exam_must_expire_in_the_future(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let course_id = create_active_course(&pool, faculty.id, "CS103").await;
    let token = login(&app, &faculty.email).await;

    let mut body = exam_body(course_id);
    body["expires_at"] = json!(Utc::now() - Duration::hours(1));
    let (status, _) = send(&app, request("POST", "/api/exams", Some(&token), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_exam_refuses_submissions(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS104").await;
    enroll(&pool, course_id, student.id).await;
    let faculty_token = login(&app, &faculty.email).await;
    let student_token = login(&app, &student.email).await;

    let (_, exam) = send(
        &app,
        request("POST", "/api/exams", Some(&faculty_token), Some(exam_body(course_id))),
    )
    .await;
    let exam_id = exam["id"].as_str().unwrap().to_string();
    let first_question = question_ids(&exam)[0].clone();

    sqlx::query("UPDATE exams SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1::uuid")
        .bind(&exam_id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/api/exams/{exam_id}/submit"),
            Some(&student_token),
            Some(json!({ "answers": [{ "question_id": first_question, "selected_option": "4" }] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_outside_the_course_are_refused(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let outsider = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS105").await;
    let faculty_token = login(&app, &faculty.email).await;
    let outsider_token = login(&app, &outsider.email).await;

    let (_, exam) = send(
        &app,
        request("POST", "/api/exams", Some(&faculty_token), Some(exam_body(course_id))),
    )
    .await;
    let exam_id = exam["id"].as_str().unwrap().to_string();
    let first_question = question_ids(&exam)[0].clone();

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/exams/course/{course_id}"), Some(&outsider_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/exams/{exam_id}"), Some(&outsider_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/api/exams/{exam_id}/submit"),
            Some(&outsider_token),
            Some(json!({ "answers": [{ "question_id": first_question, "selected_option": "4" }] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, mine) =
        send(&app, request("GET", "/api/result/my", Some(&outsider_token), None)).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_results_outlive_purged_exams(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS106").await;
    enroll(&pool, course_id, student.id).await;
    let (exam_id, _) = sit_exam(&app, course_id, &faculty, &student).await;
    let faculty_token = login(&app, &faculty.email).await;
    let roster_uri = format!("/api/result/exam/{exam_id}");

    sqlx::query("UPDATE exams SET expires_at = NOW() - INTERVAL '2 days' WHERE id = $1::uuid")
        .bind(&exam_id)
        .execute(&pool)
        .await
        .unwrap();

    // still inside the retention window
    let report = purge_expired(&pool, 30).await.unwrap();
    assert_eq!(report.exams, 0);
    let (status, roster) =
        send(&app, request("GET", &roster_uri, Some(&faculty_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().unwrap().len(), 1);

    let report = purge_expired(&pool, 1).await.unwrap();
    assert_eq!(report.exams, 1);

    let (status, roster) =
        send(&app, request("GET", &roster_uri, Some(&faculty_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let roster = roster.as_array().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["exam_id"], exam_id.as_str());
    assert_eq!(roster[0]["exam_title"], "Midterm");

    let other = create_user(&pool, "faculty").await;
    let other_token = login(&app, &other.email).await;
    let (status, _) = send(&app, request("GET", &roster_uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_result_visibility(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let faculty = create_user(&pool, "faculty").await;
    let student = create_user(&pool, "student").await;
    let classmate = create_user(&pool, "student").await;
    let course_id = create_active_course(&pool, faculty.id, "CS107").await;
    enroll(&pool, course_id, student.id).await;
    enroll(&pool, course_id, classmate.id).await;
    let (_, result_id) = sit_exam(&app, course_id, &faculty, &student).await;
    let uri = format!("/api/result/{result_id}");

    let student_token = login(&app, &student.email).await;
    let (status, mine) =
        send(&app, request("GET", "/api/result/my", Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["id"], result_id.as_str());
    assert_eq!(mine[0]["exam_title"], "Midterm");

    for user in [&student, &faculty, &admin] {
        let token = login(&app, &user.email).await;
        let (status, result) = send(&app, request("GET", &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["score"], 3);
    }

    let token = login(&app, &classmate.email).await;
    let (status, _) = send(&app, request("GET", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/result/{}", uuid::Uuid::new_v4()), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
