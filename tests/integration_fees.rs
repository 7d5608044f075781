mod common;

use axum::http::StatusCode;
use common::{
    create_department, create_user, create_user_in_term, login, request, send, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_online_payment_flow(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let department = create_department(&pool, "CSE").await;
    let student = create_user_in_term(&pool, "student", Some(department), Some(2), Some(3)).await;
    let admin_token = login(&app, &admin.email).await;
    let student_token = login(&app, &student.email).await;

    let (status, structure) = send(
        &app,
        request(
            "POST",
            "/api/fees/structures",
            Some(&admin_token),
            Some(json!({ "department_id": department, "year": 2, "semester": 3, "amount": 50000 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(structure["amount"], 50000);

    let (status, fee) = send(&app, request("GET", "/api/fees/my", Some(&student_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fee["status"], "Pending");
    assert_eq!(fee["remaining"], 50000);

    let (status, intent) = send(
        &app,
        request("POST", "/api/fees/create-payment-intent", Some(&student_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(intent["amount"], 5_000_000);
    let intent_id = intent["payment_intent_id"].as_str().unwrap().to_string();

    let sent = app.gateway.last_request().unwrap();
    assert!(sent.metadata.contains(&("department".to_string(), "CSE".to_string())));
    assert!(sent.metadata.contains(&("student_id".to_string(), student.id.to_string())));

    let confirm = json!({ "payment_intent_id": intent_id });
    let (status, _) = send(
        &app,
        request("POST", "/api/fees/confirm", Some(&student_token), Some(confirm.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.gateway.succeed(&intent_id);
    let (status, payment) = send(
        &app,
        request("POST", "/api/fees/confirm", Some(&student_token), Some(confirm.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "Paid");

    // confirming twice returns the settled record
    let (status, again) = send(
        &app,
        request("POST", "/api/fees/confirm", Some(&student_token), Some(confirm)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], payment["id"]);

    let (_, fee) = send(&app, request("GET", "/api/fees/my", Some(&student_token), None)).await;
    assert_eq!(fee["status"], "Paid");
    assert_eq!(fee["remaining"], 0);
    assert_eq!(fee["is_overpaid"], false);

    let (status, _) = send(
        &app,
        request("POST", "/api/fees/create-payment-intent", Some(&student_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_offline_overpayment_is_not_clamped(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let department = create_department(&pool, "EEE").await;
    let student = create_user_in_term(&pool, "student", Some(department), Some(1), Some(1)).await;
    let admin_token = login(&app, &admin.email).await;
    let student_token = login(&app, &student.email).await;

    let (_, structure) = send(
        &app,
        request(
            "POST",
            "/api/fees/structures",
            Some(&admin_token),
            Some(json!({ "department_id": department, "year": 1, "semester": 1, "amount": 1000 })),
        ),
    )
    .await;

    let (status, payment) = send(
        &app,
        request(
            "POST",
            "/api/fees/offline",
            Some(&admin_token),
            Some(json!({
                "student_id": student.id,
                "fee_structure_id": structure["id"],
                "amount_paid": 1200,
                "mode": "cash"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "Paid");
    assert_eq!(payment["mode"], "cash");

    let (_, fee) = send(&app, request("GET", "/api/fees/my", Some(&student_token), None)).await;
    assert_eq!(fee["remaining"], -200);
    assert_eq!(fee["is_overpaid"], true);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_offline_payment_rejects_online_mode(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let department = create_department(&pool, "MECH").await;
    let student = create_user_in_term(&pool, "student", Some(department), Some(1), Some(2)).await;
    let admin_token = login(&app, &admin.email).await;

    let (_, structure) = send(
        &app,
        request(
            "POST",
            "/api/fees/structures",
            Some(&admin_token),
            Some(json!({ "department_id": department, "year": 1, "semester": 2, "amount": 1000 })),
        ),
    )
    .await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/fees/offline",
            Some(&admin_token),
            Some(json!({
                "student_id": student.id,
                "fee_structure_id": structure["id"],
                "amount_paid": 1000,
                "mode": "online"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_fee_structure_conflicts(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let admin = create_user(&pool, "admin").await;
    let department = create_department(&pool, "CIVIL").await;
    let token = login(&app, &admin.email).await;
    let body = json!({ "department_id": department, "year": 3, "semester": 5, "amount": 700 });

    let (status, _) = send(
        &app,
        request("POST", "/api/fees/structures", Some(&token), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        request("POST", "/api/fees/structures", Some(&token), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_without_structure_gets_not_found(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let department = create_department(&pool, "MATH").await;
    let student = create_user_in_term(&pool, "student", Some(department), Some(4), Some(8)).await;
    let token = login(&app, &student.email).await;

    let (status, _) = send(&app, request("GET", "/api/fees/my", Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
