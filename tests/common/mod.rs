#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use campusdesk::campusdesk_config::storage::DEFAULT_MAX_UPLOAD_BYTES;
use campusdesk::campusdesk_core::file_storage::LocalFileStorage;
use campusdesk::campusdesk_core::hash_password;
use campusdesk::router::init_router;
use campusdesk::state::AppState;
use campusdesk::utils::payment::{
    GatewayError, GatewayFuture, INTENT_SUCCEEDED, PaymentGateway, PaymentIntent,
    PaymentIntentRequest,
};

pub const PASSWORD: &str = "secret123";

/// In-memory stand-in for the Stripe client. Intents start unpaid until
/// [`FakeGateway::succeed`] is called.
#[derive(Default)]
pub struct FakeGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    requests: Mutex<Vec<PaymentIntentRequest>>,
}

impl FakeGateway {
    pub fn succeed(&self, intent_id: &str) {
        if let Some(intent) = self.intents.lock().unwrap().get_mut(intent_id) {
            intent.status = INTENT_SUCCEEDED.to_string();
        }
    }

    pub fn last_request(&self) -> Option<PaymentIntentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl PaymentGateway for FakeGateway {
    fn create_payment_intent<'a>(
        &'a self,
        request: &'a PaymentIntentRequest,
    ) -> GatewayFuture<'a, PaymentIntent> {
        Box::pin(async move {
            let id = format!("pi_test_{}", Uuid::new_v4().simple());
            let intent = PaymentIntent {
                id: id.clone(),
                client_secret: Some(format!("{id}_secret")),
                status: "requires_payment_method".to_string(),
                amount: request.amount,
                currency: request.currency.clone(),
                metadata: request.metadata.iter().cloned().collect(),
            };
            self.requests.lock().unwrap().push(request.clone());
            self.intents.lock().unwrap().insert(id, intent.clone());
            Ok(intent)
        })
    }

    fn retrieve_payment_intent<'a>(
        &'a self,
        intent_id: &'a str,
    ) -> GatewayFuture<'a, PaymentIntent> {
        Box::pin(async move {
            self.intents
                .lock()
                .unwrap()
                .get(intent_id)
                .cloned()
                .ok_or(GatewayError::Api {
                    status: 404,
                    message: "No such payment_intent".to_string(),
                })
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub gateway: Arc<FakeGateway>,
}

pub fn setup_test_app(pool: PgPool) -> TestApp {
    setup_test_app_with_upload_limit(pool, DEFAULT_MAX_UPLOAD_BYTES)
}

/// Same as [`setup_test_app`] but with a smaller document size limit.
pub fn setup_test_app_with_upload_limit(pool: PgPool, max_upload_bytes: usize) -> TestApp {
    dotenvy::dotenv().ok();
    let gateway = Arc::new(FakeGateway::default());
    let upload_dir = std::env::temp_dir().join(format!("campusdesk-test-{}", Uuid::new_v4()));
    let mut state = AppState::new(pool.clone())
        .with_payment_gateway(gateway.clone())
        .with_file_storage(Arc::new(LocalFileStorage::with_max_size(
            upload_dir,
            "http://localhost/files".to_string(),
            max_upload_bytes,
        )));
    state.storage_config.max_upload_bytes = max_upload_bytes;

    TestApp {
        router: init_router(state),
        pool,
        gateway,
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.edu", Uuid::new_v4().simple())
}

/// Inserts an approved, active account.
pub async fn create_user(pool: &PgPool, role: &str) -> TestUser {
    create_user_in_term(pool, role, None, None, None).await
}

pub async fn create_user_in_term(
    pool: &PgPool,
    role: &str,
    department_id: Option<Uuid>,
    year: Option<i32>,
    semester: Option<i32>,
) -> TestUser {
    let email = unique_email(role);
    let hashed = hash_password(PASSWORD).unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, email, password, role, department_id, year, semester)
         VALUES ($1, $2, $3, $4::user_role, $5, $6, $7)
         RETURNING id",
    )
    .bind(format!("Test {role}"))
    .bind(&email)
    .bind(hashed)
    .bind(role)
    .bind(department_id)
    .bind(year)
    .bind(semester)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser { id, email }
}

pub async fn create_department(pool: &PgPool, code: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO departments (name, code) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("Department {code}"))
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// An admin-approved course taught by `instructor_id`.
pub async fn create_active_course(pool: &PgPool, instructor_id: Uuid, code: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO courses
            (name, code, description, instructor_id, created_by, status,
             approve_request, approved_by_admin)
         VALUES ($1, $2, 'Test course', $3, $3, 'active', false, true)
         RETURNING id",
    )
    .bind(format!("Course {code}"))
    .bind(code)
    .bind(instructor_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn enroll(pool: &PgPool, course_id: Uuid, student_id: Uuid) {
    sqlx::query("INSERT INTO course_enrollments (course_id, student_id) VALUES ($1, $2)")
        .bind(course_id)
        .bind(student_id)
        .execute(pool)
        .await
        .unwrap();
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub const MULTIPART_BOUNDARY: &str = "campusdesk-test-boundary";

/// A `multipart/form-data` request with text `fields` and one `file` part.
pub fn multipart_request(
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub async fn login(app: &TestApp, email: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "email": email, "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}
