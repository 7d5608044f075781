use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use campusdesk_core::{AppError, ErrorResponse};
use campusdesk_models::FeeStructureId;

use crate::middleware::auth::{AuthUser, RequireAdmin, RequireStudent};
use crate::modules::fees::model::{
    ConfirmPaymentDto, CreateFeeStructureDto, FeePayment, FeePaymentWithStudent, FeeStructure,
    FeeStructureFilterParams, MyFeeResponse, OfflinePaymentDto, PaymentFilterParams,
    PaymentIntentResponse, UpdateFeeStructureDto,
};
use crate::modules::fees::service::FeeService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, query_params};

#[utoipa::path(
    post,
    path = "/api/fees/structures",
    request_body = CreateFeeStructureDto,
    responses(
        (status = 201, description = "Fee structure created", body = FeeStructure),
        (status = 400, description = "Invalid input or unknown department", body = ErrorResponse),
        (status = 409, description = "Structure already exists for that term", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_fee_structure(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateFeeStructureDto>,
) -> Result<(StatusCode, Json<FeeStructure>), AppError> {
    let structure = FeeService::create_structure(&state.db, admin.user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(structure)))
}

#[utoipa::path(
    get,
    path = "/api/fees/structures",
    params(FeeStructureFilterParams),
    responses((status = 200, description = "Fee structures", body = Vec<FeeStructure>)),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_fee_structures(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    filters: Result<Query<FeeStructureFilterParams>, QueryRejection>,
) -> Result<Json<Vec<FeeStructure>>, AppError> {
    let filters = query_params(filters)?;
    Ok(Json(FeeService::list_structures(&state.db, filters).await?))
}

#[utoipa::path(
    put,
    path = "/api/fees/structures/{id}",
    params(("id" = FeeStructureId, Path, description = "Fee structure ID")),
    request_body = UpdateFeeStructureDto,
    responses(
        (status = 200, description = "Fee structure updated", body = FeeStructure),
        (status = 404, description = "Fee structure not found", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_fee_structure(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<FeeStructureId>,
    ValidatedJson(dto): ValidatedJson<UpdateFeeStructureDto>,
) -> Result<Json<FeeStructure>, AppError> {
    Ok(Json(FeeService::update_structure(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/fees/structures/{id}",
    params(("id" = FeeStructureId, Path, description = "Fee structure ID")),
    responses(
        (status = 204, description = "Fee structure deleted"),
        (status = 404, description = "Fee structure not found", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_fee_structure(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<FeeStructureId>,
) -> Result<StatusCode, AppError> {
    FeeService::delete_structure(&state.db, admin.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/fees/my",
    responses(
        (status = 200, description = "Term fee, latest payment and remaining balance", body = MyFeeResponse),
        (status = 404, description = "No fee structure for the student's term", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_fee(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
) -> Result<Json<MyFeeResponse>, AppError> {
    Ok(Json(FeeService::my_fee(&state.db, student.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/fees/create-payment-intent",
    responses(
        (status = 200, description = "Payment intent opened", body = PaymentIntentResponse),
        (status = 404, description = "No fee structure for the student's term", body = ErrorResponse),
        (status = 409, description = "Fees already paid", body = ErrorResponse),
        (status = 502, description = "Payment gateway failure", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let response = FeeService::create_payment_intent(
        &state.db,
        state.payment_gateway.as_ref(),
        &state.payment_config.currency,
        student.user_id,
    )
    .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/fees/confirm",
    request_body = ConfirmPaymentDto,
    responses(
        (status = 200, description = "Payment settled", body = FeePayment),
        (status = 400, description = "Payment has not succeeded", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    ValidatedJson(dto): ValidatedJson<ConfirmPaymentDto>,
) -> Result<Json<FeePayment>, AppError> {
    let payment = FeeService::confirm(
        &state.db,
        state.payment_gateway.as_ref(),
        student.user_id,
        dto,
    )
    .await?;
    Ok(Json(payment))
}

#[utoipa::path(
    post,
    path = "/api/fees/offline",
    request_body = OfflinePaymentDto,
    responses(
        (status = 201, description = "Payment recorded", body = FeePayment),
        (status = 400, description = "Invalid mode or not a student", body = ErrorResponse),
        (status = 404, description = "Student or fee structure not found", body = ErrorResponse),
        (status = 409, description = "Fees already paid", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn record_offline_payment(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<OfflinePaymentDto>,
) -> Result<(StatusCode, Json<FeePayment>), AppError> {
    let payment = FeeService::record_offline(&state.db, admin.user_id, dto).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/fees/payments",
    params(PaymentFilterParams),
    responses(
        (status = 200, description = "All payments", body = Vec<FeePaymentWithStudent>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    filters: Result<Query<PaymentFilterParams>, QueryRejection>,
) -> Result<Json<Vec<FeePaymentWithStudent>>, AppError> {
    let filters = query_params(filters)?;
    Ok(Json(FeeService::list_payments(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/fees/payments/my",
    responses((status = 200, description = "Caller's payments", body = Vec<FeePayment>)),
    tag = "Fees",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_payments(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
) -> Result<Json<Vec<FeePayment>>, AppError> {
    Ok(Json(
        FeeService::list_for_student(&state.db, student.user_id).await?,
    ))
}
