//! Fee structures and payments.
//!
//! Amounts are whole currency units. The gateway works in minor units, so
//! the payment bridge multiplies by 100 on the way out. Request amounts are
//! capped at one trillion units so that product always fits in an `i64`.

use campusdesk_core::serde::{deserialize_optional_i32, deserialize_optional_uuid};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::ids::{DepartmentId, FeePaymentId, FeeStructureId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_mode", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Online,
    Cash,
    BankTransfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub department_id: DepartmentId,
    pub year: i32,
    pub semester: i32,
    pub amount: i64,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFeeStructureDto {
    pub department_id: DepartmentId,
    #[validate(range(min = 1, max = 6))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub semester: i32,
    #[validate(range(min = 1i64, max = 1_000_000_000_000i64, message = "Amount must be between 1 and 1000000000000"))]
    pub amount: i64,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateFeeStructureDto {
    #[validate(range(min = 1i64, max = 1_000_000_000_000i64, message = "Amount must be between 1 and 1000000000000"))]
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeeStructureFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub department_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub semester: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeePayment {
    pub id: FeePaymentId,
    pub student_id: UserId,
    pub fee_structure_id: FeeStructureId,
    pub amount_paid: i64,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FeePaymentWithStudent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment: FeePayment,
    pub student_name: String,
    pub student_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MyFeeResponse {
    pub structure: FeeStructure,
    /// Most recent payment record, if any
    pub payment: Option<FeePayment>,
    pub status: PaymentStatus,
    pub amount_paid: i64,
    /// Negative when overpaid
    pub remaining: i64,
    pub is_overpaid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub payment: FeePayment,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ConfirmPaymentDto {
    #[validate(length(min = 1))]
    pub payment_intent_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct OfflinePaymentDto {
    pub student_id: UserId,
    pub fee_structure_id: FeeStructureId,
    #[validate(range(min = 1i64, max = 1_000_000_000_000i64, message = "Amount must be between 1 and 1000000000000"))]
    pub amount_paid: i64,
    /// `cash` or `bank_transfer`
    pub mode: PaymentMode,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilterParams {
    pub status: Option<PaymentStatus>,
}
