//! Leave requests.
//!
//! ```text
//! pending ──approve──▶ approved
//!    │ ────reject───▶ rejected
//!    └─────cancel───▶ cancelled
//! ```
//!
//! Every transition leaves `pending`; nothing moves out of a decided state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{LeaveId, UserId};
use crate::users::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn can_transition_to(self, next: LeaveStatus) -> bool {
        self == LeaveStatus::Pending && next != LeaveStatus::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Casual,
    Personal,
    Academic,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Leave {
    pub id: LeaveId,
    pub requester_id: UserId,
    pub requester_role: UserRole,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub decided_by: Option<UserId>,
    pub decision_note: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LeaveWithRequester {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub leave: Leave,
    pub requester_name: String,
    pub requester_email: String,
}

fn validate_leave_dates(dto: &CreateLeaveDto) -> Result<(), ValidationError> {
    if dto.start_date > dto.end_date {
        let mut err = ValidationError::new("date_range");
        err.message = Some("Start date must not be after end date".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_leave_dates"))]
pub struct CreateLeaveDto {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 1, max = 2000, message = "Reason is required"))]
    pub reason: String,
    pub leave_type: LeaveType,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LeaveDecisionDto {
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilterParams {
    pub status: Option<LeaveStatus>,
}
