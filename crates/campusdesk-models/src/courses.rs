//! Courses and enrollment.
//!
//! A course authored by faculty starts `pending` with `approve_request` set
//! and only becomes visible in the general catalogue once an admin approves
//! it. Courses authored by an admin skip the queue.

use std::sync::LazyLock;

use campusdesk_core::PaginationMeta;
use campusdesk_core::serde::deserialize_optional_uuid;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, DepartmentId, UserId};

static COURSE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,5}[0-9]{2,4}$").expect("course code pattern"));

/// 2-5 uppercase letters followed by 2-4 digits, e.g. `CS101`.
pub fn is_valid_course_code(code: &str) -> bool {
    COURSE_CODE.is_match(code)
}

fn validate_course_code(code: &str) -> Result<(), ValidationError> {
    if is_valid_course_code(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("course_code");
        err.message = Some(
            "Course code must be 2-5 uppercase letters followed by 2-4 digits (e.g. CS101)".into(),
        );
        Err(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "course_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub code: String,
    pub description: String,
    pub credits: Option<i32>,
    pub department_id: Option<DepartmentId>,
    pub instructor_id: UserId,
    pub created_by: Option<UserId>,
    pub status: CourseStatus,
    /// Set while an approval request is outstanding
    pub approve_request: bool,
    pub approved_by_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Approve and reject are only legal while this holds.
    pub fn is_awaiting_approval(&self) -> bool {
        self.status == CourseStatus::Pending && self.approve_request
    }
}

/// A course with its instructor's name and enrollment count.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CourseDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub instructor_name: String,
    pub enrolled_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(custom(function = "validate_course_code"))]
    #[schema(example = "CS101")]
    pub code: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 0, max = 30))]
    pub credits: Option<i32>,
    pub department_id: Option<DepartmentId>,
    /// Required when an admin creates the course; ignored for faculty
    pub instructor_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_course_code"))]
    pub code: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 30))]
    pub credits: Option<i32>,
    pub department_id: Option<DepartmentId>,
    /// Admin only
    pub instructor_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<CourseDetail>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EnrolledStudent {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub department_id: Option<DepartmentId>,
    pub year: Option<i32>,
    pub semester: Option<i32>,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    pub message: String,
    pub course_id: CourseId,
    pub student_id: UserId,
}
