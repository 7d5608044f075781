use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AttendanceId, CourseId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attendance_status")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attendance {
    pub id: AttendanceId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AttendanceWithStudent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    pub student_id: UserId,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceDto {
    pub course_id: CourseId,
    /// Today or earlier
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "At least one attendance record is required"))]
    pub records: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarkAttendanceResponse {
    pub created: Vec<Attendance>,
    /// Students that already had a record for that course and date
    pub skipped: Vec<UserId>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilterParams {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AttendanceSummary {
    pub course_id: CourseId,
    pub course_name: String,
    pub course_code: String,
    pub present: i64,
    pub total: i64,
    /// 0-100, two decimals
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MyAttendanceResponse {
    pub records: Vec<Attendance>,
    pub summary: Vec<AttendanceSummary>,
}
