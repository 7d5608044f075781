use campusdesk_core::serde::{deserialize_optional_i32, deserialize_optional_uuid};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, DepartmentId, ScheduleId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "day_of_week", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Half-open intervals: a slot ending at 10:00 does not clash with one starting at 10:00.
pub fn slots_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// One slot in a (department, year, semester) weekly timetable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WeeklySchedule {
    pub id: ScheduleId,
    pub department_id: DepartmentId,
    pub year: i32,
    pub semester: i32,
    pub day: DayOfWeek,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "10:00:00")]
    pub end_time: NaiveTime,
    pub course_id: CourseId,
    pub faculty_id: UserId,
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ScheduleSlotView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub slot: WeeklySchedule,
    pub course_name: String,
    pub course_code: String,
    pub faculty_name: String,
}

fn validate_slot_times(dto: &CreateScheduleDto) -> Result<(), ValidationError> {
    if dto.start_time >= dto.end_time {
        let mut err = ValidationError::new("time_range");
        err.message = Some("Start time must be before end time".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_slot_times"))]
pub struct CreateScheduleDto {
    pub department_id: DepartmentId,
    #[validate(range(min = 1, max = 6))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub semester: i32,
    pub day: DayOfWeek,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "10:00:00")]
    pub end_time: NaiveTime,
    pub course_id: CourseId,
    pub faculty_id: UserId,
    #[validate(length(max = 50))]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateScheduleDto {
    pub day: Option<DayOfWeek>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub course_id: Option<CourseId>,
    pub faculty_id: Option<UserId>,
    #[validate(length(max = 50))]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub department_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_i32")]
    pub semester: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(slots_overlap(t(9, 0), t(10, 0), t(9, 30), t(10, 30)));
        assert!(slots_overlap(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
        assert!(!slots_overlap(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!slots_overlap(t(13, 0), t(14, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn start_must_precede_end() {
        let dto = CreateScheduleDto {
            department_id: DepartmentId::new(),
            year: 1,
            semester: 1,
            day: DayOfWeek::Monday,
            start_time: t(10, 0),
            end_time: t(10, 0),
            course_id: CourseId::new(),
            faculty_id: UserId::new(),
            room: None,
        };
        assert!(dto.validate().is_err());
    }
}
