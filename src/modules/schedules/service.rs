use chrono::NaiveTime;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument};

use campusdesk_core::AppError;
use campusdesk_models::{DepartmentId, ScheduleId, UserId, UserRole};

use crate::middleware::auth::AuthUser;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::courses::CourseService;
use crate::modules::schedules::model::{
    CreateScheduleDto, DayOfWeek, ScheduleFilterParams, ScheduleSlotView, UpdateScheduleDto,
    WeeklySchedule, slots_overlap,
};
use crate::utils::db_errors::is_foreign_key_violation;

const SCHEDULE_COLUMNS: &str = "id, department_id, year, semester, day, start_time, end_time, \
     course_id, faculty_id, room, created_at, updated_at";

const VIEW_SELECT: &str = "SELECT s.id, s.department_id, s.year, s.semester, s.day, s.start_time,
            s.end_time, s.course_id, s.faculty_id, s.room, s.created_at, s.updated_at,
            c.name AS course_name, c.code AS course_code, u.name AS faculty_name
     FROM weekly_schedules s
     JOIN courses c ON c.id = s.course_id
     JOIN users u ON u.id = s.faculty_id";

const VIEW_ORDER: &str = "ORDER BY s.day, s.start_time";

#[derive(Debug, Clone, Copy, FromRow)]
pub struct BookedSlot {
    pub id: ScheduleId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// First booked slot that overlaps `[start, end)`.
pub fn find_clash(booked: &[BookedSlot], start: NaiveTime, end: NaiveTime) -> Option<ScheduleId> {
    booked
        .iter()
        .find(|s| slots_overlap(s.start_time, s.end_time, start, end))
        .map(|s| s.id)
}

fn write_error(e: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::bad_request(anyhow::anyhow!("Department, course or faculty does not exist"));
    }
    AppError::database(e)
}

#[derive(Debug, FromRow)]
struct StudentTerm {
    department_id: Option<DepartmentId>,
    year: Option<i32>,
    semester: Option<i32>,
}

pub struct ScheduleService;

impl ScheduleService {
    async fn find(conn: &mut PgConnection, id: ScheduleId) -> Result<WeeklySchedule, AppError> {
        sqlx::query_as::<_, WeeklySchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM weekly_schedules WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Schedule slot not found")))
    }

    /// Rejects a slot that overlaps another of the same faculty member's slots
    /// on that day. The faculty row is locked so concurrent bookings serialize.
    async fn ensure_no_clash(
        conn: &mut PgConnection,
        faculty_id: UserId,
        day: DayOfWeek,
        start: NaiveTime,
        end: NaiveTime,
        ignore: Option<ScheduleId>,
    ) -> Result<(), AppError> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(faculty_id)
            .execute(&mut *conn)
            .await?;

        let booked = sqlx::query_as::<_, BookedSlot>(
            "SELECT id, start_time, end_time FROM weekly_schedules
             WHERE faculty_id = $1 AND day = $2 AND ($3::uuid IS NULL OR id <> $3)",
        )
        .bind(faculty_id)
        .bind(day)
        .bind(ignore)
        .fetch_all(&mut *conn)
        .await?;

        if let Some(clash) = find_clash(&booked, start, end) {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Faculty already has a class at this time (slot {})",
                clash
            )));
        }
        Ok(())
    }

    #[instrument(skip(db, dto))]
    pub async fn create(
        db: &PgPool,
        admin_id: UserId,
        dto: CreateScheduleDto,
    ) -> Result<WeeklySchedule, AppError> {
        let mut tx = db.begin().await?;

        CourseService::find(&mut tx, dto.course_id).await?;
        CourseService::ensure_faculty(&mut tx, dto.faculty_id).await?;
        Self::ensure_no_clash(
            &mut tx,
            dto.faculty_id,
            dto.day,
            dto.start_time,
            dto.end_time,
            None,
        )
        .await?;

        let slot = sqlx::query_as::<_, WeeklySchedule>(&format!(
            "INSERT INTO weekly_schedules
                (department_id, year, semester, day, start_time, end_time, course_id, faculty_id, room)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(dto.department_id)
        .bind(dto.year)
        .bind(dto.semester)
        .bind(dto.day)
        .bind(dto.start_time)
        .bind(dto.end_time)
        .bind(dto.course_id)
        .bind(dto.faculty_id)
        .bind(&dto.room)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Schedule,
            format!(
                "Scheduled {:?} {}-{} for year {} semester {}",
                slot.day, slot.start_time, slot.end_time, slot.year, slot.semester
            ),
        )
        .await?;

        tx.commit().await?;
        info!(schedule.id = %slot.id, "schedule slot created");
        Ok(slot)
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        admin_id: UserId,
        id: ScheduleId,
        dto: UpdateScheduleDto,
    ) -> Result<WeeklySchedule, AppError> {
        let mut tx = db.begin().await?;

        let current = Self::find(&mut tx, id).await?;
        let day = dto.day.unwrap_or(current.day);
        let start = dto.start_time.unwrap_or(current.start_time);
        let end = dto.end_time.unwrap_or(current.end_time);
        let course_id = dto.course_id.unwrap_or(current.course_id);
        let faculty_id = dto.faculty_id.unwrap_or(current.faculty_id);

        if start >= end {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Start time must be before end time"
            )));
        }
        if course_id != current.course_id {
            CourseService::find(&mut tx, course_id).await?;
        }
        if faculty_id != current.faculty_id {
            CourseService::ensure_faculty(&mut tx, faculty_id).await?;
        }
        Self::ensure_no_clash(&mut tx, faculty_id, day, start, end, Some(id)).await?;

        let slot = sqlx::query_as::<_, WeeklySchedule>(&format!(
            "UPDATE weekly_schedules
             SET day = $2, start_time = $3, end_time = $4, course_id = $5, faculty_id = $6,
                 room = COALESCE($7, room), updated_at = NOW()
             WHERE id = $1
             RETURNING {SCHEDULE_COLUMNS}"
        ))
        .bind(id)
        .bind(day)
        .bind(start)
        .bind(end)
        .bind(course_id)
        .bind(faculty_id)
        .bind(&dto.room)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Schedule,
            format!("Updated schedule slot {id}"),
        )
        .await?;

        tx.commit().await?;
        Ok(slot)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, admin_id: UserId, id: ScheduleId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query("DELETE FROM weekly_schedules WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Schedule slot not found")));
        }

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Schedule,
            format!("Deleted schedule slot {id}"),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: ScheduleFilterParams,
    ) -> Result<Vec<ScheduleSlotView>, AppError> {
        let slots = sqlx::query_as::<_, ScheduleSlotView>(&format!(
            "{VIEW_SELECT}
             WHERE ($1::uuid IS NULL OR s.department_id = $1)
               AND ($2::int IS NULL OR s.year = $2)
               AND ($3::int IS NULL OR s.semester = $3)
             {VIEW_ORDER}"
        ))
        .bind(filters.department_id)
        .bind(filters.year)
        .bind(filters.semester)
        .fetch_all(db)
        .await?;
        Ok(slots)
    }

    /// Students get their term's timetable, faculty the slots they teach.
    #[instrument(skip(db))]
    pub async fn my_schedule(
        db: &PgPool,
        auth_user: &AuthUser,
    ) -> Result<Vec<ScheduleSlotView>, AppError> {
        match auth_user.role {
            UserRole::Faculty => {
                let slots = sqlx::query_as::<_, ScheduleSlotView>(&format!(
                    "{VIEW_SELECT} WHERE s.faculty_id = $1 {VIEW_ORDER}"
                ))
                .bind(auth_user.user_id)
                .fetch_all(db)
                .await?;
                Ok(slots)
            }
            UserRole::Student => {
                let term = sqlx::query_as::<_, StudentTerm>(
                    "SELECT department_id, year, semester FROM users WHERE id = $1",
                )
                .bind(auth_user.user_id)
                .fetch_one(db)
                .await?;

                let (Some(department_id), Some(year), Some(semester)) =
                    (term.department_id, term.year, term.semester)
                else {
                    return Ok(Vec::new());
                };

                let slots = sqlx::query_as::<_, ScheduleSlotView>(&format!(
                    "{VIEW_SELECT}
                     WHERE s.department_id = $1 AND s.year = $2 AND s.semester = $3
                     {VIEW_ORDER}"
                ))
                .bind(department_id)
                .bind(year)
                .bind(semester)
                .fetch_all(db)
                .await?;
                Ok(slots)
            }
            UserRole::Admin => Self::list(db, ScheduleFilterParams::default()).await,
        }
    }
}
