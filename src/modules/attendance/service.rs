use std::collections::HashSet;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};

use campusdesk_core::AppError;
use campusdesk_models::{CourseId, UserId};

use crate::middleware::auth::AuthUser;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::attendance::model::{
    Attendance, AttendanceFilterParams, AttendanceSummary, AttendanceWithStudent,
    MarkAttendanceDto, MarkAttendanceResponse, MyAttendanceResponse,
};
use crate::modules::courses::CourseService;

const ATTENDANCE_COLUMNS: &str = "id, student_id, course_id, date, status, marked_by, created_at";

/// Students in `requested` that are missing from `enrolled`, first occurrence order.
pub fn not_enrolled(requested: &[UserId], enrolled: &[UserId]) -> Vec<UserId> {
    let enrolled: HashSet<&UserId> = enrolled.iter().collect();
    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|id| !enrolled.contains(id) && seen.insert(**id))
        .copied()
        .collect()
}

pub struct AttendanceService;

impl AttendanceService {
    /// Records are written once per student, course and day. Existing ones are
    /// left as they are and reported back as skipped.
    #[instrument(skip(db, dto), fields(course.id = %dto.course_id, date = %dto.date))]
    pub async fn mark(
        db: &PgPool,
        auth_user: &AuthUser,
        dto: MarkAttendanceDto,
    ) -> Result<MarkAttendanceResponse, AppError> {
        if dto.date > Utc::now().date_naive() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Attendance cannot be marked for a future date"
            )));
        }

        let mut tx = db.begin().await?;

        let course = CourseService::find(&mut tx, dto.course_id).await?;
        CourseService::ensure_can_manage(auth_user, &course)?;

        let requested: Vec<UserId> = dto.records.iter().map(|r| r.student_id).collect();
        let enrolled = sqlx::query_scalar::<_, UserId>(
            "SELECT student_id FROM course_enrollments
             WHERE course_id = $1 AND student_id = ANY($2)",
        )
        .bind(course.id)
        .bind(&requested)
        .fetch_all(&mut *tx)
        .await?;

        let missing = not_enrolled(&requested, &enrolled);
        if !missing.is_empty() {
            let ids: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Students not enrolled in this course: {}",
                ids.join(", ")
            )));
        }

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        for entry in &dto.records {
            let row = sqlx::query_as::<_, Attendance>(&format!(
                "INSERT INTO attendance (student_id, course_id, date, status, marked_by)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (student_id, course_id, date) DO NOTHING
                 RETURNING {ATTENDANCE_COLUMNS}"
            ))
            .bind(entry.student_id)
            .bind(course.id)
            .bind(dto.date)
            .bind(entry.status)
            .bind(auth_user.user_id)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(record) => created.push(record),
                None => skipped.push(entry.student_id),
            }
        }

        if !created.is_empty() {
            ActivityService::log(
                &mut tx,
                Some(auth_user.user_id),
                ActivityType::Attendance,
                format!(
                    "Marked attendance for {} student(s) in {} on {}",
                    created.len(),
                    course.code,
                    dto.date
                ),
            )
            .await?;
        }

        tx.commit().await?;
        info!(created = created.len(), skipped = skipped.len(), "attendance marked");
        Ok(MarkAttendanceResponse { created, skipped })
    }

    #[instrument(skip(db))]
    pub async fn list_for_course(
        db: &PgPool,
        auth_user: &AuthUser,
        course_id: CourseId,
        filters: AttendanceFilterParams,
    ) -> Result<Vec<AttendanceWithStudent>, AppError> {
        let mut conn = db.acquire().await?;
        let course = CourseService::find(&mut conn, course_id).await?;
        CourseService::ensure_can_manage(auth_user, &course)?;

        let records = sqlx::query_as::<_, AttendanceWithStudent>(
            "SELECT a.id, a.student_id, a.course_id, a.date, a.status, a.marked_by, a.created_at,
                    u.name AS student_name
             FROM attendance a
             JOIN users u ON u.id = a.student_id
             WHERE a.course_id = $1 AND ($2::date IS NULL OR a.date = $2)
             ORDER BY a.date DESC, u.name",
        )
        .bind(course_id)
        .bind(filters.date)
        .fetch_all(&mut *conn)
        .await?;
        Ok(records)
    }

    #[instrument(skip(db))]
    pub async fn list_for_student(
        db: &PgPool,
        student_id: UserId,
    ) -> Result<MyAttendanceResponse, AppError> {
        let records = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance
             WHERE student_id = $1
             ORDER BY date DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await?;

        let summary = sqlx::query_as::<_, AttendanceSummary>(
            "SELECT c.id AS course_id, c.name AS course_name, c.code AS course_code,
                    COUNT(*) FILTER (WHERE a.status = 'Present') AS present,
                    COUNT(*) AS total,
                    ROUND(100.0 * COUNT(*) FILTER (WHERE a.status = 'Present') / COUNT(*), 2)::float8
                        AS percentage
             FROM attendance a
             JOIN courses c ON c.id = a.course_id
             WHERE a.student_id = $1
             GROUP BY c.id, c.name, c.code
             ORDER BY c.code",
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(MyAttendanceResponse { records, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_unenrolled_student_once() {
        let a = UserId::new();
        let b = UserId::new();
        let c = UserId::new();

        let missing = not_enrolled(&[a, b, c, b], &[a]);
        assert_eq!(missing, vec![b, c]);
    }

    #[test]
    fn everyone_enrolled() {
        let a = UserId::new();
        let b = UserId::new();
        assert!(not_enrolled(&[a, b], &[b, a]).is_empty());
    }
}
