use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use campusdesk_core::AppError;
use campusdesk_models::{CourseId, ExamId, ResultId, UserId};

use crate::middleware::auth::AuthUser;
use crate::modules::courses::CourseService;
use crate::modules::exams::service::RESULT_COLUMNS;
use crate::modules::results::model::{ExamResult, ResultWithStudent};

pub struct ResultService;

impl ResultService {
    #[instrument(skip(db))]
    pub async fn list_for_student(
        db: &PgPool,
        student_id: UserId,
    ) -> Result<Vec<ExamResult>, AppError> {
        let results = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results
             WHERE student_id = $1
             ORDER BY submitted_at DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await?;
        Ok(results)
    }

    /// All submissions for one exam, for the course instructor or an admin.
    #[instrument(skip(db))]
    pub async fn list_for_exam(
        db: &PgPool,
        auth_user: &AuthUser,
        exam_id: ExamId,
    ) -> Result<Vec<ResultWithStudent>, AppError> {
        let mut conn = db.acquire().await?;
        let course_id = Self::course_of_exam(&mut conn, exam_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))?;
        let course = CourseService::find(&mut conn, course_id).await?;
        CourseService::ensure_can_manage(auth_user, &course)?;

        let results = sqlx::query_as::<_, ResultWithStudent>(
            "SELECT r.id, r.student_id, r.exam_id, r.course_id, r.exam_title, r.score,
                    r.total_questions, r.answers, r.submitted_at,
                    u.name AS student_name, u.email AS student_email
             FROM results r
             JOIN users u ON u.id = r.student_id
             WHERE r.exam_id = $1
             ORDER BY r.score DESC, r.submitted_at",
        )
        .bind(exam_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(results)
    }

    /// The exam's course, falling back to its results once the exam row
    /// has been purged.
    async fn course_of_exam(
        conn: &mut PgConnection,
        exam_id: ExamId,
    ) -> Result<Option<CourseId>, AppError> {
        let course_id = sqlx::query_scalar::<_, Option<CourseId>>(
            "SELECT COALESCE(
                (SELECT course_id FROM exams WHERE id = $1),
                (SELECT course_id FROM results
                 WHERE exam_id = $1 AND course_id IS NOT NULL
                 LIMIT 1)
             )",
        )
        .bind(exam_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(course_id)
    }

    #[instrument(skip(db))]
    pub async fn get(
        db: &PgPool,
        auth_user: &AuthUser,
        id: ResultId,
    ) -> Result<ExamResult, AppError> {
        let mut conn = db.acquire().await?;
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM results WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Result not found")))?;

        if result.student_id == auth_user.user_id || auth_user.is_admin() {
            return Ok(result);
        }

        if let Some(course_id) = result.course_id {
            let course = CourseService::find(&mut conn, course_id).await?;
            if course.instructor_id == auth_user.user_id {
                return Ok(result);
            }
        }

        Err(AppError::forbidden(
            "Only the student, the course instructor or an admin can view this result",
        ))
    }
}
