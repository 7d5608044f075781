use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use campusdesk_core::AppError;
use campusdesk_models::results::{AnswerRecord, ExamResult};
use campusdesk_models::{CourseId, ExamId, QuestionId, UserId, UserRole};

use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::courses::CourseService;
use crate::modules::exams::model::{
    CreateExamDto, Exam, ExamDetail, ExamQuestion, QuestionView, SubmitExamDto, SubmittedAnswer,
};
use crate::modules::notifications::{NotificationService, Recipients};
use crate::utils::db_errors::conflict_on_unique;

const EXAM_COLUMNS: &str = "id, course_id, title, created_by, expires_at, created_at, updated_at";

pub const RESULT_COLUMNS: &str = "id, student_id, exam_id, course_id, exam_title, score, \
     total_questions, answers, submitted_at";

/// Scores a submission against the stored questions.
///
/// Returns the number of correct answers and one record per submitted answer,
/// in submission order. Unknown or repeated question ids are rejected.
pub fn grade(
    questions: &[ExamQuestion],
    answers: &[SubmittedAnswer],
) -> Result<(i32, Vec<AnswerRecord>), AppError> {
    let by_id: HashMap<QuestionId, &ExamQuestion> = questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::with_capacity(answers.len());
    let mut score = 0;
    let mut records = Vec::with_capacity(answers.len());

    for answer in answers {
        let question = by_id.get(&answer.question_id).ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!(
                "Question {} does not belong to this exam",
                answer.question_id
            ))
        })?;

        if !seen.insert(answer.question_id) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Question {} answered more than once",
                answer.question_id
            )));
        }

        let is_correct = answer.selected_option == question.correct_answer;
        if is_correct {
            score += 1;
        }

        records.push(AnswerRecord {
            question_id: question.id,
            question_text: question.question_text.clone(),
            selected_option: answer.selected_option.clone(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
        });
    }

    Ok((score, records))
}

pub struct ExamService;

impl ExamService {
    pub async fn find(conn: &mut PgConnection, id: ExamId) -> Result<Exam, AppError> {
        sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))
    }

    async fn questions(
        conn: &mut PgConnection,
        exam_id: ExamId,
    ) -> Result<Vec<ExamQuestion>, AppError> {
        let questions = sqlx::query_as::<_, ExamQuestion>(
            "SELECT id, exam_id, position, question_text, options, correct_answer
             FROM exam_questions WHERE exam_id = $1 ORDER BY position",
        )
        .bind(exam_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(questions)
    }

    fn detail(exam: Exam, questions: Vec<ExamQuestion>, reveal_answers: bool) -> ExamDetail {
        let questions: Vec<QuestionView> = questions
            .into_iter()
            .map(|q| QuestionView::from_question(q, reveal_answers))
            .collect();
        ExamDetail {
            is_open: exam.is_open_at(Utc::now()),
            total_questions: questions.len(),
            questions,
            exam,
        }
    }

    /// Only the course's own instructor may set an exam.
    #[instrument(skip(db, dto), fields(course.id = %dto.course_id, actor = %auth_user.user_id))]
    pub async fn create(
        db: &PgPool,
        auth_user: &AuthUser,
        dto: CreateExamDto,
    ) -> Result<ExamDetail, AppError> {
        if dto.expires_at <= Utc::now() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Expiry time must be in the future"
            )));
        }

        let mut tx = db.begin().await?;

        let course = CourseService::find(&mut tx, dto.course_id).await?;
        if course.instructor_id != auth_user.user_id {
            return Err(AppError::forbidden(
                "Only the course instructor can create exams for this course",
            ));
        }

        let exam = sqlx::query_as::<_, Exam>(&format!(
            "INSERT INTO exams (course_id, title, created_by, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(dto.course_id)
        .bind(dto.title.trim())
        .bind(auth_user.user_id)
        .bind(dto.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(dto.questions.len());
        for (index, q) in dto.questions.iter().enumerate() {
            let question = sqlx::query_as::<_, ExamQuestion>(
                "INSERT INTO exam_questions (exam_id, position, question_text, options, correct_answer)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, exam_id, position, question_text, options, correct_answer",
            )
            .bind(exam.id)
            .bind(index as i32 + 1)
            .bind(q.question_text.trim())
            .bind(&q.options)
            .bind(&q.correct_answer)
            .fetch_one(&mut *tx)
            .await?;
            questions.push(question);
        }

        let enrolled = sqlx::query_scalar::<_, UserId>(
            "SELECT student_id FROM course_enrollments WHERE course_id = $1",
        )
        .bind(course.id)
        .fetch_all(&mut *tx)
        .await?;

        NotificationService::notify(
            &mut tx,
            Some(auth_user.user_id),
            "New exam",
            &format!(
                "{} has been published for {} and closes at {}",
                exam.title,
                course.code,
                exam.expires_at.format("%Y-%m-%d %H:%M UTC")
            ),
            Recipients {
                user_ids: enrolled,
                roles: Vec::new(),
            },
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Exam,
            format!("Created exam '{}' for {}", exam.title, course.code),
        )
        .await?;

        tx.commit().await?;
        info!(exam.id = %exam.id, questions = questions.len(), "exam created");
        Ok(Self::detail(exam, questions, true))
    }

    /// Instructors and admins see every exam with answers. Students must be
    /// enrolled and only see open exams, redacted.
    #[instrument(skip(db))]
    pub async fn list_for_course(
        db: &PgPool,
        auth_user: &AuthUser,
        course_id: CourseId,
    ) -> Result<Vec<ExamDetail>, AppError> {
        let mut conn = db.acquire().await?;
        let course = CourseService::find(&mut conn, course_id).await?;
        let can_manage = CourseService::ensure_can_manage(auth_user, &course).is_ok();
        if auth_user.role == UserRole::Student {
            CourseService::ensure_enrolled(&mut conn, course_id, auth_user.user_id).await?;
        }

        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams
             WHERE course_id = $1 AND ($2 OR expires_at > NOW())
             ORDER BY expires_at"
        ))
        .bind(course_id)
        .bind(can_manage)
        .fetch_all(&mut *conn)
        .await?;

        let mut details = Vec::with_capacity(exams.len());
        for exam in exams {
            let questions = Self::questions(&mut conn, exam.id).await?;
            details.push(Self::detail(exam, questions, can_manage));
        }
        Ok(details)
    }

    #[instrument(skip(db))]
    pub async fn get(
        db: &PgPool,
        auth_user: &AuthUser,
        id: ExamId,
    ) -> Result<ExamDetail, AppError> {
        let mut conn = db.acquire().await?;
        let exam = Self::find(&mut conn, id).await?;
        let course = CourseService::find(&mut conn, exam.course_id).await?;
        let can_manage = CourseService::ensure_can_manage(auth_user, &course).is_ok();
        if auth_user.role == UserRole::Student {
            CourseService::ensure_enrolled(&mut conn, exam.course_id, auth_user.user_id).await?;
        }

        if !can_manage && !exam.is_open_at(Utc::now()) {
            return Err(AppError::not_found(anyhow::anyhow!("Exam not found")));
        }

        let questions = Self::questions(&mut conn, id).await?;
        Ok(Self::detail(exam, questions, can_manage))
    }

    #[instrument(skip(db, dto), fields(student = %student_id))]
    pub async fn submit(
        db: &PgPool,
        student_id: UserId,
        id: ExamId,
        dto: SubmitExamDto,
    ) -> Result<ExamResult, AppError> {
        let mut tx = db.begin().await?;

        let exam = Self::find(&mut tx, id).await?;
        if !exam.is_open_at(Utc::now()) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Exam has expired and no longer accepts submissions"
            )));
        }
        CourseService::ensure_enrolled(&mut tx, exam.course_id, student_id).await?;

        let questions = Self::questions(&mut tx, id).await?;
        let (score, answers) = grade(&questions, &dto.answers)?;
        let total_questions = questions.len() as i32;

        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "INSERT INTO results
                (student_id, exam_id, course_id, exam_title, score, total_questions, answers)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {RESULT_COLUMNS}"
        ))
        .bind(student_id)
        .bind(exam.id)
        .bind(exam.course_id)
        .bind(&exam.title)
        .bind(score)
        .bind(total_questions)
        .bind(Json(&answers))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            warn!(exam.id = %id, "duplicate or failed submission");
            conflict_on_unique(e, "Exam already submitted")
        })?;

        ActivityService::log(
            &mut tx,
            Some(student_id),
            ActivityType::Exam,
            format!("Submitted exam '{}' ({}/{})", exam.title, score, total_questions),
        )
        .await?;

        tx.commit().await?;

        metrics::track_exam_submitted(score, total_questions);
        info!(result.id = %result.id, score, total_questions, "exam submitted");
        Ok(result)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, auth_user: &AuthUser, id: ExamId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let exam = Self::find(&mut tx, id).await?;
        let course = CourseService::find(&mut tx, exam.course_id).await?;
        CourseService::ensure_can_manage(auth_user, &course)?;

        sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Exam,
            format!("Deleted exam '{}'", exam.title),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
