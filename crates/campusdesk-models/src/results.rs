//! Graded exam submissions.
//!
//! A result snapshots the exam title and every answered question so it
//! stays readable after the exam itself has been purged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::ids::{CourseId, ExamId, QuestionId, ResultId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub question_text: String,
    pub selected_option: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamResult {
    pub id: ResultId,
    pub student_id: UserId,
    /// Kept after the exam row itself is purged
    pub exam_id: ExamId,
    pub course_id: Option<CourseId>,
    pub exam_title: String,
    pub score: i32,
    pub total_questions: i32,
    #[schema(value_type = Vec<AnswerRecord>)]
    pub answers: Json<Vec<AnswerRecord>>,
    pub submitted_at: DateTime<Utc>,
}

/// A result row joined with the submitting student, for instructors.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ResultWithStudent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub result: ExamResult,
    pub student_name: String,
    pub student_email: String,
}
