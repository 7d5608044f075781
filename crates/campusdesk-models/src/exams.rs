//! Exams and their multiple-choice questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, ExamId, QuestionId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Exam {
    pub id: ExamId,
    pub course_id: CourseId,
    pub title: String,
    pub created_by: Option<UserId>,
    /// Submissions are refused from this instant on
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExamQuestion {
    pub id: QuestionId,
    pub exam_id: ExamId,
    pub position: i32,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// A question as sent to clients. Students never receive `correct_answer`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionView {
    pub id: QuestionId,
    pub position: i32,
    pub question_text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl QuestionView {
    pub fn from_question(q: ExamQuestion, reveal_answer: bool) -> Self {
        Self {
            id: q.id,
            position: q.position,
            question_text: q.question_text,
            options: q.options,
            correct_answer: reveal_answer.then_some(q.correct_answer),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamDetail {
    #[serde(flatten)]
    pub exam: Exam,
    pub is_open: bool,
    pub total_questions: usize,
    pub questions: Vec<QuestionView>,
}

fn validate_question(q: &CreateQuestionDto) -> Result<(), ValidationError> {
    if q.options.iter().any(|o| o.trim().is_empty()) {
        let mut err = ValidationError::new("empty_option");
        err.message = Some("Options must not be blank".into());
        return Err(err);
    }
    if !q.options.contains(&q.correct_answer) {
        let mut err = ValidationError::new("correct_answer");
        err.message = Some("Correct answer must be one of the options".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_question"))]
pub struct CreateQuestionDto {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub question_text: String,
    #[validate(length(min = 2, message = "At least two options are required"))]
    pub options: Vec<String>,
    #[validate(length(min = 1))]
    pub correct_answer: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExamDto {
    pub course_id: CourseId,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Must be in the future
    pub expires_at: DateTime<Utc>,
    #[validate(length(min = 1, message = "An exam needs at least one question"), nested)]
    pub questions: Vec<CreateQuestionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_option: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitExamDto {
    #[validate(length(min = 1, message = "At least one answer is required"))]
    pub answers: Vec<SubmittedAnswer>,
}
