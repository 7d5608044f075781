use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{NoticeId, UserId};
use crate::users::UserRole;

pub const DEFAULT_NOTICE_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notice_audience", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeAudience {
    #[default]
    All,
    Faculty,
    Student,
}

impl NoticeAudience {
    /// Admins see everything; others see `all` plus their own audience.
    pub fn is_visible_to(self, role: UserRole) -> bool {
        match (self, role) {
            (_, UserRole::Admin) | (NoticeAudience::All, _) => true,
            (NoticeAudience::Faculty, UserRole::Faculty) => true,
            (NoticeAudience::Student, UserRole::Student) => true,
            _ => false,
        }
    }
}

pub fn default_notice_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(DEFAULT_NOTICE_LIFETIME_DAYS)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notice {
    pub id: NoticeId,
    pub title: String,
    pub content: String,
    pub audience: NoticeAudience,
    pub created_by: Option<UserId>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct NoticeWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notice: Notice,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNoticeDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub audience: NoticeAudience,
    /// Defaults to seven days from now
    pub expires_at: Option<DateTime<Utc>>,
}
