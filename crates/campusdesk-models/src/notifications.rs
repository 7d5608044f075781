//! In-app notifications.
//!
//! One row fans out to many receivers; read state is tracked per receiver in
//! `read_by` instead of one row per recipient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::{NotificationId, UserId};
use crate::users::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: NotificationId,
    /// Null for system-generated notifications
    pub sender_id: Option<UserId>,
    pub title: String,
    pub message: String,
    pub receiver_ids: Vec<UserId>,
    pub read_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

/// A notification from one receiver's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationView {
    pub id: NotificationId,
    pub sender_id: Option<UserId>,
    pub sender_name: Option<String>,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SentNotification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub recipient_count: i32,
    pub read_count: i32,
    pub created_at: DateTime<Utc>,
}

fn validate_has_target(dto: &SendNotificationDto) -> Result<(), ValidationError> {
    if dto.receiver_ids.is_empty() && dto.roles.is_empty() {
        let mut err = ValidationError::new("receivers");
        err.message = Some("Provide receiver_ids, roles, or both".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_has_target"))]
pub struct SendNotificationDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(default)]
    pub receiver_ids: Vec<UserId>,
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkedReadResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationCreatedResponse {
    pub id: NotificationId,
}
