use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::ids::{ActivityId, UserId};
use crate::users::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Auth,
    User,
    Course,
    Exam,
    Attendance,
    Leave,
    Fee,
    Notice,
    Document,
    Schedule,
    Department,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Activity {
    pub id: ActivityId,
    pub actor_id: Option<UserId>,
    pub action: String,
    pub activity_type: ActivityType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ActivityWithActor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub activity: Activity,
    pub actor_name: Option<String>,
    pub actor_role: Option<UserRole>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityFilterParams {
    pub activity_type: Option<ActivityType>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedActivitiesResponse {
    pub data: Vec<ActivityWithActor>,
    pub meta: campusdesk_core::PaginationMeta,
}
