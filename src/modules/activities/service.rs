use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use campusdesk_core::{AppError, PaginationMeta, PaginationParams};
use campusdesk_models::UserId;

use crate::modules::activities::model::{
    ActivityFilterParams, ActivityType, ActivityWithActor, PaginatedActivitiesResponse,
};

const ACTIVITY_SELECT: &str = "SELECT a.id, a.actor_id, a.action, a.activity_type, a.created_at,
            u.name AS actor_name, u.role AS actor_role
     FROM activities a
     LEFT JOIN users u ON u.id = a.actor_id";

pub struct ActivityService;

impl ActivityService {
    /// Appends one entry on the caller's connection, usually the workflow's transaction.
    #[instrument(skip(conn, action))]
    pub async fn log(
        conn: &mut PgConnection,
        actor_id: Option<UserId>,
        activity_type: ActivityType,
        action: impl Into<String>,
    ) -> Result<(), AppError> {
        let action = action.into();
        sqlx::query("INSERT INTO activities (actor_id, action, activity_type) VALUES ($1, $2, $3)")
            .bind(actor_id)
            .bind(&action)
            .bind(activity_type)
            .execute(&mut *conn)
            .await?;

        debug!(?activity_type, %action, "activity logged");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        filters: ActivityFilterParams,
        pagination: PaginationParams,
    ) -> Result<PaginatedActivitiesResponse, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activities WHERE ($1::activity_type IS NULL OR activity_type = $1)",
        )
        .bind(filters.activity_type)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, ActivityWithActor>(&format!(
            "{ACTIVITY_SELECT}
             WHERE ($1::activity_type IS NULL OR a.activity_type = $1)
             ORDER BY a.created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(filters.activity_type)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedActivitiesResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn list_for_actor(
        db: &PgPool,
        actor_id: UserId,
        pagination: PaginationParams,
    ) -> Result<PaginatedActivitiesResponse, AppError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activities WHERE actor_id = $1")
                .bind(actor_id)
                .fetch_one(db)
                .await?;

        let data = sqlx::query_as::<_, ActivityWithActor>(&format!(
            "{ACTIVITY_SELECT}
             WHERE a.actor_id = $1
             ORDER BY a.created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(actor_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedActivitiesResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }
}
