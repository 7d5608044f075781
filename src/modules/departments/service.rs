use sqlx::PgPool;
use tracing::{info, instrument};

use campusdesk_core::AppError;
use campusdesk_models::{DepartmentId, UserId};

use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, UpdateDepartmentDto,
};
use crate::utils::db_errors::conflict_on_unique;

const DUPLICATE: &str = "A department with this name or code already exists";

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db, dto), fields(department.code = %dto.code))]
    pub async fn create(
        db: &PgPool,
        actor_id: UserId,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let mut tx = db.begin().await?;

        let department = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name, code, description)
             VALUES ($1, $2, $3)
             RETURNING id, name, code, description, created_at, updated_at",
        )
        .bind(dto.name.trim())
        .bind(dto.code.trim().to_uppercase())
        .bind(&dto.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE))?;

        ActivityService::log(
            &mut tx,
            Some(actor_id),
            ActivityType::Department,
            format!("Created department {}", department.code),
        )
        .await?;

        tx.commit().await?;
        info!(department.id = %department.id, "department created");
        Ok(department)
    }

    #[instrument(skip(db))]
    pub async fn list(db: &PgPool) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, name, code, description, created_at, updated_at
             FROM departments ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(departments)
    }

    #[instrument(skip(db))]
    pub async fn get(db: &PgPool, id: DepartmentId) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            "SELECT id, name, code, description, created_at, updated_at
             FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        id: DepartmentId,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            "UPDATE departments SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, code, description, created_at, updated_at",
        )
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.code.as_deref().map(|c| c.trim().to_uppercase()))
        .bind(&dto.description)
        .fetch_optional(db)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    /// Users and courses keep existing with their department cleared.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, actor_id: UserId, id: DepartmentId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let code = sqlx::query_scalar::<_, String>(
            "DELETE FROM departments WHERE id = $1 RETURNING code",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))?;

        ActivityService::log(
            &mut tx,
            Some(actor_id),
            ActivityType::Department,
            format!("Deleted department {}", code),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
