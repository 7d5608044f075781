use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use campusdesk_core::{AppError, PaginationMeta, PaginationParams};
use campusdesk_models::{CourseId, UserId, UserRole};

use crate::metrics;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::ensure_owner_or_admin;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::courses::model::{
    Course, CourseDetail, CourseFilterParams, CourseStatus, CreateCourseDto, EnrolledStudent,
    EnrollmentResponse, PaginatedCoursesResponse, UpdateCourseDto, is_valid_course_code,
};
use crate::modules::notifications::{NotificationService, Recipients};
use crate::utils::db_errors::{conflict_on_unique, is_foreign_key_violation};

pub const COURSE_COLUMNS: &str = "id, name, code, description, credits, department_id, \
     instructor_id, created_by, status, approve_request, approved_by_admin, created_at, updated_at";

const DETAIL_SELECT: &str = "SELECT c.id, c.name, c.code, c.description, c.credits, c.department_id,
            c.instructor_id, c.created_by, c.status, c.approve_request, c.approved_by_admin,
            c.created_at, c.updated_at,
            u.name AS instructor_name,
            (SELECT COUNT(*) FROM course_enrollments e WHERE e.course_id = c.id) AS enrolled_count
     FROM courses c
     JOIN users u ON u.id = c.instructor_id";

const DUPLICATE_CODE: &str = "Course code already exists";

fn invalid_code() -> AppError {
    AppError::bad_request(anyhow::anyhow!(
        "Course code must be 2-5 uppercase letters followed by 2-4 digits (e.g. CS101)"
    ))
}

fn course_write_error(e: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::bad_request(anyhow::anyhow!("Department does not exist"));
    }
    conflict_on_unique(e, DUPLICATE_CODE)
}

pub struct CourseService;

impl CourseService {
    /// Loads a bare course row; shared by the exam, attendance, schedule and
    /// document workflows.
    pub async fn find(conn: &mut PgConnection, id: CourseId) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    /// 403 unless `student_id` is enrolled in the course.
    pub async fn ensure_enrolled(
        conn: &mut PgConnection,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<(), AppError> {
        let enrolled = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM course_enrollments WHERE course_id = $1 AND student_id = $2
             )",
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_one(&mut *conn)
        .await?;

        if enrolled {
            Ok(())
        } else {
            Err(AppError::forbidden("You are not enrolled in this course"))
        }
    }

    /// Passes for the course's instructor or any admin.
    pub fn ensure_can_manage(auth_user: &AuthUser, course: &Course) -> Result<(), AppError> {
        ensure_owner_or_admin(auth_user, Some(course.instructor_id), "course instructor")
    }

    /// 404 for unknown ids, 400 for users that exist but are not faculty.
    pub async fn ensure_faculty(conn: &mut PgConnection, id: UserId) -> Result<(), AppError> {
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Instructor not found")))?;

        if role != UserRole::Faculty {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Instructor must be a faculty member"
            )));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(course.code = %dto.code, actor = %auth_user.user_id))]
    pub async fn create(
        db: &PgPool,
        auth_user: &AuthUser,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        if !is_valid_course_code(&dto.code) {
            return Err(invalid_code());
        }

        let mut tx = db.begin().await?;

        let by_admin = auth_user.is_admin();
        let instructor_id = if by_admin {
            let id = dto.instructor_id.ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!("Instructor is required"))
            })?;
            Self::ensure_faculty(&mut tx, id).await?;
            id
        } else {
            auth_user.user_id
        };

        let (status, approve_request, approved_by_admin) = if by_admin {
            (CourseStatus::Active, false, true)
        } else {
            (CourseStatus::Pending, true, false)
        };

        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses
                (name, code, description, credits, department_id, instructor_id, created_by,
                 status, approve_request, approved_by_admin)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(dto.name.trim())
        .bind(&dto.code)
        .bind(&dto.description)
        .bind(dto.credits)
        .bind(dto.department_id)
        .bind(instructor_id)
        .bind(auth_user.user_id)
        .bind(status)
        .bind(approve_request)
        .bind(approved_by_admin)
        .fetch_one(&mut *tx)
        .await
        .map_err(course_write_error)?;

        if !by_admin {
            NotificationService::notify(
                &mut tx,
                Some(auth_user.user_id),
                "Course approval requested",
                &format!(
                    "Course {} ({}) is waiting for approval",
                    course.name, course.code
                ),
                Recipients::role(UserRole::Admin),
            )
            .await?;
        }

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Course,
            format!("Created course {}", course.code),
        )
        .await?;

        tx.commit().await?;

        metrics::track_course_created(if by_admin { "active" } else { "pending" });
        info!(course.id = %course.id, course.status = ?course.status, "course created");
        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn list_approved(
        db: &PgPool,
        filters: CourseFilterParams,
        pagination: PaginationParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses
             WHERE approved_by_admin AND ($1::uuid IS NULL OR department_id = $1)",
        )
        .bind(filters.department_id)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, CourseDetail>(&format!(
            "{DETAIL_SELECT}
             WHERE c.approved_by_admin AND ($1::uuid IS NULL OR c.department_id = $1)
             ORDER BY c.code
             LIMIT $2 OFFSET $3"
        ))
        .bind(filters.department_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedCoursesResponse {
            data,
            meta: PaginationMeta::new(&pagination, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn list_pending(db: &PgPool) -> Result<Vec<CourseDetail>, AppError> {
        let courses = sqlx::query_as::<_, CourseDetail>(&format!(
            "{DETAIL_SELECT}
             WHERE c.status = 'pending' AND c.approve_request
             ORDER BY c.created_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(courses)
    }

    /// Unapproved courses are only visible to their instructor and admins.
    #[instrument(skip(db))]
    pub async fn get(
        db: &PgPool,
        auth_user: &AuthUser,
        id: CourseId,
    ) -> Result<CourseDetail, AppError> {
        let detail = sqlx::query_as::<_, CourseDetail>(&format!("{DETAIL_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .filter(|d| {
                d.course.approved_by_admin
                    || auth_user.is_admin()
                    || d.course.instructor_id == auth_user.user_id
            })
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;
        Ok(detail)
    }

    /// Taught courses for faculty, enrolled courses for students, everything for admins.
    #[instrument(skip(db))]
    pub async fn my_courses(
        db: &PgPool,
        auth_user: &AuthUser,
    ) -> Result<Vec<CourseDetail>, AppError> {
        let query = match auth_user.role {
            UserRole::Admin => format!("{DETAIL_SELECT} WHERE $1::uuid IS NOT NULL ORDER BY c.code"),
            UserRole::Faculty => format!("{DETAIL_SELECT} WHERE c.instructor_id = $1 ORDER BY c.code"),
            UserRole::Student => format!(
                "{DETAIL_SELECT}
                 JOIN course_enrollments ce ON ce.course_id = c.id AND ce.student_id = $1
                 ORDER BY c.code"
            ),
        };

        let courses = sqlx::query_as::<_, CourseDetail>(&query)
            .bind(auth_user.user_id)
            .fetch_all(db)
            .await?;
        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn approve(db: &PgPool, admin_id: UserId, id: CourseId) -> Result<Course, AppError> {
        Self::decide(db, admin_id, id, true).await
    }

    #[instrument(skip(db))]
    pub async fn reject(db: &PgPool, admin_id: UserId, id: CourseId) -> Result<Course, AppError> {
        Self::decide(db, admin_id, id, false).await
    }

    async fn decide(
        db: &PgPool,
        admin_id: UserId,
        id: CourseId,
        approve: bool,
    ) -> Result<Course, AppError> {
        let mut tx = db.begin().await?;

        let pending = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;

        if !pending.is_awaiting_approval() {
            warn!(course.id = %id, status = ?pending.status, "course is not awaiting approval");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Course is not awaiting approval"
            )));
        }

        let update = if approve {
            "UPDATE courses
             SET status = 'active', approved_by_admin = TRUE, approve_request = FALSE, updated_at = NOW()
             WHERE id = $1"
        } else {
            "UPDATE courses
             SET status = 'rejected', approve_request = FALSE, updated_at = NOW()
             WHERE id = $1"
        };

        let course = sqlx::query_as::<_, Course>(&format!("{update} RETURNING {COURSE_COLUMNS}"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let verdict = if approve { "approved" } else { "rejected" };
        NotificationService::notify(
            &mut tx,
            Some(admin_id),
            &format!("Course {}", verdict),
            &format!("Your course {} ({}) was {}", course.name, course.code, verdict),
            Recipients::user(course.instructor_id),
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Course,
            format!("{} course {}", if approve { "Approved" } else { "Rejected" }, course.code),
        )
        .await?;

        tx.commit().await?;
        info!(course.id = %course.id, verdict, "course decision recorded");
        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn enroll(
        db: &PgPool,
        student_id: UserId,
        id: CourseId,
    ) -> Result<EnrollmentResponse, AppError> {
        let mut tx = db.begin().await?;

        let course = Self::find(&mut tx, id).await?;
        if !course.approved_by_admin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Course is not open for enrollment"
            )));
        }

        let inserted = sqlx::query(
            "INSERT INTO course_enrollments (course_id, student_id) VALUES ($1, $2)
             ON CONFLICT (course_id, student_id) DO NOTHING",
        )
        .bind(id)
        .bind(student_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Student is already enrolled in this course"
            )));
        }

        ActivityService::log(
            &mut tx,
            Some(student_id),
            ActivityType::Course,
            format!("Enrolled in {}", course.code),
        )
        .await?;

        tx.commit().await?;

        Ok(EnrollmentResponse {
            message: format!("Enrolled in {}", course.code),
            course_id: id,
            student_id,
        })
    }

    #[instrument(skip(db))]
    pub async fn unenroll(db: &PgPool, student_id: UserId, id: CourseId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;
        let course = Self::find(&mut tx, id).await?;

        let removed =
            sqlx::query("DELETE FROM course_enrollments WHERE course_id = $1 AND student_id = $2")
                .bind(id)
                .bind(student_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        if removed == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Not enrolled in this course"
            )));
        }

        ActivityService::log(
            &mut tx,
            Some(student_id),
            ActivityType::Course,
            format!("Dropped {}", course.code),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(db, dto))]
    pub async fn update(
        db: &PgPool,
        auth_user: &AuthUser,
        id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        if let Some(code) = &dto.code
            && !is_valid_course_code(code)
        {
            return Err(invalid_code());
        }

        let mut tx = db.begin().await?;

        let course = Self::find(&mut tx, id).await?;
        Self::ensure_can_manage(auth_user, &course)?;

        if let Some(instructor_id) = dto.instructor_id
            && instructor_id != course.instructor_id
        {
            if !auth_user.is_admin() {
                return Err(AppError::forbidden("Only an admin can reassign the instructor"));
            }
            Self::ensure_faculty(&mut tx, instructor_id).await?;
        }

        let updated = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                description = COALESCE($4, description),
                credits = COALESCE($5, credits),
                department_id = COALESCE($6, department_id),
                instructor_id = COALESCE($7, instructor_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.code)
        .bind(&dto.description)
        .bind(dto.credits)
        .bind(dto.department_id)
        .bind(dto.instructor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(course_write_error)?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Course,
            format!("Updated course {}", updated.code),
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, auth_user: &AuthUser, id: CourseId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let course = Self::find(&mut tx, id).await?;
        Self::ensure_can_manage(auth_user, &course)?;

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        ActivityService::log(
            &mut tx,
            Some(auth_user.user_id),
            ActivityType::Course,
            format!("Deleted course {}", course.code),
        )
        .await?;

        tx.commit().await?;
        info!(course.id = %id, "course deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn enrolled_students(
        db: &PgPool,
        auth_user: &AuthUser,
        id: CourseId,
    ) -> Result<Vec<EnrolledStudent>, AppError> {
        let mut conn = db.acquire().await?;
        let course = Self::find(&mut conn, id).await?;
        Self::ensure_can_manage(auth_user, &course)?;

        let students = sqlx::query_as::<_, EnrolledStudent>(
            "SELECT u.id, u.name, u.email, u.department_id, u.year, u.semester, e.enrolled_at
             FROM course_enrollments e
             JOIN users u ON u.id = e.student_id
             WHERE e.course_id = $1
             ORDER BY u.name",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(students)
    }
}
