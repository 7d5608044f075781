use axum::http::StatusCode;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{info, instrument, warn};

use campusdesk_core::AppError;
use campusdesk_models::{DepartmentId, FeeStructureId, UserId, UserRole};

use crate::metrics;
use crate::modules::activities::{ActivityService, ActivityType};
use crate::modules::fees::model::{
    ConfirmPaymentDto, CreateFeeStructureDto, FeePayment, FeePaymentWithStudent, FeeStructure,
    FeeStructureFilterParams, MyFeeResponse, OfflinePaymentDto, PaymentFilterParams, PaymentMode,
    PaymentIntentResponse, PaymentStatus, UpdateFeeStructureDto,
};
use crate::modules::notifications::{NotificationService, Recipients};
use crate::utils::db_errors::{conflict_on_unique, is_foreign_key_violation};
use crate::utils::payment::{GatewayError, PaymentGateway, PaymentIntentRequest};

const STRUCTURE_COLUMNS: &str =
    "id, department_id, year, semester, amount, description, due_date, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, student_id, fee_structure_id, amount_paid, mode, status, \
     payment_intent_id, paid_at, created_at, updated_at";

/// Outstanding balance for a structure. Overpayment yields a negative value.
pub fn balance(amount: i64, settled: Option<i64>) -> (i64, bool) {
    let remaining = amount - settled.unwrap_or(0);
    (remaining, remaining < 0)
}

/// Gateway amounts are in minor units.
pub fn to_minor_units(amount: i64) -> Result<i64, AppError> {
    amount.checked_mul(100).ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!("Fee amount is too large to charge online"))
    })
}

fn already_paid() -> AppError {
    AppError::conflict(anyhow::anyhow!("Fees for this term are already paid"))
}

#[derive(Debug, FromRow)]
struct Payer {
    id: UserId,
    name: String,
    email: String,
    phone: Option<String>,
    role: UserRole,
    department_id: Option<DepartmentId>,
    department_code: Option<String>,
    year: Option<i32>,
    semester: Option<i32>,
}

pub struct FeeService;

impl FeeService {
    #[instrument(skip(db, dto))]
    pub async fn create_structure(
        db: &PgPool,
        admin_id: UserId,
        dto: CreateFeeStructureDto,
    ) -> Result<FeeStructure, AppError> {
        let mut tx = db.begin().await?;

        let structure = sqlx::query_as::<_, FeeStructure>(&format!(
            "INSERT INTO fee_structures (department_id, year, semester, amount, description, due_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STRUCTURE_COLUMNS}"
        ))
        .bind(dto.department_id)
        .bind(dto.year)
        .bind(dto.semester)
        .bind(dto.amount)
        .bind(&dto.description)
        .bind(dto.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::bad_request(anyhow::anyhow!("Department does not exist"));
            }
            conflict_on_unique(
                e,
                "A fee structure already exists for this department, year and semester",
            )
        })?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Fee,
            format!(
                "Created fee structure of {} for year {} semester {}",
                structure.amount, structure.year, structure.semester
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(structure)
    }

    #[instrument(skip(db))]
    pub async fn list_structures(
        db: &PgPool,
        filters: FeeStructureFilterParams,
    ) -> Result<Vec<FeeStructure>, AppError> {
        let structures = sqlx::query_as::<_, FeeStructure>(&format!(
            "SELECT {STRUCTURE_COLUMNS} FROM fee_structures
             WHERE ($1::uuid IS NULL OR department_id = $1)
               AND ($2::int IS NULL OR year = $2)
               AND ($3::int IS NULL OR semester = $3)
             ORDER BY year, semester"
        ))
        .bind(filters.department_id)
        .bind(filters.year)
        .bind(filters.semester)
        .fetch_all(db)
        .await?;
        Ok(structures)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_structure(
        db: &PgPool,
        id: FeeStructureId,
        dto: UpdateFeeStructureDto,
    ) -> Result<FeeStructure, AppError> {
        sqlx::query_as::<_, FeeStructure>(&format!(
            "UPDATE fee_structures
             SET amount = COALESCE($2, amount),
                 description = COALESCE($3, description),
                 due_date = COALESCE($4, due_date),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {STRUCTURE_COLUMNS}"
        ))
        .bind(id)
        .bind(dto.amount)
        .bind(&dto.description)
        .bind(dto.due_date)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Fee structure not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_structure(
        db: &PgPool,
        admin_id: UserId,
        id: FeeStructureId,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query("DELETE FROM fee_structures WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Fee structure not found")));
        }

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Fee,
            format!("Deleted fee structure {id}"),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn payer(conn: &mut PgConnection, user_id: UserId) -> Result<Payer, AppError> {
        sqlx::query_as::<_, Payer>(
            "SELECT u.id, u.name, u.email, u.phone, u.role, u.department_id,
                    d.code AS department_code, u.year, u.semester
             FROM users u
             LEFT JOIN departments d ON d.id = u.department_id
             WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    /// The structure matching the student's department, year and semester.
    async fn structure_for(
        conn: &mut PgConnection,
        payer: &Payer,
    ) -> Result<FeeStructure, AppError> {
        let not_found = || {
            AppError::not_found(anyhow::anyhow!(
                "No fee structure found for your department, year and semester"
            ))
        };

        let (Some(department_id), Some(year), Some(semester)) =
            (payer.department_id, payer.year, payer.semester)
        else {
            return Err(not_found());
        };

        sqlx::query_as::<_, FeeStructure>(&format!(
            "SELECT {STRUCTURE_COLUMNS} FROM fee_structures
             WHERE department_id = $1 AND year = $2 AND semester = $3"
        ))
        .bind(department_id)
        .bind(year)
        .bind(semester)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(not_found)
    }

    async fn paid_record(
        conn: &mut PgConnection,
        student_id: UserId,
        structure_id: FeeStructureId,
    ) -> Result<Option<FeePayment>, AppError> {
        let payment = sqlx::query_as::<_, FeePayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM fee_payments
             WHERE student_id = $1 AND fee_structure_id = $2 AND status = 'Paid'"
        ))
        .bind(student_id)
        .bind(structure_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(payment)
    }

    #[instrument(skip(db))]
    pub async fn my_fee(db: &PgPool, student_id: UserId) -> Result<MyFeeResponse, AppError> {
        let mut conn = db.acquire().await?;
        let payer = Self::payer(&mut conn, student_id).await?;
        let structure = Self::structure_for(&mut conn, &payer).await?;

        let paid = Self::paid_record(&mut conn, student_id, structure.id).await?;
        let latest = match paid {
            Some(p) => Some(p),
            None => sqlx::query_as::<_, FeePayment>(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM fee_payments
                 WHERE student_id = $1 AND fee_structure_id = $2
                 ORDER BY created_at DESC
                 LIMIT 1"
            ))
            .bind(student_id)
            .bind(structure.id)
            .fetch_optional(&mut *conn)
            .await?,
        };

        let settled = latest
            .as_ref()
            .filter(|p| p.status == PaymentStatus::Paid)
            .map(|p| p.amount_paid);
        let (remaining, is_overpaid) = balance(structure.amount, settled);

        Ok(MyFeeResponse {
            status: if settled.is_some() {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            amount_paid: settled.unwrap_or(0),
            remaining,
            is_overpaid,
            payment: latest,
            structure,
        })
    }

    /// Opens a payment intent for the full term fee and records it as pending.
    #[instrument(skip(db, gateway))]
    pub async fn create_payment_intent(
        db: &PgPool,
        gateway: &dyn PaymentGateway,
        currency: &str,
        student_id: UserId,
    ) -> Result<PaymentIntentResponse, AppError> {
        let mut conn = db.acquire().await?;
        let payer = Self::payer(&mut conn, student_id).await?;
        let structure = Self::structure_for(&mut conn, &payer).await?;

        if Self::paid_record(&mut conn, student_id, structure.id)
            .await?
            .is_some()
        {
            return Err(already_paid());
        }

        let request = PaymentIntentRequest {
            amount: to_minor_units(structure.amount)?,
            currency: currency.to_lowercase(),
            receipt_email: Some(payer.email.clone()),
            description: Some(format!(
                "Tuition fee year {} semester {}",
                structure.year, structure.semester
            )),
            metadata: vec![
                ("student_id".into(), payer.id.to_string()),
                (
                    "department".into(),
                    payer.department_code.clone().unwrap_or_default(),
                ),
                ("year".into(), structure.year.to_string()),
                ("semester".into(), structure.semester.to_string()),
                ("name".into(), payer.name.clone()),
                ("email".into(), payer.email.clone()),
                ("phone".into(), payer.phone.clone().unwrap_or_default()),
            ],
        };

        let intent = gateway
            .create_payment_intent(&request)
            .await
            .map_err(GatewayError::into_app_error)?;

        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_GATEWAY,
                anyhow::anyhow!("Payment gateway returned no client secret"),
            )
        })?;

        let payment = sqlx::query_as::<_, FeePayment>(&format!(
            "INSERT INTO fee_payments
                (student_id, fee_structure_id, amount_paid, mode, status, payment_intent_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(student_id)
        .bind(structure.id)
        .bind(structure.amount)
        .bind(PaymentMode::Online)
        .bind(PaymentStatus::Pending)
        .bind(&intent.id)
        .fetch_one(&mut *conn)
        .await?;

        metrics::track_payment("online", "Pending");
        info!(payment.id = %payment.id, intent_id = %intent.id, "payment intent created");

        Ok(PaymentIntentResponse {
            client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
            payment,
        })
    }

    /// Settles a pending online payment once the gateway reports success.
    /// Confirming an already settled payment returns it unchanged.
    #[instrument(skip(db, gateway, dto))]
    pub async fn confirm(
        db: &PgPool,
        gateway: &dyn PaymentGateway,
        student_id: UserId,
        dto: ConfirmPaymentDto,
    ) -> Result<FeePayment, AppError> {
        let payment = sqlx::query_as::<_, FeePayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM fee_payments
             WHERE payment_intent_id = $1 AND student_id = $2"
        ))
        .bind(&dto.payment_intent_id)
        .bind(student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Payment not found")))?;

        if payment.status == PaymentStatus::Paid {
            return Ok(payment);
        }

        let intent = gateway
            .retrieve_payment_intent(&dto.payment_intent_id)
            .await
            .map_err(GatewayError::into_app_error)?;

        if !intent.is_succeeded() {
            warn!(intent_id = %intent.id, status = %intent.status, "payment not yet settled");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Payment has not succeeded (status: {})",
                intent.status
            )));
        }

        let mut tx = db.begin().await?;

        let updated = sqlx::query_as::<_, FeePayment>(&format!(
            "UPDATE fee_payments
             SET status = 'Paid', paid_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND status = 'Pending'
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Fees for this term are already paid"))?;

        let Some(updated) = updated else {
            // settled by a concurrent confirmation
            let current = sqlx::query_as::<_, FeePayment>(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM fee_payments WHERE id = $1"
            ))
            .bind(payment.id)
            .fetch_one(&mut *tx)
            .await?;
            return Ok(current);
        };

        NotificationService::notify(
            &mut tx,
            None,
            "Payment received",
            &format!("We received your fee payment of {}", updated.amount_paid),
            Recipients::user(student_id),
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(student_id),
            ActivityType::Fee,
            format!("Paid fees online ({})", updated.amount_paid),
        )
        .await?;

        tx.commit().await?;

        metrics::track_payment("online", "Paid");
        info!(payment.id = %updated.id, "online payment settled");
        Ok(updated)
    }

    /// Records a cash or bank-transfer payment taken at the office.
    #[instrument(skip(db, dto), fields(student = %dto.student_id))]
    pub async fn record_offline(
        db: &PgPool,
        admin_id: UserId,
        dto: OfflinePaymentDto,
    ) -> Result<FeePayment, AppError> {
        let mode = match dto.mode {
            PaymentMode::Online => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Offline payments must be cash or bank_transfer"
                )));
            }
            PaymentMode::Cash => "cash",
            PaymentMode::BankTransfer => "bank_transfer",
        };

        let mut tx = db.begin().await?;

        let payer = Self::payer(&mut tx, dto.student_id).await?;
        if payer.role != UserRole::Student {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Fees can only be recorded for students"
            )));
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM fee_structures WHERE id = $1)",
        )
        .bind(dto.fee_structure_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Fee structure not found")));
        }

        if Self::paid_record(&mut tx, dto.student_id, dto.fee_structure_id)
            .await?
            .is_some()
        {
            return Err(already_paid());
        }

        let payment = sqlx::query_as::<_, FeePayment>(&format!(
            "INSERT INTO fee_payments
                (student_id, fee_structure_id, amount_paid, mode, status, paid_at)
             VALUES ($1, $2, $3, $4, 'Paid', NOW())
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(dto.student_id)
        .bind(dto.fee_structure_id)
        .bind(dto.amount_paid)
        .bind(dto.mode)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Fees for this term are already paid"))?;

        NotificationService::notify(
            &mut tx,
            Some(admin_id),
            "Payment recorded",
            &format!(
                "A {} payment of {} was recorded against your fees",
                mode.replace('_', " "),
                payment.amount_paid
            ),
            Recipients::user(dto.student_id),
        )
        .await?;

        ActivityService::log(
            &mut tx,
            Some(admin_id),
            ActivityType::Fee,
            format!(
                "Recorded {} payment of {} for {}",
                mode, payment.amount_paid, payer.email
            ),
        )
        .await?;

        tx.commit().await?;

        metrics::track_payment(mode, "Paid");
        Ok(payment)
    }

    #[instrument(skip(db))]
    pub async fn list_payments(
        db: &PgPool,
        filters: PaymentFilterParams,
    ) -> Result<Vec<FeePaymentWithStudent>, AppError> {
        let payments = sqlx::query_as::<_, FeePaymentWithStudent>(
            "SELECT p.id, p.student_id, p.fee_structure_id, p.amount_paid, p.mode, p.status,
                    p.payment_intent_id, p.paid_at, p.created_at, p.updated_at,
                    u.name AS student_name, u.email AS student_email
             FROM fee_payments p
             JOIN users u ON u.id = p.student_id
             WHERE ($1::payment_status IS NULL OR p.status = $1)
             ORDER BY p.created_at DESC",
        )
        .bind(filters.status)
        .fetch_all(db)
        .await?;
        Ok(payments)
    }

    #[instrument(skip(db))]
    pub async fn list_for_student(
        db: &PgPool,
        student_id: UserId,
    ) -> Result<Vec<FeePayment>, AppError> {
        let payments = sqlx::query_as::<_, FeePayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM fee_payments
             WHERE student_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(student_id)
        .fetch_all(db)
        .await?;
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_paid_leaves_full_amount() {
        assert_eq!(balance(50_000, None), (50_000, false));
    }

    #[test]
    fn exact_payment_clears_balance() {
        assert_eq!(balance(50_000, Some(50_000)), (0, false));
    }

    #[test]
    fn partial_payment() {
        assert_eq!(balance(50_000, Some(20_000)), (30_000, false));
    }

    #[test]
    fn overpayment_is_not_clamped() {
        let (remaining, overpaid) = balance(50_000, Some(55_000));
        assert_eq!(remaining, -5_000);
        assert!(overpaid);
    }

    #[test]
    fn gateway_amounts_are_minor_units() {
        assert_eq!(to_minor_units(1_250).unwrap(), 125_000);
    }

    #[test]
    fn oversized_amounts_are_rejected_not_wrapped() {
        let err = to_minor_units(100_000_000_000_000_000).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(to_minor_units(i64::MAX / 100).is_ok());
    }
}
