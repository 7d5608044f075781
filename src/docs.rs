use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use campusdesk_core::{ErrorResponse, PaginationMeta, PaginationParams};
use campusdesk_models::{activities, attendance, auth, courses, departments, documents, exams};
use campusdesk_models::{fees, leaves, notices, notifications, results, schedules, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_pending_faculty,
        crate::modules::users::controller::approve_faculty,
        crate::modules::users::controller::reject_faculty,
        crate::modules::users::controller::update_account_status,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::get_students,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::get_departments,
        crate::modules::departments::controller::get_department,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_pending_courses,
        crate::modules::courses::controller::get_my_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::approve_course,
        crate::modules::courses::controller::reject_course,
        crate::modules::courses::controller::enroll,
        crate::modules::courses::controller::unenroll,
        crate::modules::courses::controller::get_enrolled_students,
        crate::modules::attendance::controller::mark_attendance,
        crate::modules::attendance::controller::get_course_attendance,
        crate::modules::attendance::controller::get_my_attendance,
        crate::modules::exams::controller::create_exam,
        crate::modules::exams::controller::get_course_exams,
        crate::modules::exams::controller::get_exam,
        crate::modules::exams::controller::submit_exam,
        crate::modules::exams::controller::delete_exam,
        crate::modules::results::controller::get_my_results,
        crate::modules::results::controller::get_exam_results,
        crate::modules::results::controller::get_result,
        crate::modules::leaves::controller::submit_leave,
        crate::modules::leaves::controller::get_leaves,
        crate::modules::leaves::controller::get_my_leaves,
        crate::modules::leaves::controller::approve_leave,
        crate::modules::leaves::controller::reject_leave,
        crate::modules::leaves::controller::cancel_leave,
        crate::modules::notices::controller::create_notice,
        crate::modules::notices::controller::get_notices,
        crate::modules::notices::controller::delete_notice,
        crate::modules::notifications::controller::send_notification,
        crate::modules::notifications::controller::get_my_notifications,
        crate::modules::notifications::controller::get_unread_count,
        crate::modules::notifications::controller::mark_read,
        crate::modules::notifications::controller::mark_all_read,
        crate::modules::notifications::controller::get_sent_notifications,
        crate::modules::notifications::controller::delete_notification,
        crate::modules::activities::controller::get_activities,
        crate::modules::activities::controller::get_my_activities,
        crate::modules::fees::controller::create_fee_structure,
        crate::modules::fees::controller::get_fee_structures,
        crate::modules::fees::controller::update_fee_structure,
        crate::modules::fees::controller::delete_fee_structure,
        crate::modules::fees::controller::get_my_fee,
        crate::modules::fees::controller::create_payment_intent,
        crate::modules::fees::controller::confirm_payment,
        crate::modules::fees::controller::record_offline_payment,
        crate::modules::fees::controller::get_payments,
        crate::modules::fees::controller::get_my_payments,
        crate::modules::schedules::controller::create_schedule,
        crate::modules::schedules::controller::get_schedules,
        crate::modules::schedules::controller::get_my_schedule,
        crate::modules::schedules::controller::update_schedule,
        crate::modules::schedules::controller::delete_schedule,
        crate::modules::documents::controller::upload_document,
        crate::modules::documents::controller::get_course_documents,
        crate::modules::documents::controller::delete_document,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            auth::MessageResponse,
            users::User,
            users::UserRole,
            users::ApprovalStatus,
            users::AccountStatus,
            users::UpdateProfileDto,
            users::ChangePasswordDto,
            users::UpdateAccountStatusDto,
            users::PaginatedUsersResponse,
            departments::Department,
            departments::CreateDepartmentDto,
            departments::UpdateDepartmentDto,
            courses::CourseStatus,
            courses::Course,
            courses::CourseDetail,
            courses::CreateCourseDto,
            courses::UpdateCourseDto,
            courses::PaginatedCoursesResponse,
            courses::EnrolledStudent,
            courses::EnrollmentResponse,
            attendance::AttendanceStatus,
            attendance::Attendance,
            attendance::AttendanceWithStudent,
            attendance::AttendanceEntry,
            attendance::MarkAttendanceDto,
            attendance::MarkAttendanceResponse,
            attendance::AttendanceSummary,
            attendance::MyAttendanceResponse,
            exams::Exam,
            exams::ExamDetail,
            exams::QuestionView,
            exams::CreateExamDto,
            exams::CreateQuestionDto,
            exams::SubmitExamDto,
            exams::SubmittedAnswer,
            results::ExamResult,
            results::AnswerRecord,
            results::ResultWithStudent,
            leaves::LeaveStatus,
            leaves::LeaveType,
            leaves::Leave,
            leaves::LeaveWithRequester,
            leaves::CreateLeaveDto,
            leaves::LeaveDecisionDto,
            notices::NoticeAudience,
            notices::Notice,
            notices::NoticeWithAuthor,
            notices::CreateNoticeDto,
            notifications::NotificationView,
            notifications::SentNotification,
            notifications::SendNotificationDto,
            notifications::UnreadCountResponse,
            notifications::MarkedReadResponse,
            notifications::NotificationCreatedResponse,
            activities::ActivityType,
            activities::ActivityWithActor,
            activities::PaginatedActivitiesResponse,
            fees::PaymentStatus,
            fees::PaymentMode,
            fees::FeeStructure,
            fees::CreateFeeStructureDto,
            fees::UpdateFeeStructureDto,
            fees::FeePayment,
            fees::FeePaymentWithStudent,
            fees::MyFeeResponse,
            fees::PaymentIntentResponse,
            fees::ConfirmPaymentDto,
            fees::OfflinePaymentDto,
            schedules::WeeklySchedule,
            schedules::ScheduleSlotView,
            schedules::CreateScheduleDto,
            schedules::UpdateScheduleDto,
            documents::DocumentType,
            documents::Document,
            documents::UploadDocumentForm,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Authentication", description = "Registration, sessions and password reset"),
        (name = "Users", description = "Profiles, faculty approval and account administration"),
        (name = "Departments", description = "Academic departments"),
        (name = "Courses", description = "Course catalogue, approval and enrollment"),
        (name = "Attendance", description = "Daily attendance per course"),
        (name = "Exams", description = "Timed multiple-choice exams"),
        (name = "Results", description = "Graded exam submissions"),
        (name = "Leaves", description = "Leave requests and decisions"),
        (name = "Notices", description = "Audience-targeted notice board"),
        (name = "Notifications", description = "Per-user notification inbox"),
        (name = "Activities", description = "Audit trail of user actions"),
        (name = "Fees", description = "Fee structures and payments"),
        (name = "Schedules", description = "Weekly timetable"),
        (name = "Documents", description = "Course study material")
    ),
    info(
        title = "Campusdesk API",
        version = "0.1.0",
        description = "College management REST API for admins, faculty and students.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_every_area() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/courses/{id}/enroll",
            "/api/exams/{id}/submit",
            "/api/fees/confirm",
            "/api/leave/{id}/approve",
            "/api/documents",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
