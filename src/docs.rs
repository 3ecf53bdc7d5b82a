use utoipa::OpenApi;

use learnhub_core::{ErrorResponse, PaginationMeta, PaginationParams};
use learnhub_models::attendance::{
    AttendanceRangeParams, AttendanceRecord, AttendanceSummary, BulkAttendanceDto,
    BulkAttendanceEntry, RecordAttendanceDto,
};
use learnhub_models::class_times::{
    ClassTime, ClassTimeFilterParams, CreateClassTimeDto, UpdateClassTimeDto,
};
use learnhub_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentAction, EnrollmentFilterParams,
    PaginatedEnrollmentsResponse,
};
use learnhub_models::families::{AddFamilyMemberDto, CreateFamilyDto, Family, FamilyMember, FamilyWithMembers};
use learnhub_models::groups::{
    CreateGroupClassDto, GroupClass, GroupClassFilterParams, GroupClassWithStats,
    PaginatedGroupClassesResponse,
};
use learnhub_models::id_cards::{CardResolution, IdCard, IssuedCardsResponse};
use learnhub_models::materials::{
    CreateMaterialDto, LearningMaterial, MaterialFilterParams, PaginatedMaterialsResponse,
    UpdateMaterialDto,
};
use learnhub_models::payments::{
    MonthlyPayment, PaginatedPaymentsResponse, ReviewPaymentDto, SubmitPaymentDto,
};
use learnhub_models::projects::{
    CreateProjectDto, PaginatedProjectsResponse, ProjectFilterParams, ShowcaseParams,
    StudentProject, UpdateProjectDto,
};
use learnhub_models::schools::{
    CreateSchoolDto, CreateSchoolStudentDto, PaginatedSchoolStudentsResponse,
    PaginatedSchoolsResponse, School, SchoolFilterParams, SchoolStudent, UpdateSchoolDto,
};
use learnhub_models::system_ids::SystemIdResolution;
use learnhub_models::users::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, User, UserFilterParams,
};
use learnhub_models::{
    AttendanceStatus, CardHolderType, EnrollmentStatus, EnrollmentType, MaterialType,
    PaymentStatus, ProofStatus, UserRole,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::deactivate_user,
        crate::modules::users::controller::delete_user,
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::list_schools,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::update_school,
        crate::modules::schools::controller::delete_school,
        crate::modules::schools::controller::add_student,
        crate::modules::schools::controller::list_students,
        crate::modules::schools::controller::remove_student,
        crate::modules::families::controller::create_family,
        crate::modules::families::controller::get_family,
        crate::modules::families::controller::add_member,
        crate::modules::families::controller::remove_member,
        crate::modules::groups::controller::create_group,
        crate::modules::groups::controller::list_groups,
        crate::modules::groups::controller::get_group,
        crate::modules::groups::controller::list_member_enrollments,
        crate::modules::enrollments::controller::create_enrollment,
        crate::modules::enrollments::controller::list_enrollments,
        crate::modules::enrollments::controller::get_enrollment,
        crate::modules::enrollments::controller::transition_enrollment,
        crate::modules::payments::controller::submit_payment,
        crate::modules::payments::controller::list_enrollment_payments,
        crate::modules::payments::controller::list_pending_payments,
        crate::modules::payments::controller::verify_payment,
        crate::modules::payments::controller::reject_payment,
        crate::modules::class_times::controller::create_class_time,
        crate::modules::class_times::controller::list_class_times,
        crate::modules::class_times::controller::update_class_time,
        crate::modules::class_times::controller::delete_class_time,
        crate::modules::attendance::controller::record_attendance,
        crate::modules::attendance::controller::record_bulk_attendance,
        crate::modules::attendance::controller::list_attendance,
        crate::modules::attendance::controller::attendance_summary,
        crate::modules::materials::controller::create_material,
        crate::modules::materials::controller::list_materials,
        crate::modules::materials::controller::get_material,
        crate::modules::materials::controller::update_material,
        crate::modules::materials::controller::delete_material,
        crate::modules::materials::controller::materials_for_enrollment,
        crate::modules::id_cards::controller::issue_cards,
        crate::modules::id_cards::controller::list_cards,
        crate::modules::id_cards::controller::get_card,
        crate::modules::id_cards::controller::revoke_card,
        crate::modules::id_cards::controller::scan_card,
        crate::modules::id_cards::controller::resolve_card,
        crate::modules::projects::controller::create_project,
        crate::modules::projects::controller::list_projects,
        crate::modules::projects::controller::list_owner_projects,
        crate::modules::projects::controller::showcase,
        crate::modules::projects::controller::get_project,
        crate::modules::projects::controller::update_project,
        crate::modules::projects::controller::delete_project,
        crate::modules::projects::controller::publish_project,
        crate::modules::projects::controller::unpublish_project,
        crate::modules::projects::controller::feature_project,
        crate::modules::projects::controller::unfeature_project,
        crate::modules::system_ids::controller::resolve_system_id,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
            UserRole,
            EnrollmentType,
            EnrollmentStatus,
            EnrollmentAction,
            PaymentStatus,
            ProofStatus,
            AttendanceStatus,
            MaterialType,
            CardHolderType,
            User,
            CreateUserDto,
            UpdateUserDto,
            UserFilterParams,
            PaginatedUsersResponse,
            School,
            CreateSchoolDto,
            UpdateSchoolDto,
            SchoolFilterParams,
            PaginatedSchoolsResponse,
            SchoolStudent,
            CreateSchoolStudentDto,
            PaginatedSchoolStudentsResponse,
            Family,
            FamilyMember,
            FamilyWithMembers,
            CreateFamilyDto,
            AddFamilyMemberDto,
            GroupClass,
            GroupClassWithStats,
            CreateGroupClassDto,
            GroupClassFilterParams,
            PaginatedGroupClassesResponse,
            Enrollment,
            CreateEnrollmentDto,
            EnrollmentFilterParams,
            PaginatedEnrollmentsResponse,
            MonthlyPayment,
            SubmitPaymentDto,
            ReviewPaymentDto,
            PaginatedPaymentsResponse,
            ClassTime,
            CreateClassTimeDto,
            UpdateClassTimeDto,
            ClassTimeFilterParams,
            AttendanceRecord,
            RecordAttendanceDto,
            BulkAttendanceDto,
            BulkAttendanceEntry,
            AttendanceRangeParams,
            AttendanceSummary,
            LearningMaterial,
            CreateMaterialDto,
            UpdateMaterialDto,
            MaterialFilterParams,
            PaginatedMaterialsResponse,
            IdCard,
            IssuedCardsResponse,
            CardResolution,
            StudentProject,
            CreateProjectDto,
            UpdateProjectDto,
            ProjectFilterParams,
            ShowcaseParams,
            PaginatedProjectsResponse,
            SystemIdResolution,
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints"),
        (name = "Schools", description = "Partner schools and their students"),
        (name = "Families", description = "Families and family members"),
        (name = "Group Classes", description = "Group classes led by a user"),
        (name = "Enrollments", description = "Enrollment creation and lifecycle"),
        (name = "Payments", description = "Monthly payment proofs and review"),
        (name = "Class Times", description = "Weekly class schedule"),
        (name = "Attendance", description = "Attendance recording and summaries"),
        (name = "Learning Materials", description = "Learning materials"),
        (name = "ID Cards", description = "QR ID card issuance, scanning and revocation"),
        (name = "Projects", description = "Student projects and the public showcase"),
        (name = "System IDs", description = "Human readable identifier lookup")
    ),
    info(
        title = "LearnHub API",
        version = "0.1.0",
        description = "A REST API built with Rust, Axum, and PostgreSQL for managing a learning center.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_scan_and_showcase() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/id-cards/scan/{token}"));
        assert!(doc.paths.paths.contains_key("/api/projects/showcase"));
        assert!(doc.paths.paths.contains_key("/api/system-ids/{system_id}"));
    }
}
