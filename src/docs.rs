use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::{ErrorResponse, MessageResponse};
use learnhub_core::{PaginationMeta, PaginationParams, SortOrder};
use learnhub_models::assignments::{
    Assignment, AssignmentQuestion, AssignmentResponse, CreateAssignmentDto,
    PaginatedAssignmentsResponse, UpdateAssignmentDto,
};
use learnhub_models::attendance::{AttendanceRow, AttendanceSheet};
use learnhub_models::auth::{
    Account, AuthResponse, AuthUser, LoginRequest, Profile, ProfileResponse, RegisterRequest,
};
use learnhub_models::authorities::{Authorities, Permissions};
use learnhub_models::common::{EmergencyContact, EmploymentStatus, Gender, QuestionType};
use learnhub_models::courses::{
    Course, CourseResponse, CourseStats, CourseStatsResponse, CourseStatus, CourseView,
    CreateCourseDto, InstructorSummary, MyCoursesResponse, MyCoursesSummary,
    PaginatedCoursesResponse, UpdateCourseDto,
};
use learnhub_models::quizzes::{
    CreateQuizDto, PaginatedQuizzesResponse, Quiz, QuizQuestion, QuizResponse, UpdateQuizDto,
};
use learnhub_models::roles::Role;
use learnhub_models::staff::{
    CreateStaffDto, PaginatedStaffResponse, Staff, StaffDocuments, StaffQualification,
    StaffResponse, StaffStats, StaffStatsResponse, UpdateStaffDto,
};
use learnhub_models::students::{
    AttendanceMark, CreateStudentDto, Enrollment, PaginatedStudentsResponse, ParentGuardian,
    Student, StudentBrief, StudentResponse, StudentsByCourseResponse, UpdateStudentDto,
};
use learnhub_models::teachers::{
    CourseAssignment, CreateTeacherDto, InstructorOption, InstructorsListResponse,
    PaginatedTeachersResponse, Qualification, Teacher, TeacherDocuments, TeacherResponse,
    TeacherStats, TeacherStatsResponse, UpdateTeacherDto,
};
use learnhub_models::visitors::{
    BulkUpdateResponse, BulkUpdateVisitorsDto, CreateVisitorDto, LeadStatus, MonthlyCount,
    PaginatedVisitorsResponse, UpdateVisitorDto, Visitor, VisitorResponse, VisitorStats,
    VisitorStatsResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::get_profile,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_students_by_course,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::teachers::controller::create_teacher,
        crate::modules::teachers::controller::get_teachers,
        crate::modules::teachers::controller::get_teacher_stats,
        crate::modules::teachers::controller::get_instructors_list,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::teachers::controller::delete_teacher,
        crate::modules::staff::controller::create_staff,
        crate::modules::staff::controller::get_staff_list,
        crate::modules::staff::controller::get_staff_stats,
        crate::modules::staff::controller::get_staff,
        crate::modules::staff::controller::update_staff,
        crate::modules::staff::controller::delete_staff,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_courses,
        crate::modules::courses::controller::get_course_stats,
        crate::modules::courses::controller::get_my_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::get_students_attendance,
        crate::modules::visitors::controller::create_visitor,
        crate::modules::visitors::controller::get_visitors,
        crate::modules::visitors::controller::get_visitor_stats,
        crate::modules::visitors::controller::bulk_update_visitors,
        crate::modules::visitors::controller::get_visitor,
        crate::modules::visitors::controller::update_visitor,
        crate::modules::visitors::controller::delete_visitor,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::get_assignments,
        crate::modules::assignments::controller::get_assignment,
        crate::modules::assignments::controller::update_assignment,
        crate::modules::assignments::controller::delete_assignment,
        crate::modules::quizzes::controller::create_quiz,
        crate::modules::quizzes::controller::get_quizzes,
        crate::modules::quizzes::controller::get_quiz,
        crate::modules::quizzes::controller::update_quiz,
        crate::modules::quizzes::controller::delete_quiz,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            PaginationMeta,
            PaginationParams,
            SortOrder,
            Role,
            Gender,
            EmploymentStatus,
            QuestionType,
            EmergencyContact,
            Permissions,
            Authorities,
            Account,
            AuthUser,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            Profile,
            ProfileResponse,
            Student,
            ParentGuardian,
            Enrollment,
            AttendanceMark,
            CreateStudentDto,
            UpdateStudentDto,
            StudentResponse,
            PaginatedStudentsResponse,
            StudentBrief,
            StudentsByCourseResponse,
            Teacher,
            Qualification,
            CourseAssignment,
            TeacherDocuments,
            CreateTeacherDto,
            UpdateTeacherDto,
            TeacherResponse,
            PaginatedTeachersResponse,
            InstructorOption,
            InstructorsListResponse,
            TeacherStats,
            TeacherStatsResponse,
            Staff,
            StaffQualification,
            StaffDocuments,
            CreateStaffDto,
            UpdateStaffDto,
            StaffResponse,
            PaginatedStaffResponse,
            StaffStats,
            StaffStatsResponse,
            Course,
            CourseStatus,
            CourseView,
            InstructorSummary,
            CreateCourseDto,
            UpdateCourseDto,
            CourseResponse,
            PaginatedCoursesResponse,
            CourseStats,
            CourseStatsResponse,
            MyCoursesSummary,
            MyCoursesResponse,
            AttendanceRow,
            AttendanceSheet,
            Visitor,
            LeadStatus,
            CreateVisitorDto,
            UpdateVisitorDto,
            BulkUpdateVisitorsDto,
            BulkUpdateResponse,
            VisitorResponse,
            PaginatedVisitorsResponse,
            MonthlyCount,
            VisitorStats,
            VisitorStatsResponse,
            Assignment,
            AssignmentQuestion,
            CreateAssignmentDto,
            UpdateAssignmentDto,
            AssignmentResponse,
            PaginatedAssignmentsResponse,
            Quiz,
            QuizQuestion,
            CreateQuizDto,
            UpdateQuizDto,
            QuizResponse,
            PaginatedQuizzesResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Admin registration, login and profile"),
        (name = "Students", description = "Student records and enrollments"),
        (name = "Teachers", description = "Teacher records and instructor lookups"),
        (name = "Staff", description = "Staff records and their authorities"),
        (name = "Courses", description = "Courses, statistics and attendance"),
        (name = "Visitors", description = "Visitor leads"),
        (name = "Assignments", description = "Assignments"),
        (name = "Quizzes", description = "Quizzes")
    ),
    info(
        title = "LearnHub API",
        version = "0.1.0",
        description = "Administration backend for a learning management system, built with Rust, Axum, and PostgreSQL.",
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
            )
        }
    }
}
