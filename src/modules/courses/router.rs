use crate::state::AppState;
use axum::{Router, routing::get};

use super::controller::{
    create_course, delete_course, get_course, get_course_stats, get_courses, get_my_courses,
    get_students_attendance, update_course,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_courses).post(create_course))
        .route("/stats", get(get_course_stats))
        .route("/my-courses", get(get_my_courses))
        .route(
            "/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/{id}/students-attendance", get(get_students_attendance))
}
