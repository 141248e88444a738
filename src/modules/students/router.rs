use crate::state::AppState;
use axum::{Router, routing::get};

use super::controller::{
    create_student, delete_student, get_student, get_students, get_students_by_course,
    update_student,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_students).post(create_student))
        .route("/course/{course_id}", get(get_students_by_course))
        .route(
            "/{id}",
            get(get_student)
                .put(update_student)
                .patch(update_student)
                .delete(delete_student),
        )
}
