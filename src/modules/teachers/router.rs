use crate::state::AppState;
use axum::{Router, routing::get};

use super::controller::{
    create_teacher, delete_teacher, get_instructors_list, get_teacher, get_teacher_stats,
    get_teachers, update_teacher,
};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_teachers).post(create_teacher))
        .route("/stats", get(get_teacher_stats))
        .route("/instructors-list", get(get_instructors_list))
        .route(
            "/{id}",
            get(get_teacher).patch(update_teacher).delete(delete_teacher),
        )
}
