use crate::state::AppState;
use axum::{Router, routing::get};

use super::controller::{
    create_staff, delete_staff, get_staff, get_staff_list, get_staff_stats, update_staff,
};

pub fn init_staff_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_staff_list).post(create_staff))
        .route("/stats", get(get_staff_stats))
        .route(
            "/{id}",
            get(get_staff).patch(update_staff).delete(delete_staff),
        )
}
