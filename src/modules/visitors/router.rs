use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch},
};

use super::controller::{
    bulk_update_visitors, create_visitor, delete_visitor, get_visitor, get_visitor_stats,
    get_visitors, update_visitor,
};

pub fn init_visitors_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_visitors).post(create_visitor))
        .route("/stats", get(get_visitor_stats))
        .route("/bulk-update", patch(bulk_update_visitors))
        .route(
            "/{id}",
            get(get_visitor).patch(update_visitor).delete(delete_visitor),
        )
}
