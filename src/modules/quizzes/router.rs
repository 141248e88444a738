use crate::state::AppState;
use axum::{Router, routing::get};

use super::controller::{create_quiz, delete_quiz, get_quiz, get_quizzes, update_quiz};

pub fn init_quizzes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_quizzes).post(create_quiz))
        .route(
            "/{id}",
            get(get_quiz).put(update_quiz).delete(delete_quiz),
        )
}
