pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::candidates::handlers;
use crate::parsing::handlers::parse_resume_route;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/parse-resume", parse_resume_route())
        .route(
            "/api/v1/candidates",
            post(handlers::handle_create_candidate).get(handlers::handle_list_candidates),
        )
        .route(
            "/api/v1/candidates/:id",
            get(handlers::handle_get_candidate)
                .patch(handlers::handle_update_candidate)
                .delete(handlers::handle_delete_candidate),
        )
        .with_state(state)
}
