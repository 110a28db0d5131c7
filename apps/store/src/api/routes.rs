use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::api::handlers::{system, teams};
use crate::domain::repositories::Store;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Builds the HTTP routes over a store
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(system::health_check))
        // Team routes
        .route("/api/teams", get(teams::get_all_teams).post(teams::create_team))
        .route(
            "/api/teams/:id",
            get(teams::get_team)
                .put(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/api/teams/:id/name", put(teams::update_team_name))
        .route("/api/teams/domain/:domain", get(teams::get_team_by_domain))
        .route("/api/teams/email/:email", get(teams::get_teams_for_email))
        .with_state(state)
}
