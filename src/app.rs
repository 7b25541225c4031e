use crate::config::Config;
use crate::handlers;
use crate::session::session_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/api/goals", get(handlers::list_goals))
        .route("/api/tasks/update", post(handlers::update_task))
        .route("/api/goals/action", post(handlers::goal_action))
        .layer(session_layer(config))
        .with_state(state)
}
