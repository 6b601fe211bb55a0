use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{app::AppState, handler::*, middleware::mw_require_auth};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/tasks", get(get_tasks).post(create_task))
        .route("/tasks/new", get(new_task_form))
        .route("/tasks/delete/confirm", post(confirm_delete))
        .route("/tasks/delete/cancel", post(cancel_delete))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/swipe", post(swipe_task))
        .route("/navigation/back", post(go_back))
        .route("/navigation/tab", put(select_tab))
        .route("/settings", get(get_settings))
        .route("/settings/motivational", put(set_motivational))
        .route("/logout", post(logout))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/login", post(login))
        .route("/navigation", get(get_navigation))
        .route("/notifications", post(deliver_notification))
        .route("/", get(health_checker_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);
    app
}
