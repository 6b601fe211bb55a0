use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    app::AppState,
    error::AppError,
    model::CurrentUser,
    schema::{DeliverSchema, LoginSchema, MotivationalSchema, TabSchema},
    screen::AddTaskForm,
};

fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({"status": "success", "data": data}))
}

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "To-do app core with Rust, SQLX, Cognito and Axum";

    let json_response = serde_json::json!({
        "status": "success",
        "message": MESSAGE
    });

    Json(json_response)
}

// Which tree and screen is showing
pub async fn get_navigation(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    success(app.navigation().await)
}

pub async fn login(
    State(app): State<Arc<AppState>>,
    Json(body): Json<LoginSchema>,
) -> impl IntoResponse {
    let view = app.login(&body.email, &body.password).await;
    let status = if view.alert.is_some() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    (status, success(view))
}

pub async fn deliver_notification(
    State(app): State<Arc<AppState>>,
    Json(body): Json<DeliverSchema>,
) -> impl IntoResponse {
    let phase = body.phase();
    app.notifications().deliver(body.message, phase);
    StatusCode::ACCEPTED
}

pub async fn get_tasks(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    success(app.list_view().await)
}

// Swipe on a row opens the delete confirmation
pub async fn swipe_task(
    Path(id): Path<String>,
    State(app): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success(app.swipe(&id).await?))
}

pub async fn confirm_delete(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    success(app.confirm_delete().await)
}

pub async fn cancel_delete(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    success(app.cancel_delete().await)
}

pub async fn get_task(
    Path(id): Path<String>,
    State(app): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success(app.open_details(&id).await?))
}

pub async fn new_task_form(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    success(app.open_add_task().await)
}

pub async fn create_task(
    State(app): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<AddTaskForm>,
) -> Result<impl IntoResponse, AppError> {
    let view = app.submit_task(&user.session, body).await?;
    Ok((StatusCode::CREATED, success(view)))
}

pub async fn go_back(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    success(app.go_back().await)
}

pub async fn select_tab(
    State(app): State<Arc<AppState>>,
    Json(body): Json<TabSchema>,
) -> impl IntoResponse {
    success(app.select_tab(body.tab).await)
}

pub async fn get_settings(
    State(app): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success(app.settings_view(&user.session).await?))
}

pub async fn set_motivational(
    State(app): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<MotivationalSchema>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success(
        app.toggle_motivational(&user.session, body.enabled).await?,
    ))
}

pub async fn logout(State(app): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    app.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
