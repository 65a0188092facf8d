use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use db::models::task::Task;
use deployment::Deployment;
use serde::Serialize;
use services::services::{
    daily_tasks,
    tasks::{self, NewTaskRequest, TaskPatch},
};
use utils::{dates::today, response::ApiResponse};
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AuthUser},
};

#[derive(Debug, Serialize)]
pub struct GeneratedTasks {
    pub created: usize,
    pub tasks: Vec<Task>,
}

pub async fn get_tasks(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_user(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn create_task(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<NewTaskRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    let task = tasks::create_task(&deployment.db().pool, user.user_id, &payload, today()).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn update_task(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(task_id): AppPath<Uuid>,
    AppJson(payload): AppJson<TaskPatch>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let (task, _goal) =
        tasks::update_task(&deployment.db().pool, user.user_id, task_id, &payload, today()).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(task_id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = tasks::delete_task(&deployment.db().pool, user.user_id, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn generate_daily(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<GeneratedTasks>>, ApiError> {
    let tasks = daily_tasks::generate_for_user(&deployment.db().pool, user.user_id, today()).await?;
    tracing::debug!(user_id = %user.user_id, created = tasks.len(), "Generated daily goal tasks");
    Ok(ResponseJson(ApiResponse::success(GeneratedTasks {
        created: tasks.len(),
        tasks,
    })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/tasks",
        Router::new()
            .route("/", get(get_tasks).post(create_task))
            .route("/generate-daily", post(generate_daily))
            .route("/{id}", patch(update_task).delete(delete_task)),
    )
}
