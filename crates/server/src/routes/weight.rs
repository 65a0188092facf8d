use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::weight_goal::{CreateWeightGoal, WeightGoal, WeightLog};
use deployment::Deployment;
use services::services::weight::{self, WeightError, WeightGoalUpdate, WeightGoalView};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AuthUser},
};

pub async fn get_goals(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<WeightGoalView>>>, ApiError> {
    let goals = WeightGoal::find_by_user(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(
        goals.into_iter().map(WeightGoalView::from).collect(),
    )))
}

pub async fn create_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateWeightGoal>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WeightGoalView>>), ApiError> {
    let goal = weight::create_goal(&deployment.db().pool, user.user_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(goal.into())),
    ))
}

pub async fn get_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<WeightGoalView>>, ApiError> {
    let goal = weight::find_goal(&deployment.db().pool, user.user_id, goal_id).await?;
    Ok(ResponseJson(ApiResponse::success(goal.into())))
}

pub async fn update_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
    AppJson(payload): AppJson<WeightGoalUpdate>,
) -> Result<ResponseJson<ApiResponse<WeightGoalView>>, ApiError> {
    let goal = weight::update_goal(&deployment.db().pool, user.user_id, goal_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(goal.into())))
}

pub async fn delete_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    weight::delete_goal(&deployment.db().pool, user.user_id, goal_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Logs of one goal, oldest first.
pub async fn get_logs(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<WeightLog>>>, ApiError> {
    let goal = weight::find_goal(&deployment.db().pool, user.user_id, goal_id).await?;
    let mut logs = goal.logs.0;
    logs.sort_by_key(|log| log.date);
    Ok(ResponseJson(ApiResponse::success(logs)))
}

pub async fn add_log(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
    AppJson(payload): AppJson<WeightLog>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WeightGoalView>>), ApiError> {
    let goal = weight::add_log(&deployment.db().pool, user.user_id, goal_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(goal.into())),
    ))
}

/// The user's most recently created goal, active or archived.
pub async fn get_history(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<WeightGoalView>>, ApiError> {
    let goal = WeightGoal::find_latest_for_user(&deployment.db().pool, user.user_id)
        .await?
        .ok_or(WeightError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(goal.into())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/weight",
        Router::new()
            .route("/goal", get(get_goals).post(create_goal))
            .route(
                "/goal/{goal_id}",
                get(get_goal).put(update_goal).delete(delete_goal),
            )
            .route("/goal/{goal_id}/logs", get(get_logs).post(add_log))
            .route("/history", get(get_history)),
    )
}
