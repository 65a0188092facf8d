use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use db::models::{
    book_reading_goal::{BookReadingGoal, CreateBookReadingGoal},
    goal::{GoalKind, GoalStatus},
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::{
    daily_tasks::{self, GoalTaskTemplate},
    goal_sync::{self, GoalSyncError, TrackedGoal},
};
use utils::{
    dates::{parse_day, today},
    response::ApiResponse,
};
use uuid::Uuid;

use super::{ProgressRequest, parse_range, record_goal_progress, required, settle_goal_status};
use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AppPath, AuthUser},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookReadingGoal {
    pub book_title: Option<String>,
    pub author: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReadingGoalPatch {
    pub book_title: Option<String>,
    pub author: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<GoalStatus>,
}

pub async fn get_goals(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<BookReadingGoal>>>, ApiError> {
    let goals = BookReadingGoal::find_by_user(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(goals)))
}

pub async fn create_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<NewBookReadingGoal>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<BookReadingGoal>>), ApiError> {
    let (Some(book_title), Some(start), Some(end)) = (
        required(&payload.book_title),
        required(&payload.start_date),
        required(&payload.end_date),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };
    let (start_date, end_date) = parse_range(start, end)?;

    let pool = &deployment.db().pool;
    let goal = BookReadingGoal::create(
        pool,
        user.user_id,
        &CreateBookReadingGoal {
            book_title: book_title.to_string(),
            author: required(&payload.author).map(str::to_string),
            start_date,
            end_date,
        },
    )
    .await?;
    daily_tasks::seed_goal_tasks(
        pool,
        &GoalTaskTemplate::from(&goal),
        start_date,
        end_date,
        today(),
    )
    .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(goal))))
}

pub async fn update_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
    AppJson(payload): AppJson<BookReadingGoalPatch>,
) -> Result<ResponseJson<ApiResponse<TrackedGoal>>, ApiError> {
    let pool = &deployment.db().pool;
    let mut goal = BookReadingGoal::find_by_id_for_user(pool, goal_id, user.user_id)
        .await?
        .ok_or(GoalSyncError::GoalNotFound)?;
    if let Some(status) = payload.status {
        goal_sync::check_status(GoalKind::BookReading, status)?;
    }

    if let Some(title) = required(&payload.book_title) {
        goal.book_title = title.to_string();
    }
    if payload.author.is_some() {
        goal.author = required(&payload.author).map(str::to_string);
    }
    if let Some(start) = required(&payload.start_date) {
        goal.start_date = parse_day(start)?;
    }
    if let Some(end) = required(&payload.end_date) {
        goal.end_date = parse_day(end)?;
    }
    if goal.end_date < goal.start_date {
        return Err(ApiError::BadRequest(
            "endDate must not be before startDate".to_string(),
        ));
    }

    let goal = TrackedGoal::BookReading(BookReadingGoal::save(pool, &goal).await?);
    let goal = settle_goal_status(pool, goal, payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(goal)))
}

pub async fn delete_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    goal_sync::delete_goal(
        &deployment.db().pool,
        GoalKind::BookReading,
        goal_id,
        user.user_id,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn record_progress(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppPath(goal_id): AppPath<Uuid>,
    AppJson(payload): AppJson<ProgressRequest>,
) -> Result<ResponseJson<ApiResponse<TrackedGoal>>, ApiError> {
    let goal = record_goal_progress(
        &deployment.db().pool,
        GoalKind::BookReading,
        goal_id,
        user.user_id,
        payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(goal)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/goals/book-reading",
        Router::new()
            .route("/", get(get_goals).post(create_goal))
            .route("/{id}", patch(update_goal).delete(delete_goal))
            .route("/{id}/progress", post(record_progress)),
    )
}
