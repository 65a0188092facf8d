use axum::Router;
use chrono::NaiveDate;
use db::models::goal::{GoalKind, GoalStatus};
use serde::Deserialize;
use services::services::goal_sync::{self, GoalSyncError, TrackedGoal};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utils::dates::{parse_day, today};
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub mod auth;
pub mod book_reading;
pub mod countries;
pub mod exercise;
pub mod health;
pub mod settings;
pub mod status_config;
pub mod tasks;
pub mod travel;
pub mod weight;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(health::router(&deployment))
        .merge(auth::router(&deployment))
        .merge(tasks::router(&deployment))
        .merge(book_reading::router(&deployment))
        .merge(exercise::router(&deployment))
        .merge(travel::router(&deployment))
        .merge(weight::router(&deployment))
        .merge(settings::router(&deployment))
        .merge(status_config::router(&deployment))
        .merge(countries::router(&deployment));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(deployment)
}

/// Required text field: trimmed and non-empty.
pub(crate) fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parses an inclusive goal date range.
pub(crate) fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let (start, end) = (parse_day(start)?, parse_day(end)?);
    if end < start {
        return Err(ApiError::BadRequest(
            "endDate must not be before startDate".to_string(),
        ));
    }
    Ok((start, end))
}

/// Body of the goal progress endpoints. Book reading clients send `read`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressRequest {
    pub date: Option<String>,
    #[serde(alias = "read")]
    pub completed: Option<bool>,
    pub notes: Option<String>,
}

/// Record one progress day on a goal owned by `user_id`.
pub(crate) async fn record_goal_progress(
    pool: &SqlitePool,
    kind: GoalKind,
    goal_id: Uuid,
    user_id: Uuid,
    payload: ProgressRequest,
) -> Result<TrackedGoal, ApiError> {
    let (Some(date), Some(completed)) = (required(&payload.date), payload.completed) else {
        return Err(ApiError::BadRequest(
            "date and completion flag are required".to_string(),
        ));
    };
    let date = parse_day(date)?;
    let goal = TrackedGoal::load_for_user(pool, kind, goal_id, user_id)
        .await?
        .ok_or(GoalSyncError::GoalNotFound)?;
    Ok(goal_sync::record_progress(pool, goal, date, completed, payload.notes, today()).await?)
}

/// Apply a requested status after a goal's fields were saved, or re-check
/// the stored status against the goal's tasks when none was requested.
pub(crate) async fn settle_goal_status(
    pool: &SqlitePool,
    goal: TrackedGoal,
    status: Option<GoalStatus>,
) -> Result<TrackedGoal, ApiError> {
    let today = today();
    match status {
        Some(target) => Ok(goal_sync::set_goal_status(pool, goal, target, today).await?),
        None => {
            let (kind, id) = (goal.kind(), goal.id());
            Ok(goal_sync::refresh_goal(pool, kind, id, today)
                .await?
                .unwrap_or(goal))
        }
    }
}
