//! Weight-loss goals: one active goal per user, archived instead of deleted
//! when it ends.

use chrono::NaiveDate;
use db::models::weight_goal::{
    CreateWeightGoal, WeightGoal, WeightGoalStatus, WeightLog, WeightUnit,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WeightError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("An active weight goal already exists")]
    ActiveGoalExists,
    #[error("Goal not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

/// A goal as returned to clients, with derived progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightGoalView {
    #[serde(flatten)]
    pub goal: WeightGoal,
    pub current_weight: f64,
    pub percent_to_goal: Option<f64>,
}

impl From<WeightGoal> for WeightGoalView {
    fn from(goal: WeightGoal) -> Self {
        Self {
            current_weight: goal.current_weight(),
            percent_to_goal: goal.percent_to_goal(),
            goal,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightGoalUpdate {
    pub age: Option<i64>,
    pub height: Option<f64>,
    pub start_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub unit: Option<WeightUnit>,
    pub start_date: Option<NaiveDate>,
    pub status: Option<WeightGoalStatus>,
    pub is_active: Option<bool>,
}

fn require_positive(field: &str, value: f64) -> Result<(), WeightError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WeightError::Validation(format!("{field} must be a positive number")))
    }
}

fn check_measurements(age: i64, height: f64, start: f64, target: f64) -> Result<(), WeightError> {
    if age <= 0 {
        return Err(WeightError::Validation("age must be a positive number".to_string()));
    }
    require_positive("height", height)?;
    require_positive("startWeight", start)?;
    require_positive("targetWeight", target)
}

async fn ensure_no_other_active(
    pool: &SqlitePool,
    user_id: Uuid,
    except: Option<Uuid>,
) -> Result<(), WeightError> {
    match WeightGoal::find_active_for_user(pool, user_id).await? {
        Some(active) if Some(active.id) != except => Err(WeightError::ActiveGoalExists),
        _ => Ok(()),
    }
}

pub async fn create_goal(
    pool: &SqlitePool,
    user_id: Uuid,
    data: &CreateWeightGoal,
) -> Result<WeightGoal, WeightError> {
    check_measurements(data.age, data.height, data.start_weight, data.target_weight)?;
    ensure_no_other_active(pool, user_id, None).await?;
    let goal = WeightGoal::create(pool, user_id, data).await?;
    info!(goal_id = %goal.id, user_id = %user_id, "Weight goal created");
    Ok(goal)
}

pub async fn find_goal(
    pool: &SqlitePool,
    user_id: Uuid,
    goal_id: Uuid,
) -> Result<WeightGoal, WeightError> {
    WeightGoal::find_by_id_for_user(pool, goal_id, user_id)
        .await?
        .ok_or(WeightError::NotFound)
}

/// Apply `update`. An archiving status always clears `isActive`.
pub async fn update_goal(
    pool: &SqlitePool,
    user_id: Uuid,
    goal_id: Uuid,
    update: &WeightGoalUpdate,
) -> Result<WeightGoal, WeightError> {
    let mut goal = find_goal(pool, user_id, goal_id).await?;

    goal.age = update.age.unwrap_or(goal.age);
    goal.height = update.height.unwrap_or(goal.height);
    goal.start_weight = update.start_weight.unwrap_or(goal.start_weight);
    goal.target_weight = update.target_weight.unwrap_or(goal.target_weight);
    goal.target_date = update.target_date.unwrap_or(goal.target_date);
    goal.unit = update.unit.unwrap_or(goal.unit);
    if update.start_date.is_some() {
        goal.start_date = update.start_date;
    }
    if let Some(is_active) = update.is_active {
        goal.is_active = is_active;
    }
    if let Some(status) = update.status {
        goal.status = status;
        if status.is_archived() {
            goal.is_active = false;
        }
    }
    check_measurements(goal.age, goal.height, goal.start_weight, goal.target_weight)?;
    if goal.is_active {
        ensure_no_other_active(pool, user_id, Some(goal.id)).await?;
    }

    let goal = WeightGoal::save(pool, &goal).await?;
    if !goal.is_active {
        info!(goal_id = %goal.id, status = %goal.status, "Weight goal archived");
    }
    Ok(goal)
}

pub async fn delete_goal(
    pool: &SqlitePool,
    user_id: Uuid,
    goal_id: Uuid,
) -> Result<(), WeightError> {
    match WeightGoal::delete(pool, goal_id, user_id).await? {
        0 => Err(WeightError::NotFound),
        _ => Ok(()),
    }
}

pub async fn add_log(
    pool: &SqlitePool,
    user_id: Uuid,
    goal_id: Uuid,
    log: WeightLog,
) -> Result<WeightGoal, WeightError> {
    require_positive("weight", log.weight)?;
    let mut goal = find_goal(pool, user_id, goal_id).await?;
    goal.logs.push(log);
    Ok(WeightGoal::save(pool, &goal).await?)
}
