use axum::{
    Router, extract::State, http::StatusCode, response::Json as ResponseJson, routing::get,
};
use db::models::travel_goal::{CreateTravelGoal, TravelGoal};
use deployment::Deployment;
use serde::Deserialize;
use utils::response::ApiResponse;

use super::{parse_range, required};
use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AuthUser},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTravelGoal {
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub ticket_booked: bool,
    pub remarks: Option<String>,
}

pub async fn get_goals(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<TravelGoal>>>, ApiError> {
    let goals = TravelGoal::find_by_user(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(goals)))
}

pub async fn create_goal(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<NewTravelGoal>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TravelGoal>>), ApiError> {
    let (Some(destination), Some(start), Some(end)) = (
        required(&payload.destination),
        required(&payload.start_date),
        required(&payload.end_date),
    ) else {
        return Err(ApiError::BadRequest(
            "destination, startDate and endDate are required".to_string(),
        ));
    };
    let (start_date, end_date) = parse_range(start, end)?;

    let goal = TravelGoal::create(
        &deployment.db().pool,
        user.user_id,
        &CreateTravelGoal {
            destination: destination.to_string(),
            start_date,
            end_date,
            ticket_booked: payload.ticket_booked,
            remarks: payload.remarks.unwrap_or_default(),
        },
    )
    .await?;
    tracing::debug!(goal_id = %goal.id, "Travel goal created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(goal))))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/goals/travel", get(get_goals).post(create_goal))
}
