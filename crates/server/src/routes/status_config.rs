use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::status_config::{StatusConfig, StatusConfigEntry};
use deployment::Deployment;
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AuthUser},
};

#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfigUpdate {
    pub statuses: Vec<StatusConfigEntry>,
}

pub async fn get_status_config(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<StatusConfig>>, ApiError> {
    let config = StatusConfig::find_or_create_default(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(config)))
}

pub async fn update_status_config(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<StatusConfigUpdate>,
) -> Result<ResponseJson<ApiResponse<StatusConfig>>, ApiError> {
    if payload.statuses.iter().any(|s| s.status.trim().is_empty()) {
        return Err(ApiError::BadRequest("Status name is required".to_string()));
    }
    let config =
        StatusConfig::upsert(&deployment.db().pool, user.user_id, &payload.statuses).await?;
    tracing::debug!(
        user_id = %user.user_id,
        statuses = config.statuses.len(),
        "Status config saved"
    );
    Ok(ResponseJson(ApiResponse::success(config)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route(
        "/status-config",
        get(get_status_config).put(update_status_config),
    )
}
