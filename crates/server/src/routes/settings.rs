use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::{
    status_config::{StatusConfig, StatusConfigEntry},
    user::User,
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{AppJson, AuthUser},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub categories: Vec<String>,
    pub priorities: Vec<String>,
    pub status_configs: Vec<StatusConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct Preferences {
    pub categories: Vec<String>,
    pub priorities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub categories: Option<Vec<String>>,
    pub priorities: Option<Vec<String>>,
}

/// Trims labels and drops blanks and repeats. A list left empty is refused.
fn clean_labels(field: &str, labels: &[String]) -> Result<Vec<String>, ApiError> {
    let mut cleaned: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if !cleaned.iter().any(|c| c.eq_ignore_ascii_case(label)) {
            cleaned.push(label.to_string());
        }
    }
    if cleaned.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} cannot be empty")));
    }
    Ok(cleaned)
}

async fn find_user(deployment: &DeploymentImpl, user: &AuthUser) -> Result<User, ApiError> {
    User::find_by_id(&deployment.db().pool, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn get_settings(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Settings>>, ApiError> {
    let account = find_user(&deployment, &user).await?;
    let status_config =
        StatusConfig::find_or_create_default(&deployment.db().pool, user.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(Settings {
        categories: account.categories.0,
        priorities: account.priorities.0,
        status_configs: status_config.statuses.0,
    })))
}

pub async fn update_settings(
    State(deployment): State<DeploymentImpl>,
    user: AuthUser,
    AppJson(payload): AppJson<PreferencesUpdate>,
) -> Result<ResponseJson<ApiResponse<Preferences>>, ApiError> {
    let account = find_user(&deployment, &user).await?;
    let categories = match &payload.categories {
        Some(labels) => clean_labels("categories", labels)?,
        None => account.categories.0,
    };
    let priorities = match &payload.priorities {
        Some(labels) => clean_labels("priorities", labels)?,
        None => account.priorities.0,
    };

    let updated =
        User::update_preferences(&deployment.db().pool, user.user_id, &categories, &priorities)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(Preferences {
        categories: updated.categories.0,
        priorities: updated.priorities.0,
    })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}
