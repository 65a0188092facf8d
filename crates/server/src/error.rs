use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::{
    auth::AuthError, goal_sync::GoalSyncError, tasks::TaskError, weight::WeightError,
};
use thiserror::Error;
use utils::{dates::InvalidDate, jwt::TokenError, response::ApiResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    GoalSync(#[from] GoalSyncError),
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    InvalidDate(#[from] InvalidDate),
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
    #[error(transparent)]
    PathParam(#[from] PathRejection),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
}

type ErrorParts = (StatusCode, String, Option<serde_json::Value>);

fn database_error(err: &sqlx::Error) -> ErrorParts {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "Not found".to_string(), None),
        sqlx::Error::Database(db) if db.is_check_violation() => (
            StatusCode::BAD_REQUEST,
            "Validation failed".to_string(),
            Some(serde_json::json!(db.message())),
        ),
        sqlx::Error::Database(db) if db.is_unique_violation() => (
            StatusCode::CONFLICT,
            "Resource already exists".to_string(),
            None,
        ),
        _ => {
            tracing::error!(error = %err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            )
        }
    }
}

impl ApiError {
    fn parts(&self) -> ErrorParts {
        let plain = |status: StatusCode| (status, self.to_string(), None);
        match self {
            ApiError::Database(e) => database_error(e),
            ApiError::Auth(AuthError::Database(e))
            | ApiError::Task(TaskError::Database(e))
            | ApiError::GoalSync(GoalSyncError::Database(e))
            | ApiError::Weight(WeightError::Database(e)) => database_error(e),
            ApiError::Task(TaskError::GoalSync(e)) => ApiError::goal_sync_parts(e),
            ApiError::GoalSync(e) => ApiError::goal_sync_parts(e),
            ApiError::Auth(AuthError::Validation(_) | AuthError::UserExists) => {
                plain(StatusCode::BAD_REQUEST)
            }
            ApiError::Auth(AuthError::AccountExists) => plain(StatusCode::CONFLICT),
            ApiError::Auth(AuthError::InvalidCredentials) => plain(StatusCode::UNAUTHORIZED),
            ApiError::Auth(AuthError::Token(e)) => {
                tracing::error!(error = %e, "Failed to issue token");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Auth(AuthError::Hashing(e)) => {
                tracing::error!(error = %e, "Password hashing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Task(TaskError::Validation { message, details }) => (
                StatusCode::BAD_REQUEST,
                message.clone(),
                Some(serde_json::json!(details)),
            ),
            ApiError::Task(TaskError::NotFound) => plain(StatusCode::NOT_FOUND),
            ApiError::Weight(WeightError::ActiveGoalExists) => plain(StatusCode::CONFLICT),
            ApiError::Weight(WeightError::NotFound) => plain(StatusCode::NOT_FOUND),
            ApiError::Weight(WeightError::Validation(_)) => plain(StatusCode::BAD_REQUEST),
            ApiError::Token(_) | ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None)
            }
            ApiError::JsonBody(rejection) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                Some(serde_json::json!(rejection.body_text())),
            ),
            ApiError::PathParam(rejection) => (
                StatusCode::BAD_REQUEST,
                "Invalid path parameter".to_string(),
                Some(serde_json::json!(rejection.body_text())),
            ),
            ApiError::InvalidDate(_) | ApiError::BadRequest(_) => plain(StatusCode::BAD_REQUEST),
            ApiError::NotFound(_) => plain(StatusCode::NOT_FOUND),
        }
    }

    fn goal_sync_parts(err: &GoalSyncError) -> ErrorParts {
        match err {
            GoalSyncError::Database(e) => database_error(e),
            GoalSyncError::GoalNotFound => {
                (StatusCode::NOT_FOUND, "Goal not found".to_string(), None)
            }
            GoalSyncError::StatusNotAllowed { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string(), None)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = self.parts();
        let body = match details {
            Some(details) => ApiResponse::<()>::error_with_details(&message, details),
            None => ApiResponse::<()>::error(&message),
        };
        (status, ResponseJson(body)).into_response()
    }
}
