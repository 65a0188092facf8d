//! Request extractors shared by the routes.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use deployment::Deployment;
use utils::jwt::verify_token;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// JSON body whose rejection renders as a 400 `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Path parameters whose rejection renders as a 400 `ApiError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

/// The caller identified by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl FromRequestParts<DeploymentImpl> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let claims = verify_token(&deployment.config().jwt_secret, token)?;
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
        })
    }
}
