use axum::{
    Router, extract::State, http::StatusCode, response::Json as ResponseJson, routing::post,
};
use db::models::user::User;
use deployment::Deployment;
use serde::Serialize;
use services::services::{
    auth::{self, LoginRequest, RegisterRequest},
    email::EmailDelivery,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, extract::AppJson};

#[derive(Debug, Serialize)]
pub struct Registered {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUp {
    pub message: &'static str,
    #[serde(flatten)]
    pub email: EmailDelivery,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
    pub token: String,
    pub user: User,
}

pub async fn register(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Registered>>), ApiError> {
    auth::register(&deployment.db().pool, &payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(Registered {
            message: "User registered successfully",
        })),
    ))
}

pub async fn signup(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<SignedUp>>), ApiError> {
    let config = deployment.config();
    let (user, email) = auth::signup(
        &deployment.db().pool,
        deployment.email(),
        &config.email_from,
        &config.app_url,
        &payload,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(SignedUp {
            message: "User created successfully",
            email,
            user: UserSummary::from(&user),
        })),
    ))
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoggedIn>>, ApiError> {
    let (token, user) = auth::login(
        &deployment.db().pool,
        &deployment.config().jwt_secret,
        &payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(LoggedIn { token, user })))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/register", post(register))
            .route("/signup", post(signup))
            .route("/login", post(login)),
    )
}

#[cfg(test)]
mod tests {
    use utils::jwt::verify_token;

    use super::*;
    use crate::test_support::{JWT_SECRET, test_deployment};

    fn payload(email: &str, mobile: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Kiran".to_string()),
            email: Some(email.to_string()),
            password: Some("s3cure-pass".to_string()),
            mobile: Some(mobile.to_string()),
            country_code: Some("+91".to_string()),
            country_iso_code: Some("IN".to_string()),
            country_name: Some("India".to_string()),
        }
    }

    #[tokio::test]
    async fn signup_reports_email_failure_and_login_works() {
        let deployment = test_deployment().await;
        let (status, ResponseJson(body)) = signup(
            State(deployment.clone()),
            AppJson(payload("kiran@example.com", "9000000001")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["data"]["emailStatus"], "Email failed");
        assert_eq!(json["data"]["user"]["email"], "kiran@example.com");

        let ResponseJson(body) = login(
            State(deployment),
            AppJson(LoginRequest {
                email: "kiran@example.com".to_string(),
                password: "s3cure-pass".to_string(),
            }),
        )
        .await
        .unwrap();
        let logged_in = body.into_data().unwrap();
        let claims = verify_token(JWT_SECRET, &logged_in.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), logged_in.user.id);
    }

    #[tokio::test]
    async fn register_conflicts_and_validation() {
        let deployment = test_deployment().await;
        let (status, _) = register(
            State(deployment.clone()),
            AppJson(payload("dup@example.com", "9000000002")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let err = register(
            State(deployment.clone()),
            AppJson(payload("other@example.com", "9000000002")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = register(State(deployment), AppJson(payload("x@example.com", "12345")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
