pub mod error;
pub mod extract;
pub mod routes;

pub type DeploymentImpl = deployment::LocalDeployment;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use db::DBService;
    use services::services::{
        auth::{RegisterRequest, register},
        config::Config,
        email::UnconfiguredEmail,
    };
    use uuid::Uuid;

    use crate::{DeploymentImpl, extract::AuthUser};

    pub const JWT_SECRET: &str = "test-secret";

    pub async fn test_deployment() -> DeploymentImpl {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            "ENABLE_SCHEDULER" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let db = DBService::new_in_memory().await.unwrap();
        DeploymentImpl::from_parts(db, config, Arc::new(UnconfiguredEmail))
    }

    /// Registers a fresh account and returns it as an authenticated caller.
    pub async fn auth_user(deployment: &DeploymentImpl) -> AuthUser {
        use deployment::Deployment;

        let email = format!("user-{}@example.com", Uuid::new_v4().simple());
        let mobile: String = Uuid::new_v4()
            .as_u128()
            .to_string()
            .chars()
            .take(10)
            .collect();
        let user = register(
            &deployment.db().pool,
            &RegisterRequest {
                name: Some("Test User".to_string()),
                email: Some(email),
                password: Some("password123".to_string()),
                mobile: Some(mobile),
                country_code: Some("+91".to_string()),
                country_iso_code: Some("IN".to_string()),
                country_name: Some("India".to_string()),
            },
        )
        .await
        .unwrap();
        AuthUser {
            user_id: user.id,
            email: user.email,
        }
    }
}
