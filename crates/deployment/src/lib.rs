//! Wiring of the long-lived pieces every request handler needs.

use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use services::services::{
    config::{Config, ConfigError},
    email::{self, EmailError, EmailSender},
    task_rollover::TaskRolloverService,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Email(#[from] EmailError),
}

#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn db(&self) -> &DBService;

    fn config(&self) -> &Config;

    fn email(&self) -> &dyn EmailSender;

    /// Start the background jobs this deployment runs, if any.
    async fn spawn_background_jobs(&self) -> Option<JoinHandle<()>> {
        if !self.config().enable_scheduler {
            info!("Task rollover scheduler disabled");
            return None;
        }
        Some(TaskRolloverService::spawn(self.db().clone()).await)
    }
}

/// Single-process deployment backed by a local SQLite file.
#[derive(Clone)]
pub struct LocalDeployment {
    db: DBService,
    config: Arc<Config>,
    email: Arc<dyn EmailSender>,
}

impl LocalDeployment {
    pub fn from_parts(db: DBService, config: Config, email: Arc<dyn EmailSender>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            email,
        }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env()?;
        let db = DBService::new(&config.database_url).await?;
        let email = email::sender_for(&config)?;
        Ok(Self::from_parts(db, config, email))
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn email(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use services::services::email::UnconfiguredEmail;

    use super::*;

    #[tokio::test]
    async fn scheduler_can_be_disabled() {
        let config = Config::from_lookup(|key| match key {
            "ENABLE_SCHEDULER" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let db = DBService::new_in_memory().await.unwrap();
        let deployment = LocalDeployment::from_parts(db, config, Arc::new(UnconfiguredEmail));
        assert!(deployment.spawn_background_jobs().await.is_none());
    }

    #[test]
    fn missing_credentials_fall_back_to_unconfigured_sender() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(email::sender_for(&config).is_ok());
    }
}
