//! Process configuration read from the environment (and `.env`, if present).

use std::{net::SocketAddr, str::FromStr};

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://habitflow.db";
pub const DEFAULT_EMAIL_FROM: &str = "noreply@habitflow.com";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// SMTP relay settings. Present only when both user and password are set.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub smtp: Option<SmtpSettings>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub app_url: String,
    pub enable_scheduler: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or("PORT", get("PORT"), 3001)?;
        let enable_scheduler = match get("ENABLE_SCHEDULER") {
            None => true,
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                key: "ENABLE_SCHEDULER",
                value,
            })?,
        };
        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!(
                "JWT_SECRET not set; generated a random secret, issued tokens end with this process"
            );
            random_secret()
        });

        let smtp = match (get("EMAIL_SERVER_USER"), get("EMAIL_SERVER_PASSWORD")) {
            (Some(user), Some(password)) => Some(SmtpSettings {
                host: get("EMAIL_SERVER_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: parse_or("EMAIL_SERVER_PORT", get("EMAIL_SERVER_PORT"), DEFAULT_SMTP_PORT)?,
                user,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            app_url: get("APP_URL").unwrap_or_else(|| format!("http://{host}:{port}")),
            host,
            port,
            jwt_secret,
            smtp,
            resend_api_key: get("RESEND_API_KEY"),
            email_from: get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            enable_scheduler,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = format!("{}:{}", self.host, self.port);
        value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key: "HOST", value })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3001");
        assert_eq!(config.email_from, DEFAULT_EMAIL_FROM);
        assert_eq!(config.app_url, "http://127.0.0.1:3001");
        assert!(config.enable_scheduler);
        assert!(config.resend_api_key.is_none());
        assert!(config.smtp.is_none());
        assert!(!config.jwt_secret.is_empty());
    }

    #[test]
    fn values_are_read_and_checked() {
        let config = load(&[
            ("PORT", "8080"),
            ("ENABLE_SCHEDULER", "off"),
            ("RESEND_API_KEY", " re_123 "),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.enable_scheduler);
        assert_eq!(config.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(config.jwt_secret, "s3cret");

        let err = load(&[("PORT", "http")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: 'http'");
    }

    #[test]
    fn smtp_needs_user_and_password() {
        let config = load(&[("EMAIL_SERVER_USER", "mailer")]).unwrap();
        assert!(config.smtp.is_none());

        let config = load(&[
            ("EMAIL_SERVER_USER", "mailer"),
            ("EMAIL_SERVER_PASSWORD", "app-password"),
        ])
        .unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, DEFAULT_SMTP_HOST);
        assert_eq!(smtp.port, DEFAULT_SMTP_PORT);
        assert!(!format!("{smtp:?}").contains("app-password"));

        let config = load(&[
            ("EMAIL_SERVER_HOST", "smtp.example.com"),
            ("EMAIL_SERVER_PORT", "465"),
            ("EMAIL_SERVER_USER", "mailer"),
            ("EMAIL_SERVER_PASSWORD", "app-password"),
        ])
        .unwrap();
        assert_eq!(config.smtp.unwrap().port, 465);
    }
}
