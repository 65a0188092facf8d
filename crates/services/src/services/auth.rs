//! Account registration, signup and password login.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use db::models::user::{CreateUser, User};
use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::task;
use tracing::info;
use utils::jwt::{TokenError, issue_token};

use super::email::{EmailDelivery, EmailSender, send_welcome_email};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 50;
const INDIA_DIAL_CODE: &str = "+91";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static INDIAN_MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid mobile regex"));

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("An account with this email or mobile already exists")]
    AccountExists,
    #[error("User already exists")]
    UserExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<password_hash::Error> for AuthError {
    fn from(err: password_hash::Error) -> Self {
        Self::Hashing(err.to_string())
    }
}

impl From<task::JoinError> for AuthError {
    fn from(err: task::JoinError) -> Self {
        Self::Hashing(err.to_string())
    }
}

/// Argon2id hash in PHC string form. Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await?
    .map_err(AuthError::from)
}

/// `Ok(false)` on a wrong password; a stored hash that does not parse is an error.
pub async fn verify_password(password: String, encoded: String) -> Result<bool, AuthError> {
    task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&encoded)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    })
    .await?
    .map_err(AuthError::from)
}

/// Body of both account creation endpoints. Signup additionally requires
/// the country ISO code and name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
    pub country_code: Option<String>,
    pub country_iso_code: Option<String>,
    pub country_name: Option<String>,
}

fn field(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

struct ValidAccount {
    name: String,
    email: String,
    password: String,
    mobile: String,
    country_code: String,
    country_iso_code: Option<String>,
    country_name: Option<String>,
}

impl RegisterRequest {
    fn validate(
        &self,
        require_country: bool,
        missing_message: &str,
    ) -> Result<ValidAccount, AuthError> {
        let country_iso_code = field(&self.country_iso_code);
        let country_name = field(&self.country_name);
        // Passwords are kept exactly as typed.
        let password = self.password.clone().filter(|p| !p.is_empty());
        let (Some(name), Some(email), Some(password), Some(mobile), Some(country_code)) = (
            field(&self.name),
            field(&self.email),
            password,
            field(&self.mobile),
            field(&self.country_code),
        ) else {
            return Err(AuthError::Validation(missing_message.to_string()));
        };
        if require_country && (country_iso_code.is_none() || country_name.is_none()) {
            return Err(AuthError::Validation(missing_message.to_string()));
        }

        if name.chars().count() > MAX_NAME_LEN {
            return Err(AuthError::Validation(format!(
                "Name cannot be more than {MAX_NAME_LEN} characters"
            )));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(AuthError::Validation(
                "Please provide a valid email address".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        if country_code == INDIA_DIAL_CODE && !INDIAN_MOBILE_RE.is_match(&mobile) {
            return Err(AuthError::Validation(
                "Mobile number must be 10 digits for India".to_string(),
            ));
        }

        Ok(ValidAccount {
            name,
            email: email.to_lowercase(),
            password,
            mobile,
            country_code,
            country_iso_code,
            country_name,
        })
    }
}

impl ValidAccount {
    async fn create(self, pool: &SqlitePool) -> Result<User, AuthError> {
        let password_hash = hash_password(self.password).await?;
        let user = User::create(
            pool,
            &CreateUser {
                name: self.name,
                email: self.email,
                password_hash,
                mobile: self.mobile,
                country_code: self.country_code,
                country_iso_code: self.country_iso_code,
                country_name: self.country_name,
            },
        )
        .await?;
        info!(user_id = %user.id, "Account created");
        Ok(user)
    }
}

/// Create an account. Email and mobile must both be unused.
pub async fn register(pool: &SqlitePool, request: &RegisterRequest) -> Result<User, AuthError> {
    let account = request.validate(false, "Please provide all required fields")?;
    if User::find_by_email_or_mobile(pool, &account.email, &account.mobile)
        .await?
        .is_some()
    {
        return Err(AuthError::AccountExists);
    }
    account.create(pool).await
}

/// Create an account with full country details and send the welcome email.
/// Email failures are reported in the returned delivery, never raised.
pub async fn signup(
    pool: &SqlitePool,
    email_sender: &dyn EmailSender,
    email_from: &str,
    app_url: &str,
    request: &RegisterRequest,
) -> Result<(User, EmailDelivery), AuthError> {
    let account = request.validate(true, "Missing required fields")?;
    if User::find_by_email(pool, &account.email).await?.is_some() {
        return Err(AuthError::UserExists);
    }
    let user = account.create(pool).await?;
    let delivery =
        send_welcome_email(email_sender, email_from, &user.email, &user.name, app_url).await;
    Ok((user, delivery))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Check credentials and issue a bearer token.
pub async fn login(
    pool: &SqlitePool,
    jwt_secret: &str,
    request: &LoginRequest,
) -> Result<(String, User), AuthError> {
    let user = User::find_by_email(pool, request.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(request.password.clone(), user.password_hash.clone()).await? {
        return Err(AuthError::InvalidCredentials);
    }
    let token = issue_token(jwt_secret, user.id, &user.email)?;
    info!(user_id = %user.id, "User logged in");
    Ok((token, user))
}
