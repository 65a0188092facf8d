use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub mobile: String,
    pub country_code: String,
    pub country_iso_code: Option<String>,
    pub country_name: Option<String>,
    pub categories: Json<Vec<String>>,
    pub priorities: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile: String,
    pub country_code: String,
    pub country_iso_code: Option<String>,
    pub country_name: Option<String>,
}

impl User {
    pub async fn create(pool: &SqlitePool, data: &CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, name, email, password_hash, mobile, country_code,
                                  country_iso_code, country_name)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.email.to_lowercase())
        .bind(&data.password_hash)
        .bind(&data.mobile)
        .bind(&data.country_code)
        .bind(&data.country_iso_code)
        .bind(&data.country_name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email_or_mobile(
        pool: &SqlitePool,
        email: &str,
        mobile: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 OR mobile = $2 LIMIT 1")
            .bind(email.to_lowercase())
            .bind(mobile)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_preferences(
        pool: &SqlitePool,
        id: Uuid,
        categories: &[String],
        priorities: &[String],
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET categories = $2, priorities = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(Json(categories))
        .bind(Json(priorities))
        .fetch_optional(pool)
        .await
    }

    pub async fn all_ids(pool: &SqlitePool) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM users")
            .fetch_all(pool)
            .await
    }
}
