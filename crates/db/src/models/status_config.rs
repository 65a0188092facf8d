use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use uuid::Uuid;

/// One entry of a user's status vocabulary. Only the UI reads these flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfigEntry {
    pub status: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub all_pages: bool,
    #[serde(default)]
    pub todo: bool,
    #[serde(default)]
    pub goals: bool,
    #[serde(default)]
    pub habit: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub is_custom: bool,
}

impl StatusConfigEntry {
    fn builtin(status: &str, icon: &str, enabled: bool) -> Self {
        Self {
            status: status.to_string(),
            icon: icon.to_string(),
            all_pages: enabled,
            todo: enabled,
            goals: enabled,
            habit: enabled,
            enabled,
            is_custom: false,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    pub user_id: Uuid,
    pub statuses: Json<Vec<StatusConfigEntry>>,
    pub updated_at: DateTime<Utc>,
}

impl StatusConfig {
    pub fn default_statuses() -> Vec<StatusConfigEntry> {
        vec![
            StatusConfigEntry::builtin("Done", "✅", true),
            StatusConfigEntry::builtin("In Progress", "⏳", true),
            StatusConfigEntry::builtin("Not Started", "⭕", true),
            StatusConfigEntry::builtin("Not Required", "➖", true),
            StatusConfigEntry::builtin("On Hold", "⏸️", false),
            StatusConfigEntry::builtin("Blocked", "⛔", false),
            StatusConfigEntry::builtin("To Do", "📝", false),
            StatusConfigEntry::builtin("Review", "🔍", false),
            StatusConfigEntry::builtin("Canceled", "❌", false),
            StatusConfigEntry::builtin("Deferred", "📅", false),
            StatusConfigEntry::builtin("In Review", "👀", false),
            StatusConfigEntry::builtin("Pending", "🕒", false),
        ]
    }

    pub async fn find_by_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StatusConfig>("SELECT * FROM status_configs WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert(
        pool: &SqlitePool,
        user_id: Uuid,
        statuses: &[StatusConfigEntry],
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, StatusConfig>(
            r#"INSERT INTO status_configs (user_id, statuses)
               VALUES ($1, $2)
               ON CONFLICT(user_id) DO UPDATE SET
                   statuses = excluded.statuses,
                   updated_at = datetime('now', 'subsec')
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(Json(statuses))
        .fetch_one(pool)
        .await
    }

    /// Returns the stored vocabulary, writing the defaults on first access.
    pub async fn find_or_create_default(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        match Self::find_by_user(pool, user_id).await? {
            Some(config) => Ok(config),
            None => Self::upsert(pool, user_id, &Self::default_statuses()).await,
        }
    }
}
