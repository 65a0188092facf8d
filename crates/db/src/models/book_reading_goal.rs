use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use uuid::Uuid;

use super::goal::{GoalStatus, ProgressEntry};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReadingGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_title: String,
    pub author: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub progress: Json<Vec<ProgressEntry>>,
    pub status: GoalStatus,
    pub task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookReadingGoal {
    pub book_title: String,
    pub author: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BookReadingGoal {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateBookReadingGoal,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BookReadingGoal>(
            r#"INSERT INTO book_reading_goals (id, user_id, book_title, author, start_date, end_date)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.book_title.trim())
        .bind(&data.author)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookReadingGoal>("SELECT * FROM book_reading_goals WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookReadingGoal>(
            "SELECT * FROM book_reading_goals WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookReadingGoal>(
            "SELECT * FROM book_reading_goals WHERE user_id = $1 ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Active goals whose date range includes `day`.
    pub async fn find_active_covering(
        pool: &SqlitePool,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookReadingGoal>(
            r#"SELECT * FROM book_reading_goals
               WHERE user_id = $1 AND status = 'Active' AND start_date <= $2 AND end_date >= $2"#,
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(pool)
        .await
    }

    pub async fn save(pool: &SqlitePool, goal: &Self) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BookReadingGoal>(
            r#"UPDATE book_reading_goals
               SET book_title = $2, author = $3, start_date = $4, end_date = $5, progress = $6,
                   status = $7, task_id = $8, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(goal.id)
        .bind(&goal.book_title)
        .bind(&goal.author)
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(&goal.progress)
        .bind(goal.status)
        .bind(goal.task_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM book_reading_goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
