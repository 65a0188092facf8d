use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(type_name = "weight_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(type_name = "weight_goal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeightGoalStatus {
    #[default]
    Ongoing,
    Achieved,
    NotAchieved,
    Discarded,
}

impl WeightGoalStatus {
    /// Any status other than `ongoing` archives the goal.
    pub fn is_archived(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightLog {
    pub date: NaiveDate,
    pub weight: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub age: i64,
    pub height: f64,
    pub start_weight: f64,
    pub target_weight: f64,
    pub target_date: NaiveDate,
    pub unit: WeightUnit,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub logs: Json<Vec<WeightLog>>,
    pub status: WeightGoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWeightGoal {
    pub age: i64,
    pub height: f64,
    pub start_weight: f64,
    pub target_weight: f64,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub unit: WeightUnit,
    pub start_date: Option<NaiveDate>,
}

impl WeightGoal {
    /// Most recent log by date; later entries win ties.
    pub fn latest_log(&self) -> Option<&WeightLog> {
        self.logs
            .iter()
            .enumerate()
            .max_by_key(|(index, log)| (log.date, *index))
            .map(|(_, log)| log)
    }

    pub fn current_weight(&self) -> f64 {
        self.latest_log().map_or(self.start_weight, |log| log.weight)
    }

    /// Share of the planned change already achieved:
    /// `(start - current) / (start - target)`. `None` when start equals target.
    pub fn percent_to_goal(&self) -> Option<f64> {
        let planned = self.start_weight - self.target_weight;
        if planned.abs() < f64::EPSILON {
            return None;
        }
        Some((self.start_weight - self.current_weight()) / planned)
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateWeightGoal,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WeightGoal>(
            r#"INSERT INTO weight_goals (id, user_id, age, height, start_weight, target_weight,
                                         target_date, unit, start_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.age)
        .bind(data.height)
        .bind(data.start_weight)
        .bind(data.target_weight)
        .bind(data.target_date)
        .bind(data.unit)
        .bind(data.start_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeightGoal>("SELECT * FROM weight_goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeightGoal>(
            "SELECT * FROM weight_goals WHERE user_id = $1 ORDER BY target_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_active_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeightGoal>(
            "SELECT * FROM weight_goals WHERE user_id = $1 AND is_active = 1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_latest_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WeightGoal>(
            "SELECT * FROM weight_goals WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn save(pool: &SqlitePool, goal: &Self) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WeightGoal>(
            r#"UPDATE weight_goals
               SET age = $2, height = $3, start_weight = $4, target_weight = $5, target_date = $6,
                   unit = $7, is_active = $8, start_date = $9, logs = $10, status = $11,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(goal.id)
        .bind(goal.age)
        .bind(goal.height)
        .bind(goal.start_weight)
        .bind(goal.target_weight)
        .bind(goal.target_date)
        .bind(goal.unit)
        .bind(goal.is_active)
        .bind(goal.start_date)
        .bind(&goal.logs)
        .bind(goal.status)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM weight_goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
