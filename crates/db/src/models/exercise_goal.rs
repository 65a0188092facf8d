use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::goal::{GoalStatus, ProgressEntry};

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(type_name = "measurement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MeasurementType {
    Repsets,
    Minutes,
    Seconds,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_name: String,
    pub frequency: String,
    pub measurement_type: MeasurementType,
    pub rep: Option<i64>,
    #[serde(rename = "set")]
    pub sets: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
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
pub struct CreateExerciseGoal {
    pub exercise_name: String,
    pub frequency: Option<String>,
    pub measurement_type: MeasurementType,
    pub rep: Option<i64>,
    #[serde(rename = "set")]
    pub sets: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ExerciseGoal {
    /// Description put on the goal's daily tasks, e.g. `10 reps × 3 sets`.
    pub fn daily_description(&self) -> String {
        fn or_dash(value: Option<i64>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }
        match self.measurement_type {
            MeasurementType::Repsets => {
                format!("{} reps × {} sets", or_dash(self.rep), or_dash(self.sets))
            }
            MeasurementType::Minutes => format!("{} min", or_dash(self.minutes)),
            MeasurementType::Seconds => format!("{} sec", or_dash(self.seconds)),
        }
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateExerciseGoal,
    ) -> Result<Self, sqlx::Error> {
        let frequency = data.frequency.clone().unwrap_or_else(|| "daily".to_string());
        sqlx::query_as::<_, ExerciseGoal>(
            r#"INSERT INTO exercise_goals (id, user_id, exercise_name, frequency, measurement_type,
                                           rep, sets, minutes, seconds, start_date, end_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.exercise_name.trim())
        .bind(frequency)
        .bind(data.measurement_type)
        .bind(data.rep)
        .bind(data.sets)
        .bind(data.minutes)
        .bind(data.seconds)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseGoal>("SELECT * FROM exercise_goals WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseGoal>(
            "SELECT * FROM exercise_goals WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseGoal>(
            "SELECT * FROM exercise_goals WHERE user_id = $1 ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_active_covering(
        pool: &SqlitePool,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ExerciseGoal>(
            r#"SELECT * FROM exercise_goals
               WHERE user_id = $1 AND status = 'Active' AND start_date <= $2 AND end_date >= $2"#,
        )
        .bind(user_id)
        .bind(day)
        .fetch_all(pool)
        .await
    }

    pub async fn save(pool: &SqlitePool, goal: &Self) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ExerciseGoal>(
            r#"UPDATE exercise_goals
               SET exercise_name = $2, frequency = $3, measurement_type = $4, rep = $5, sets = $6,
                   minutes = $7, seconds = $8, start_date = $9, end_date = $10, progress = $11,
                   status = $12, task_id = $13, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(goal.id)
        .bind(&goal.exercise_name)
        .bind(&goal.frequency)
        .bind(goal.measurement_type)
        .bind(goal.rep)
        .bind(goal.sets)
        .bind(goal.minutes)
        .bind(goal.seconds)
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(&goal.progress)
        .bind(goal.status)
        .bind(goal.task_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM exercise_goals WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::db_with_user;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plank(measurement_type: MeasurementType) -> CreateExerciseGoal {
        CreateExerciseGoal {
            exercise_name: "Plank".to_string(),
            frequency: None,
            measurement_type,
            rep: Some(10),
            sets: None,
            minutes: Some(5),
            seconds: Some(45),
            start_date: day("2025-05-01"),
            end_date: day("2025-05-07"),
        }
    }

    #[tokio::test]
    async fn create_defaults_to_daily_active() {
        let (db, user) = db_with_user().await;
        let goal = ExerciseGoal::create(&db.pool, user.id, &plank(MeasurementType::Seconds))
            .await
            .unwrap();
        assert_eq!(goal.frequency, "daily");
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.daily_description(), "45 sec");
    }

    #[tokio::test]
    async fn description_marks_missing_counts() {
        let (db, user) = db_with_user().await;
        let goal = ExerciseGoal::create(&db.pool, user.id, &plank(MeasurementType::Repsets))
            .await
            .unwrap();
        assert_eq!(goal.daily_description(), "10 reps × - sets");
    }

    #[test]
    fn payload_uses_set_field_name() {
        let payload: CreateExerciseGoal = serde_json::from_str(
            r#"{"exerciseName":"Squat","measurementType":"repsets","rep":12,"set":3,
                "startDate":"2025-05-01","endDate":"2025-05-07"}"#,
        )
        .unwrap();
        assert_eq!(payload.sets, Some(3));
        assert_eq!(payload.measurement_type, MeasurementType::Repsets);
    }
}
