use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type, types::Json};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::goal::ProgressEntry;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(type_name = "travel_status")]
pub enum TravelStatus {
    #[default]
    #[sqlx(rename = "Yet to plan")]
    #[serde(rename = "Yet to plan")]
    #[strum(serialize = "Yet to plan")]
    YetToPlan,
    #[sqlx(rename = "Ticket Booked")]
    #[serde(rename = "Ticket Booked")]
    #[strum(serialize = "Ticket Booked")]
    TicketBooked,
    Reschedule,
    Completed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ticket_booked: bool,
    pub remarks: String,
    pub progress: Json<Vec<ProgressEntry>>,
    pub status: TravelStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTravelGoal {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub ticket_booked: bool,
    #[serde(default)]
    pub remarks: String,
}

impl TravelGoal {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateTravelGoal,
    ) -> Result<Self, sqlx::Error> {
        // A booked ticket is the first milestone of a trip.
        let status = if data.ticket_booked {
            TravelStatus::TicketBooked
        } else {
            TravelStatus::YetToPlan
        };
        sqlx::query_as::<_, TravelGoal>(
            r#"INSERT INTO travel_goals (id, user_id, destination, start_date, end_date,
                                         ticket_booked, remarks, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.destination.trim())
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.ticket_booked)
        .bind(&data.remarks)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TravelGoal>(
            "SELECT * FROM travel_goals WHERE user_id = $1 ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::db_with_user;

    #[tokio::test]
    async fn booked_ticket_sets_initial_status() {
        let (db, user) = db_with_user().await;
        let payload: CreateTravelGoal = serde_json::from_str(
            r#"{"destination":"Kyoto","startDate":"2025-10-01","endDate":"2025-10-09","ticketBooked":true}"#,
        )
        .unwrap();
        let goal = TravelGoal::create(&db.pool, user.id, &payload).await.unwrap();
        assert_eq!(goal.status, TravelStatus::TicketBooked);
        assert_eq!(goal.remarks, "");

        let all = TravelGoal::find_by_user(&db.pool, user.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            serde_json::to_value(&all[0]).unwrap()["status"],
            "Ticket Booked"
        );
    }
}
