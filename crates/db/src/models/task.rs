use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::goal::GoalKind;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(type_name = "task_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TaskCategory {
    Work,
    Personal,
    Health,
    Learning,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(type_name = "scheduled_for", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScheduledFor {
    #[default]
    Today,
    Tomorrow,
}

/// Task statuses the service itself reads or writes. Users may store any
/// other label from their status vocabulary, so `Task::status` stays text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
    Achieved,
    Completed,
    NotRequired,
    NotDone,
    Missed,
}

impl TaskStatus {
    pub fn parse(status: &str) -> Option<Self> {
        status.trim().parse().ok()
    }

    /// Counts as a finished day for goal progress.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Done | Self::Achieved | Self::Completed)
    }

    /// Counts as a deliberately skipped day.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::NotRequired | Self::NotDone)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub status: String,
    pub date: NaiveDate,
    pub scheduled_for: ScheduledFor,
    pub pending_since: Option<DateTime<Utc>>,
    pub is_auto_copied: bool,
    pub goal_id: Option<Uuid>,
    pub goal_type: Option<GoalKind>,
    pub goal_flag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub status: TaskStatus,
    pub date: NaiveDate,
    pub scheduled_for: ScheduledFor,
    pub is_auto_copied: bool,
    pub goal_id: Option<Uuid>,
    pub goal_type: Option<GoalKind>,
}

impl CreateTask {
    pub fn new(
        user_id: Uuid,
        title: String,
        description: Option<String>,
        priority: TaskPriority,
        category: TaskCategory,
        date: NaiveDate,
        scheduled_for: ScheduledFor,
    ) -> Self {
        Self {
            user_id,
            title,
            description,
            priority,
            category,
            status: TaskStatus::NotStarted,
            date,
            scheduled_for,
            is_auto_copied: false,
            goal_id: None,
            goal_type: None,
        }
    }

    /// A daily task owned by a goal.
    pub fn for_goal(
        user_id: Uuid,
        kind: GoalKind,
        goal_id: Uuid,
        title: String,
        description: Option<String>,
        date: NaiveDate,
        scheduled_for: ScheduledFor,
    ) -> Self {
        Self {
            goal_id: Some(goal_id),
            goal_type: Some(kind),
            ..Self::new(
                user_id,
                title,
                description,
                kind.task_priority(),
                kind.task_category(),
                date,
                scheduled_for,
            )
        }
    }

    /// The not-started copy placed on tomorrow's list when a task is started.
    pub fn carry_over(task: &Task, tomorrow: NaiveDate) -> Self {
        Self {
            is_auto_copied: true,
            ..Self::new(
                task.user_id,
                task.title.clone(),
                task.description.clone(),
                task.priority,
                task.category,
                tomorrow,
                ScheduledFor::Tomorrow,
            )
        }
    }
}

impl Task {
    pub fn status_kind(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }

    pub async fn create(pool: &SqlitePool, data: &CreateTask) -> Result<Self, sqlx::Error> {
        let goal_flag = data.goal_type.map(|kind| kind.task_flag());
        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (id, user_id, title, description, priority, category, status, date,
                                  scheduled_for, is_auto_copied, goal_id, goal_type, goal_flag)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority)
        .bind(data.category)
        .bind(data.status.to_string())
        .bind(data.date)
        .bind(data.scheduled_for)
        .bind(data.is_auto_copied)
        .bind(data.goal_id)
        .bind(data.goal_type)
        .bind(goal_flag)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Every task linked to a goal, oldest day first.
    pub async fn find_by_goal(
        pool: &SqlitePool,
        goal_id: Uuid,
        kind: GoalKind,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE goal_id = $1 AND goal_type = $2 ORDER BY date ASC, rowid ASC",
        )
        .bind(goal_id)
        .bind(kind)
        .fetch_all(pool)
        .await
    }

    pub async fn exists_for_goal_on(
        pool: &SqlitePool,
        goal_id: Uuid,
        kind: GoalKind,
        date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE goal_id = $1 AND goal_type = $2 AND date = $3",
        )
        .bind(goal_id)
        .bind(kind)
        .bind(date)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn find_tomorrow_by_title(
        pool: &SqlitePool,
        user_id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE user_id = $1 AND title = $2 AND scheduled_for = 'tomorrow' LIMIT 1",
        )
        .bind(user_id)
        .bind(title)
        .fetch_optional(pool)
        .await
    }

    /// Persist every mutable field of `task`. `scheduled_for` is written as
    /// given; callers decide whether it may change.
    pub async fn update(pool: &SqlitePool, task: &Task) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET title = $2, description = $3, priority = $4, category = $5, status = $6,
                   date = $7, scheduled_for = $8, pending_since = $9, is_auto_copied = $10,
                   goal_id = $11, goal_type = $12, goal_flag = $13,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.category)
        .bind(&task.status)
        .bind(task.date)
        .bind(task.scheduled_for)
        .bind(task.pending_since)
        .bind(task.is_auto_copied)
        .bind(task.goal_id)
        .bind(task.goal_type)
        .bind(&task.goal_flag)
        .fetch_one(pool)
        .await
    }

    pub async fn delete_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>("DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Remove the auto-copied carry-overs of `title` from tomorrow's list.
    pub async fn delete_tomorrow_copies(
        pool: &SqlitePool,
        user_id: Uuid,
        title: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM tasks WHERE user_id = $1 AND title = $2 AND scheduled_for = 'tomorrow' AND is_auto_copied = 1",
        )
        .bind(user_id)
        .bind(title)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a goal's tasks dated on or after `from`.
    pub async fn delete_goal_tasks_from(
        pool: &SqlitePool,
        goal_id: Uuid,
        kind: GoalKind,
        from: NaiveDate,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM tasks WHERE goal_id = $1 AND goal_type = $2 AND date >= $3")
                .bind(goal_id)
                .bind(kind)
                .bind(from)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_goal(
        pool: &SqlitePool,
        goal_id: Uuid,
        kind: GoalKind,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE goal_id = $1 AND goal_type = $2")
            .bind(goal_id)
            .bind(kind)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Tasks left unfinished on an earlier day become `missed` and move to
    /// `today`. Returns the rows that changed.
    pub async fn mark_overdue_missed(
        pool: &SqlitePool,
        today: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
               SET status = 'missed', date = $1, updated_at = datetime('now', 'subsec')
               WHERE scheduled_for = 'today'
                 AND status IN ('in-progress', 'not-started')
                 AND date < $1
               RETURNING *"#,
        )
        .bind(today)
        .fetch_all(pool)
        .await
    }

    /// Move everything scheduled for tomorrow onto `today`.
    pub async fn promote_tomorrow(pool: &SqlitePool, today: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE tasks
               SET scheduled_for = 'today', date = $1, updated_at = datetime('now', 'subsec')
               WHERE scheduled_for = 'tomorrow'"#,
        )
        .bind(today)
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

    fn plain(
        user_id: Uuid,
        title: &str,
        date: NaiveDate,
        scheduled_for: ScheduledFor,
    ) -> CreateTask {
        CreateTask::new(
            user_id,
            title.to_string(),
            None,
            TaskPriority::Medium,
            TaskCategory::Work,
            date,
            scheduled_for,
        )
    }

    #[test]
    fn status_classification_ignores_case() {
        assert_eq!(TaskStatus::parse("DONE"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("In-Progress"), Some(TaskStatus::InProgress));
        assert!(TaskStatus::parse("Achieved").unwrap().is_completed());
        assert!(TaskStatus::parse("not-done").unwrap().is_skipped());
        assert_eq!(TaskStatus::parse("on hold"), None);
        assert_eq!(TaskStatus::NotStarted.to_string(), "not-started");
    }

    #[tokio::test]
    async fn create_sets_defaults_and_goal_flag() {
        let (db, user) = db_with_user().await;
        let goal_id = Uuid::new_v4();
        let task = Task::create(
            &db.pool,
            &CreateTask::for_goal(
                user.id,
                GoalKind::Exercise,
                goal_id,
                "Push-ups".to_string(),
                None,
                day("2025-05-01"),
                ScheduledFor::Today,
            ),
        )
        .await
        .unwrap();

        assert_eq!(task.status, "not-started");
        assert_eq!(task.category, TaskCategory::Health);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.goal_flag.as_deref(), Some("Exercise - Goal"));
        assert!(
            Task::exists_for_goal_on(&db.pool, goal_id, GoalKind::Exercise, day("2025-05-01"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn overlong_title_is_rejected_by_schema() {
        let (db, user) = db_with_user().await;
        let err = Task::create(
            &db.pool,
            &plain(user.id, &"x".repeat(101), day("2025-05-01"), ScheduledFor::Today),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, sqlx::Error::Database(ref e) if e.is_check_violation()));
    }

    #[tokio::test]
    async fn overdue_unfinished_tasks_become_missed() {
        let (db, user) = db_with_user().await;
        let today = day("2025-05-10");
        let yesterday = day("2025-05-09");
        let stale = Task::create(&db.pool, &plain(user.id, "stale", yesterday, ScheduledFor::Today))
            .await
            .unwrap();
        let mut finished =
            Task::create(&db.pool, &plain(user.id, "finished", yesterday, ScheduledFor::Today))
                .await
                .unwrap();
        finished.status = "done".to_string();
        Task::update(&db.pool, &finished).await.unwrap();
        Task::create(&db.pool, &plain(user.id, "current", today, ScheduledFor::Today))
            .await
            .unwrap();

        let missed = Task::mark_overdue_missed(&db.pool, today).await.unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, stale.id);
        assert_eq!(missed[0].status, "missed");
        assert_eq!(missed[0].date, today);

        // Second run finds nothing left to move.
        assert!(Task::mark_overdue_missed(&db.pool, today).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tomorrow_tasks_are_promoted() {
        let (db, user) = db_with_user().await;
        let today = day("2025-05-10");
        let task = Task::create(&db.pool, &plain(user.id, "later", today, ScheduledFor::Tomorrow))
            .await
            .unwrap();

        assert_eq!(Task::promote_tomorrow(&db.pool, today).await.unwrap(), 1);
        let task = Task::find_by_id(&db.pool, task.id).await.unwrap().unwrap();
        assert_eq!(task.scheduled_for, ScheduledFor::Today);
        assert_eq!(task.date, today);
    }

    #[tokio::test]
    async fn deleting_tomorrow_copies_keeps_manual_tasks() {
        let (db, user) = db_with_user().await;
        let today = day("2025-05-10");
        let source = Task::create(&db.pool, &plain(user.id, "Write", today, ScheduledFor::Today))
            .await
            .unwrap();
        Task::create(&db.pool, &CreateTask::carry_over(&source, day("2025-05-11")))
            .await
            .unwrap();
        Task::create(&db.pool, &plain(user.id, "Write", day("2025-05-11"), ScheduledFor::Tomorrow))
            .await
            .unwrap();

        assert_eq!(Task::delete_tomorrow_copies(&db.pool, user.id, "Write").await.unwrap(), 1);
        assert!(Task::find_tomorrow_by_title(&db.pool, user.id, "Write").await.unwrap().is_some());
    }
}
