//! Task creation and update rules shared by the HTTP layer.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use db::models::task::{CreateTask, ScheduledFor, Task, TaskCategory, TaskPriority, TaskStatus};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use utils::dates::tomorrow_of;
use uuid::Uuid;

use super::goal_sync::{self, GoalSyncError, TrackedGoal};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },
    #[error("Task not found for this user.")]
    NotFound,
    #[error(transparent)]
    GoalSync(#[from] GoalSyncError),
}

impl TaskError {
    fn invalid(message: &str, detail: impl Into<String>) -> Self {
        Self::Validation {
            message: message.to_string(),
            details: vec![detail.into()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub scheduled_for: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_choice<T: FromStr>(field: &str, value: &str, allowed: &str) -> Result<T, TaskError> {
    T::from_str(value).map_err(|_| {
        TaskError::invalid(
            &format!("Invalid {field}"),
            format!("{field} must be one of: {allowed}"),
        )
    })
}

fn check_lengths(title: &str, description: Option<&str>) -> Result<(), TaskError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TaskError::invalid(
            "Validation failed",
            format!("Title cannot be more than {MAX_TITLE_LEN} characters"),
        ));
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(TaskError::invalid(
            "Validation failed",
            format!("Description cannot be more than {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

impl NewTaskRequest {
    /// Validate and normalise a client request into a task dated `today`.
    pub fn validate(&self, user_id: Uuid, today: NaiveDate) -> Result<CreateTask, TaskError> {
        let title = present(&self.title);
        let category = present(&self.category);
        let priority = present(&self.priority);
        let scheduled_for = present(&self.scheduled_for);

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("Title is required".to_string());
        }
        if category.is_none() {
            missing.push("Category is required".to_string());
        }
        if priority.is_none() {
            missing.push("Priority is required".to_string());
        }
        if scheduled_for.is_none() {
            missing.push("scheduledFor is required".to_string());
        }
        let (Some(title), Some(category), Some(priority), Some(scheduled_for)) =
            (title, category, priority, scheduled_for)
        else {
            return Err(TaskError::Validation {
                message: "Validation failed".to_string(),
                details: missing,
            });
        };

        let category: TaskCategory =
            parse_choice("category", category, "work, personal, health, learning")?;
        let priority: TaskPriority = parse_choice("priority", priority, "low, medium, high")?;
        let scheduled_for: ScheduledFor =
            parse_choice("scheduledFor", scheduled_for, "today, tomorrow")?;
        let description = present(&self.description);
        check_lengths(title, description)?;

        Ok(CreateTask::new(
            user_id,
            title.to_string(),
            description.map(str::to_string),
            priority,
            category,
            today,
            scheduled_for,
        ))
    }
}

/// Fields a client may change on an existing task. `scheduledFor` is not
/// among them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub date: Option<NaiveDate>,
}

pub async fn create_task(
    pool: &SqlitePool,
    user_id: Uuid,
    request: &NewTaskRequest,
    today: NaiveDate,
) -> Result<Task, TaskError> {
    let data = request.validate(user_id, today)?;
    let task = Task::create(pool, &data).await?;
    debug!(task_id = %task.id, user_id = %user_id, "Task created");
    Ok(task)
}

/// Apply `patch` and its status side effects, then reconcile the owning goal.
pub async fn update_task(
    pool: &SqlitePool,
    user_id: Uuid,
    task_id: Uuid,
    patch: &TaskPatch,
    today: NaiveDate,
) -> Result<(Task, Option<TrackedGoal>), TaskError> {
    let current = Task::find_by_id_for_user(pool, task_id, user_id)
        .await?
        .ok_or(TaskError::NotFound)?;
    let mut task = current.clone();

    if let Some(title) = present(&patch.title) {
        task.title = title.to_string();
    }
    if let Some(description) = &patch.description {
        task.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
    }
    if let Some(priority) = present(&patch.priority) {
        task.priority = parse_choice("priority", priority, "low, medium, high")?;
    }
    if let Some(category) = present(&patch.category) {
        task.category = parse_choice("category", category, "work, personal, health, learning")?;
    }
    if let Some(date) = patch.date {
        task.date = date;
    }
    check_lengths(&task.title, task.description.as_deref())?;

    let new_status = present(&patch.status).filter(|s| *s != current.status);
    if let Some(status) = new_status {
        task.status = status.to_string();
        apply_status_side_effects(pool, &current, &mut task, today).await?;
    }

    let task = Task::update(pool, &task).await?;
    let goal = match new_status {
        Some(_) => goal_sync::sync_task_goal(pool, &task, today).await?,
        None => None,
    };
    Ok((task, goal))
}

async fn apply_status_side_effects(
    pool: &SqlitePool,
    current: &Task,
    task: &mut Task,
    today: NaiveDate,
) -> Result<(), sqlx::Error> {
    let status = task.status_kind();
    match status {
        Some(TaskStatus::InProgress) => {
            if Task::find_tomorrow_by_title(pool, task.user_id, &current.title)
                .await?
                .is_none()
            {
                let copy =
                    Task::create(pool, &CreateTask::carry_over(current, tomorrow_of(today)))
                        .await?;
                info!(task_id = %current.id, copy_id = %copy.id, "Carried task over to tomorrow");
            }
        }
        Some(TaskStatus::Achieved | TaskStatus::NotRequired) => {
            let removed = Task::delete_tomorrow_copies(pool, task.user_id, &current.title).await?;
            if removed > 0 {
                debug!(task_id = %current.id, removed, "Removed tomorrow's carried-over copies");
            }
        }
        _ => {}
    }

    if status == Some(TaskStatus::NotStarted) {
        if current.pending_since.is_none() {
            task.pending_since = Some(Utc::now());
        }
    } else {
        task.pending_since = None;
    }
    Ok(())
}

pub async fn delete_task(
    pool: &SqlitePool,
    user_id: Uuid,
    task_id: Uuid,
) -> Result<Task, TaskError> {
    Task::delete_for_user(pool, task_id, user_id)
        .await?
        .ok_or(TaskError::NotFound)
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::user::{CreateUser, User},
    };
    use utils::dates::parse_day;

    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    async fn setup() -> (DBService, User) {
        let db = DBService::new_in_memory().await.unwrap();
        let user = User::create(
            &db.pool,
            &CreateUser {
                name: "Lena".to_string(),
                email: "lena@example.com".to_string(),
                password_hash: "hash".to_string(),
                mobile: "4915112345".to_string(),
                country_code: "+49".to_string(),
                country_iso_code: Some("DE".to_string()),
                country_name: Some("Germany".to_string()),
            },
        )
        .await
        .unwrap();
        (db, user)
    }

    fn request(title: &str) -> NewTaskRequest {
        NewTaskRequest {
            title: Some(title.to_string()),
            description: Some("  notes  ".to_string()),
            priority: Some("HIGH".to_string()),
            category: Some("Work".to_string()),
            scheduled_for: Some("today".to_string()),
        }
    }

    #[test]
    fn validation_lists_every_missing_field() {
        let err = NewTaskRequest::default()
            .validate(Uuid::new_v4(), d("2025-05-01"))
            .unwrap_err();
        match err {
            TaskError::Validation { message, details } => {
                assert_eq!(message, "Validation failed");
                assert_eq!(details.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation_normalises_case_and_rejects_unknown_values() {
        let data = request("  Write report ").validate(Uuid::new_v4(), d("2025-05-01")).unwrap();
        assert_eq!(data.title, "Write report");
        assert_eq!(data.description.as_deref(), Some("notes"));
        assert_eq!(data.priority, TaskPriority::High);
        assert_eq!(data.category, TaskCategory::Work);
        assert_eq!(data.date, d("2025-05-01"));

        let mut bad = request("x");
        bad.category = Some("chores".to_string());
        let err = bad.validate(Uuid::new_v4(), d("2025-05-01")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid category");

        let long = request(&"a".repeat(101));
        assert!(long.validate(Uuid::new_v4(), d("2025-05-01")).is_err());
    }

    #[tokio::test]
    async fn starting_a_task_carries_it_over_once() {
        let (db, user) = setup().await;
        let today = d("2025-05-01");
        let task = create_task(&db.pool, user.id, &request("Gym"), today).await.unwrap();

        let patch = TaskPatch {
            status: Some("in-progress".to_string()),
            ..Default::default()
        };
        let (updated, goal) = update_task(&db.pool, user.id, task.id, &patch, today).await.unwrap();
        assert_eq!(updated.status, "in-progress");
        assert!(goal.is_none());

        let copy = Task::find_tomorrow_by_title(&db.pool, user.id, "Gym").await.unwrap().unwrap();
        assert!(copy.is_auto_copied);
        assert_eq!(copy.date, d("2025-05-02"));
        assert_eq!(copy.status, "not-started");

        // Flip away and back: still a single copy.
        let back = TaskPatch {
            status: Some("not-started".to_string()),
            ..Default::default()
        };
        let (pending, _) = update_task(&db.pool, user.id, task.id, &back, today).await.unwrap();
        assert!(pending.pending_since.is_some());
        update_task(&db.pool, user.id, task.id, &patch, today).await.unwrap();
        assert_eq!(Task::find_by_user(&db.pool, user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn achieving_a_task_drops_tomorrows_copy() {
        let (db, user) = setup().await;
        let today = d("2025-05-01");
        let task = create_task(&db.pool, user.id, &request("Read"), today).await.unwrap();
        let start = TaskPatch {
            status: Some("in-progress".to_string()),
            ..Default::default()
        };
        update_task(&db.pool, user.id, task.id, &start, today).await.unwrap();

        let achieve = TaskPatch {
            status: Some("achieved".to_string()),
            ..Default::default()
        };
        let (updated, _) = update_task(&db.pool, user.id, task.id, &achieve, today).await.unwrap();
        assert!(updated.pending_since.is_none());
        assert_eq!(updated.scheduled_for, ScheduledFor::Today);
        assert!(Task::find_tomorrow_by_title(&db.pool, user.id, "Read").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_users_tasks_are_not_found() {
        let (db, user) = setup().await;
        let task = create_task(&db.pool, user.id, &request("Mine"), d("2025-05-01")).await.unwrap();
        let err = delete_task(&db.pool, Uuid::new_v4(), task.id).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound));
        assert_eq!(delete_task(&db.pool, user.id, task.id).await.unwrap().id, task.id);
    }
}
