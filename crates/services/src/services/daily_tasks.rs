//! Daily task generation for goals tracked through tasks.

use chrono::NaiveDate;
use db::models::{
    book_reading_goal::BookReadingGoal,
    exercise_goal::ExerciseGoal,
    goal::GoalKind,
    task::{CreateTask, ScheduledFor, Task},
    user::User,
};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;
use utils::dates::tomorrow_of;

/// What a goal contributes to each of its daily tasks.
#[derive(Debug, Clone)]
pub struct GoalTaskTemplate {
    pub kind: GoalKind,
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

impl From<&BookReadingGoal> for GoalTaskTemplate {
    fn from(goal: &BookReadingGoal) -> Self {
        Self {
            kind: GoalKind::BookReading,
            goal_id: goal.id,
            user_id: goal.user_id,
            title: goal.book_title.clone(),
            description: None,
        }
    }
}

impl From<&ExerciseGoal> for GoalTaskTemplate {
    fn from(goal: &ExerciseGoal) -> Self {
        Self {
            kind: GoalKind::Exercise,
            goal_id: goal.id,
            user_id: goal.user_id,
            title: goal.exercise_name.clone(),
            description: Some(goal.daily_description()),
        }
    }
}

impl GoalTaskTemplate {
    fn task_for(&self, date: NaiveDate, scheduled_for: ScheduledFor) -> CreateTask {
        CreateTask::for_goal(
            self.user_id,
            self.kind,
            self.goal_id,
            self.title.clone(),
            self.description.clone(),
            date,
            scheduled_for,
        )
    }

    /// Creates the task for `date` unless the goal already has one that day.
    async fn ensure_task(
        &self,
        pool: &SqlitePool,
        date: NaiveDate,
        scheduled_for: ScheduledFor,
    ) -> Result<Option<Task>, sqlx::Error> {
        if Task::exists_for_goal_on(pool, self.goal_id, self.kind, date).await? {
            return Ok(None);
        }
        Task::create(pool, &self.task_for(date, scheduled_for))
            .await
            .map(Some)
    }
}

/// Tasks for a freshly created goal: today and tomorrow, where they fall
/// inside `[start, end]`. Later days are produced by the daily run.
pub async fn seed_goal_tasks(
    pool: &SqlitePool,
    template: &GoalTaskTemplate,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<Task>, sqlx::Error> {
    let mut created = Vec::new();
    for (date, scheduled_for) in [
        (today, ScheduledFor::Today),
        (tomorrow_of(today), ScheduledFor::Tomorrow),
    ] {
        if date < start || date > end {
            continue;
        }
        if let Some(task) = template.ensure_task(pool, date, scheduled_for).await? {
            created.push(task);
        }
    }
    info!(
        goal_id = %template.goal_id,
        kind = %template.kind,
        created = created.len(),
        "Seeded goal tasks"
    );
    Ok(created)
}

/// Create today's task for every active goal of `user_id` covering today.
pub async fn generate_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<Task>, sqlx::Error> {
    let mut templates: Vec<GoalTaskTemplate> =
        BookReadingGoal::find_active_covering(pool, user_id, today)
            .await?
            .iter()
            .map(GoalTaskTemplate::from)
            .collect();
    templates.extend(
        ExerciseGoal::find_active_covering(pool, user_id, today)
            .await?
            .iter()
            .map(GoalTaskTemplate::from),
    );

    let mut created = Vec::new();
    for template in &templates {
        if let Some(task) = template.ensure_task(pool, today, ScheduledFor::Today).await? {
            created.push(task);
        }
    }
    Ok(created)
}

/// Run [`generate_for_user`] for every user. A failing user is logged and
/// skipped. Returns the number of tasks created.
pub async fn generate_for_all_users(
    pool: &SqlitePool,
    today: NaiveDate,
) -> Result<usize, sqlx::Error> {
    let mut total = 0;
    for user_id in User::all_ids(pool).await? {
        match generate_for_user(pool, user_id, today).await {
            Ok(tasks) => total += tasks.len(),
            Err(e) => warn!(user_id = %user_id, error = %e, "Daily goal task generation failed"),
        }
    }
    Ok(total)
}
