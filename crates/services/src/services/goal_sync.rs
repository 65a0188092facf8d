//! Applies [`goal_rules`](super::goal_rules) to stored goals.

use chrono::NaiveDate;
use db::models::{
    book_reading_goal::BookReadingGoal,
    exercise_goal::ExerciseGoal,
    goal::{GoalKind, GoalStatus, ProgressEntry},
    task::Task,
};
use serde::Serialize;
use sqlx::{SqlitePool, types::Json};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::goal_rules::{self, ChangedDay, GoalSnapshot};

#[derive(Debug, Error)]
pub enum GoalSyncError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("goal not found")]
    GoalNotFound,
    #[error("status '{status}' is not valid for {kind} goals")]
    StatusNotAllowed { status: GoalStatus, kind: GoalKind },
}

/// A goal whose progress is driven by daily tasks.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TrackedGoal {
    BookReading(BookReadingGoal),
    Exercise(ExerciseGoal),
}

impl TrackedGoal {
    pub async fn load(
        pool: &SqlitePool,
        kind: GoalKind,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        Ok(match kind {
            GoalKind::BookReading => BookReadingGoal::find_by_id(pool, id)
                .await?
                .map(Self::BookReading),
            GoalKind::Exercise => ExerciseGoal::find_by_id(pool, id).await?.map(Self::Exercise),
        })
    }

    pub async fn load_for_user(
        pool: &SqlitePool,
        kind: GoalKind,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        Ok(match kind {
            GoalKind::BookReading => BookReadingGoal::find_by_id_for_user(pool, id, user_id)
                .await?
                .map(Self::BookReading),
            GoalKind::Exercise => ExerciseGoal::find_by_id_for_user(pool, id, user_id)
                .await?
                .map(Self::Exercise),
        })
    }

    pub fn kind(&self) -> GoalKind {
        match self {
            Self::BookReading(_) => GoalKind::BookReading,
            Self::Exercise(_) => GoalKind::Exercise,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::BookReading(goal) => goal.id,
            Self::Exercise(goal) => goal.id,
        }
    }

    pub fn status(&self) -> GoalStatus {
        match self {
            Self::BookReading(goal) => goal.status,
            Self::Exercise(goal) => goal.status,
        }
    }

    pub fn progress(&self) -> &[ProgressEntry] {
        match self {
            Self::BookReading(goal) => &goal.progress,
            Self::Exercise(goal) => &goal.progress,
        }
    }

    pub fn snapshot(&self) -> GoalSnapshot {
        let (status, start_date, end_date, progress) = match self {
            Self::BookReading(g) => (g.status, g.start_date, g.end_date, &g.progress),
            Self::Exercise(g) => (g.status, g.start_date, g.end_date, &g.progress),
        };
        GoalSnapshot {
            status,
            start_date,
            end_date,
            progress: progress.0.clone(),
        }
    }

    fn apply(&mut self, snapshot: GoalSnapshot) {
        let (status, progress) = match self {
            Self::BookReading(g) => (&mut g.status, &mut g.progress),
            Self::Exercise(g) => (&mut g.status, &mut g.progress),
        };
        *status = snapshot.status;
        *progress = Json(snapshot.progress);
    }

    pub async fn save(&self, pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        Ok(match self {
            Self::BookReading(goal) => Self::BookReading(BookReadingGoal::save(pool, goal).await?),
            Self::Exercise(goal) => Self::Exercise(ExerciseGoal::save(pool, goal).await?),
        })
    }

    /// Runs the transition table against the goal's current tasks and saves
    /// the result when anything changed.
    async fn reconcile_and_save(
        mut self,
        pool: &SqlitePool,
        changed: Option<ChangedDay>,
        today: NaiveDate,
    ) -> Result<Self, GoalSyncError> {
        let kind = self.kind();
        let siblings = Task::find_by_goal(pool, self.id(), kind).await?;
        let statuses: Vec<&str> = siblings.iter().map(|t| t.status.as_str()).collect();

        let before = self.snapshot();
        let after = goal_rules::reconcile(kind, &before, changed, &statuses, today);
        if after == before {
            debug!(goal_id = %self.id(), kind = %kind, "Goal already up to date");
            return Ok(self);
        }
        if after.status != before.status {
            info!(
                goal_id = %self.id(),
                kind = %kind,
                from = %before.status,
                to = %after.status,
                "Goal status changed"
            );
        }
        self.apply(after);
        Ok(self.save(pool).await?)
    }
}

/// Reconcile the goal owning `task` after its status changed. Tasks without
/// a goal, or whose goal is gone, are ignored.
pub async fn sync_task_goal(
    pool: &SqlitePool,
    task: &Task,
    today: NaiveDate,
) -> Result<Option<TrackedGoal>, GoalSyncError> {
    let (Some(goal_id), Some(kind)) = (task.goal_id, task.goal_type) else {
        return Ok(None);
    };
    let Some(goal) = TrackedGoal::load(pool, kind, goal_id).await? else {
        debug!(task_id = %task.id, goal_id = %goal_id, "Task references a missing goal");
        return Ok(None);
    };
    let changed = ChangedDay::from_status(task.date, &task.status);
    goal.reconcile_and_save(pool, Some(changed), today)
        .await
        .map(Some)
}

/// Re-evaluate a goal's status from its tasks without recording a new day.
pub async fn refresh_goal(
    pool: &SqlitePool,
    kind: GoalKind,
    goal_id: Uuid,
    today: NaiveDate,
) -> Result<Option<TrackedGoal>, GoalSyncError> {
    match TrackedGoal::load(pool, kind, goal_id).await? {
        Some(goal) => goal.reconcile_and_save(pool, None, today).await.map(Some),
        None => Ok(None),
    }
}

/// Refuse statuses that belong to the other goal kind.
pub fn check_status(kind: GoalKind, status: GoalStatus) -> Result<(), GoalSyncError> {
    if kind.accepts(status) {
        Ok(())
    } else {
        Err(GoalSyncError::StatusNotAllowed { status, kind })
    }
}

/// Set a goal's status on request. `Completed` and `Discarded` close the goal:
/// its tasks from today on are deleted before the closure rules run. Other
/// statuses are stored and then re-checked against the goal's tasks.
pub async fn set_goal_status(
    pool: &SqlitePool,
    mut goal: TrackedGoal,
    target: GoalStatus,
    today: NaiveDate,
) -> Result<TrackedGoal, GoalSyncError> {
    let kind = goal.kind();
    check_status(kind, target)?;

    if target.closes_goal() {
        let removed = Task::delete_goal_tasks_from(pool, goal.id(), kind, today).await?;
        let closed = goal_rules::close(kind, &goal.snapshot(), target, today);
        info!(
            goal_id = %goal.id(),
            kind = %kind,
            requested = %target,
            status = %closed.status,
            removed_tasks = removed,
            "Goal closed"
        );
        goal.apply(closed);
        return Ok(goal.save(pool).await?);
    }

    let mut snapshot = goal.snapshot();
    snapshot.status = target;
    goal.apply(snapshot);
    let goal = goal.save(pool).await?;
    goal.reconcile_and_save(pool, None, today).await
}

/// Record a progress day reported directly by the client. `notes` replaces
/// the stored notes when given.
pub async fn record_progress(
    pool: &SqlitePool,
    mut goal: TrackedGoal,
    date: NaiveDate,
    completed: bool,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<TrackedGoal, GoalSyncError> {
    let mut snapshot = goal.snapshot();
    goal_rules::upsert_progress(&mut snapshot.progress, date, completed);
    if let Some(notes) = notes {
        if let Some(entry) = snapshot.progress.iter_mut().find(|p| p.date == date) {
            entry.notes = notes;
        }
    }
    goal.apply(snapshot);
    let goal = goal.save(pool).await?;
    goal.reconcile_and_save(pool, None, today).await
}

/// Delete a goal together with every task it owns.
pub async fn delete_goal(
    pool: &SqlitePool,
    kind: GoalKind,
    goal_id: Uuid,
    user_id: Uuid,
) -> Result<(), GoalSyncError> {
    let deleted = match kind {
        GoalKind::BookReading => BookReadingGoal::delete(pool, goal_id, user_id).await?,
        GoalKind::Exercise => ExerciseGoal::delete(pool, goal_id, user_id).await?,
    };
    if deleted == 0 {
        return Err(GoalSyncError::GoalNotFound);
    }
    let tasks = Task::delete_by_goal(pool, goal_id, kind).await?;
    info!(goal_id = %goal_id, kind = %kind, removed_tasks = tasks, "Goal deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{
            book_reading_goal::CreateBookReadingGoal,
            exercise_goal::{CreateExerciseGoal, MeasurementType},
            task::{CreateTask, ScheduledFor},
            user::{CreateUser, User},
        },
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
                name: "Ravi".to_string(),
                email: "ravi@example.com".to_string(),
                password_hash: "hash".to_string(),
                mobile: "9876543210".to_string(),
                country_code: "+91".to_string(),
                country_iso_code: Some("IN".to_string()),
                country_name: Some("India".to_string()),
            },
        )
        .await
        .unwrap();
        (db, user)
    }

    async fn book_goal(db: &DBService, user: &User) -> BookReadingGoal {
        BookReadingGoal::create(
            &db.pool,
            user.id,
            &CreateBookReadingGoal {
                book_title: "Dune".to_string(),
                author: None,
                start_date: d("2025-05-01"),
                end_date: d("2025-05-10"),
            },
        )
        .await
        .unwrap()
    }

    async fn goal_task(
        db: &DBService,
        user: &User,
        kind: GoalKind,
        goal_id: Uuid,
        date: &str,
    ) -> Task {
        Task::create(
            &db.pool,
            &CreateTask::for_goal(
                user.id,
                kind,
                goal_id,
                "daily".to_string(),
                None,
                d(date),
                ScheduledFor::Today,
            ),
        )
        .await
        .unwrap()
    }

    async fn set_status(db: &DBService, task: &Task, status: &str) -> Task {
        let mut task = task.clone();
        task.status = status.to_string();
        Task::update(&db.pool, &task).await.unwrap()
    }

    #[tokio::test]
    async fn finishing_every_task_completes_the_goal() {
        let (db, user) = setup().await;
        let goal = book_goal(&db, &user).await;
        let first = goal_task(&db, &user, GoalKind::BookReading, goal.id, "2025-05-01").await;
        let second = goal_task(&db, &user, GoalKind::BookReading, goal.id, "2025-05-02").await;

        let first = set_status(&db, &first, "done").await;
        let synced = sync_task_goal(&db.pool, &first, d("2025-05-02")).await.unwrap().unwrap();
        assert_eq!(synced.status(), GoalStatus::Active);
        assert_eq!(synced.progress(), &[ProgressEntry::new(d("2025-05-01"), true)]);

        let second = set_status(&db, &second, "Done").await;
        let synced = sync_task_goal(&db.pool, &second, d("2025-05-02")).await.unwrap().unwrap();
        assert_eq!(synced.status(), GoalStatus::Completed);
        assert_eq!(synced.progress().len(), 2);
    }

    #[tokio::test]
    async fn skipped_exercise_tasks_mark_goal_not_done() {
        let (db, user) = setup().await;
        let goal = ExerciseGoal::create(
            &db.pool,
            user.id,
            &CreateExerciseGoal {
                exercise_name: "Plank".to_string(),
                frequency: None,
                measurement_type: MeasurementType::Seconds,
                rep: None,
                sets: None,
                minutes: None,
                seconds: Some(90),
                start_date: d("2025-05-01"),
                end_date: d("2025-05-10"),
            },
        )
        .await
        .unwrap();
        let task = goal_task(&db, &user, GoalKind::Exercise, goal.id, "2025-05-03").await;
        let task = set_status(&db, &task, "not-required").await;

        let synced = sync_task_goal(&db.pool, &task, d("2025-05-03")).await.unwrap().unwrap();
        assert_eq!(synced.status(), GoalStatus::NotDone);
        assert!(!synced.progress()[0].completed);
    }

    #[tokio::test]
    async fn closing_a_goal_deletes_tasks_from_today() {
        let (db, user) = setup().await;
        let goal = book_goal(&db, &user).await;
        goal_task(&db, &user, GoalKind::BookReading, goal.id, "2025-05-03").await;
        goal_task(&db, &user, GoalKind::BookReading, goal.id, "2025-05-04").await;
        goal_task(&db, &user, GoalKind::BookReading, goal.id, "2025-05-05").await;

        let closed = set_goal_status(
            &db.pool,
            TrackedGoal::BookReading(goal.clone()),
            GoalStatus::Discarded,
            d("2025-05-04"),
        )
        .await
        .unwrap();
        assert_eq!(closed.status(), GoalStatus::Discarded);

        let left = Task::find_by_goal(&db.pool, goal.id, GoalKind::BookReading).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].date, d("2025-05-03"));
    }

    #[tokio::test]
    async fn completing_marks_today_done() {
        let (db, user) = setup().await;
        let goal = book_goal(&db, &user).await;
        let closed = set_goal_status(
            &db.pool,
            TrackedGoal::BookReading(goal),
            GoalStatus::Completed,
            d("2025-05-04"),
        )
        .await
        .unwrap();
        assert_eq!(closed.status(), GoalStatus::Completed);
        assert_eq!(closed.progress(), &[ProgressEntry::new(d("2025-05-04"), true)]);
    }

    #[tokio::test]
    async fn exercise_goals_reject_book_statuses() {
        let (db, user) = setup().await;
        let goal = book_goal(&db, &user).await;
        let err = set_goal_status(
            &db.pool,
            TrackedGoal::BookReading(goal),
            GoalStatus::NotDone,
            d("2025-05-04"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GoalSyncError::StatusNotAllowed { .. }));
    }

    #[tokio::test]
    async fn recorded_progress_keeps_one_entry_per_day() {
        let (db, user) = setup().await;
        let goal = TrackedGoal::BookReading(book_goal(&db, &user).await);
        let goal = record_progress(
            &db.pool,
            goal,
            d("2025-05-02"),
            false,
            Some("slow".to_string()),
            d("2025-05-02"),
        )
        .await
        .unwrap();
        let goal = record_progress(&db.pool, goal, d("2025-05-02"), true, None, d("2025-05-02"))
            .await
            .unwrap();
        assert_eq!(goal.progress().len(), 1);
        assert!(goal.progress()[0].completed);
        assert_eq!(goal.progress()[0].notes, "slow");
    }

    #[tokio::test]
    async fn deleting_a_goal_removes_its_tasks() {
        let (db, user) = setup().await;
        let goal = book_goal(&db, &user).await;
        goal_task(&db, &user, GoalKind::BookReading, goal.id, "2025-05-03").await;

        delete_goal(&db.pool, GoalKind::BookReading, goal.id, user.id).await.unwrap();
        assert!(Task::find_by_user(&db.pool, user.id).await.unwrap().is_empty());
        assert!(matches!(
            delete_goal(&db.pool, GoalKind::BookReading, goal.id, user.id).await,
            Err(GoalSyncError::GoalNotFound)
        ));
    }
}
