//! Background service that rolls the task list over between days.
//!
//! Two jobs run at fixed local times:
//! - 23:59 marks tasks left open on an earlier day as `missed` and moves them
//!   to today;
//! - 00:01 moves everything scheduled for tomorrow onto today and generates
//!   the day's goal tasks.
//!
//! Each job is idempotent. A failed run is logged and waits for the next day;
//! there is no retry and no transaction across the batch.

use std::{collections::HashSet, time::Duration};

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone};
use db::{
    DBService,
    models::{goal::GoalKind, task::Task},
};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};
use utils::dates::today;
use uuid::Uuid;

use super::{
    daily_tasks,
    goal_sync::{self, GoalSyncError},
};

#[derive(Debug, Error)]
pub enum RolloverError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    GoalSync(#[from] GoalSyncError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverJob {
    MarkMissed,
    PromoteTomorrow,
}

impl RolloverJob {
    pub fn runs_at(&self) -> NaiveTime {
        let (hour, minute) = match self {
            Self::MarkMissed => (23, 59),
            Self::PromoteTomorrow => (0, 1),
        };
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::MarkMissed => "mark-missed",
            Self::PromoteTomorrow => "promote-tomorrow",
        }
    }
}

/// Result of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    pub tasks_updated: usize,
    pub goals_refreshed: usize,
    pub tasks_generated: usize,
}

/// Time left until the next `at` on `now`'s wall clock, never zero.
pub fn until_next<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Duration {
    let local_now = now.naive_local();
    let mut target = local_now.date().and_time(at);
    if target <= local_now {
        target = target
            .checked_add_days(Days::new(1))
            .unwrap_or(target);
    }
    now.timezone()
        .from_local_datetime(&target)
        .earliest()
        .and_then(|next| (next - now.clone()).to_std().ok())
        .filter(|wait| !wait.is_zero())
        .unwrap_or(Duration::from_secs(60))
}

pub struct TaskRolloverService {
    db: DBService,
}

impl TaskRolloverService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    /// Spawn both daily jobs on their own tokio task.
    pub async fn spawn(db: DBService) -> tokio::task::JoinHandle<()> {
        let service = Self::new(db);
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            mark_missed_at = %RolloverJob::MarkMissed.runs_at(),
            promote_at = %RolloverJob::PromoteTomorrow.runs_at(),
            "Starting task rollover service"
        );
        tokio::join!(
            self.run_daily(RolloverJob::MarkMissed),
            self.run_daily(RolloverJob::PromoteTomorrow),
        );
    }

    async fn run_daily(&self, job: RolloverJob) {
        loop {
            sleep(until_next(&Local::now(), job.runs_at())).await;
            match self.run(job, today()).await {
                Ok(report) => info!(
                    job = job.name(),
                    tasks_updated = report.tasks_updated,
                    goals_refreshed = report.goals_refreshed,
                    tasks_generated = report.tasks_generated,
                    "Rollover job finished"
                ),
                Err(e) => error!(job = job.name(), error = %e, "Rollover job failed"),
            }
        }
    }

    pub async fn run(
        &self,
        job: RolloverJob,
        today: NaiveDate,
    ) -> Result<RolloverReport, RolloverError> {
        match job {
            RolloverJob::MarkMissed => self.mark_missed(today).await,
            RolloverJob::PromoteTomorrow => self.promote_tomorrow(today).await,
        }
    }

    async fn mark_missed(&self, today: NaiveDate) -> Result<RolloverReport, RolloverError> {
        let missed = Task::mark_overdue_missed(&self.db.pool, today).await?;
        let goals: HashSet<(Uuid, GoalKind)> = missed
            .iter()
            .filter_map(|task| task.goal_id.zip(task.goal_type))
            .collect();

        let mut goals_refreshed = 0;
        for (goal_id, kind) in goals {
            match goal_sync::refresh_goal(&self.db.pool, kind, goal_id, today).await {
                Ok(Some(_)) => goals_refreshed += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(goal_id = %goal_id, kind = %kind, error = %e, "Goal refresh failed")
                }
            }
        }

        Ok(RolloverReport {
            tasks_updated: missed.len(),
            goals_refreshed,
            tasks_generated: 0,
        })
    }

    async fn promote_tomorrow(&self, today: NaiveDate) -> Result<RolloverReport, RolloverError> {
        let promoted = Task::promote_tomorrow(&self.db.pool, today).await?;
        let generated = daily_tasks::generate_for_all_users(&self.db.pool, today).await?;
        Ok(RolloverReport {
            tasks_updated: promoted as usize,
            goals_refreshed: 0,
            tasks_generated: generated,
        })
    }
}
