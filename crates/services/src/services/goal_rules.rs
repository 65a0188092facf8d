//! Goal-progress reconciliation.
//!
//! Book reading and exercise goals derive their status and progress from the
//! daily tasks that carry their id. Every write path (task PATCH, goal PATCH,
//! progress endpoints, the rollover job) funnels through [`reconcile`], so
//! the transition table below lives in exactly one place.

use chrono::NaiveDate;
use db::models::{
    goal::{GoalKind, GoalStatus, ProgressEntry},
    task::TaskStatus,
};
use utils::dates::span_in_days;

/// Share of the goal's days that must be done for it to close as completed.
pub const COMPLETION_THRESHOLD: f64 = 0.8;

/// The parts of a goal the reconciler reads and rewrites.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSnapshot {
    pub status: GoalStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub progress: Vec<ProgressEntry>,
}

impl GoalSnapshot {
    /// Completed progress days inside the goal's range over the range length.
    pub fn completion_ratio(&self) -> f64 {
        let days = span_in_days(self.start_date, self.end_date);
        if days == 0 {
            return 0.0;
        }
        let done = self
            .progress
            .iter()
            .filter(|p| p.completed && p.date >= self.start_date && p.date <= self.end_date)
            .count();
        done as f64 / days as f64
    }
}

/// The task whose status just changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangedDay {
    pub date: NaiveDate,
    pub completed: bool,
}

impl ChangedDay {
    pub fn from_status(date: NaiveDate, status: &str) -> Self {
        Self {
            date,
            completed: is_completed_status(status),
        }
    }
}

pub fn is_completed_status(status: &str) -> bool {
    TaskStatus::parse(status).is_some_and(|s| s.is_completed())
}

pub fn is_skipped_status(status: &str) -> bool {
    TaskStatus::parse(status).is_some_and(|s| s.is_skipped())
}

fn is_in_progress_status(status: &str) -> bool {
    TaskStatus::parse(status) == Some(TaskStatus::InProgress)
}

/// Insert or replace the entry for `date`. An existing entry keeps its notes.
pub fn upsert_progress(progress: &mut Vec<ProgressEntry>, date: NaiveDate, completed: bool) {
    match progress.iter_mut().find(|p| p.date == date) {
        Some(entry) => entry.completed = completed,
        None => progress.push(ProgressEntry::new(date, completed)),
    }
}

/// Per-kind status policy. The transition order is shared; kinds differ in
/// the status an unmet goal ends in.
pub trait GoalStatusRule {
    fn kind(&self) -> GoalKind;

    fn unmet_status(&self) -> GoalStatus {
        self.kind().unmet_status()
    }

    /// Outcome of the closure gate once the goal's end date has been reached.
    fn closing_status(&self, goal: &GoalSnapshot) -> GoalStatus {
        if goal.completion_ratio() >= COMPLETION_THRESHOLD {
            GoalStatus::Completed
        } else {
            self.unmet_status()
        }
    }

    fn next_status(&self, goal: &GoalSnapshot, siblings: &[&str], today: NaiveDate) -> GoalStatus {
        if siblings.is_empty() || goal.status == GoalStatus::Discarded {
            return goal.status;
        }
        if siblings.iter().all(|s| is_completed_status(s)) {
            return GoalStatus::Completed;
        }
        if siblings.iter().all(|s| is_skipped_status(s)) {
            return self.unmet_status();
        }
        if today >= goal.end_date {
            return self.closing_status(goal);
        }
        if siblings.iter().any(|s| is_in_progress_status(s)) {
            return GoalStatus::Active;
        }
        goal.status
    }
}

pub struct BookReadingRule;

impl GoalStatusRule for BookReadingRule {
    fn kind(&self) -> GoalKind {
        GoalKind::BookReading
    }
}

pub struct ExerciseRule;

impl GoalStatusRule for ExerciseRule {
    fn kind(&self) -> GoalKind {
        GoalKind::Exercise
    }
}

pub fn rule_for(kind: GoalKind) -> &'static dyn GoalStatusRule {
    match kind {
        GoalKind::BookReading => &BookReadingRule,
        GoalKind::Exercise => &ExerciseRule,
    }
}

/// Apply a task change to a goal. `siblings` holds the current status of
/// every task linked to the goal, the changed task included.
pub fn reconcile(
    kind: GoalKind,
    goal: &GoalSnapshot,
    changed: Option<ChangedDay>,
    siblings: &[&str],
    today: NaiveDate,
) -> GoalSnapshot {
    let mut next = goal.clone();
    if let Some(day) = changed {
        upsert_progress(&mut next.progress, day.date, day.completed);
    }
    next.status = rule_for(kind).next_status(&next, siblings, today);
    next
}

/// Explicitly close a goal as `Completed` or `Discarded`. Completing records
/// today as done; on or after the end date the closure gate has the final say.
pub fn close(
    kind: GoalKind,
    goal: &GoalSnapshot,
    target: GoalStatus,
    today: NaiveDate,
) -> GoalSnapshot {
    let mut next = goal.clone();
    next.status = target;
    if target == GoalStatus::Completed {
        upsert_progress(&mut next.progress, today, true);
        if today >= next.end_date {
            next.status = rule_for(kind).closing_status(&next);
        }
    }
    next
}
