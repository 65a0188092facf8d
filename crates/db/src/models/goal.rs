//! Vocabulary shared by the goal kinds that are tracked through daily tasks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use strum_macros::{Display, EnumString};

use super::task::{TaskCategory, TaskPriority};

/// Goal kinds whose progress is derived from linked daily tasks.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[sqlx(type_name = "goal_kind")]
pub enum GoalKind {
    #[sqlx(rename = "Book Reading")]
    #[serde(rename = "Book Reading")]
    #[strum(serialize = "Book Reading")]
    BookReading,
    Exercise,
}

impl GoalKind {
    /// Marker written to `goal_flag` on the tasks a goal owns.
    pub fn task_flag(&self) -> &'static str {
        match self {
            Self::BookReading => "Book Reading - Goal",
            Self::Exercise => "Exercise - Goal",
        }
    }

    /// Status a goal ends in when its days were skipped or too few were done.
    pub fn unmet_status(&self) -> GoalStatus {
        match self {
            Self::BookReading => GoalStatus::NotRequired,
            Self::Exercise => GoalStatus::NotDone,
        }
    }

    pub fn accepts(&self, status: GoalStatus) -> bool {
        match status {
            GoalStatus::NotRequired => *self == Self::BookReading,
            GoalStatus::NotDone => *self == Self::Exercise,
            _ => true,
        }
    }

    pub fn task_category(&self) -> TaskCategory {
        match self {
            Self::BookReading => TaskCategory::Learning,
            Self::Exercise => TaskCategory::Health,
        }
    }

    pub fn task_priority(&self) -> TaskPriority {
        TaskPriority::High
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "goal_status")]
pub enum GoalStatus {
    #[default]
    Active,
    Planned,
    Completed,
    #[sqlx(rename = "Not Required")]
    #[serde(rename = "Not Required")]
    #[strum(serialize = "Not Required")]
    NotRequired,
    #[sqlx(rename = "Not Done")]
    #[serde(rename = "Not Done")]
    #[strum(serialize = "Not Done")]
    NotDone,
    Discarded,
}

impl GoalStatus {
    /// Statuses that close a goal and drop its remaining daily tasks.
    pub fn closes_goal(&self) -> bool {
        matches!(self, Self::Completed | Self::Discarded)
    }
}

/// One day of goal progress. Book reading clients send `read`, exercise
/// clients send `completed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    pub date: NaiveDate,
    #[serde(alias = "read")]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
}

impl ProgressEntry {
    pub fn new(date: NaiveDate, completed: bool) -> Self {
        Self {
            date,
            completed,
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_names_match_stored_text() {
        assert_eq!(GoalStatus::NotRequired.to_string(), "Not Required");
        assert_eq!(GoalStatus::from_str("Not Done").unwrap(), GoalStatus::NotDone);
        assert_eq!(
            serde_json::to_string(&GoalKind::BookReading).unwrap(),
            "\"Book Reading\""
        );
    }

    #[test]
    fn unmet_status_depends_on_kind() {
        assert_eq!(GoalKind::BookReading.unmet_status(), GoalStatus::NotRequired);
        assert_eq!(GoalKind::Exercise.unmet_status(), GoalStatus::NotDone);
        assert!(!GoalKind::Exercise.accepts(GoalStatus::NotRequired));
        assert!(GoalKind::Exercise.accepts(GoalStatus::Discarded));
    }

    #[test]
    fn progress_entry_accepts_read_alias() {
        let entry: ProgressEntry =
            serde_json::from_str(r#"{"date":"2025-05-01","read":true}"#).unwrap();
        assert!(entry.completed);
        assert!(entry.notes.is_empty());
    }
}
