pub mod auth;
pub mod config;
pub mod daily_tasks;
pub mod email;
pub mod goal_rules;
pub mod goal_sync;
pub mod task_rollover;
pub mod tasks;
pub mod weight;
