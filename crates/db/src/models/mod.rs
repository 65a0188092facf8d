pub mod book_reading_goal;
pub mod country;
pub mod exercise_goal;
pub mod goal;
pub mod status_config;
pub mod task;
pub mod travel_goal;
pub mod user;
pub mod weight_goal;
