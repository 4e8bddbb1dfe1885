pub mod challenge;
pub mod path_task;
pub mod user_progress;
pub mod user_stats;
