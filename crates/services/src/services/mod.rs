pub mod challenge;
pub mod gamification;
pub mod progression;
pub mod saga_path;
pub mod streak;
