pub mod challenges;
pub mod health;
pub mod saga_path;
pub mod wallet;
