//! Server configuration from CLI flags and environment (a `.env` file is loaded first).

use clap::Parser;
use services::services::streak::DEFAULT_FREEZE_COST;

#[derive(Parser, Debug, Clone)]
#[command(name = "server")]
#[command(about = "Saga path progression API")]
pub struct Config {
    /// SQLite connection URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://saga.db")]
    pub database_url: String,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Gems charged for one streak freeze, identical for every user
    #[arg(long, env = "STREAK_FREEZE_COST", default_value_t = DEFAULT_FREEZE_COST)]
    pub streak_freeze_cost: i64,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.streak_freeze_cost < 0 {
            return Err(format!(
                "STREAK_FREEZE_COST must not be negative (got {})",
                self.streak_freeze_cost
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err("DATABASE_URL must not be empty".to_string());
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
