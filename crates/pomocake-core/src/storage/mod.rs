mod config;
mod stats_store;

pub use config::{Config, NotificationsConfig, ScheduleConfig, StatsConfig};
pub use stats_store::{JsonStatsStore, MemoryStore, StatsStore};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `POMOCAKE_DATA_DIR` wins when set. Otherwise `~/.config/pomocake[-dev]/`,
/// with the `-dev` suffix when `POMOCAKE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("POMOCAKE_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOCAKE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomocake-dev")
            } else {
                base_dir.join("pomocake")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
