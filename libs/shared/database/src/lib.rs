pub mod sqlite;

pub use sqlite::{is_foreign_key_violation, is_unique_violation, Database};

use shared_config::AppConfig;

/// Shared state handed to every cell router.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        Self { config, db }
    }
}
