use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::identity::JwtIdentity;
use crate::services::notifier::Notifier;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub identity: JwtIdentity,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database mutex poisoned")))
    }
}
