use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::SqliteStore;
use crate::errors::AppError;
use crate::services::booking::BookingStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub store: Arc<dyn BookingStore>,
    pub config: AppConfig,
}

impl AppState {
    /// State over one SQLite connection shared by the booking store and the
    /// account/catalogue queries.
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let db = Arc::new(Mutex::new(conn));
        Self {
            store: Arc::new(SqliteStore::new(Arc::clone(&db))),
            db,
            config,
        }
    }

    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::StorageUnavailable("database lock poisoned".to_string()))
    }
}
