use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: Arc<str>,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(db: SqlitePool, jwt_secret: &str, session_ttl_hours: i64) -> Self {
        Self {
            db,
            jwt_secret: Arc::from(jwt_secret),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }
}
