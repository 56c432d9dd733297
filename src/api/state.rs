use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::config::Config;
use crate::domain::KanbanError;
use crate::gateway::SqliteGateway;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Option<SqlitePool>, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, KanbanError> {
        self.db
            .as_ref()
            .ok_or_else(|| KanbanError::Internal("Database not available".into()))
    }

    /// Store access scoped to the caller.
    pub fn gateway(&self, user: &AuthUser) -> Result<SqliteGateway, KanbanError> {
        Ok(SqliteGateway::for_user(
            self.require_db()?.clone(),
            user.user_id.clone(),
        ))
    }
}
