use std::sync::Arc;

use crate::auth::{repo::UserRepository, session::SessionKeys};
use crate::config::AppConfig;
use crate::db::{self, PgRepository};
use crate::meals::repo::MealRepository;

#[derive(Clone)]
pub struct AppState {
    pub meals: Arc<dyn MealRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let pool = db::connect(&config).await?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }

        Ok(Self::from_parts(&config, Arc::new(PgRepository::new(pool))))
    }

    pub fn from_parts<R>(config: &AppConfig, repo: Arc<R>) -> Self
    where
        R: MealRepository + UserRepository + 'static,
    {
        let sessions = SessionKeys::from_config(&config.session);
        Self {
            meals: repo.clone(),
            users: repo,
            sessions,
        }
    }

    #[cfg(test)]
    pub fn fake(repo: Arc<crate::memory::MemoryRepository>) -> Self {
        Self::from_parts(&AppConfig::test(), repo)
    }
}
