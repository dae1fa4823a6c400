use anyhow::Context;
use async_trait::async_trait;

use crate::db::PgRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stored password hash of `username`, if the user exists.
    async fn find_password_hash(&self, username: &str) -> anyhow::Result<Option<String>>;
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn find_password_hash(&self, username: &str) -> anyhow::Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            r#"
            SELECT password
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find password hash")?;
        Ok(hash)
    }
}
