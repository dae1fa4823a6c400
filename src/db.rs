use anyhow::Context;
use sqlx::{error::ErrorKind, postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Unique index on `meals (username, lower(name))`.
pub const MEAL_NAME_UNIQUE: &str = "meals_username_name_key";
/// Unique index on `ingredients (meal_id, lower(name))`.
pub const INGREDIENT_NAME_UNIQUE: &str = "ingredients_meal_name_key";
/// Foreign key `ingredients (meal_id, username) -> meals (id, username)`.
pub const INGREDIENT_MEAL_OWNER_FK: &str = "ingredients_meal_owner_fkey";

/// PostgreSQL-backed implementation of the repository traits.
#[derive(Clone)]
pub struct PgRepository {
    pub(crate) db: PgPool,
}

impl PgRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Name of the constraint a unique or foreign key violation tripped, if that
/// is what `err` is.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match db_err.kind() {
        ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation => db_err.constraint(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_constraint_violations() {
        assert_eq!(violated_constraint(&sqlx::Error::RowNotFound), None);
        assert_eq!(violated_constraint(&sqlx::Error::PoolTimedOut), None);
    }
}
