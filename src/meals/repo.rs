use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::db::{
    violated_constraint, PgRepository, INGREDIENT_MEAL_OWNER_FK, INGREDIENT_NAME_UNIQUE,
    MEAL_NAME_UNIQUE,
};
use crate::meals::repo_types::{Ingredient, Meal, MealRow, MealSummary};

/// Storage operations for meals and ingredients. Every method takes the owning
/// username and only ever touches that user's rows.
#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn create_meal(&self, owner: &str, name: &str) -> anyhow::Result<bool>;
    async fn create_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        name: &str,
        cost: Decimal,
    ) -> anyhow::Result<bool>;
    async fn delete_meal(&self, owner: &str, meal_id: i32) -> anyhow::Result<bool>;
    async fn delete_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<bool>;
    async fn exists_meal_name(&self, owner: &str, name: &str) -> anyhow::Result<bool>;
    async fn exists_ingredient(&self, owner: &str, meal_id: i32, name: &str)
        -> anyhow::Result<bool>;
    async fn set_meal_name(&self, owner: &str, meal_id: i32, name: &str) -> anyhow::Result<bool>;
    async fn set_ingredient_name(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
        name: &str,
    ) -> anyhow::Result<bool>;
    async fn set_ingredient_cost(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
        cost: Decimal,
    ) -> anyhow::Result<bool>;
    async fn load_meal(&self, owner: &str, meal_id: i32) -> anyhow::Result<Option<Meal>>;
    async fn load_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<Option<Ingredient>>;
    /// Meals with their total cost, cheapest first.
    async fn sorted_meals(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<MealSummary>>;
    /// Ingredients of a meal, cheapest first, ties by case-insensitive name.
    async fn sorted_ingredients(
        &self,
        owner: &str,
        meal_id: i32,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Ingredient>>;
    async fn count_meals(&self, owner: &str) -> anyhow::Result<i64>;
    async fn count_ingredients(&self, owner: &str, meal_id: i32) -> anyhow::Result<i64>;
    async fn meal_total_cost(&self, owner: &str, meal_id: i32) -> anyhow::Result<Decimal>;
}

#[async_trait]
impl MealRepository for PgRepository {
    async fn create_meal(&self, owner: &str, name: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("INSERT INTO meals (name, username) VALUES ($1, $2)")
            .bind(name)
            .bind(owner)
            .execute(&self.db)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if violated_constraint(&e) == Some(MEAL_NAME_UNIQUE) => {
                debug!(%owner, %name, "meal name already taken");
                Ok(false)
            }
            Err(e) => Err(e).context("insert meal"),
        }
    }

    async fn create_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        name: &str,
        cost: Decimal,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO ingredients (name, cost, meal_id, username)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(name)
        .bind(cost)
        .bind(meal_id)
        .bind(owner)
        .execute(&self.db)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) => match violated_constraint(&e) {
                Some(INGREDIENT_NAME_UNIQUE) => {
                    debug!(%owner, meal_id, %name, "ingredient name already taken");
                    Ok(false)
                }
                Some(INGREDIENT_MEAL_OWNER_FK) => {
                    debug!(%owner, meal_id, "ingredient for a meal the user does not own");
                    Ok(false)
                }
                _ => Err(e).context("insert ingredient"),
            },
        }
    }

    async fn delete_meal(&self, owner: &str, meal_id: i32) -> anyhow::Result<bool> {
        let done = sqlx::query("DELETE FROM meals WHERE id = $1 AND username = $2")
            .bind(meal_id)
            .bind(owner)
            .execute(&self.db)
            .await
            .context("delete meal")?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<bool> {
        let done = sqlx::query(
            "DELETE FROM ingredients WHERE meal_id = $1 AND id = $2 AND username = $3",
        )
        .bind(meal_id)
        .bind(ingredient_id)
        .bind(owner)
        .execute(&self.db)
        .await
        .context("delete ingredient")?;
        Ok(done.rows_affected() > 0)
    }

    async fn exists_meal_name(&self, owner: &str, name: &str) -> anyhow::Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM meals
                 WHERE lower(name) = lower($1) AND username = $2
            )
            "#,
        )
        .bind(name)
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .context("check meal name")?;
        Ok(found)
    }

    async fn exists_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        name: &str,
    ) -> anyhow::Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM ingredients
                 WHERE lower(name) = lower($1) AND meal_id = $2 AND username = $3
            )
            "#,
        )
        .bind(name)
        .bind(meal_id)
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .context("check ingredient name")?;
        Ok(found)
    }

    async fn set_meal_name(&self, owner: &str, meal_id: i32, name: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE meals SET name = $1 WHERE id = $2 AND username = $3")
            .bind(name)
            .bind(meal_id)
            .bind(owner)
            .execute(&self.db)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if violated_constraint(&e) == Some(MEAL_NAME_UNIQUE) => Ok(false),
            Err(e) => Err(e).context("rename meal"),
        }
    }

    async fn set_ingredient_name(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
        name: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE ingredients SET name = $1
             WHERE id = $2 AND meal_id = $3 AND username = $4
            "#,
        )
        .bind(name)
        .bind(ingredient_id)
        .bind(meal_id)
        .bind(owner)
        .execute(&self.db)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if violated_constraint(&e) == Some(INGREDIENT_NAME_UNIQUE) => Ok(false),
            Err(e) => Err(e).context("rename ingredient"),
        }
    }

    async fn set_ingredient_cost(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
        cost: Decimal,
    ) -> anyhow::Result<bool> {
        let done = sqlx::query(
            r#"
            UPDATE ingredients SET cost = $1
             WHERE id = $2 AND meal_id = $3 AND username = $4
            "#,
        )
        .bind(cost)
        .bind(ingredient_id)
        .bind(meal_id)
        .bind(owner)
        .execute(&self.db)
        .await
        .context("update ingredient cost")?;
        Ok(done.rows_affected() > 0)
    }

    async fn load_meal(&self, owner: &str, meal_id: i32) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, MealRow>(
            "SELECT id, name, username FROM meals WHERE id = $1 AND username = $2",
        )
        .bind(meal_id)
        .bind(owner)
        .fetch_optional(&self.db);

        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, cost, meal_id, username
              FROM ingredients
             WHERE meal_id = $1 AND username = $2
             ORDER BY cost ASC, lower(name) ASC, id ASC
            "#,
        )
        .bind(meal_id)
        .bind(owner)
        .fetch_all(&self.db);

        let (meal, ingredients) = tokio::try_join!(meal, ingredients).context("load meal")?;
        Ok(meal.map(|row| Meal::from_row(row, ingredients)))
    }

    async fn load_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, cost, meal_id, username
              FROM ingredients
             WHERE meal_id = $1 AND id = $2 AND username = $3
            "#,
        )
        .bind(meal_id)
        .bind(ingredient_id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("load ingredient")?;
        Ok(ingredient)
    }

    async fn sorted_meals(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<MealSummary>> {
        let rows = sqlx::query_as::<_, MealSummary>(
            r#"
            SELECT m.id, m.name, COALESCE(SUM(i.cost), 0) AS total_cost
              FROM meals m
              LEFT JOIN ingredients i
                ON i.meal_id = m.id AND i.username = m.username
             WHERE m.username = $1
             GROUP BY m.id, m.name
             ORDER BY total_cost ASC, lower(m.name) ASC, m.id ASC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list meals")?;
        Ok(rows)
    }

    async fn sorted_ingredients(
        &self,
        owner: &str,
        meal_id: i32,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, cost, meal_id, username
              FROM ingredients
             WHERE meal_id = $1 AND username = $2
             ORDER BY cost ASC, lower(name) ASC, id ASC
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(meal_id)
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list ingredients")?;
        Ok(rows)
    }

    async fn count_meals(&self, owner: &str) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM meals WHERE username = $1")
            .bind(owner)
            .fetch_one(&self.db)
            .await
            .context("count meals")?;
        Ok(count)
    }

    async fn count_ingredients(&self, owner: &str, meal_id: i32) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ingredients WHERE meal_id = $1 AND username = $2",
        )
        .bind(meal_id)
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .context("count ingredients")?;
        Ok(count)
    }

    async fn meal_total_cost(&self, owner: &str, meal_id: i32) -> anyhow::Result<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(cost), 0)
              FROM ingredients
             WHERE meal_id = $1 AND username = $2
            "#,
        )
        .bind(meal_id)
        .bind(owner)
        .fetch_one(&self.db)
        .await
        .context("sum ingredient costs")?;
        Ok(total)
    }
}
