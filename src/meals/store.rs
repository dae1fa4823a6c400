use std::sync::Arc;

use rust_decimal::Decimal;

use crate::meals::{
    pagination::PAGE_SIZE,
    repo::MealRepository,
    repo_types::{Ingredient, Meal, MealSummary},
};

/// Data access bound to one signed-in user. Only built from an authenticated
/// session, so handlers never name an owner themselves.
#[derive(Clone)]
pub struct MealStore {
    repo: Arc<dyn MealRepository>,
    username: String,
}

impl MealStore {
    pub fn new(repo: Arc<dyn MealRepository>, username: impl Into<String>) -> Self {
        Self {
            repo,
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// False when the user already has a meal with that name.
    pub async fn create_meal(&self, name: &str) -> anyhow::Result<bool> {
        self.repo.create_meal(&self.username, name).await
    }

    /// False when the meal already has an ingredient with that name, or the
    /// meal does not belong to this user.
    pub async fn create_ingredient(
        &self,
        meal_id: i32,
        name: &str,
        cost: Decimal,
    ) -> anyhow::Result<bool> {
        self.repo
            .create_ingredient(&self.username, meal_id, name, cost)
            .await
    }

    pub async fn delete_meal(&self, meal_id: i32) -> anyhow::Result<bool> {
        self.repo.delete_meal(&self.username, meal_id).await
    }

    pub async fn delete_ingredient(&self, meal_id: i32, ingredient_id: i32) -> anyhow::Result<bool> {
        self.repo
            .delete_ingredient(&self.username, meal_id, ingredient_id)
            .await
    }

    pub async fn exists_meal_name(&self, name: &str) -> anyhow::Result<bool> {
        self.repo.exists_meal_name(&self.username, name).await
    }

    pub async fn exists_ingredient(&self, name: &str, meal_id: i32) -> anyhow::Result<bool> {
        self.repo
            .exists_ingredient(&self.username, meal_id, name)
            .await
    }

    pub async fn set_meal_name(&self, meal_id: i32, name: &str) -> anyhow::Result<bool> {
        self.repo.set_meal_name(&self.username, meal_id, name).await
    }

    pub async fn set_ingredient_name(
        &self,
        meal_id: i32,
        ingredient_id: i32,
        name: &str,
    ) -> anyhow::Result<bool> {
        self.repo
            .set_ingredient_name(&self.username, meal_id, ingredient_id, name)
            .await
    }

    pub async fn set_ingredient_cost(
        &self,
        meal_id: i32,
        ingredient_id: i32,
        cost: Decimal,
    ) -> anyhow::Result<bool> {
        self.repo
            .set_ingredient_cost(&self.username, meal_id, ingredient_id, cost)
            .await
    }

    pub async fn load_meal(&self, meal_id: i32) -> anyhow::Result<Option<Meal>> {
        self.repo.load_meal(&self.username, meal_id).await
    }

    pub async fn load_ingredient(
        &self,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<Option<Ingredient>> {
        self.repo
            .load_ingredient(&self.username, meal_id, ingredient_id)
            .await
    }

    /// Meals in `[start, end)` of the list ordered by total cost, cheapest
    /// first.
    pub async fn sorted_meal_lists(&self, start: i64, end: i64) -> anyhow::Result<Vec<MealSummary>> {
        let start = start.max(0);
        let limit = (end - start).max(0);
        self.repo.sorted_meals(&self.username, limit, start).await
    }

    /// One page of a meal's ingredients, `PAGE_SIZE` per page.
    pub async fn sorted_ingredients(&self, meal_id: i32, page: i64) -> anyhow::Result<Vec<Ingredient>> {
        let offset = (page.max(1) - 1) * PAGE_SIZE;
        self.repo
            .sorted_ingredients(&self.username, meal_id, PAGE_SIZE, offset)
            .await
    }

    pub async fn number_of_meals(&self) -> anyhow::Result<i64> {
        self.repo.count_meals(&self.username).await
    }

    pub async fn number_of_ingredients(&self, meal_id: i32) -> anyhow::Result<i64> {
        self.repo.count_ingredients(&self.username, meal_id).await
    }

    /// Sum of the meal's ingredient costs; zero when it has none.
    pub async fn meal_total_cost(&self, meal_id: i32) -> anyhow::Result<Decimal> {
        self.repo.meal_total_cost(&self.username, meal_id).await
    }
}
