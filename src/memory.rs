//! In-memory repository used by the unit tests. Mirrors the constraints the
//! PostgreSQL schema enforces: owner scoping, case-insensitive unique names,
//! the cost range and the cascading meal delete.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::auth::{password::hash_password, repo::UserRepository};
use crate::meals::{
    repo::MealRepository,
    repo_types::{Ingredient, Meal, MealRow, MealSummary},
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, String>,
    meals: Vec<MealRow>,
    ingredients: Vec<Ingredient>,
    next_meal_id: i32,
    next_ingredient_id: i32,
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn cost_in_range(cost: Decimal) -> bool {
    cost >= Decimal::new(1, 2) && cost <= Decimal::new(99999, 2)
}

fn sort_ingredients(ingredients: &mut [Ingredient]) {
    ingredients.sort_by(|a, b| {
        a.cost
            .cmp(&b.cost)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn window<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        let hash = hash_password(password).expect("hash test password");
        self.lock().users.insert(username.to_string(), hash);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory repository poisoned")
    }

    fn owned_ingredients(tables: &Tables, owner: &str, meal_id: i32) -> Vec<Ingredient> {
        let mut rows: Vec<_> = tables
            .ingredients
            .iter()
            .filter(|i| i.meal_id == meal_id && i.username == owner)
            .cloned()
            .collect();
        sort_ingredients(&mut rows);
        rows
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_password_hash(&self, username: &str) -> anyhow::Result<Option<String>> {
        Ok(self.lock().users.get(username).cloned())
    }
}

#[async_trait]
impl MealRepository for MemoryRepository {
    async fn create_meal(&self, owner: &str, name: &str) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        if tables
            .meals
            .iter()
            .any(|m| m.username == owner && same_name(&m.name, name))
        {
            return Ok(false);
        }
        tables.next_meal_id += 1;
        let id = tables.next_meal_id;
        tables.meals.push(MealRow {
            id,
            name: name.to_string(),
            username: owner.to_string(),
        });
        Ok(true)
    }

    async fn create_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        name: &str,
        cost: Decimal,
    ) -> anyhow::Result<bool> {
        anyhow::ensure!(cost_in_range(cost), "ingredients_cost_check violated");
        let mut tables = self.lock();
        let meal_owned = tables
            .meals
            .iter()
            .any(|m| m.id == meal_id && m.username == owner);
        let duplicate = tables
            .ingredients
            .iter()
            .any(|i| i.meal_id == meal_id && same_name(&i.name, name));
        if !meal_owned || duplicate {
            return Ok(false);
        }
        tables.next_ingredient_id += 1;
        let id = tables.next_ingredient_id;
        tables.ingredients.push(Ingredient {
            id,
            name: name.to_string(),
            cost,
            meal_id,
            username: owner.to_string(),
        });
        Ok(true)
    }

    async fn delete_meal(&self, owner: &str, meal_id: i32) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        let before = tables.meals.len();
        tables
            .meals
            .retain(|m| !(m.id == meal_id && m.username == owner));
        if tables.meals.len() == before {
            return Ok(false);
        }
        tables
            .ingredients
            .retain(|i| !(i.meal_id == meal_id && i.username == owner));
        Ok(true)
    }

    async fn delete_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        let before = tables.ingredients.len();
        tables.ingredients.retain(|i| {
            !(i.id == ingredient_id && i.meal_id == meal_id && i.username == owner)
        });
        Ok(tables.ingredients.len() < before)
    }

    async fn exists_meal_name(&self, owner: &str, name: &str) -> anyhow::Result<bool> {
        Ok(self
            .lock()
            .meals
            .iter()
            .any(|m| m.username == owner && same_name(&m.name, name)))
    }

    async fn exists_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        name: &str,
    ) -> anyhow::Result<bool> {
        Ok(self
            .lock()
            .ingredients
            .iter()
            .any(|i| i.meal_id == meal_id && i.username == owner && same_name(&i.name, name)))
    }

    async fn set_meal_name(&self, owner: &str, meal_id: i32, name: &str) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        if tables
            .meals
            .iter()
            .any(|m| m.id != meal_id && m.username == owner && same_name(&m.name, name))
        {
            return Ok(false);
        }
        match tables
            .meals
            .iter_mut()
            .find(|m| m.id == meal_id && m.username == owner)
        {
            Some(meal) => {
                meal.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_ingredient_name(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
        name: &str,
    ) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        if tables
            .ingredients
            .iter()
            .any(|i| i.meal_id == meal_id && i.id != ingredient_id && same_name(&i.name, name))
        {
            return Ok(false);
        }
        match tables
            .ingredients
            .iter_mut()
            .find(|i| i.id == ingredient_id && i.meal_id == meal_id && i.username == owner)
        {
            Some(ingredient) => {
                ingredient.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_ingredient_cost(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
        cost: Decimal,
    ) -> anyhow::Result<bool> {
        anyhow::ensure!(cost_in_range(cost), "ingredients_cost_check violated");
        let mut tables = self.lock();
        match tables
            .ingredients
            .iter_mut()
            .find(|i| i.id == ingredient_id && i.meal_id == meal_id && i.username == owner)
        {
            Some(ingredient) => {
                ingredient.cost = cost;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn load_meal(&self, owner: &str, meal_id: i32) -> anyhow::Result<Option<Meal>> {
        let tables = self.lock();
        let row = tables
            .meals
            .iter()
            .find(|m| m.id == meal_id && m.username == owner)
            .cloned();
        Ok(row.map(|row| Meal::from_row(row, Self::owned_ingredients(&tables, owner, meal_id))))
    }

    async fn load_ingredient(
        &self,
        owner: &str,
        meal_id: i32,
        ingredient_id: i32,
    ) -> anyhow::Result<Option<Ingredient>> {
        Ok(self
            .lock()
            .ingredients
            .iter()
            .find(|i| i.id == ingredient_id && i.meal_id == meal_id && i.username == owner)
            .cloned())
    }

    async fn sorted_meals(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<MealSummary>> {
        let tables = self.lock();
        let mut rows: Vec<MealSummary> = tables
            .meals
            .iter()
            .filter(|m| m.username == owner)
            .map(|m| MealSummary {
                id: m.id,
                name: m.name.clone(),
                total_cost: tables
                    .ingredients
                    .iter()
                    .filter(|i| i.meal_id == m.id && i.username == owner)
                    .map(|i| i.cost)
                    .sum(),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.total_cost
                .cmp(&b.total_cost)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(window(rows, limit, offset))
    }

    async fn sorted_ingredients(
        &self,
        owner: &str,
        meal_id: i32,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Ingredient>> {
        let rows = Self::owned_ingredients(&self.lock(), owner, meal_id);
        Ok(window(rows, limit, offset))
    }

    async fn count_meals(&self, owner: &str) -> anyhow::Result<i64> {
        Ok(self.lock().meals.iter().filter(|m| m.username == owner).count() as i64)
    }

    async fn count_ingredients(&self, owner: &str, meal_id: i32) -> anyhow::Result<i64> {
        Ok(self
            .lock()
            .ingredients
            .iter()
            .filter(|i| i.meal_id == meal_id && i.username == owner)
            .count() as i64)
    }

    async fn meal_total_cost(&self, owner: &str, meal_id: i32) -> anyhow::Result<Decimal> {
        Ok(self
            .lock()
            .ingredients
            .iter()
            .filter(|i| i.meal_id == meal_id && i.username == owner)
            .map(|i| i.cost)
            .sum())
    }
}
