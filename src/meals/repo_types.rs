use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use sqlx::FromRow;

/// Meal row as stored, without its ingredients.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MealRow {
    pub id: i32,
    pub name: String,
    pub username: String,
}

/// A meal together with all of its ingredients.
#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub ingredients: Vec<Ingredient>,
}

impl Meal {
    pub fn from_row(row: MealRow, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            ingredients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    #[serde(serialize_with = "money")]
    pub cost: Decimal,
    pub meal_id: i32,
    pub username: String,
}

/// One line of the meal list: the meal and the sum of its ingredient costs.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MealSummary {
    pub id: i32,
    pub name: String,
    #[serde(serialize_with = "money")]
    pub total_cost: Decimal,
}

/// Renders an amount with exactly two decimals.
pub fn money<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}
