use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::meals::repo_types::{money, Ingredient, Meal, MealSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealForm {
    #[serde(default)]
    pub meal_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientForm {
    #[serde(default)]
    pub ingredient_name: String,
    #[serde(default)]
    pub ingredient_cost: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientNameForm {
    #[serde(default)]
    pub ingredient_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCostForm {
    #[serde(default)]
    pub ingredient_cost: String,
}

#[derive(Debug, Serialize)]
pub struct MealListView {
    pub meals: Vec<MealSummary>,
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct MealFormView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal: Option<Meal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MealDetailView {
    pub meal_id: i32,
    pub meal_name: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(serialize_with = "money")]
    pub total_cost: Decimal,
    pub page: i64,
    pub total_pages: i64,
}

/// Context shared by the new-ingredient and edit-ingredient forms.
#[derive(Debug, Serialize)]
pub struct IngredientFormView {
    pub meal: Meal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<Ingredient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_cost: Option<String>,
}
