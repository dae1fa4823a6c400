use axum::{
    extract::{Path, Query},
    response::{Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::SignedIn,
        session::{FlashKind, Session},
    },
    error::{AppError, AppResult},
    meals::{
        dto::{
            IngredientCostForm, IngredientForm, IngredientFormView, IngredientNameForm,
            MealDetailView, MealForm, MealFormView, MealListView,
        },
        pagination::{page_param, resolve_page, PageNotFound, PageWindow},
        repo_types::{Ingredient, Meal},
        store::MealStore,
        validation::{parse_cost, validate_name, NameField},
    },
    state::AppState,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/meals") }))
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/new", get(new_meal_form).post(create_meal))
        .route("/meals/:meal_id", get(show_meal).post(create_ingredient))
        .route("/meals/:meal_id/edit", get(edit_meal_form).post(update_meal))
        .route("/meals/:meal_id/destroy", post(destroy_meal))
        .route("/meals/:meal_id/ingredients", get(new_ingredient_form))
        .route(
            "/meals/:meal_id/ingredients/:ingredient_id/destroy",
            post(destroy_ingredient),
        )
        .route(
            "/meals/:meal_id/ingredients/:ingredient_id/edit-name",
            get(edit_ingredient_name_form).post(update_ingredient_name),
        )
        .route(
            "/meals/:meal_id/ingredients/:ingredient_id/edit-cost",
            get(edit_ingredient_cost_form).post(update_ingredient_cost),
        )
}

// --- lookups ---

fn parse_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().filter(|id| *id > 0)
}

fn parse_ids(meal_id: &str, ingredient_id: &str) -> AppResult<(i32, i32)> {
    match (parse_id(meal_id), parse_id(ingredient_id)) {
        (Some(meal_id), Some(ingredient_id)) => Ok((meal_id, ingredient_id)),
        _ => Err(AppError::NotFound),
    }
}

async fn find_meal(store: &MealStore, meal_id: &str) -> AppResult<Meal> {
    let meal_id = parse_id(meal_id).ok_or(AppError::NotFound)?;
    store.load_meal(meal_id).await?.ok_or(AppError::NotFound)
}

async fn find_ingredient(
    store: &MealStore,
    meal_id: &str,
    ingredient_id: &str,
) -> AppResult<(Meal, Ingredient)> {
    let (meal_id, ingredient_id) = parse_ids(meal_id, ingredient_id)?;
    let (meal, ingredient) = tokio::try_join!(
        store.load_meal(meal_id),
        store.load_ingredient(meal_id, ingredient_id)
    )?;
    match (meal, ingredient) {
        (Some(meal), Some(ingredient)) => Ok((meal, ingredient)),
        _ => Err(AppError::NotFound),
    }
}

fn page_not_found(mut session: Session) -> Response {
    session.flash(FlashKind::Error, PageNotFound.to_string());
    session.redirect("/meals")
}

fn render_meal_form(session: Session, view: &str, meal: Option<Meal>, name: Option<String>) -> Response {
    session.render(
        view,
        MealFormView {
            meal,
            meal_name: name,
        },
    )
}

fn render_ingredient_form(
    session: Session,
    view: &str,
    meal: Meal,
    ingredient: Option<Ingredient>,
    name: Option<String>,
    cost: Option<String>,
) -> Response {
    session.render(
        view,
        IngredientFormView {
            meal,
            ingredient,
            ingredient_name: name,
            ingredient_cost: cost,
        },
    )
}

// --- meals ---

#[instrument(skip(auth))]
pub async fn list_meals(
    auth: SignedIn,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;

    let total = store.number_of_meals().await?;
    let window = match page_param(&query).and_then(|page| resolve_page(page, total)) {
        Ok(window) => window,
        Err(not_found) => {
            warn!(user = %store.username(), ?query, "meal list page out of range");
            session.flash(FlashKind::Error, not_found.to_string());
            PageWindow::first(total)
        }
    };

    let meals = store
        .sorted_meal_lists(window.start(), window.end())
        .await?;
    Ok(session.render(
        "meals",
        MealListView {
            meals,
            page: window.page,
            total_pages: window.total_pages,
        },
    ))
}

#[instrument(skip(auth))]
pub async fn new_meal_form(auth: SignedIn) -> Response {
    render_meal_form(auth.session, "new-meal", None, None)
}

#[instrument(skip(auth, form))]
pub async fn create_meal(auth: SignedIn, Form(form): Form<MealForm>) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;

    let name = match validate_name(&form.meal_name, NameField::Meal) {
        Ok(name) => name,
        Err(message) => {
            session.flash(FlashKind::Error, message);
            return Ok(render_meal_form(session, "new-meal", None, Some(form.meal_name)));
        }
    };

    if store.exists_meal_name(&name).await? || !store.create_meal(&name).await? {
        session.flash(FlashKind::Error, "The meal already exists.");
        return Ok(render_meal_form(session, "new-meal", None, Some(form.meal_name)));
    }

    info!(user = %store.username(), meal = %name, "meal created");
    session.flash(FlashKind::Success, "A new meal has been created!");
    Ok(session.redirect("/meals"))
}

#[instrument(skip(auth))]
pub async fn show_meal(
    auth: SignedIn,
    Path(meal_id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Response> {
    let SignedIn { session, store } = auth;

    let Some(meal_id) = parse_id(&meal_id) else {
        return Ok(page_not_found(session));
    };
    let (meal, total) = tokio::try_join!(
        store.load_meal(meal_id),
        store.number_of_ingredients(meal_id)
    )?;
    let Some(meal) = meal else {
        return Ok(page_not_found(session));
    };
    let Ok(window) = page_param(&query).and_then(|page| resolve_page(page, total)) else {
        warn!(user = %store.username(), meal_id, ?query, "ingredient page out of range");
        return Ok(page_not_found(session));
    };

    let (ingredients, total_cost) = tokio::try_join!(
        store.sorted_ingredients(meal.id, window.page),
        store.meal_total_cost(meal.id)
    )?;
    Ok(session.render(
        "ingredients",
        MealDetailView {
            meal_id: meal.id,
            meal_name: meal.name,
            ingredients,
            total_cost,
            page: window.page,
            total_pages: window.total_pages,
        },
    ))
}

#[instrument(skip(auth))]
pub async fn edit_meal_form(auth: SignedIn, Path(meal_id): Path<String>) -> AppResult<Response> {
    let meal = find_meal(&auth.store, &meal_id).await?;
    Ok(render_meal_form(auth.session, "edit-meal", Some(meal), None))
}

#[instrument(skip(auth, form))]
pub async fn update_meal(
    auth: SignedIn,
    Path(meal_id): Path<String>,
    Form(form): Form<MealForm>,
) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;
    let meal = find_meal(&store, &meal_id).await?;

    let name = match validate_name(&form.meal_name, NameField::Meal) {
        Ok(name) => name,
        Err(message) => {
            session.flash(FlashKind::Error, message);
            return Ok(render_meal_form(session, "edit-meal", Some(meal), Some(form.meal_name)));
        }
    };

    if store.exists_meal_name(&name).await? {
        session.flash(FlashKind::Error, "The meal name already exists.");
        return Ok(render_meal_form(session, "edit-meal", Some(meal), Some(form.meal_name)));
    }

    if !store.set_meal_name(meal.id, &name).await? {
        return Err(AppError::NotFound);
    }

    info!(user = %store.username(), meal_id = meal.id, meal = %name, "meal renamed");
    session.flash(FlashKind::Success, "Meal name updated.");
    Ok(session.redirect(&format!("/meals/{}", meal.id)))
}

#[instrument(skip(auth))]
pub async fn destroy_meal(auth: SignedIn, Path(meal_id): Path<String>) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;
    let meal_id = parse_id(&meal_id).ok_or(AppError::NotFound)?;

    if !store.delete_meal(meal_id).await? {
        return Err(AppError::NotFound);
    }

    info!(user = %store.username(), meal_id, "meal deleted");
    session.flash(FlashKind::Success, "The meal deleted.");
    Ok(session.redirect("/meals"))
}

// --- ingredients ---

#[instrument(skip(auth))]
pub async fn new_ingredient_form(
    auth: SignedIn,
    Path(meal_id): Path<String>,
) -> AppResult<Response> {
    let meal = find_meal(&auth.store, &meal_id).await?;
    Ok(render_ingredient_form(
        auth.session,
        "new-ingredient",
        meal,
        None,
        None,
        None,
    ))
}

#[instrument(skip(auth, form))]
pub async fn create_ingredient(
    auth: SignedIn,
    Path(meal_id): Path<String>,
    Form(form): Form<IngredientForm>,
) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;
    let meal = find_meal(&store, &meal_id).await?;
    let meal_path = format!("/meals/{}", meal.id);

    let (name, cost) = match (
        validate_name(&form.ingredient_name, NameField::Ingredient),
        parse_cost(&form.ingredient_cost),
    ) {
        (Ok(name), Ok(cost)) => (name, cost),
        (name, cost) => {
            for message in [name.err(), cost.err()].into_iter().flatten() {
                session.flash(FlashKind::Error, message);
            }
            return Ok(render_ingredient_form(
                session,
                "new-ingredient",
                meal,
                None,
                Some(form.ingredient_name),
                Some(form.ingredient_cost),
            ));
        }
    };

    if store.exists_ingredient(&name, meal.id).await?
        || !store.create_ingredient(meal.id, &name, cost).await?
    {
        session.flash(FlashKind::Error, "The ingredient already exists.");
        return Ok(render_ingredient_form(
            session,
            "new-ingredient",
            meal,
            None,
            Some(form.ingredient_name),
            Some(form.ingredient_cost),
        ));
    }

    info!(user = %store.username(), meal_id = meal.id, ingredient = %name, %cost, "ingredient added");
    session.flash(FlashKind::Success, "The ingredient has been added.");
    Ok(session.redirect(&meal_path))
}

#[instrument(skip(auth))]
pub async fn destroy_ingredient(
    auth: SignedIn,
    Path((meal_id, ingredient_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;
    let (meal_id, ingredient_id) = parse_ids(&meal_id, &ingredient_id)?;

    if !store.delete_ingredient(meal_id, ingredient_id).await? {
        return Err(AppError::NotFound);
    }

    info!(user = %store.username(), meal_id, ingredient_id, "ingredient deleted");
    session.flash(FlashKind::Success, "The ingredient has been deleted.");
    Ok(session.redirect(&format!("/meals/{meal_id}")))
}

#[instrument(skip(auth))]
pub async fn edit_ingredient_name_form(
    auth: SignedIn,
    Path((meal_id, ingredient_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let (meal, ingredient) = find_ingredient(&auth.store, &meal_id, &ingredient_id).await?;
    Ok(render_ingredient_form(
        auth.session,
        "edit-ingredient-name",
        meal,
        Some(ingredient),
        None,
        None,
    ))
}

#[instrument(skip(auth, form))]
pub async fn update_ingredient_name(
    auth: SignedIn,
    Path((meal_id, ingredient_id)): Path<(String, String)>,
    Form(form): Form<IngredientNameForm>,
) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;
    let (meal, ingredient) = find_ingredient(&store, &meal_id, &ingredient_id).await?;
    let (meal_id, ingredient_id) = (meal.id, ingredient.id);

    let name = match validate_name(&form.ingredient_name, NameField::Ingredient) {
        Ok(name) => name,
        Err(message) => {
            session.flash(FlashKind::Error, message);
            return Ok(render_ingredient_form(
                session,
                "edit-ingredient-name",
                meal,
                Some(ingredient),
                Some(form.ingredient_name),
                None,
            ));
        }
    };

    if store.exists_ingredient(&name, meal_id).await?
        || !store
            .set_ingredient_name(meal_id, ingredient_id, &name)
            .await?
    {
        session.flash(FlashKind::Error, "The ingredient already exists.");
        return Ok(render_ingredient_form(
            session,
            "edit-ingredient-name",
            meal,
            Some(ingredient),
            Some(form.ingredient_name),
            None,
        ));
    }

    info!(user = %store.username(), meal_id, ingredient_id, ingredient = %name, "ingredient renamed");
    session.flash(FlashKind::Success, "The ingredient name has been updated.");
    Ok(session.redirect(&format!("/meals/{meal_id}")))
}

#[instrument(skip(auth))]
pub async fn edit_ingredient_cost_form(
    auth: SignedIn,
    Path((meal_id, ingredient_id)): Path<(String, String)>,
) -> AppResult<Response> {
    let (meal, ingredient) = find_ingredient(&auth.store, &meal_id, &ingredient_id).await?;
    Ok(render_ingredient_form(
        auth.session,
        "edit-ingredient-cost",
        meal,
        Some(ingredient),
        None,
        None,
    ))
}

#[instrument(skip(auth, form))]
pub async fn update_ingredient_cost(
    auth: SignedIn,
    Path((meal_id, ingredient_id)): Path<(String, String)>,
    Form(form): Form<IngredientCostForm>,
) -> AppResult<Response> {
    let SignedIn { mut session, store } = auth;
    let (meal, ingredient) = find_ingredient(&store, &meal_id, &ingredient_id).await?;
    let (meal_id, ingredient_id) = (meal.id, ingredient.id);

    let cost = match parse_cost(&form.ingredient_cost) {
        Ok(cost) => cost,
        Err(message) => {
            session.flash(FlashKind::Error, message);
            return Ok(render_ingredient_form(
                session,
                "edit-ingredient-cost",
                meal,
                Some(ingredient),
                None,
                Some(form.ingredient_cost),
            ));
        }
    };

    if !store
        .set_ingredient_cost(meal_id, ingredient_id, cost)
        .await?
    {
        return Err(AppError::NotFound);
    }

    info!(user = %store.username(), meal_id, ingredient_id, %cost, "ingredient cost updated");
    session.flash(FlashKind::Success, "Ingredient cost updated.");
    Ok(session.redirect(&format!("/meals/{meal_id}")))
}
