// Copyright 2023 Remi Bernotavicius

//! Turns a [`RecipeQuery`] into a single `SELECT` over the recipe tables.
//!
//! Every value taken from the query is a bind parameter. Criteria that are unset, and
//! included/banned sets that are empty, produce no clause at all. Matching ids come back newest
//! first, ties broken by the larger id.

use crate::database::models::RecipeId;
use crate::database::schema::{recipe_ingredients, recipe_utensils, recipes};
use crate::database::{self, contains_pattern};
use crate::query::RecipeQuery;
use crate::recipe::Recipe;
use crate::store;
use crate::Result;
use diesel::expression_methods::EscapeExpressionMethods as _;
use diesel::expression_methods::TextExpressionMethods as _;
use diesel::sqlite::Sqlite;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;

pub type CompiledQuery = recipes::BoxedQuery<'static, Sqlite, diesel::sql_types::Integer>;

fn sorted<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort();
    items
}

pub fn compile(query: &RecipeQuery) -> CompiledQuery {
    let mut statement = recipes::table
        .select(recipes::id)
        .order((recipes::created_at.desc(), recipes::id.desc()))
        .into_boxed();

    if !query.name.is_empty() {
        statement = statement.filter(
            recipes::name
                .like(contains_pattern(&query.name))
                .escape('\\'),
        );
    }
    if let Some(max_budget) = query.max_budget {
        statement = statement.filter(recipes::budget.le(max_budget));
    }
    if let Some(min_diners) = query.min_diners {
        statement = statement.filter(recipes::diners.ge(min_diners));
    }

    // One membership test per included id: a recipe has to use all of them.
    for ingredient in sorted(query.present_ingredients()) {
        statement = statement.filter(
            recipes::id.eq_any(
                recipe_ingredients::table
                    .select(recipe_ingredients::recipe_id)
                    .filter(recipe_ingredients::ingredient_id.eq(ingredient)),
            ),
        );
    }
    let banned = sorted(query.banned_ingredients());
    if !banned.is_empty() {
        statement = statement.filter(
            recipes::id.ne_all(
                recipe_ingredients::table
                    .select(recipe_ingredients::recipe_id)
                    .filter(recipe_ingredients::ingredient_id.eq_any(banned)),
            ),
        );
    }

    for utensil in sorted(query.present_utensils()) {
        statement = statement.filter(
            recipes::id.eq_any(
                recipe_utensils::table
                    .select(recipe_utensils::recipe_id)
                    .filter(recipe_utensils::utensil_id.eq(utensil)),
            ),
        );
    }
    let banned = sorted(query.banned_utensils());
    if !banned.is_empty() {
        statement = statement.filter(
            recipes::id.ne_all(
                recipe_utensils::table
                    .select(recipe_utensils::recipe_id)
                    .filter(recipe_utensils::utensil_id.eq_any(banned)),
            ),
        );
    }

    statement
}

/// Ids of the recipes matching `query`. No match is an empty list.
pub fn search(conn: &mut database::Connection, query: &RecipeQuery) -> Result<Vec<RecipeId>> {
    let statement = compile(query);
    log::debug!(
        "recipe search: {}",
        diesel::debug_query::<Sqlite, _>(&statement)
    );

    let ids: Vec<RecipeId> = statement.load(conn)?;
    log::debug!("recipe search matched {} recipes", ids.len());
    Ok(ids)
}

/// Like [`search`], with each id resolved to its recipe.
pub fn search_recipes(
    conn: &mut database::Connection,
    query: &RecipeQuery,
) -> Result<Vec<(RecipeId, Recipe)>> {
    let ids = search(conn, query)?;
    store::get_by_ids(conn, &ids)
}
