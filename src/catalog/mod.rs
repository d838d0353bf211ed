// Copyright 2023 Remi Bernotavicius

//! The fixed reference data recipes are written against: ingredients, utensils and measurement
//! types. It is written once, when the database is created, and only read afterwards.

use crate::database::models::{
    Ingredient, IngredientId, MeasurementType, MeasurementTypeId, Utensil, UtensilId,
};
use crate::database::{self, contains_pattern};
use crate::{Error, Result};
use diesel::expression_methods::EscapeExpressionMethods as _;
use diesel::expression_methods::TextExpressionMethods as _;
use diesel::prelude::Connection as _;
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::HashMap;

mod seed;

pub use seed::{CatalogSeed, DecodeError, IngredientDefinition, ValueKind};

fn is_empty(conn: &mut database::Connection) -> Result<bool> {
    use database::schema::{ingredients, measurement_types, utensils};

    let rows = measurement_types::table.count().get_result::<i64>(conn)?
        + ingredients::table.count().get_result::<i64>(conn)?
        + utensils::table.count().get_result::<i64>(conn)?;
    Ok(rows == 0)
}

/// Fills the catalog tables from `seed` unless they already hold data. Returns whether anything
/// was written. Either the whole seed is written or nothing is.
pub fn seed_if_empty(conn: &mut database::Connection, seed: &CatalogSeed) -> Result<bool> {
    seed.validate()?;

    conn.transaction::<_, Error, _>(|conn| {
        if !is_empty(conn)? {
            log::debug!("catalog already seeded");
            return Ok(false);
        }

        let mut measurement_type_id = MeasurementTypeId::INITIAL;
        let mut new_measurement_types = vec![];
        for name in &seed.measurement_types {
            new_measurement_types.push(MeasurementType {
                id: measurement_type_id,
                name: name.clone(),
            });
            measurement_type_id = measurement_type_id.next();
        }
        let measurement_ids: HashMap<&str, MeasurementTypeId> = new_measurement_types
            .iter()
            .map(|m| (m.name.as_str(), m.id))
            .collect();

        let mut ingredient_id = IngredientId::INITIAL;
        let mut new_ingredients = vec![];
        for definition in &seed.ingredients {
            let measurement_type_id = *measurement_ids
                .get(definition.measurement.as_str())
                .ok_or_else(|| DecodeError::UnknownMeasurement {
                    ingredient: definition.full_name.clone(),
                    measurement: definition.measurement.clone(),
                })?;
            new_ingredients.push(Ingredient {
                id: ingredient_id,
                full_name: definition.full_name.clone(),
                measurement_type_id,
                allows_units: definition.allows_units,
            });
            ingredient_id = ingredient_id.next();
        }

        let mut utensil_id = UtensilId::INITIAL;
        let mut new_utensils = vec![];
        for name in &seed.utensils {
            new_utensils.push(Utensil {
                id: utensil_id,
                name: name.clone(),
            });
            utensil_id = utensil_id.next();
        }

        if !new_measurement_types.is_empty() {
            diesel::insert_into(database::schema::measurement_types::table)
                .values(&new_measurement_types)
                .execute(conn)?;
        }
        if !new_ingredients.is_empty() {
            diesel::insert_into(database::schema::ingredients::table)
                .values(&new_ingredients)
                .execute(conn)?;
        }
        if !new_utensils.is_empty() {
            diesel::insert_into(database::schema::utensils::table)
                .values(&new_utensils)
                .execute(conn)?;
        }

        log::info!(
            "seeded catalog with {} measurement types, {} ingredients and {} utensils",
            new_measurement_types.len(),
            new_ingredients.len(),
            new_utensils.len()
        );
        Ok(true)
    })
}

pub fn all_ingredients(conn: &mut database::Connection) -> Result<Vec<Ingredient>> {
    ingredients_except(conn, &[])
}

pub fn ingredients_except(
    conn: &mut database::Connection,
    excluded: &[IngredientId],
) -> Result<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    let mut query = ingredients
        .select(Ingredient::as_select())
        .order(id.asc())
        .into_boxed();
    if !excluded.is_empty() {
        query = query.filter(id.ne_all(excluded.to_vec()));
    }
    Ok(query.load(conn)?)
}

pub fn get_ingredient(
    conn: &mut database::Connection,
    lookup_id: IngredientId,
) -> Result<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    Ok(ingredients
        .select(Ingredient::as_select())
        .filter(id.eq(lookup_id))
        .get_result(conn)
        .optional()?)
}

/// Ingredients whose full name contains `query`, e.g. "fish" finds every `seafood.fish.*`.
pub fn search_ingredients(
    conn: &mut database::Connection,
    query: &str,
) -> Result<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    Ok(ingredients
        .select(Ingredient::as_select())
        .filter(full_name.like(contains_pattern(query)).escape('\\'))
        .order(id.asc())
        .load(conn)?)
}

pub fn all_utensils(conn: &mut database::Connection) -> Result<Vec<Utensil>> {
    utensils_except(conn, &[])
}

pub fn utensils_except(
    conn: &mut database::Connection,
    excluded: &[UtensilId],
) -> Result<Vec<Utensil>> {
    use database::schema::utensils::dsl::*;

    let mut query = utensils
        .select(Utensil::as_select())
        .order(id.asc())
        .into_boxed();
    if !excluded.is_empty() {
        query = query.filter(id.ne_all(excluded.to_vec()));
    }
    Ok(query.load(conn)?)
}

pub fn get_utensil(
    conn: &mut database::Connection,
    lookup_id: UtensilId,
) -> Result<Option<Utensil>> {
    use database::schema::utensils::dsl::*;

    Ok(utensils
        .select(Utensil::as_select())
        .filter(id.eq(lookup_id))
        .get_result(conn)
        .optional()?)
}

pub fn all_measurement_types(conn: &mut database::Connection) -> Result<Vec<MeasurementType>> {
    use database::schema::measurement_types::dsl::*;

    Ok(measurement_types
        .select(MeasurementType::as_select())
        .order(id.asc())
        .load(conn)?)
}

pub fn get_measurement_type(
    conn: &mut database::Connection,
    lookup_id: MeasurementTypeId,
) -> Result<Option<MeasurementType>> {
    use database::schema::measurement_types::dsl::*;

    Ok(measurement_types
        .select(MeasurementType::as_select())
        .filter(id.eq(lookup_id))
        .get_result(conn)
        .optional()?)
}
