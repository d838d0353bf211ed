// Copyright 2023 Remi Bernotavicius

//! Reading and writing recipes together with their ingredient and utensil associations. Every
//! write is a single transaction.

use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, NewRecipe, RecipeChanges, RecipeId, RecipeIngredient, RecipeRecord,
    RecipeUtensil, UtensilId,
};
use crate::recipe::Recipe;
use crate::{Error, Record, Result};
use diesel::prelude::Connection as _;
use diesel::prelude::OptionalExtension as _;
use diesel::BelongingToDsl as _;
use diesel::ExpressionMethods as _;
use diesel::GroupedBy as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::{HashMap, HashSet};

/// Confirms every ingredient and utensil `recipe` mentions is in the catalog. Returns the
/// mentioned ingredients.
fn check_catalog_references(
    conn: &mut database::Connection,
    recipe: &Recipe,
) -> Result<HashMap<IngredientId, Ingredient>> {
    let wanted_ingredients: Vec<IngredientId> = recipe.ingredients.keys().copied().collect();
    let found_ingredients: HashMap<IngredientId, Ingredient> = if wanted_ingredients.is_empty() {
        HashMap::new()
    } else {
        use database::schema::ingredients::dsl::*;

        ingredients
            .select(Ingredient::as_select())
            .filter(id.eq_any(wanted_ingredients.clone()))
            .load(conn)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect()
    };
    if let Some(missing) = wanted_ingredients
        .iter()
        .find(|i| !found_ingredients.contains_key(i))
    {
        return Err(Error::ConstraintViolation(Record::Ingredient(*missing)));
    }

    let wanted_utensils: Vec<UtensilId> = recipe.utensils.iter().copied().collect();
    if !wanted_utensils.is_empty() {
        use database::schema::utensils::dsl::*;

        let found_utensils: HashSet<UtensilId> = utensils
            .select(id)
            .filter(id.eq_any(wanted_utensils.clone()))
            .load::<UtensilId>(conn)?
            .into_iter()
            .collect();
        if let Some(missing) = wanted_utensils
            .iter()
            .find(|u| !found_utensils.contains(u))
        {
            return Err(Error::ConstraintViolation(Record::Utensil(*missing)));
        }
    }

    Ok(found_ingredients)
}

fn insert_associations(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
    recipe: &Recipe,
    catalog: &HashMap<IngredientId, Ingredient>,
) -> Result<()> {
    let new_ingredients: Vec<RecipeIngredient> = recipe
        .ingredients
        .iter()
        .map(|(ingredient_id, properties)| RecipeIngredient {
            recipe_id,
            ingredient_id: *ingredient_id,
            amount: properties.amount,
            in_units: properties.in_units
                && catalog.get(ingredient_id).is_some_and(|i| i.allows_units),
        })
        .collect();
    if !new_ingredients.is_empty() {
        diesel::insert_into(database::schema::recipe_ingredients::table)
            .values(&new_ingredients)
            .execute(conn)?;
    }

    let new_utensils: Vec<RecipeUtensil> = recipe
        .utensils
        .iter()
        .map(|utensil_id| RecipeUtensil {
            recipe_id,
            utensil_id: *utensil_id,
        })
        .collect();
    if !new_utensils.is_empty() {
        diesel::insert_into(database::schema::recipe_utensils::table)
            .values(&new_utensils)
            .execute(conn)?;
    }

    Ok(())
}

fn delete_associations(conn: &mut database::Connection, delete_id: RecipeId) -> Result<()> {
    {
        use database::schema::recipe_ingredients::dsl::*;
        diesel::delete(recipe_ingredients.filter(recipe_id.eq(delete_id))).execute(conn)?;
    }
    {
        use database::schema::recipe_utensils::dsl::*;
        diesel::delete(recipe_utensils.filter(recipe_id.eq(delete_id))).execute(conn)?;
    }
    Ok(())
}

/// Stores a new recipe and returns the id it was given.
pub fn insert(conn: &mut database::Connection, recipe: &Recipe) -> Result<RecipeId> {
    use database::schema::recipes::dsl::*;

    recipe.validate()?;
    conn.transaction::<_, Error, _>(|conn| {
        let catalog = check_catalog_references(conn, recipe)?;
        let new_id: RecipeId = diesel::insert_into(recipes)
            .values(NewRecipe::from(recipe))
            .returning(id)
            .get_result(conn)?;
        insert_associations(conn, new_id, recipe, &catalog)?;

        log::info!("inserted recipe {new_id} {:?}", recipe.name);
        Ok(new_id)
    })
}

/// Replaces everything about the recipe except its id and creation time.
pub fn update(conn: &mut database::Connection, recipe_id: RecipeId, recipe: &Recipe) -> Result<()> {
    use database::schema::recipes::dsl::*;

    recipe.validate()?;
    conn.transaction::<_, Error, _>(|conn| {
        let updated = diesel::update(recipes.filter(id.eq(recipe_id)))
            .set(RecipeChanges::from(recipe))
            .execute(conn)?;
        if updated == 0 {
            return Err(Error::NotFound(Record::Recipe(recipe_id)));
        }

        let catalog = check_catalog_references(conn, recipe)?;
        delete_associations(conn, recipe_id)?;
        insert_associations(conn, recipe_id, recipe, &catalog)?;

        log::info!("updated recipe {recipe_id} {:?}", recipe.name);
        Ok(())
    })
}

pub fn delete(conn: &mut database::Connection, recipe_id: RecipeId) -> Result<()> {
    use database::schema::recipes::dsl::*;

    conn.transaction::<_, Error, _>(|conn| {
        delete_associations(conn, recipe_id)?;
        let deleted = diesel::delete(recipes.filter(id.eq(recipe_id))).execute(conn)?;
        if deleted == 0 {
            return Err(Error::NotFound(Record::Recipe(recipe_id)));
        }

        log::info!("deleted recipe {recipe_id}");
        Ok(())
    })
}

/// Most ids bound into a single `IN (...)` list. SQLite refuses statements with more than 32766
/// variables.
const IDS_PER_QUERY: usize = 10_000;

/// Loads the associations of the records, one query per association table for every
/// [`IDS_PER_QUERY`] records.
fn assemble(
    conn: &mut database::Connection,
    mut records: Vec<RecipeRecord>,
) -> Result<Vec<(RecipeId, Recipe)>> {
    let mut assembled = Vec::with_capacity(records.len());
    while !records.is_empty() {
        let rest = records.split_off(records.len().min(IDS_PER_QUERY));

        let ingredients = RecipeIngredient::belonging_to(&records)
            .select(RecipeIngredient::as_select())
            .load(conn)?
            .grouped_by(&records);
        let utensils = RecipeUtensil::belonging_to(&records)
            .select(RecipeUtensil::as_select())
            .load(conn)?
            .grouped_by(&records);

        assembled.extend(records.into_iter().zip(ingredients).zip(utensils).map(
            |((record, ingredients), utensils)| {
                (record.id, Recipe::from_rows(record, ingredients, utensils))
            },
        ));
        records = rest;
    }
    Ok(assembled)
}

/// A missing recipe is `None`, not an error.
pub fn get_by_id(conn: &mut database::Connection, recipe_id: RecipeId) -> Result<Option<Recipe>> {
    use database::schema::recipes::dsl::*;

    let Some(record) = recipes
        .select(RecipeRecord::as_select())
        .filter(id.eq(recipe_id))
        .get_result(conn)
        .optional()?
    else {
        return Ok(None);
    };
    Ok(assemble(conn, vec![record])?.pop().map(|(_, recipe)| recipe))
}

/// Resolves ids into recipes in the order given. Ids that don't exist (any more) are skipped.
pub fn get_by_ids(
    conn: &mut database::Connection,
    recipe_ids: &[RecipeId],
) -> Result<Vec<(RecipeId, Recipe)>> {
    use database::schema::recipes::dsl::*;

    let mut records = Vec::with_capacity(recipe_ids.len());
    for chunk in recipe_ids.chunks(IDS_PER_QUERY) {
        records.extend(
            recipes
                .select(RecipeRecord::as_select())
                .filter(id.eq_any(chunk.to_vec()))
                .load(conn)?,
        );
    }
    let by_id: HashMap<RecipeId, Recipe> = assemble(conn, records)?.into_iter().collect();

    Ok(recipe_ids
        .iter()
        .filter_map(|recipe_id| by_id.get(recipe_id).map(|r| (*recipe_id, r.clone())))
        .collect())
}

/// Every recipe, most recently created first.
pub fn get_all(conn: &mut database::Connection) -> Result<Vec<(RecipeId, Recipe)>> {
    use database::schema::recipes::dsl::*;

    let records = recipes
        .select(RecipeRecord::as_select())
        .order((created_at.desc(), id.desc()))
        .load(conn)?;
    assemble(conn, records)
}

pub fn count(conn: &mut database::Connection) -> Result<i64> {
    use database::schema::recipes::dsl::*;

    Ok(recipes.count().get_result(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeIngredientProperties;
    use maplit::{btreemap, btreeset};

    fn at(hour: u32) -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn stew() -> Recipe {
        Recipe {
            name: "Stew".into(),
            body: "Simmer everything for two hours.".into(),
            budget: 12,
            diners: 4,
            created_at: at(9),
            ingredients: btreemap! {
                IngredientId::from(1) => RecipeIngredientProperties::new(2.0),
                IngredientId::from(3) => RecipeIngredientProperties::new(1.5),
            },
            utensils: btreeset! { UtensilId::from(2), UtensilId::from(3) },
        }
    }

    fn association_rows(conn: &mut database::Connection, recipe: RecipeId) -> i64 {
        use database::schema::{recipe_ingredients, recipe_utensils};

        let ingredients: i64 = recipe_ingredients::table
            .filter(recipe_ingredients::recipe_id.eq(recipe))
            .count()
            .get_result(conn)
            .unwrap();
        let utensils: i64 = recipe_utensils::table
            .filter(recipe_utensils::recipe_id.eq(recipe))
            .count()
            .get_result(conn)
            .unwrap();
        ingredients + utensils
    }

    #[test]
    fn insert_and_get_round_trip() {
        let mut conn = database::test_connection();
        let recipe = stew();

        let id = insert(&mut conn, &recipe).unwrap();
        let loaded = get_by_id(&mut conn, id).unwrap().unwrap();

        assert_eq!(loaded.name, recipe.name);
        assert_eq!(loaded.body, recipe.body);
        assert_eq!(loaded.budget, recipe.budget);
        assert_eq!(loaded.diners, recipe.diners);
        assert_eq!(loaded.ingredients, recipe.ingredients);
        assert_eq!(loaded.utensils, recipe.utensils);
        assert_eq!(loaded, recipe);
    }

    #[test]
    fn insert_assigns_fresh_ids() {
        let mut conn = database::test_connection();
        let first = insert(&mut conn, &stew()).unwrap();
        let second = insert(&mut conn, &stew()).unwrap();
        assert_ne!(first, second);

        delete(&mut conn, second).unwrap();
        let third = insert(&mut conn, &stew()).unwrap();
        assert!(third != first && third != second);
        assert_eq!(count(&mut conn).unwrap(), 2);
    }

    #[test]
    fn missing_recipe_is_none() {
        let mut conn = database::test_connection();
        assert!(get_by_id(&mut conn, RecipeId::from(1)).unwrap().is_none());
    }

    #[test]
    fn units_flag_is_cleared_when_ingredient_forbids_units() {
        let mut conn = database::test_connection();
        let mut recipe = stew();
        let rice = crate::catalog::get_ingredient(&mut conn, IngredientId::from(1))
            .unwrap()
            .unwrap();
        assert!(!rice.allows_units);
        recipe
            .ingredients
            .insert(rice.id, RecipeIngredientProperties::units(2.0));

        let id = insert(&mut conn, &recipe).unwrap();
        let loaded = get_by_id(&mut conn, id).unwrap().unwrap();
        assert_eq!(
            loaded.ingredients[&rice.id],
            RecipeIngredientProperties::new(2.0)
        );
    }

    #[test]
    fn unknown_catalog_ids_are_rejected() {
        let mut conn = database::test_connection();

        let mut recipe = stew();
        recipe
            .ingredients
            .insert(IngredientId::from(9999), RecipeIngredientProperties::new(1.0));
        let error = insert(&mut conn, &recipe).unwrap_err();
        assert!(matches!(
            error,
            Error::ConstraintViolation(Record::Ingredient(i)) if i == IngredientId::from(9999)
        ));

        let mut recipe = stew();
        recipe.utensils.insert(UtensilId::from(9999));
        let error = insert(&mut conn, &recipe).unwrap_err();
        assert!(matches!(
            error,
            Error::ConstraintViolation(Record::Utensil(_))
        ));

        assert_eq!(count(&mut conn).unwrap(), 0);
        assert!(get_all(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn failed_update_leaves_recipe_untouched() {
        let mut conn = database::test_connection();
        let recipe = stew();
        let id = insert(&mut conn, &recipe).unwrap();

        let mut changed = stew();
        changed.name = "Broken stew".into();
        changed.ingredients.clear();
        changed.utensils.insert(UtensilId::from(9999));
        assert!(matches!(
            update(&mut conn, id, &changed),
            Err(Error::ConstraintViolation(Record::Utensil(u))) if u == UtensilId::from(9999)
        ));

        assert_eq!(get_by_id(&mut conn, id).unwrap().unwrap(), recipe);
    }

    #[test]
    fn invalid_recipe_is_rejected() {
        let mut conn = database::test_connection();
        let mut recipe = stew();
        recipe.diners = 0;
        assert!(matches!(
            insert(&mut conn, &recipe),
            Err(Error::InvalidRecipe(_))
        ));
    }

    #[test]
    fn update_replaces_fields_and_associations() {
        let mut conn = database::test_connection();
        let id = insert(&mut conn, &stew()).unwrap();

        let mut changed = stew();
        changed.name = "Fish stew".into();
        changed.budget = 20;
        changed.created_at = at(23);
        changed.ingredients = btreemap! {
            IngredientId::from(4) => RecipeIngredientProperties::units(2.0),
        };
        changed.utensils = btreeset! { UtensilId::from(5) };
        update(&mut conn, id, &changed).unwrap();

        let loaded = get_by_id(&mut conn, id).unwrap().unwrap();
        assert_eq!(loaded.name, "Fish stew");
        assert_eq!(loaded.budget, 20);
        assert_eq!(loaded.ingredients, changed.ingredients);
        assert_eq!(loaded.utensils, changed.utensils);
        assert_eq!(loaded.created_at, at(9));
    }

    #[test]
    fn update_is_idempotent() {
        let mut conn = database::test_connection();
        let id = insert(&mut conn, &stew()).unwrap();

        let mut changed = stew();
        changed.diners = 6;
        changed.utensils.remove(&UtensilId::from(2));

        update(&mut conn, id, &changed).unwrap();
        let once = get_all(&mut conn).unwrap();
        let rows_once = association_rows(&mut conn, id);

        update(&mut conn, id, &changed).unwrap();
        assert_eq!(get_all(&mut conn).unwrap(), once);
        assert_eq!(association_rows(&mut conn, id), rows_once);
    }

    #[test]
    fn update_and_delete_missing_recipe() {
        let mut conn = database::test_connection();
        let missing = RecipeId::from(42);
        assert!(matches!(
            update(&mut conn, missing, &stew()),
            Err(Error::NotFound(Record::Recipe(r))) if r == missing
        ));
        assert!(matches!(
            delete(&mut conn, missing),
            Err(Error::NotFound(Record::Recipe(_)))
        ));
    }

    #[test]
    fn delete_cascades() {
        let mut conn = database::test_connection();
        let id = insert(&mut conn, &stew()).unwrap();
        let kept = insert(&mut conn, &stew()).unwrap();
        assert_eq!(association_rows(&mut conn, id), 4);

        delete(&mut conn, id).unwrap();
        assert!(get_by_id(&mut conn, id).unwrap().is_none());
        assert_eq!(association_rows(&mut conn, id), 0);
        assert_eq!(association_rows(&mut conn, kept), 4);
    }

    #[test]
    fn get_by_ids_preserves_order() {
        let mut conn = database::test_connection();
        let a = insert(&mut conn, &stew()).unwrap();
        let mut other = stew();
        other.name = "Salad".into();
        other.utensils.clear();
        let b = insert(&mut conn, &other).unwrap();

        let loaded = get_by_ids(&mut conn, &[b, RecipeId::from(777), a]).unwrap();
        let ids: Vec<_> = loaded.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![b, a]);
        assert_eq!(loaded[0].1, other);
        assert_eq!(loaded[1].1, stew());

        assert!(get_by_ids(&mut conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn get_all_is_newest_first() {
        let mut conn = database::test_connection();
        let mut recipe = stew();
        let old = insert(&mut conn, &recipe).unwrap();
        recipe.created_at = at(18);
        let new = insert(&mut conn, &recipe).unwrap();
        let tied = insert(&mut conn, &recipe).unwrap();

        let ids: Vec<_> = get_all(&mut conn)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![tied, new, old]);
    }

    #[test]
    fn reads_more_recipes_than_sqlite_binds_at_once() {
        const RECIPES: i64 = 33_000;

        let mut conn = database::test_connection();
        diesel::sql_query(format!(
            "INSERT INTO recipes (name, body, budget, diners, created_at) \
             WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < {RECIPES}) \
             SELECT 'Stew ' || i, '', 10, 2, '2024-03-02 12:00:00' FROM n"
        ))
        .execute(&mut conn)
        .unwrap();
        diesel::sql_query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount, in_units) \
             SELECT id, 1, 2.0, 0 FROM recipes",
        )
        .execute(&mut conn)
        .unwrap();
        assert_eq!(count(&mut conn).unwrap(), RECIPES);

        let all = get_all(&mut conn).unwrap();
        assert_eq!(all.len() as i64, RECIPES);
        assert_eq!(all[0].0, RecipeId::from(RECIPES as i32));
        assert!(all.iter().all(|(_, r)| r.ingredients.len() == 1));

        let ids: Vec<RecipeId> = all.iter().map(|(id, _)| *id).collect();
        let by_ids = get_by_ids(&mut conn, &ids).unwrap();
        assert_eq!(by_ids, all);

        let searched =
            crate::compiler::search_recipes(&mut conn, &crate::query::RecipeQuery::new()).unwrap();
        assert_eq!(searched.len() as i64, RECIPES);
    }
}
