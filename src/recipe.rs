// Copyright 2023 Remi Bernotavicius

use crate::database::models::{
    Ingredient, IngredientId, NewRecipe, RecipeChanges, RecipeIngredient, RecipeRecord,
    RecipeUtensil, UtensilId,
};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// How much of an ingredient a recipe uses.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RecipeIngredientProperties {
    pub amount: f32,
    /// The amount counts whole units ("2 onions") rather than the ingredient's measurement type.
    /// Only ever true for ingredients that allow units.
    pub in_units: bool,
}

impl RecipeIngredientProperties {
    pub fn new(amount: f32) -> Self {
        Self {
            amount,
            in_units: false,
        }
    }

    pub fn units(amount: f32) -> Self {
        Self {
            amount,
            in_units: true,
        }
    }

    pub fn for_ingredient(ingredient: &Ingredient, amount: f32, in_units: bool) -> Self {
        Self {
            amount,
            in_units: in_units && ingredient.allows_units,
        }
    }
}

/// A recipe as the rest of the application sees it, with its associations resolved. A recipe
/// that hasn't been inserted yet is a draft; it gets an id from `store::insert`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: String,
    pub body: String,
    pub budget: i32,
    pub diners: i32,
    pub created_at: chrono::NaiveDateTime,
    pub ingredients: BTreeMap<IngredientId, RecipeIngredientProperties>,
    pub utensils: BTreeSet<UtensilId>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: String::new(),
            budget: 0,
            diners: 1,
            created_at: chrono::Utc::now().naive_utc(),
            ingredients: BTreeMap::new(),
            utensils: BTreeSet::new(),
        }
    }

    /// Adds or replaces an ingredient, returning what it replaced.
    pub fn set_ingredient(
        &mut self,
        ingredient: &Ingredient,
        amount: f32,
        in_units: bool,
    ) -> Option<RecipeIngredientProperties> {
        self.ingredients.insert(
            ingredient.id,
            RecipeIngredientProperties::for_ingredient(ingredient, amount, in_units),
        )
    }

    pub fn remove_ingredient(&mut self, id: IngredientId) -> bool {
        self.ingredients.remove(&id).is_some()
    }

    pub fn add_utensil(&mut self, id: UtensilId) -> bool {
        self.utensils.insert(id)
    }

    pub fn remove_utensil(&mut self, id: UtensilId) -> bool {
        self.utensils.remove(&id)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRecipe("name must not be empty".into()));
        }
        if self.budget < 0 {
            return Err(Error::InvalidRecipe(format!(
                "budget must not be negative, got {}",
                self.budget
            )));
        }
        if self.diners < 1 {
            return Err(Error::InvalidRecipe(format!(
                "diners must be positive, got {}",
                self.diners
            )));
        }
        for (id, properties) in &self.ingredients {
            if !(properties.amount.is_finite() && properties.amount > 0.0) {
                return Err(Error::InvalidRecipe(format!(
                    "amount of ingredient {id} must be positive, got {}",
                    properties.amount
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn from_rows(
        record: RecipeRecord,
        ingredients: Vec<RecipeIngredient>,
        utensils: Vec<RecipeUtensil>,
    ) -> Self {
        Self {
            name: record.name,
            body: record.body,
            budget: record.budget,
            diners: record.diners,
            created_at: record.created_at,
            ingredients: ingredients
                .into_iter()
                .map(|i| {
                    (
                        i.ingredient_id,
                        RecipeIngredientProperties {
                            amount: i.amount,
                            in_units: i.in_units,
                        },
                    )
                })
                .collect(),
            utensils: utensils.into_iter().map(|u| u.utensil_id).collect(),
        }
    }
}

impl<'a> From<&'a Recipe> for NewRecipe<'a> {
    fn from(recipe: &'a Recipe) -> Self {
        Self {
            name: &recipe.name,
            body: &recipe.body,
            budget: recipe.budget,
            diners: recipe.diners,
            created_at: recipe.created_at,
        }
    }
}

impl<'a> From<&'a Recipe> for RecipeChanges<'a> {
    fn from(recipe: &'a Recipe) -> Self {
        Self {
            name: &recipe.name,
            body: &recipe.body,
            budget: recipe.budget,
            diners: recipe.diners,
        }
    }
}
