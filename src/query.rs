// Copyright 2023 Remi Bernotavicius

//! The filter a recipe search is made of. Nothing here touches the database; see
//! [`crate::compiler`] for that.

use crate::database::models::{IngredientId, UtensilId};
use derive_more::Display;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Disposition {
    #[display("included")]
    Included,
    #[display("banned")]
    Banned,
}

impl Disposition {
    fn opposite(&self) -> Self {
        match self {
            Self::Included => Self::Banned,
            Self::Banned => Self::Included,
        }
    }
}

/// Which ids are included and which are banned. An id is never both.
#[derive(Debug, Clone)]
pub struct Dispositions<IdT> {
    entries: HashMap<IdT, Disposition>,
}

impl<IdT> Default for Dispositions<IdT> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<IdT: Copy + Eq + Hash> Dispositions<IdT> {
    /// Records `disposition` for `id`. An id that already has the opposite disposition is only
    /// flipped when `override_opposite` is set. Returns whether anything changed.
    pub fn set(&mut self, id: IdT, disposition: Disposition, override_opposite: bool) -> bool {
        match self.entries.get(&id) {
            Some(current) if *current == disposition => false,
            Some(current) if *current == disposition.opposite() && !override_opposite => false,
            _ => {
                self.entries.insert(id, disposition);
                true
            }
        }
    }

    pub fn include(&mut self, id: IdT, override_ban: bool) -> bool {
        self.set(id, Disposition::Included, override_ban)
    }

    pub fn ban(&mut self, id: IdT, override_include: bool) -> bool {
        self.set(id, Disposition::Banned, override_include)
    }

    pub fn get(&self, id: IdT) -> Option<Disposition> {
        self.entries.get(&id).copied()
    }

    pub fn is_included(&self, id: IdT) -> bool {
        self.get(id) == Some(Disposition::Included)
    }

    pub fn is_banned(&self, id: IdT) -> bool {
        self.get(id) == Some(Disposition::Banned)
    }

    pub fn with(&self, disposition: Disposition) -> HashSet<IdT> {
        self.entries
            .iter()
            .filter(|(_, d)| **d == disposition)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn included(&self) -> HashSet<IdT> {
        self.with(Disposition::Included)
    }

    pub fn banned(&self) -> HashSet<IdT> {
        self.with(Disposition::Banned)
    }

    pub fn clear_with(&mut self, disposition: Disposition) {
        self.entries.retain(|_, d| *d != disposition);
    }

    /// Forgets the disposition of a single id. Returns whether it had one.
    pub fn remove(&mut self, id: IdT) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Criteria for finding recipes. Unset criteria don't constrain anything.
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    /// Recipes whose name contains this.
    pub name: String,
    pub max_budget: Option<i32>,
    pub min_diners: Option<i32>,
    ingredients: Dispositions<IngredientId>,
    utensils: Dispositions<UtensilId>,
}

impl RecipeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_ingredient(&mut self, id: IngredientId, override_ban: bool) -> bool {
        self.ingredients.include(id, override_ban)
    }

    pub fn ban_ingredient(&mut self, id: IngredientId, override_include: bool) -> bool {
        self.ingredients.ban(id, override_include)
    }

    pub fn is_ingredient_present(&self, id: IngredientId) -> bool {
        self.ingredients.is_included(id)
    }

    pub fn is_ingredient_banned(&self, id: IngredientId) -> bool {
        self.ingredients.is_banned(id)
    }

    pub fn present_ingredients(&self) -> HashSet<IngredientId> {
        self.ingredients.included()
    }

    pub fn banned_ingredients(&self) -> HashSet<IngredientId> {
        self.ingredients.banned()
    }

    pub fn clear_present_ingredients(&mut self) {
        self.ingredients.clear_with(Disposition::Included);
    }

    pub fn clear_banned_ingredients(&mut self) {
        self.ingredients.clear_with(Disposition::Banned);
    }

    pub fn clear_all_ingredients(&mut self) {
        self.ingredients.clear();
    }

    pub fn unconstrain_ingredient(&mut self, id: IngredientId) -> bool {
        self.ingredients.remove(id)
    }

    pub fn ingredients(&self) -> &Dispositions<IngredientId> {
        &self.ingredients
    }

    pub fn include_utensil(&mut self, id: UtensilId, override_ban: bool) -> bool {
        self.utensils.include(id, override_ban)
    }

    pub fn ban_utensil(&mut self, id: UtensilId, override_include: bool) -> bool {
        self.utensils.ban(id, override_include)
    }

    pub fn is_utensil_present(&self, id: UtensilId) -> bool {
        self.utensils.is_included(id)
    }

    pub fn is_utensil_banned(&self, id: UtensilId) -> bool {
        self.utensils.is_banned(id)
    }

    pub fn present_utensils(&self) -> HashSet<UtensilId> {
        self.utensils.included()
    }

    pub fn banned_utensils(&self) -> HashSet<UtensilId> {
        self.utensils.banned()
    }

    pub fn clear_present_utensils(&mut self) {
        self.utensils.clear_with(Disposition::Included);
    }

    pub fn clear_banned_utensils(&mut self) {
        self.utensils.clear_with(Disposition::Banned);
    }

    pub fn clear_all_utensils(&mut self) {
        self.utensils.clear();
    }

    pub fn unconstrain_utensil(&mut self, id: UtensilId) -> bool {
        self.utensils.remove(id)
    }

    pub fn utensils(&self) -> &Dispositions<UtensilId> {
        &self.utensils
    }

    /// True when the query matches every recipe.
    pub fn is_unconstrained(&self) -> bool {
        self.name.is_empty()
            && self.max_budget.is_none()
            && self.min_diners.is_none()
            && self.ingredients.is_empty()
            && self.utensils.is_empty()
    }
}
