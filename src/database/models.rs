// Copyright 2023 Remi Bernotavicius

use derive_more::{Display, From};
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Insertable};
use diesel_derive_newtype::DieselNewType;

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct MeasurementTypeId(i32);

impl MeasurementTypeId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone, PartialEq, Eq, Hash)]
#[diesel(table_name = crate::database::schema::measurement_types)]
pub struct MeasurementType {
    pub id: MeasurementTypeId,
    pub name: String,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct IngredientId(i32);

impl IngredientId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// A catalog ingredient. `full_name` is dot-delimited, most general first, e.g.
/// `seafood.fish.salmon`.
#[derive(
    Associations, Queryable, Selectable, Identifiable, Insertable, Debug, Clone, PartialEq, Eq, Hash,
)]
#[diesel(belongs_to(MeasurementType))]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub full_name: String,
    pub measurement_type_id: MeasurementTypeId,
    pub allows_units: bool,
}

impl Ingredient {
    /// The leaf segment of the full name.
    pub fn display_name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(&self.full_name[..], |(_, leaf)| leaf)
    }

    /// The segments preceding the display name, most general first.
    pub fn category_path(&self) -> Vec<&str> {
        match self.full_name.rsplit_once('.') {
            Some((path, _)) => path.split('.').collect(),
            None => vec![],
        }
    }
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct UtensilId(i32);

impl UtensilId {
    pub const INITIAL: Self = Self(1);

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone, PartialEq, Eq, Hash)]
#[diesel(table_name = crate::database::schema::utensils)]
pub struct Utensil {
    pub id: UtensilId,
    pub name: String,
}

#[derive(DieselNewType, Debug, Display, From, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct RecipeId(i32);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeRecord {
    pub id: RecipeId,
    pub name: String,
    pub body: String,
    pub budget: i32,
    pub diners: i32,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub body: &'a str,
    pub budget: i32,
    pub diners: i32,
    pub created_at: chrono::NaiveDateTime,
}

/// Everything about a recipe row that an update may replace.
#[derive(AsChangeset)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeChanges<'a> {
    pub name: &'a str,
    pub body: &'a str,
    pub budget: i32,
    pub diners: i32,
}

#[derive(
    Associations, Queryable, Selectable, Identifiable, Insertable, Debug, Clone, Copy, PartialEq,
)]
#[diesel(belongs_to(RecipeRecord, foreign_key = recipe_id))]
#[diesel(primary_key(recipe_id, ingredient_id))]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct RecipeIngredient {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: f32,
    pub in_units: bool,
}

#[derive(
    Associations, Queryable, Selectable, Identifiable, Insertable, Debug, Clone, Copy, PartialEq, Eq,
)]
#[diesel(belongs_to(RecipeRecord, foreign_key = recipe_id))]
#[diesel(primary_key(recipe_id, utensil_id))]
#[diesel(table_name = crate::database::schema::recipe_utensils)]
pub struct RecipeUtensil {
    pub recipe_id: RecipeId,
    pub utensil_id: UtensilId,
}

#[test]
fn ingredient_names() {
    let salmon = Ingredient {
        id: IngredientId::INITIAL,
        full_name: "seafood.fish.salmon".into(),
        measurement_type_id: MeasurementTypeId::INITIAL,
        allows_units: true,
    };
    assert_eq!(salmon.display_name(), "salmon");
    assert_eq!(salmon.category_path(), vec!["seafood", "fish"]);

    let salt = Ingredient {
        full_name: "salt".into(),
        ..salmon.clone()
    };
    assert_eq!(salt.display_name(), "salt");
    assert!(salt.category_path().is_empty());
    assert_ne!(salt, salmon);
    assert_eq!(salmon.clone(), salmon);
}
