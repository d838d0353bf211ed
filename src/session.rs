// Copyright 2023 Remi Bernotavicius

//! A recipe being edited, handed from one edit step to the next until it is committed.

use crate::database;
use crate::database::models::RecipeId;
use crate::recipe::Recipe;
use crate::store;
use crate::{Error, Record, Result};

pub struct EditSession {
    target: Option<RecipeId>,
    draft: Recipe,
}

impl EditSession {
    /// Starts a recipe that doesn't exist yet.
    pub fn create(draft: Recipe) -> Self {
        Self {
            target: None,
            draft,
        }
    }

    /// Starts editing a stored recipe.
    pub fn edit(conn: &mut database::Connection, recipe_id: RecipeId) -> Result<Self> {
        let draft = store::get_by_id(conn, recipe_id)?
            .ok_or(Error::NotFound(Record::Recipe(recipe_id)))?;
        Ok(Self {
            target: Some(recipe_id),
            draft,
        })
    }

    /// The stored recipe this session writes to, if it has been stored.
    pub fn target(&self) -> Option<RecipeId> {
        self.target
    }

    pub fn draft(&self) -> &Recipe {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Recipe {
        &mut self.draft
    }

    /// Writes the draft. The first commit of a new recipe inserts it, later commits update it.
    pub fn commit(&mut self, conn: &mut database::Connection) -> Result<RecipeId> {
        match self.target {
            Some(recipe_id) => {
                store::update(conn, recipe_id, &self.draft)?;
                Ok(recipe_id)
            }
            None => {
                let recipe_id = store::insert(conn, &self.draft)?;
                self.target = Some(recipe_id);
                Ok(recipe_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::database::models::{IngredientId, UtensilId};

    #[test]
    fn new_recipe_is_inserted_then_updated() {
        let mut conn = database::test_connection();
        let salmon = catalog::search_ingredients(&mut conn, "salmon")
            .unwrap()
            .remove(0);

        let mut session = EditSession::create(Recipe::new("Baked salmon"));
        assert_eq!(session.target(), None);
        session.draft_mut().set_ingredient(&salmon, 2.0, true);
        session.draft_mut().add_utensil(UtensilId::from(3));

        let id = session.commit(&mut conn).unwrap();
        assert_eq!(session.target(), Some(id));

        session.draft_mut().diners = 2;
        assert_eq!(session.commit(&mut conn).unwrap(), id);

        assert_eq!(store::count(&mut conn).unwrap(), 1);
        let stored = store::get_by_id(&mut conn, id).unwrap().unwrap();
        assert_eq!(&stored, session.draft());
    }

    #[test]
    fn editing_loads_the_stored_recipe() {
        let mut conn = database::test_connection();
        let mut recipe = Recipe::new("Rice");
        recipe.ingredients.insert(
            IngredientId::INITIAL,
            crate::recipe::RecipeIngredientProperties::new(100.0),
        );
        let id = store::insert(&mut conn, &recipe).unwrap();

        let mut session = EditSession::edit(&mut conn, id).unwrap();
        assert_eq!(session.draft(), &recipe);
        session.draft_mut().remove_ingredient(IngredientId::INITIAL);
        session.commit(&mut conn).unwrap();

        let stored = store::get_by_id(&mut conn, id).unwrap().unwrap();
        assert!(stored.ingredients.is_empty());
    }

    #[test]
    fn editing_a_missing_recipe() {
        let mut conn = database::test_connection();
        assert!(matches!(
            EditSession::edit(&mut conn, RecipeId::from(5)),
            Err(Error::NotFound(Record::Recipe(_)))
        ));
    }
}
