// Copyright 2023 Remi Bernotavicius

use crate::catalog::DecodeError;
use crate::database::models::{IngredientId, RecipeId, UtensilId};
use derive_more::Display;

/// A reference to a row that an operation needed but could not find.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Record {
    #[display("recipe {_0}")]
    Recipe(RecipeId),
    #[display("ingredient {_0}")]
    Ingredient(IngredientId),
    #[display("utensil {_0}")]
    Utensil(UtensilId),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(Record),
    #[error("{0} is not in the catalog")]
    ConstraintViolation(Record),
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),
    #[error("malformed catalog seed data: {0}")]
    MalformedSeedData(#[from] DecodeError),
    #[error("storage error: {0}")]
    Storage(#[from] diesel::result::Error),
    #[error("database path {0:?} is not valid UTF-8")]
    NonUtf8Path(std::path::PathBuf),
    #[error("failed to open database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("failed to run migrations: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync + 'static>),
}

pub type Result<T> = std::result::Result<T, Error>;
