// Copyright 2023 Remi Bernotavicius

//! Recipe notes kept in a local SQLite database, with a fixed catalog of ingredients, utensils
//! and measurement types, and a structured search over all of them.

pub mod catalog;
pub mod compiler;
pub mod database;
mod error;
pub mod listing;
pub mod query;
pub mod recipe;
pub mod session;
pub mod store;

pub use error::{Error, Record, Result};
