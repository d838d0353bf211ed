// Copyright 2023 Remi Bernotavicius

use crate::catalog::{self, CatalogSeed};
use crate::{Error, Result};
use diesel::prelude::Connection as _;
use diesel::RunQueryDsl as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

pub mod models;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Opens (creating if needed) the database at `path`, brings the schema up to date and seeds the
/// catalog the first time the database is created.
pub fn establish_connection(path: impl AsRef<Path>, seed: &CatalogSeed) -> Result<Connection> {
    let path = path.as_ref();
    let url = path
        .to_str()
        .ok_or_else(|| Error::NonUtf8Path(path.to_owned()))?;
    let mut connection = open(url)?;
    catalog::seed_if_empty(&mut connection, seed)?;
    Ok(connection)
}

/// A private database that lives as long as the returned connection.
pub fn establish_in_memory(seed: &CatalogSeed) -> Result<Connection> {
    establish_connection(":memory:", seed)
}

/// Opens a connection with foreign keys enforced and all migrations applied. The catalog is left
/// untouched.
pub fn open(url: impl AsRef<str>) -> Result<Connection> {
    let mut connection = Connection::establish(url.as_ref())?;
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut connection)?;
    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(Error::Migration)?;
    Ok(connection)
}

/// Builds a `LIKE` pattern matching any text containing `needle` literally.
///
/// Must be used together with `ESCAPE '\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let seed = CatalogSeed::packaged().unwrap();
    establish_in_memory(&seed).unwrap()
}

#[test]
fn migrations() {
    let mut connection = Connection::establish(":memory:").unwrap();

    connection.run_pending_migrations(MIGRATIONS).unwrap();
    connection.revert_all_migrations(MIGRATIONS).unwrap();
    connection.run_pending_migrations(MIGRATIONS).unwrap();
    assert!(!connection.has_pending_migration(MIGRATIONS).unwrap());
}

#[test]
fn contains_pattern_escapes_wildcards() {
    assert_eq!(contains_pattern(""), "%%");
    assert_eq!(contains_pattern("pie"), "%pie%");
    assert_eq!(contains_pattern("100%_\\"), "%100\\%\\_\\\\%");
}

#[test]
fn catalog_is_seeded_once() {
    use diesel::QueryDsl as _;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.sqlite");

    let packaged = CatalogSeed::packaged().unwrap();
    let expected = catalog::all_ingredients(&mut establish_connection(&path, &packaged).unwrap())
        .unwrap()
        .len();

    let other = CatalogSeed {
        measurement_types: vec!["weight".into()],
        utensils: vec!["spoon".into()],
        ingredients: vec![],
    };
    let mut conn = establish_connection(&path, &other).unwrap();
    assert_eq!(catalog::all_ingredients(&mut conn).unwrap().len(), expected);

    let utensil_count: i64 = schema::utensils::table
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(utensil_count as usize, packaged.utensils.len());
}

#[test]
fn foreign_keys_are_enforced() {
    let mut conn = test_connection();
    let result = diesel::sql_query(
        "INSERT INTO recipe_utensils (recipe_id, utensil_id) VALUES (12345, 1)",
    )
    .execute(&mut conn);
    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn non_utf8_path_is_refused() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt as _;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(OsStr::from_bytes(b"data\xff.sqlite"));
    let seed = CatalogSeed::packaged().unwrap();

    assert!(matches!(
        establish_connection(&path, &seed),
        Err(Error::NonUtf8Path(p)) if p == path
    ));
    assert!(!path.exists());
}
