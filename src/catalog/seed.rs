// Copyright 2023 Remi Bernotavicius

use derive_more::Display;
use plist::dictionary::Dictionary;
use plist::Value;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

const PACKAGED: &[u8] = include_bytes!("../../assets/catalog.plist");

/// Kinds of property list value, as reported when the catalog holds the wrong one.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Dictionary,
    Array,
    String,
    Boolean,
    Number,
    Data,
    Date,
    Other,
}

impl ValueKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Dictionary(_) => Self::Dictionary,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Boolean(_) => Self::Boolean,
            Value::Integer(_) | Value::Real(_) => Self::Number,
            Value::Data(_) => Self::Data,
            Value::Date(_) => Self::Date,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no such key {needle:?} found in {haystack:?}")]
    NoSuchKey {
        needle: String,
        haystack: Vec<String>,
    },
    #[error("expected {expected} but found {actual}")]
    WrongType {
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("{0} with an empty name")]
    EmptyName(&'static str),
    #[error("ingredient name {0:?} has an empty segment")]
    EmptySegment(String),
    #[error("ingredient {ingredient:?} has unknown measurement type {measurement:?}")]
    UnknownMeasurement {
        ingredient: String,
        measurement: String,
    },
    #[error("duplicate {kind} {name:?}")]
    Duplicate { kind: &'static str, name: String },
    #[error(transparent)]
    Plist(#[from] plist::Error),
}

type Result<T> = std::result::Result<T, DecodeError>;

/// Narrows `value` with `project`, which must accept exactly the `expected` kind.
fn cast<'a, T>(
    value: &'a Value,
    expected: ValueKind,
    project: fn(&'a Value) -> Option<T>,
) -> Result<T> {
    project(value).ok_or(DecodeError::WrongType {
        expected,
        actual: ValueKind::of(value),
    })
}

/// A dictionary of the catalog file, read key by key.
struct Entry<'a>(&'a Dictionary);

impl<'a> Entry<'a> {
    fn field(&self, key: &str) -> Result<&'a Value> {
        self.0.get(key).ok_or_else(|| DecodeError::NoSuchKey {
            needle: key.into(),
            haystack: self.0.keys().cloned().collect(),
        })
    }

    fn string(&self, key: &str) -> Result<&'a str> {
        cast(self.field(key)?, ValueKind::String, Value::as_string)
    }

    fn flag(&self, key: &str) -> Result<bool> {
        cast(self.field(key)?, ValueKind::Boolean, Value::as_boolean)
    }

    /// An array whose elements all have the `expected` kind.
    fn list<T>(
        &self,
        key: &str,
        expected: ValueKind,
        project: fn(&'a Value) -> Option<T>,
    ) -> Result<Vec<T>> {
        cast(self.field(key)?, ValueKind::Array, Value::as_array)?
            .iter()
            .map(|element| cast(element, expected, project))
            .collect()
    }

    fn names(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .list(key, ValueKind::String, Value::as_string)?
            .into_iter()
            .map(String::from)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientDefinition {
    pub full_name: String,
    pub measurement: String,
    pub allows_units: bool,
}

/// The definitions the catalog tables are filled from. Ids are handed out in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSeed {
    pub measurement_types: Vec<String>,
    pub utensils: Vec<String>,
    pub ingredients: Vec<IngredientDefinition>,
}

impl CatalogSeed {
    /// The catalog shipped with the application.
    pub fn packaged() -> Result<Self> {
        Self::from_bytes(PACKAGED)
    }

    /// Decodes an XML or binary property list.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let contents = Value::from_reader(Cursor::new(bytes))?;
        decode_catalog(&contents)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = Value::from_file(path)?;
        decode_catalog(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        let measurement_types = unique_names("measurement type", &self.measurement_types)?;
        unique_names("utensil", &self.utensils)?;

        let mut seen = HashSet::new();
        for ingredient in &self.ingredients {
            let name = &ingredient.full_name;
            if name.trim().is_empty() {
                return Err(DecodeError::EmptyName("ingredient"));
            }
            if name.split('.').any(|segment| segment.trim().is_empty()) {
                return Err(DecodeError::EmptySegment(name.clone()));
            }
            if !measurement_types.contains(ingredient.measurement.as_str()) {
                return Err(DecodeError::UnknownMeasurement {
                    ingredient: name.clone(),
                    measurement: ingredient.measurement.clone(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(DecodeError::Duplicate {
                    kind: "ingredient",
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn unique_names<'a>(kind: &'static str, names: &'a [String]) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(DecodeError::EmptyName(kind));
        }
        if !seen.insert(name.as_str()) {
            return Err(DecodeError::Duplicate {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(seen)
}

fn decode_catalog(root: &Value) -> Result<CatalogSeed> {
    let root = Entry(cast(root, ValueKind::Dictionary, Value::as_dictionary)?);

    let measurement_types = root.names("MeasurementTypes")?;
    let utensils = root.names("Utensils")?;
    let ingredients = root
        .list("Ingredients", ValueKind::Dictionary, Value::as_dictionary)?
        .into_iter()
        .map(|definition| -> Result<IngredientDefinition> {
            let definition = Entry(definition);
            Ok(IngredientDefinition {
                full_name: definition.string("Name")?.into(),
                measurement: definition.string("Measurement")?.into(),
                allows_units: definition.flag("AllowsUnits")?,
            })
        })
        .collect::<Result<_>>()?;

    let seed = CatalogSeed {
        measurement_types,
        utensils,
        ingredients,
    };
    seed.validate()?;
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plist(body: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
{body}
</dict>
</plist>"#
        )
        .into_bytes()
    }

    const LISTS: &str = r#"
    <key>MeasurementTypes</key>
    <array><string>weight</string><string>volume</string></array>
    <key>Utensils</key>
    <array><string>pan</string></array>"#;

    #[test]
    fn packaged_catalog_decodes() {
        let seed = CatalogSeed::packaged().unwrap();
        assert!(seed.measurement_types.contains(&"weight".to_string()));
        assert!(seed.utensils.len() >= 5);
        assert!(seed.ingredients.len() >= 3);
        assert!(seed
            .ingredients
            .iter()
            .any(|i| i.full_name == "seafood.fish.salmon" && i.allows_units));
    }

    #[test]
    fn decodes_ingredient_definitions() {
        let bytes = plist(&format!(
            r#"{LISTS}
    <key>Ingredients</key>
    <array>
        <dict>
            <key>Name</key><string>dairy.milk</string>
            <key>Measurement</key><string>volume</string>
            <key>AllowsUnits</key><false/>
        </dict>
    </array>"#
        ));
        let seed = CatalogSeed::from_bytes(&bytes).unwrap();
        assert_eq!(seed.measurement_types, vec!["weight", "volume"]);
        assert_eq!(seed.utensils, vec!["pan"]);
        assert_eq!(
            seed.ingredients,
            vec![IngredientDefinition {
                full_name: "dairy.milk".into(),
                measurement: "volume".into(),
                allows_units: false,
            }]
        );
    }

    #[test]
    fn missing_key() {
        let bytes = plist(
            r#"<key>MeasurementTypes</key><array/>
            <key>Ingredients</key><array/>"#,
        );
        let error = CatalogSeed::from_bytes(&bytes).unwrap_err();
        assert!(
            matches!(&error, DecodeError::NoSuchKey { needle, .. } if needle == "Utensils"),
            "{error}"
        );
    }

    #[test]
    fn wrong_type() {
        let bytes = plist(&format!(
            r#"{LISTS}
    <key>Ingredients</key>
    <array>
        <dict>
            <key>Name</key><string>dairy.milk</string>
            <key>Measurement</key><string>volume</string>
            <key>AllowsUnits</key><string>no</string>
        </dict>
    </array>"#
        ));
        let error = CatalogSeed::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            error,
            DecodeError::WrongType {
                expected: ValueKind::Boolean,
                actual: ValueKind::String
            }
        ));
        assert_eq!(error.to_string(), "expected Boolean but found String");
    }

    #[test]
    fn list_element_of_wrong_type() {
        let bytes = plist(
            r#"<key>MeasurementTypes</key>
    <array><string>weight</string><integer>2</integer></array>
    <key>Utensils</key><array/>
    <key>Ingredients</key><array/>"#,
        );
        assert!(matches!(
            CatalogSeed::from_bytes(&bytes),
            Err(DecodeError::WrongType {
                expected: ValueKind::String,
                actual: ValueKind::Number
            })
        ));

        let bytes = plist(r#"<key>MeasurementTypes</key><string>weight</string>"#);
        assert!(matches!(
            CatalogSeed::from_bytes(&bytes),
            Err(DecodeError::WrongType {
                expected: ValueKind::Array,
                actual: ValueKind::String
            })
        ));
    }

    #[test]
    fn unknown_measurement() {
        let bytes = plist(&format!(
            r#"{LISTS}
    <key>Ingredients</key>
    <array>
        <dict>
            <key>Name</key><string>dairy.egg</string>
            <key>Measurement</key><string>unit</string>
            <key>AllowsUnits</key><true/>
        </dict>
    </array>"#
        ));
        let error = CatalogSeed::from_bytes(&bytes).unwrap_err();
        assert!(matches!(error, DecodeError::UnknownMeasurement { .. }));
    }

    #[test]
    fn not_a_plist() {
        let error =
            CatalogSeed::from_bytes(b"<?xml version=\"1.0\"?><plist><dict><key>").unwrap_err();
        assert!(matches!(error, DecodeError::Plist(_)));
    }

    #[test]
    fn invalid_names() {
        let mut seed = CatalogSeed::packaged().unwrap();
        seed.utensils.push(seed.utensils[0].clone());
        assert!(matches!(
            seed.validate(),
            Err(DecodeError::Duplicate {
                kind: "utensil",
                ..
            })
        ));

        let mut seed = CatalogSeed::packaged().unwrap();
        seed.ingredients[0].full_name = "seafood..salmon".into();
        assert!(matches!(seed.validate(), Err(DecodeError::EmptySegment(_))));

        let mut seed = CatalogSeed::packaged().unwrap();
        seed.measurement_types.push("  ".into());
        assert!(matches!(
            seed.validate(),
            Err(DecodeError::EmptyName("measurement type"))
        ));
    }
}
