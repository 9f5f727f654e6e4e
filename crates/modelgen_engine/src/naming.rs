//! Naming facade.
//!
//! Every emitter derives its names from the same table: a canonical entity
//! name (`HeroData` → `Hero`), an identifier (`hero_data`), and their plural
//! and lowerCamel variants. Names are derived once per type and cached.

use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use modelgen_foundation::{EntityTypeId, Error, Result};
use modelgen_schema::ModelRegistry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trailing words dropped from a type name to form its canonical name.
const CONVENTIONAL_SUFFIXES: &[&str] = &["data", "model", "base"];

/// Words whose plural is the word itself.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "fish",
    "information",
    "money",
    "rice",
    "series",
    "sheep",
    "species",
];

/// Derived names of one entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Names {
    /// `HeroLadderData` → `HeroLadder`.
    pub canonical: String,
    /// `HeroLadders`.
    pub canonical_plural: String,
    /// `hero_ladder_data`, also the reference type tag.
    pub identifier: String,
    /// `hero_ladder_data` (uncountable).
    pub identifier_plural: String,
    /// `heroLadderData`.
    pub camel: String,
    /// `heroLadderData`.
    pub camel_plural: String,
}

impl Names {
    /// Derives every name from a declared type name.
    #[must_use]
    pub fn derive(type_name: &str) -> Self {
        let canonical = canonical_name(type_name);
        let identifier = identifier_name(type_name);
        let identifier_plural = pluralize(&identifier);
        Self {
            canonical_plural: pluralize(&canonical),
            camel: identifier.to_lower_camel_case(),
            camel_plural: identifier_plural.to_lower_camel_case(),
            canonical,
            identifier,
            identifier_plural,
        }
    }
}

/// Canonical entity name: drop a trailing `data`, `model` or `base` word
/// when another word remains, then PascalCase.
#[must_use]
pub fn canonical_name(type_name: &str) -> String {
    let snake = type_name.to_snake_case();
    let mut words: Vec<&str> = snake.split('_').filter(|w| !w.is_empty()).collect();
    if words.len() > 1
        && words
            .last()
            .is_some_and(|last| CONVENTIONAL_SUFFIXES.contains(last))
    {
        words.pop();
    }
    words.join("_").to_upper_camel_case()
}

/// Identifier name: snake_case of the full type name.
#[must_use]
pub fn identifier_name(type_name: &str) -> String {
    type_name.to_snake_case()
}

/// English plural of the last word of `name`, preserving its casing style.
#[must_use]
pub fn pluralize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let last_word = lower
        .rsplit(|c: char| c == '_' || c == ' ')
        .next()
        .unwrap_or(&lower);
    // PascalCase names: the last word starts at the last uppercase letter.
    let last_word = match name.rfind(|c: char| c.is_ascii_uppercase()) {
        Some(start) if !name.contains('_') => &lower[start..],
        _ => last_word,
    };

    if last_word.is_empty() || UNCOUNTABLE.contains(&last_word) {
        return name.to_string();
    }
    if lower.ends_with("ta") || lower.ends_with("ia") {
        return name.to_string();
    }
    if ["x", "ch", "sh", "ss", "s", "z"].iter().any(|s| lower.ends_with(s)) {
        return format!("{name}es");
    }
    let mut chars = lower.chars().rev();
    if let (Some('y'), Some(before)) = (chars.next(), chars.next()) {
        if !"aeiou".contains(before) {
            return format!("{}ies", &name[..name.len() - 1]);
        }
    }
    format!("{name}s")
}

/// Memoized names per entity type.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    cache: HashMap<EntityTypeId, Names>,
}

impl NameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of `ty`, derived on first request.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntityType` if `ty` is not declared.
    pub fn names(&mut self, schema: &ModelRegistry, ty: EntityTypeId) -> Result<&Names> {
        if !self.cache.contains_key(&ty) {
            let names = Names::derive(schema.get(ty)?.name());
            self.cache.insert(ty, names);
        }
        self.cache
            .get(&ty)
            .ok_or_else(|| Error::internal("name cache lost an entry"))
    }

    /// Previously derived names of `ty`.
    #[must_use]
    pub fn get(&self, ty: EntityTypeId) -> Option<&Names> {
        self.cache.get(&ty)
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if no names were derived yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
