//! Data models for craftable items and their recipes

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;

/// Identifier of a craftable or raw item, e.g. `IronGearWheel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Ingredient -> quantity, in declared order.
///
/// Only the presence of an ingredient matters to graph construction; the
/// quantity is carried for display.
pub type Recipe = IndexMap<ItemId, u32>;

/// Catalog record for one item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemInfo {
    pub recipe: Recipe,
    /// Facilities able to make this item, preferred first
    pub producers: Vec<String>,
    /// Crafting time in seconds
    pub time: f64,
}

impl ItemInfo {
    pub fn new(recipe: Recipe, producers: Vec<String>, time: f64) -> Self {
        Self {
            recipe,
            producers,
            time,
        }
    }

    /// An item with no ingredients is a raw resource.
    pub fn is_raw(&self) -> bool {
        self.recipe.is_empty()
    }

    /// The facility used for labelling; only the first declared one is ever used.
    pub fn first_producer(&self) -> Option<&str> {
        self.producers.first().map(String::as_str)
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &ItemId> {
        self.recipe.keys()
    }
}
