//! # Recipe Identity
//!
//! Locally authored recipes draw their ids from a reserved range that starts at
//! [`LOCAL_ID_FLOOR`]. Anything below it belongs to the external recipe API.
//! The raw number is only interpreted at the boundary (route parameters);
//! everything stored carries the tagged [`RecipeRef`] instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First id handed out to a locally authored recipe.
pub const LOCAL_ID_FLOOR: i64 = 10_000_000;

/// Where a recipe lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    Local,
    External,
}

impl RecipeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipeSource::Local => "local",
            RecipeSource::External => "external",
        }
    }
}

/// Classifies a raw recipe id by the reserved-range convention.
pub fn classify(recipe_id: i64) -> RecipeSource {
    if recipe_id >= LOCAL_ID_FLOOR {
        RecipeSource::Local
    } else {
        RecipeSource::External
    }
}

/// A recipe reference with its source made explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "lowercase")]
pub enum RecipeRef {
    Local(i64),
    External(i64),
}

impl RecipeRef {
    /// Tags an untagged id coming in from a URL or a form.
    pub fn from_raw(recipe_id: i64) -> Self {
        match classify(recipe_id) {
            RecipeSource::Local => RecipeRef::Local(recipe_id),
            RecipeSource::External => RecipeRef::External(recipe_id),
        }
    }

    /// Rebuilds a reference from its stored parts. Returns `None` when the tag
    /// disagrees with the id range, which would mean corrupted data.
    pub fn from_parts(source: RecipeSource, recipe_id: i64) -> Option<Self> {
        if classify(recipe_id) != source {
            return None;
        }
        Some(match source {
            RecipeSource::Local => RecipeRef::Local(recipe_id),
            RecipeSource::External => RecipeRef::External(recipe_id),
        })
    }

    pub fn id(self) -> i64 {
        match self {
            RecipeRef::Local(id) | RecipeRef::External(id) => id,
        }
    }

    pub fn source(self) -> RecipeSource {
        match self {
            RecipeRef::Local(_) => RecipeSource::Local,
            RecipeRef::External(_) => RecipeSource::External,
        }
    }
}

impl fmt::Display for RecipeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source().as_str(), self.id())
    }
}
