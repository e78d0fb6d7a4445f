//! Seams to collaborators that live outside the core.
//!
//! Asset path resolution lives with the cache in `assets::resolve`; this module holds the outfit
//! description lookup the poster card and host narration draw from.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{RoomError, RoomResult};

/// Text describing one outfit. Never returns an empty string.
pub trait DescriptionProvider: Send + Sync {
    /// Description of `outfit` in `style`.
    fn description(&self, style: &str, outfit: &str) -> String;
}

/// Generic sentence built from the keys alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackDescriptions;

impl DescriptionProvider for FallbackDescriptions {
    fn description(&self, style: &str, outfit: &str) -> String {
        format!("{style}风格{outfit}套装，主持人为您精心推荐。")
    }
}

/// Descriptions from a `{ "style": { "outfit": "text" } }` table.
///
/// Pairs missing from the table, or mapped to blank text, fall back to [`FallbackDescriptions`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapDescriptions {
    table: BTreeMap<String, BTreeMap<String, String>>,
}

impl MapDescriptions {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON table.
    pub fn from_json_str(s: &str) -> RoomResult<Self> {
        let table = serde_json::from_str(s)
            .map_err(|e| RoomError::serde(format!("description table: {e}")))?;
        Ok(Self { table })
    }

    /// Read and parse a JSON table file.
    pub fn from_path(path: &Path) -> RoomResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read description table '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Add or replace one entry.
    pub fn insert(
        &mut self,
        style: impl Into<String>,
        outfit: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.table
            .entry(style.into())
            .or_default()
            .insert(outfit.into(), text.into());
    }

    /// Number of `(style, outfit)` entries.
    pub fn len(&self) -> usize {
        self.table.values().map(BTreeMap::len).sum()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DescriptionProvider for MapDescriptions {
    fn description(&self, style: &str, outfit: &str) -> String {
        self.table
            .get(style)
            .and_then(|outfits| outfits.get(outfit))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| FallbackDescriptions.description(style, outfit))
    }
}

#[cfg(test)]
#[path = "../tests/unit/collab.rs"]
mod tests;
