use std::fmt;

use crate::foundation::error::{RoomError, RoomResult};

/// Category of the host figure.
pub const HOST_CATEGORY: &str = "host";
/// Key of a style's bare body mesh.
pub const BODY_KEY: &str = "human";

/// Role of a mesh asset in the dressing room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// The narrating host figure.
    Host,
    /// A style's skinned body, owner of the skeleton.
    Body,
    /// An outfit bound onto a body.
    Garment,
}

/// Identifies one mesh resource as `(category, key)`.
///
/// Both parts are single path segments: non-empty, no separators, no `.`/`..`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
    category: String,
    key: String,
}

impl AssetId {
    /// Build an id from raw parts.
    pub fn new(category: impl Into<String>, key: impl Into<String>) -> RoomResult<Self> {
        let category = category.into();
        let key = key.into();
        validate_segment("category", &category)?;
        validate_segment("key", &key)?;
        Ok(Self { category, key })
    }

    /// The host figure, `("host", "host")`.
    pub fn host() -> Self {
        Self {
            category: HOST_CATEGORY.to_string(),
            key: HOST_CATEGORY.to_string(),
        }
    }

    /// A style's body, `(style, "human")`.
    pub fn body(style: &str) -> RoomResult<Self> {
        Self::new(style, BODY_KEY)
    }

    /// A style's outfit, `(style, outfit)`.
    pub fn garment(style: &str, outfit: &str) -> RoomResult<Self> {
        if outfit == BODY_KEY {
            return Err(RoomError::validation(format!(
                "outfit key '{BODY_KEY}' is reserved for bodies"
            )));
        }
        Self::new(style, outfit)
    }

    /// Category part (a style, or `host`).
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Key part (outfit, `human` or `host`).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Role derived from the id layout.
    pub fn kind(&self) -> AssetKind {
        if self.category == HOST_CATEGORY {
            AssetKind::Host
        } else if self.key == BODY_KEY {
            AssetKind::Body
        } else {
            AssetKind::Garment
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.key)
    }
}

fn validate_segment(what: &str, s: &str) -> RoomResult<()> {
    if s.trim().is_empty() {
        return Err(RoomError::validation(format!(
            "asset {what} must be non-empty"
        )));
    }
    if s == "." || s == ".." || s.contains(['/', '\\']) {
        return Err(RoomError::validation(format!(
            "asset {what} '{s}' must be a single path segment"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/id.rs"]
mod tests;
