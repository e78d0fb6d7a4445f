use std::path::{Path, PathBuf};

use crate::assets::id::{AssetId, AssetKind};
use crate::config::AssetLayout;
use crate::foundation::error::{RoomError, RoomResult};

/// Maps asset ids to loadable file paths.
pub trait AssetResolver: Send + Sync {
    /// Resolve `id` to a file path. Existence is not checked.
    fn resolve_asset_path(&self, id: &AssetId) -> RoomResult<PathBuf>;
}

/// Resolver over a directory tree laid out as `host.glb`, `{style}/{style}human.glb` and
/// `{style}/{style}{outfit}.glb`.
#[derive(Clone, Debug)]
pub struct FsAssetResolver {
    layout: AssetLayout,
}

impl FsAssetResolver {
    /// Build a resolver from the asset section of the room configuration.
    pub fn new(layout: AssetLayout) -> Self {
        Self { layout }
    }

    /// Root directory all relative paths are joined onto.
    pub fn root(&self) -> &Path {
        &self.layout.root
    }

    fn relative_path(&self, id: &AssetId) -> RoomResult<String> {
        let template = match id.kind() {
            AssetKind::Host => &self.layout.host_template,
            AssetKind::Body | AssetKind::Garment => &self.layout.figure_template,
        };
        let rel = template
            .replace("{category}", id.category())
            .replace("{key}", id.key())
            .replace("{ext}", self.layout.extension.trim_start_matches('.'));
        normalize_rel_path(&rel)
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve_asset_path(&self, id: &AssetId) -> RoomResult<PathBuf> {
        let rel = self.relative_path(id)?;
        Ok(self.layout.root.join(Path::new(&rel)))
    }
}

/// Normalize and validate root-relative asset paths.
///
/// The result uses `/` separators and drops `.` segments. Absolute paths and `..` are rejected.
pub(crate) fn normalize_rel_path(source: &str) -> RoomResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(RoomError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(RoomError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(RoomError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(RoomError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolve.rs"]
mod tests;
