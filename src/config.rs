//! JSON configuration for the dressing room core.
//!
//! Every section has defaults, so an empty object `{}` is a valid
//! configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{Mat4, Quat, Rgba8, Vec3};
use crate::foundation::error::{RoomError, RoomResult};

/// Largest supported poster supersample factor (keeps the flattened raster within `u16`).
pub const MAX_SUPERSAMPLE: f32 = 16.0;

/// Root configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Where mesh assets live and how ids map to files.
    pub assets: AssetLayout,
    /// Viewport showing the host figure.
    pub host_viewport: ViewportConfig,
    /// Viewport showing the dressed figure.
    pub model_viewport: ViewportConfig,
    /// Playback rates and looping.
    pub animation: AnimationConfig,
    /// Per-category orientation/scale normalization, keyed by asset category.
    pub placements: BTreeMap<String, CategoryPlacement>,
    /// Placement used for categories without an explicit entry.
    pub default_placement: CategoryPlacement,
    /// Poster layout and output options.
    pub poster: PosterConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            assets: AssetLayout::default(),
            host_viewport: ViewportConfig::host_default(),
            model_viewport: ViewportConfig::model_default(),
            animation: AnimationConfig::default(),
            placements: BTreeMap::new(),
            default_placement: CategoryPlacement::default(),
            poster: PosterConfig::default(),
        }
    }
}

impl RoomConfig {
    /// Parse and validate a JSON configuration string.
    pub fn from_json_str(s: &str) -> RoomResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| RoomError::serde(format!("room config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// A relative `assets.root` is resolved against the config file's directory.
    pub fn from_path(path: &Path) -> RoomResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read room config '{}'", path.display()))?;
        let mut cfg = Self::from_json_str(&text)?;
        if cfg.assets.root.is_relative()
            && let Some(dir) = path.parent()
        {
            cfg.assets.root = dir.join(&cfg.assets.root);
        }
        Ok(cfg)
    }

    /// Check static invariants of every section.
    pub fn validate(&self) -> RoomResult<()> {
        self.assets.validate()?;
        self.host_viewport.validate("host_viewport")?;
        self.model_viewport.validate("model_viewport")?;
        self.animation.validate()?;
        self.default_placement.validate("default_placement")?;
        for (category, p) in &self.placements {
            p.validate(category)?;
        }
        self.poster.validate()
    }

    /// Placement for an asset category, falling back to [`RoomConfig::default_placement`].
    pub fn placement_for(&self, category: &str) -> &CategoryPlacement {
        self.placements
            .get(category)
            .unwrap_or(&self.default_placement)
    }
}

/// Filesystem layout of mesh assets.
///
/// Templates substitute `{category}`, `{key}` and `{ext}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    /// Directory all templates are relative to.
    pub root: PathBuf,
    /// File extension selecting the decoder (`glb`, `gltf` or `json`).
    pub extension: String,
    /// Template for the host figure.
    pub host_template: String,
    /// Template for bodies (`key = "human"`) and garments (`key = outfit`).
    pub figure_template: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("models"),
            extension: "glb".to_string(),
            host_template: "host.{ext}".to_string(),
            figure_template: "{category}/{category}{key}.{ext}".to_string(),
        }
    }
}

impl AssetLayout {
    fn validate(&self) -> RoomResult<()> {
        if self.extension.trim().is_empty() {
            return Err(RoomError::validation("assets.extension must be non-empty"));
        }
        if self.host_template.trim().is_empty() || self.figure_template.trim().is_empty() {
            return Err(RoomError::validation("asset templates must be non-empty"));
        }
        Ok(())
    }
}

/// Camera and interaction settings of one viewport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Initial camera placement.
    pub camera: CameraConfig,
    /// Interactive orbit limits; `None` disables interaction.
    pub orbit: Option<OrbitConfig>,
    /// Clear color behind the figure.
    pub clear: Rgba8,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::model_default()
    }
}

impl ViewportConfig {
    /// Host viewport: fixed camera at `[0, 1.5, 3]`, no interaction.
    pub fn host_default() -> Self {
        Self {
            width: 320,
            height: 320,
            camera: CameraConfig {
                position: [0.0, 1.5, 3.0],
                target: [0.0, 1.5, 0.0],
                ..CameraConfig::default()
            },
            orbit: None,
            clear: Rgba8::TRANSPARENT,
        }
    }

    /// Dressed-figure viewport: camera at `[0, 1.2, 3]` with orbit controls.
    pub fn model_default() -> Self {
        Self {
            width: 480,
            height: 480,
            camera: CameraConfig::default(),
            orbit: Some(OrbitConfig::default()),
            clear: Rgba8::TRANSPARENT,
        }
    }

    fn validate(&self, name: &str) -> RoomResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RoomError::validation(format!(
                "{name}: width/height must be > 0"
            )));
        }
        self.camera.validate(name)?;
        if let Some(orbit) = &self.orbit {
            orbit.validate(name)?;
        }
        Ok(())
    }
}

/// Perspective camera settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position in world space.
    pub position: [f32; 3],
    /// Look-at point in world space.
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.2, 3.0],
            target: [0.0, 0.0, 0.0],
            fov_y_deg: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    fn validate(&self, name: &str) -> RoomResult<()> {
        if !(self.fov_y_deg > 0.0 && self.fov_y_deg < 180.0) {
            return Err(RoomError::validation(format!(
                "{name}: camera fov_y_deg must be in (0, 180)"
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(RoomError::validation(format!(
                "{name}: camera requires 0 < near < far"
            )));
        }
        if Vec3::from(self.position).distance(Vec3::from(self.target)) <= f32::EPSILON {
            return Err(RoomError::validation(format!(
                "{name}: camera position and target must differ"
            )));
        }
        Ok(())
    }
}

/// Orbit/pan/zoom limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Allow orbiting around the target.
    pub enable_rotate: bool,
    /// Allow panning the target.
    pub enable_pan: bool,
    /// Allow dolly zoom.
    pub enable_zoom: bool,
    /// Closest allowed camera distance.
    pub min_distance: f32,
    /// Farthest allowed camera distance.
    pub max_distance: f32,
    /// Smallest polar angle from +Y, in radians.
    pub min_polar: f32,
    /// Largest polar angle in radians, at most `PI / 2` so the camera never dips below the target.
    pub max_polar: f32,
    /// Height of the ground plane; panning never moves the target below it.
    pub ground_y: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            min_distance: 2.0,
            max_distance: 10.0,
            min_polar: 0.001,
            max_polar: std::f32::consts::FRAC_PI_2,
            ground_y: -1.0,
        }
    }
}

impl OrbitConfig {
    fn validate(&self, name: &str) -> RoomResult<()> {
        if !(self.min_distance > 0.0 && self.max_distance >= self.min_distance) {
            return Err(RoomError::validation(format!(
                "{name}: orbit requires 0 < min_distance <= max_distance"
            )));
        }
        if !(self.min_polar >= 0.0
            && self.max_polar <= std::f32::consts::FRAC_PI_2
            && self.min_polar <= self.max_polar)
        {
            return Err(RoomError::validation(format!(
                "{name}: orbit polar limits must satisfy 0 <= min <= max <= pi/2"
            )));
        }
        Ok(())
    }
}

/// Playback settings for the animation driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Playback rate of the host figure.
    pub host_rate: f32,
    /// Playback rate of the dressed figure.
    pub figure_rate: f32,
    /// Whether clips restart at their end.
    pub looping: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            host_rate: 0.5,
            figure_rate: 0.8,
            looping: true,
        }
    }
}

impl AnimationConfig {
    fn validate(&self) -> RoomResult<()> {
        for (name, rate) in [("host_rate", self.host_rate), ("figure_rate", self.figure_rate)] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(RoomError::validation(format!(
                    "animation.{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Fixed orientation/scale normalization shared by a category's body and garments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPlacement {
    /// Uniform scale.
    pub scale: f32,
    /// World-space translation.
    pub offset: [f32; 3],
    /// Rotation about +Y in degrees, applied to body and garment alike.
    pub yaw_deg: f32,
    /// Extra rotation about +Y applied to garments only. Garment files are authored facing away
    /// from their body, hence the half turn by default.
    pub garment_yaw_deg: f32,
}

impl Default for CategoryPlacement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: [0.0, -1.0, 0.0],
            yaw_deg: 0.0,
            garment_yaw_deg: 180.0,
        }
    }
}

impl CategoryPlacement {
    fn validate(&self, name: &str) -> RoomResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RoomError::validation(format!(
                "placement '{name}': scale must be finite and > 0"
            )));
        }
        Ok(())
    }

    /// Root transform for the body (or host) node.
    pub fn body_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.yaw_deg.to_radians()),
            Vec3::from(self.offset),
        )
    }

    /// Root transform for a garment node.
    pub fn garment_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y((self.yaw_deg + self.garment_yaw_deg).to_radians()),
            Vec3::from(self.offset),
        )
    }
}

/// Poster layout and flattening options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    /// Output scale relative to the 800x1100 layout.
    pub supersample: f32,
    /// Font file used for every text node. When unset, a system face is looked up.
    pub font_path: Option<PathBuf>,
    /// Allow falling back to system fonts.
    pub system_fonts: bool,
    /// Theme color overrides, keyed by style.
    pub theme_colors: BTreeMap<String, Rgba8>,
    /// Main title.
    pub title: String,
    /// Line under the title.
    pub subtitle: String,
    /// Host display name.
    pub host_name: String,
    /// Host role line.
    pub host_title: String,
    /// Footer brand line.
    pub footer: String,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            supersample: 2.5,
            font_path: None,
            system_fonts: true,
            theme_colors: BTreeMap::new(),
            title: "换装体验馆".to_string(),
            subtitle: "VIRTUAL DRESSING ROOM".to_string(),
            host_name: "娜比主持人".to_string(),
            host_title: "时尚顾问".to_string(),
            footer: "虚拟换装体验馆".to_string(),
        }
    }
}

impl PosterConfig {
    fn validate(&self) -> RoomResult<()> {
        if !self.supersample.is_finite()
            || self.supersample <= 0.0
            || self.supersample > MAX_SUPERSAMPLE
        {
            return Err(RoomError::validation(format!(
                "poster.supersample must be in (0, {MAX_SUPERSAMPLE}]"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
