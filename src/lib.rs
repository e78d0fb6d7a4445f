//! Core of a virtual dressing room.
//!
//! Loads a skinned body and an independently authored garment, re-binds the garment onto the
//! body's skeleton, plays both under one clock in software-rendered viewports, and composites
//! viewport captures into a flattened 800x1100 poster.
//!
//! - Configure a [`RoomConfig`]
//! - Create a [`DressingRoom`] and call [`DressingRoom::dress`] with a style and an outfit
//! - Drive [`DressingRoom::tick`], then [`DressingRoom::generate_poster`] or hand a
//!   [`PendingPoster`] to a [`PosterSink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod assets;
pub mod collab;
pub mod config;
pub(crate) mod poster;
pub(crate) mod render;
pub(crate) mod rig;
pub(crate) mod session;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Mat4, Point, Quat, Rect, Rgba8, Rgba8Premul, Vec3,
};
pub use crate::foundation::error::{RoomError, RoomResult};

pub use crate::animation::clip::{AnimationClip, BoundClip, Channel, ChannelValues, Interpolation};
pub use crate::animation::driver::{AnimationState, FrameClock};
pub use crate::assets::cache::AssetCache;
pub use crate::assets::id::{AssetId, AssetKind, BODY_KEY, HOST_CATEGORY};
pub use crate::assets::mesh::{MeshAsset, MeshPrimitive, SkinWeights};
pub use crate::assets::resolve::{AssetResolver, FsAssetResolver};
pub use crate::collab::{DescriptionProvider, FallbackDescriptions, MapDescriptions};
pub use crate::config::{
    AnimationConfig, AssetLayout, CameraConfig, CategoryPlacement, MAX_SUPERSAMPLE, OrbitConfig,
    PosterConfig, RoomConfig, ViewportConfig,
};
pub use crate::poster::document::{
    Geometry, IconSlot, ImageSlot, POSTER_HEIGHT, POSTER_WIDTH, Paint, PosterContent,
    PosterDocument, PosterNode, Shape, SlotClip, SlotRole, TextAlign, TextSlot,
};
pub use crate::poster::icons::{Icon, IconAtlas};
pub use crate::poster::pipeline::{
    PendingPoster, PipelineState, PosterCanceller, PosterImage, PosterOutcome, PosterPipeline,
    PosterRequest, poster_filename,
};
pub use crate::poster::sink::{DirPosterSink, InMemoryPosterSink, PosterSink};
pub use crate::poster::text::{FontFace, FontSource};
pub use crate::poster::theme::{FALLBACK_COLOR, StyleTheme, builtin_styles};
pub use crate::render::camera::{Camera, OrbitControls};
pub use crate::render::raster::Raster;
pub use crate::render::software::Lighting;
pub use crate::render::stage::{Stage, ViewportHandle};
pub use crate::render::viewport::{CaptureResult, Viewport};
pub use crate::rig::binder::{
    BoneMap, DressedGarment, Figure, GarmentBinding, PosedPrimitive, SkeletalBinder,
};
pub use crate::rig::skeleton::{Bone, BoneTransform, Pose, Skeleton};
pub use crate::session::room_session::{DressingRoom, RoomView};
