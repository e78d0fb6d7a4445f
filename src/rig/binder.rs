//! Garment-to-body skeletal binding.
//!
//! A garment is authored with its own joint palette (bone names plus inverse bind matrices). To
//! deform with a body it is re-targeted onto the body's skeleton: every palette name is looked up
//! once, producing a [`BoneMap`]. The lookup is validated when the binding is built; a garment
//! whose palette names a bone the body lacks renders static in its bind pose.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::animation::driver::AnimationState;
use crate::assets::id::AssetId;
use crate::assets::mesh::{MeshAsset, MeshPrimitive};
use crate::config::{AnimationConfig, CategoryPlacement};
use crate::foundation::core::{Mat4, Rgba8, Vec3};
use crate::foundation::error::{RoomError, RoomResult};
use crate::rig::skeleton::{Pose, Skeleton};

/// Explicit palette-index to skeleton-bone-index table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoneMap {
    palette_to_bone: Vec<usize>,
}

impl BoneMap {
    /// Resolve every palette name against `skeleton`.
    ///
    /// Fails with [`RoomError::BindingMismatch`] listing every unresolved name.
    pub fn build(skeleton: &Skeleton, palette: &[String]) -> RoomResult<Self> {
        let mut palette_to_bone = Vec::with_capacity(palette.len());
        let mut missing = Vec::new();
        for name in palette {
            match skeleton.bone_index(name) {
                Some(i) => palette_to_bone.push(i),
                None => missing.push(name.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(RoomError::binding_mismatch(format!(
                "bones not in skeleton: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { palette_to_bone })
    }

    /// Skeleton bone driving palette entry `palette_index`.
    pub fn bone_for(&self, palette_index: usize) -> Option<usize> {
        self.palette_to_bone.get(palette_index).copied()
    }

    /// Palette size.
    pub fn len(&self) -> usize {
        self.palette_to_bone.len()
    }

    /// Whether the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.palette_to_bone.is_empty()
    }
}

/// Outcome of binding a skinned mesh onto a skeleton.
#[derive(Clone, Debug, PartialEq)]
pub enum GarmentBinding {
    /// Every palette resolved. One entry per primitive; `None` for unskinned primitives.
    Bound {
        /// Bone map per primitive.
        maps: Vec<Option<BoneMap>>,
    },
    /// At least one palette name is missing from the skeleton; render in bind pose.
    Static {
        /// Unresolved bone names, sorted and deduplicated.
        missing: Vec<String>,
    },
}

impl GarmentBinding {
    /// Bind `mesh`'s skin palettes to `skeleton`.
    ///
    /// Any unresolved name (or a missing skeleton) degrades the whole mesh to
    /// [`GarmentBinding::Static`].
    pub fn resolve(skeleton: Option<&Skeleton>, mesh: &MeshAsset) -> Self {
        let mut missing = BTreeSet::new();
        let mut maps = Vec::with_capacity(mesh.primitives.len());
        for prim in &mesh.primitives {
            let Some(skin) = &prim.skin else {
                maps.push(None);
                continue;
            };
            let Some(skeleton) = skeleton else {
                missing.extend(skin.joint_names.iter().cloned());
                continue;
            };
            match BoneMap::build(skeleton, &skin.joint_names) {
                Ok(map) => maps.push(Some(map)),
                Err(_) => missing.extend(
                    skin.joint_names
                        .iter()
                        .filter(|n| skeleton.bone_index(n).is_none())
                        .cloned(),
                ),
            }
        }
        if missing.is_empty() {
            Self::Bound { maps }
        } else {
            Self::Static {
                missing: missing.into_iter().collect(),
            }
        }
    }

    /// Whether the mesh deforms with the skeleton.
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound { .. })
    }

    /// Names that failed to resolve (empty when bound).
    pub fn missing(&self) -> &[String] {
        match self {
            Self::Bound { .. } => &[],
            Self::Static { missing } => missing,
        }
    }

    fn map_for(&self, primitive: usize) -> Option<&BoneMap> {
        match self {
            Self::Bound { maps } => maps.get(primitive).and_then(Option::as_ref),
            Self::Static { .. } => None,
        }
    }
}

/// Caches one validated [`GarmentBinding`] per `(body, garment)` pair.
#[derive(Default)]
pub struct SkeletalBinder {
    cache: Mutex<HashMap<(AssetId, AssetId), Arc<GarmentBinding>>>,
}

impl SkeletalBinder {
    /// Empty binder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding of `garment` onto `body`'s skeleton, built on first request.
    ///
    /// A mismatch is logged and yields a static binding; it never fails.
    #[tracing::instrument(skip_all, fields(body = %body.id, garment = %garment.id))]
    pub fn bind(&self, body: &MeshAsset, garment: &MeshAsset) -> Arc<GarmentBinding> {
        let key = (body.id.clone(), garment.id.clone());
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(b) = cache.get(&key) {
            return Arc::clone(b);
        }
        let binding = GarmentBinding::resolve(body.skeleton.as_deref(), garment);
        if let GarmentBinding::Static { missing } = &binding {
            tracing::warn!(
                missing = %missing.join(", "),
                "garment palette does not match body skeleton; rendering unbound"
            );
        }
        let binding = Arc::new(binding);
        cache.insert(key, Arc::clone(&binding));
        binding
    }

    /// Number of cached bindings.
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no binding has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A garment placed on a figure.
#[derive(Clone, Debug)]
pub struct DressedGarment {
    /// Garment mesh.
    pub asset: Arc<MeshAsset>,
    /// Binding onto the figure's body skeleton.
    pub binding: Arc<GarmentBinding>,
}

/// A body (or host) with at most one garment and its animation.
///
/// The figure owns both the body and the binding, so the binding can never outlive the skeleton
/// it was built for.
#[derive(Clone, Debug)]
pub struct Figure {
    body: Arc<MeshAsset>,
    body_binding: GarmentBinding,
    garment: Option<DressedGarment>,
    placement: CategoryPlacement,
    animation: AnimationState,
    pose: Pose,
}

impl Figure {
    /// Figure showing `body` with its default clip at `rate`.
    pub fn new(
        body: Arc<MeshAsset>,
        placement: CategoryPlacement,
        rate: f32,
        looping: bool,
    ) -> Self {
        let (body_binding, animation, pose) = Self::prepare_body(&body, rate, looping);
        Self {
            body,
            body_binding,
            garment: None,
            placement,
            animation,
            pose,
        }
    }

    /// Figure configured from the room's animation settings for a dressed body.
    pub fn dressed_figure(
        body: Arc<MeshAsset>,
        placement: CategoryPlacement,
        animation: &AnimationConfig,
    ) -> Self {
        Self::new(body, placement, animation.figure_rate, animation.looping)
    }

    fn prepare_body(
        body: &MeshAsset,
        rate: f32,
        looping: bool,
    ) -> (GarmentBinding, AnimationState, Pose) {
        let skeleton = body.skeleton.as_deref();
        let binding = GarmentBinding::resolve(skeleton, body);
        if !binding.is_bound() {
            tracing::warn!(
                body = %body.id,
                missing = %binding.missing().join(", "),
                "body skin does not match its own skeleton"
            );
        }
        let clip = match (skeleton, body.default_clip()) {
            (Some(sk), Some(clip)) => Some(clip.bind(sk)),
            _ => None,
        };
        let mut pose = skeleton.map(Skeleton::rest_pose).unwrap_or_default();
        let animation = AnimationState::new(clip, rate, looping);
        animation.apply(&mut pose);
        (binding, animation, pose)
    }

    /// Put `garment` on, replacing any previous garment.
    pub fn dress(&mut self, garment: Arc<MeshAsset>, binding: Arc<GarmentBinding>) {
        self.garment = Some(DressedGarment {
            asset: garment,
            binding,
        });
    }

    /// Remove the garment, if any.
    pub fn undress(&mut self) -> Option<DressedGarment> {
        self.garment.take()
    }

    /// Swap the body. The old garment binding is dropped first and rebuilt against the new
    /// skeleton through `binder`.
    pub fn replace_body(&mut self, body: Arc<MeshAsset>, binder: &SkeletalBinder) {
        let garment = self.garment.take();
        let (body_binding, animation, pose) =
            Self::prepare_body(&body, self.animation.rate(), self.animation.looping());
        self.body = body;
        self.body_binding = body_binding;
        self.animation = animation;
        self.pose = pose;
        if let Some(g) = garment {
            let binding = binder.bind(&self.body, &g.asset);
            self.dress(g.asset, binding);
        }
    }

    /// Body mesh.
    pub fn body(&self) -> &Arc<MeshAsset> {
        &self.body
    }

    /// Current garment.
    pub fn garment(&self) -> Option<&DressedGarment> {
        self.garment.as_ref()
    }

    /// Render nodes: the body plus the garment when dressed.
    pub fn node_count(&self) -> usize {
        1 + usize::from(self.garment.is_some())
    }

    /// Playback state.
    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    /// Current pose of the body skeleton.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Advance the animation by `delta` seconds and refresh the pose.
    pub fn advance(&mut self, delta: f32) {
        self.animation.advance(delta);
        self.animation.apply(&mut self.pose);
    }

    /// Deform every primitive into world space for the current pose.
    pub fn posed_primitives(&self) -> Vec<PosedPrimitive<'_>> {
        let world = self
            .body
            .skeleton
            .as_ref()
            .map(|sk| sk.world_matrices(&self.pose))
            .unwrap_or_default();

        let mut out = Vec::new();
        let body_root = self.placement.body_matrix();
        for (i, prim) in self.body.primitives.iter().enumerate() {
            let map = self.body_binding.map_for(i);
            out.push(pose_primitive(prim, map, &world, body_root));
        }
        if let Some(g) = &self.garment {
            let garment_root = self.placement.garment_matrix();
            for (i, prim) in g.asset.primitives.iter().enumerate() {
                let map = g.binding.map_for(i);
                out.push(pose_primitive(prim, map, &world, garment_root));
            }
        }
        out
    }
}

/// One primitive deformed into world space.
#[derive(Clone, Debug)]
pub struct PosedPrimitive<'a> {
    /// World-space vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle list indices into `positions`.
    pub indices: &'a [u32],
    /// Flat base color.
    pub color: Rgba8,
}

/// Linear-blend skinning of one primitive; unbound primitives keep their bind pose.
fn pose_primitive<'a>(
    prim: &'a MeshPrimitive,
    map: Option<&BoneMap>,
    bone_world: &[Mat4],
    root: Mat4,
) -> PosedPrimitive<'a> {
    let positions = match (&prim.skin, map) {
        (Some(skin), Some(map)) => {
            let palette: Vec<Mat4> = skin
                .inverse_binds
                .iter()
                .enumerate()
                .map(|(pi, ibm)| {
                    let bone = map.bone_for(pi).and_then(|b| bone_world.get(b));
                    root * bone.copied().unwrap_or(Mat4::IDENTITY) * *ibm
                })
                .collect();
            prim.positions
                .par_iter()
                .zip(skin.joints.par_iter().zip(skin.weights.par_iter()))
                .map(|(p, (joints, weights))| {
                    let mut acc = Vec3::ZERO;
                    let mut total = 0.0f32;
                    for (&j, &w) in joints.iter().zip(weights) {
                        if w <= 0.0 {
                            continue;
                        }
                        if let Some(m) = palette.get(usize::from(j)) {
                            acc += m.transform_point3(*p) * w;
                            total += w;
                        }
                    }
                    if total > 0.0 {
                        acc / total
                    } else {
                        root.transform_point3(*p)
                    }
                })
                .collect()
        }
        _ => prim
            .positions
            .iter()
            .map(|p| root.transform_point3(*p))
            .collect(),
    };
    PosedPrimitive {
        positions,
        indices: &prim.indices,
        color: prim.base_color,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/binder.rs"]
mod tests;
