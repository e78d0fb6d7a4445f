use std::sync::Arc;

use crate::animation::clip::AnimationClip;
use crate::assets::id::AssetId;
use crate::foundation::core::{Mat4, Rgba8, Vec3};
use crate::foundation::error::{RoomError, RoomResult};
use crate::rig::skeleton::Skeleton;

/// Per-vertex skinning data of one primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct SkinWeights {
    /// Joint palette: bone names the joint indices below refer to.
    pub joint_names: Vec<String>,
    /// Inverse bind matrix per palette entry.
    pub inverse_binds: Vec<Mat4>,
    /// Up to four palette indices per vertex.
    pub joints: Vec<[u16; 4]>,
    /// Weights matching `joints`.
    pub weights: Vec<[f32; 4]>,
}

/// Triangle list with a flat base color.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPrimitive {
    /// Vertex positions in mesh space.
    pub positions: Vec<Vec3>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Material base color.
    pub base_color: Rgba8,
    /// Skinning data, when the primitive deforms with a skeleton.
    pub skin: Option<SkinWeights>,
}

impl MeshPrimitive {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn validate(&self) -> RoomResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(RoomError::validation(
                "primitive index count must be a multiple of 3",
            ));
        }
        let n = self.positions.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(RoomError::validation(format!(
                "primitive index {bad} out of range for {n} vertices"
            )));
        }
        if let Some(skin) = &self.skin {
            if skin.joints.len() != n || skin.weights.len() != n {
                return Err(RoomError::validation(
                    "skin joints/weights must have one entry per vertex",
                ));
            }
            if skin.inverse_binds.len() != skin.joint_names.len() {
                return Err(RoomError::validation(
                    "skin needs one inverse bind matrix per palette entry",
                ));
            }
            let palette = skin.joint_names.len();
            let out_of_palette = skin.joints.iter().zip(&skin.weights).any(|(j, w)| {
                j.iter()
                    .zip(w)
                    .any(|(&ji, &wi)| wi > 0.0 && usize::from(ji) >= palette)
            });
            if out_of_palette {
                return Err(RoomError::validation(
                    "weighted skin joint index exceeds palette size",
                ));
            }
        }
        Ok(())
    }
}

/// A fully loaded mesh resource. Immutable once built.
#[derive(Clone, Debug)]
pub struct MeshAsset {
    /// Identity the asset was loaded under.
    pub id: AssetId,
    /// Drawable primitives.
    pub primitives: Vec<MeshPrimitive>,
    /// Bone hierarchy, present for bodies and the host only.
    pub skeleton: Option<Arc<Skeleton>>,
    /// Animation clips in file order.
    pub clips: Vec<Arc<AnimationClip>>,
}

impl MeshAsset {
    /// Check primitive invariants.
    pub fn validate(&self) -> RoomResult<()> {
        if self.primitives.is_empty() {
            return Err(RoomError::validation(format!(
                "asset '{}' has no primitives",
                self.id
            )));
        }
        for p in &self.primitives {
            p.validate()
                .map_err(|e| RoomError::validation(format!("asset '{}': {e}", self.id)))?;
        }
        Ok(())
    }

    /// Total triangles over all primitives.
    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(MeshPrimitive::triangle_count).sum()
    }

    /// Whether any primitive carries skin weights.
    pub fn is_skinned(&self) -> bool {
        self.primitives.iter().any(|p| p.skin.is_some())
    }

    /// Clip played by default (the first one authored).
    pub fn default_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clips.first()
    }
}
