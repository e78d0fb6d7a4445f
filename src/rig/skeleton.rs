use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Mat4, Quat, Vec3};
use crate::foundation::error::{RoomError, RoomResult};

/// Local translation/rotation/scale of one bone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoneTransform {
    /// Translation relative to the parent bone.
    pub translation: Vec3,
    /// Rotation relative to the parent bone, as `[x, y, z, w]`.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl BoneTransform {
    /// No translation, rotation or scale.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Compose into a column-major matrix (`T * R * S`).
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose an affine matrix.
    pub fn from_mat4(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One named joint of a [`Skeleton`].
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    /// Unique bone name; garments bind against it.
    pub name: String,
    /// Index of the parent bone, always smaller than this bone's index.
    pub parent: Option<usize>,
    /// Rest (bind) local transform.
    pub rest: BoneTransform,
}

/// Bone hierarchy owned by a body mesh.
///
/// Bones are stored parents-before-children so world matrices resolve in one forward pass.
#[derive(Clone, Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    base: Mat4,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Build a validated skeleton. `base` is applied above every root bone.
    pub fn new(bones: Vec<Bone>, base: Mat4) -> RoomResult<Self> {
        let mut by_name = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter().enumerate() {
            if bone.name.is_empty() {
                return Err(RoomError::validation(format!("bone {i} has an empty name")));
            }
            if let Some(p) = bone.parent
                && p >= i
            {
                return Err(RoomError::validation(format!(
                    "bone '{}' must come after its parent (parent index {p})",
                    bone.name
                )));
            }
            if by_name.insert(bone.name.clone(), i).is_some() {
                return Err(RoomError::validation(format!(
                    "duplicate bone name '{}'",
                    bone.name
                )));
            }
        }
        Ok(Self {
            bones,
            base,
            by_name,
        })
    }

    /// All bones, parents first.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Number of bones.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the skeleton has no bones.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Look a bone up by name.
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Transform applied above every root bone.
    pub fn base(&self) -> Mat4 {
        self.base
    }

    /// Pose holding every bone's rest transform.
    pub fn rest_pose(&self) -> Pose {
        Pose {
            locals: self.bones.iter().map(|b| b.rest).collect(),
        }
    }

    /// Skeleton-space matrix of every bone for `pose`.
    ///
    /// Bones missing from a shorter pose use their rest transform.
    pub fn world_matrices(&self, pose: &Pose) -> Vec<Mat4> {
        let mut out: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for (i, bone) in self.bones.iter().enumerate() {
            let local = pose.local(i).unwrap_or(&bone.rest).to_mat4();
            let parent = match bone.parent {
                Some(p) => out[p],
                None => self.base,
            };
            out.push(parent * local);
        }
        out
    }
}

/// Local transforms of every bone at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    locals: Vec<BoneTransform>,
}

impl Pose {
    /// Local transforms, indexed like the skeleton's bones.
    pub fn locals(&self) -> &[BoneTransform] {
        &self.locals
    }

    /// Local transform of one bone.
    pub fn local(&self, bone: usize) -> Option<&BoneTransform> {
        self.locals.get(bone)
    }

    /// Mutable local transform of one bone.
    pub fn local_mut(&mut self, bone: usize) -> Option<&mut BoneTransform> {
        self.locals.get_mut(bone)
    }

    /// Number of bones covered.
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    /// Whether the pose covers no bones.
    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/skeleton.rs"]
mod tests;
