use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use crate::animation::clip::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::assets::id::{AssetId, AssetKind};
use crate::assets::mesh::{MeshAsset, MeshPrimitive, SkinWeights};
use crate::foundation::core::{Mat4, Quat, Rgba8, Vec3};
use crate::foundation::error::{RoomError, RoomResult};
use crate::rig::skeleton::{Bone, BoneTransform, Skeleton};

/// Decode a mesh file, choosing the decoder by extension (`glb`/`gltf` or `json`).
///
/// Garments never keep a skeleton of their own; any found in the file is dropped.
#[tracing::instrument(skip_all, fields(id = %id, path = %path.display()))]
pub(crate) fn decode_mesh_file(id: &AssetId, path: &Path) -> RoomResult<MeshAsset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut asset = match ext.as_str() {
        "glb" | "gltf" => decode_gltf(id, path),
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read rig document '{}'", path.display()))
                .map_err(|e| RoomError::asset_load(format!("{id}: {e:#}")))?;
            decode_rig_json(id, &text)
        }
        other => Err(RoomError::asset_load(format!(
            "{id}: unsupported mesh extension '{other}'"
        ))),
    }?;

    if asset.id.kind() == AssetKind::Garment && asset.skeleton.take().is_some() {
        tracing::debug!("dropped skeleton embedded in garment file");
    }
    asset
        .validate()
        .map_err(|e| RoomError::asset_load(e.to_string()))?;
    tracing::debug!(
        primitives = asset.primitives.len(),
        triangles = asset.triangle_count(),
        clips = asset.clips.len(),
        "decoded mesh"
    );
    Ok(asset)
}

/// Parse an SVG document into a `usvg` tree.
pub(crate) fn parse_svg(bytes: &[u8]) -> RoomResult<Arc<usvg::Tree>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(Arc::new(tree))
}

// ----- glTF -----

fn decode_gltf(id: &AssetId, path: &Path) -> RoomResult<MeshAsset> {
    let (doc, buffers, _images) = gltf::import(path)
        .map_err(|e| RoomError::asset_load(format!("{id}: import '{}': {e}", path.display())))?;
    let buffer_data = |b: gltf::Buffer<'_>| buffers.get(b.index()).map(|d| d.0.as_slice());

    let node_count = doc.nodes().len();
    let mut parent = vec![None; node_count];
    for n in doc.nodes() {
        for c in n.children() {
            if parent[c.index()].replace(n.index()).is_some() {
                return Err(RoomError::asset_load(format!(
                    "{id}: node {} has more than one parent",
                    c.index()
                )));
            }
        }
    }

    // Scene traversal order puts parents before children.
    let roots: Vec<gltf::Node<'_>> = match doc.default_scene().or_else(|| doc.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => doc.nodes().filter(|n| parent[n.index()].is_none()).collect(),
    };
    let mut order = Vec::with_capacity(node_count);
    let mut world = vec![Mat4::IDENTITY; node_count];
    let mut stack: Vec<(gltf::Node<'_>, Mat4)> =
        roots.into_iter().rev().map(|n| (n, Mat4::IDENTITY)).collect();
    let mut visited = vec![false; node_count];
    while let Some((node, parent_world)) = stack.pop() {
        if std::mem::replace(&mut visited[node.index()], true) {
            return Err(RoomError::asset_load(format!(
                "{id}: node graph has a cycle through node {}",
                node.index()
            )));
        }
        let w = parent_world * Mat4::from_cols_array_2d(&node.transform().matrix());
        world[node.index()] = w;
        order.push(node.index());
        let children: Vec<_> = node.children().collect();
        for c in children.into_iter().rev() {
            stack.push((c, w));
        }
    }

    let node_name = |i: usize| -> String {
        doc.nodes()
            .nth(i)
            .and_then(|n| n.name().map(str::to_string))
            .unwrap_or_else(|| format!("node{i}"))
    };

    let is_joint: Vec<bool> = {
        let mut v = vec![false; node_count];
        for skin in doc.skins() {
            for j in skin.joints() {
                v[j.index()] = true;
            }
        }
        v
    };

    let skeleton = if is_joint.iter().any(|&j| j) {
        let mut bone_of_node: HashMap<usize, usize> = HashMap::new();
        let mut bones = Vec::new();
        let mut base = None;
        for &ni in order.iter().filter(|&&ni| is_joint[ni]) {
            let mut up = parent[ni];
            let mut steps = 0;
            while let Some(p) = up {
                if is_joint[p] {
                    break;
                }
                steps += 1;
                if steps > node_count {
                    return Err(RoomError::asset_load(format!(
                        "{id}: node {ni} has a cyclic ancestry"
                    )));
                }
                up = parent[p];
            }
            let bone_parent = up.and_then(|p| bone_of_node.get(&p).copied());
            if bone_parent.is_none() && base.is_none() {
                base = Some(parent[ni].map_or(Mat4::IDENTITY, |p| world[p]));
            }
            let rest = doc
                .nodes()
                .nth(ni)
                .map(|n| BoneTransform::from_mat4(Mat4::from_cols_array_2d(&n.transform().matrix())))
                .unwrap_or_default();
            bone_of_node.insert(ni, bones.len());
            bones.push(Bone {
                name: node_name(ni),
                parent: bone_parent,
                rest,
            });
        }
        let sk = Skeleton::new(bones, base.unwrap_or(Mat4::IDENTITY))
            .map_err(|e| RoomError::asset_load(format!("{id}: {e}")))?;
        Some(Arc::new(sk))
    } else {
        None
    };

    let mut primitives = Vec::new();
    for &ni in &order {
        let Some(node) = doc.nodes().nth(ni) else {
            continue;
        };
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let skin = node.skin();
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(mesh = ?mesh.name(), "skipping non-triangle primitive");
                continue;
            }
            let reader = prim.reader(buffer_data);
            let Some(pos_it) = reader.read_positions() else {
                continue;
            };
            let mut positions: Vec<Vec3> = pos_it.map(Vec3::from).collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(it) => it.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let [r, g, b, a] = prim.material().pbr_metallic_roughness().base_color_factor();
            let base_color = Rgba8::rgba(
                linear_to_srgb_u8(r),
                linear_to_srgb_u8(g),
                linear_to_srgb_u8(b),
                (a.clamp(0.0, 1.0) * 255.0).round() as u8,
            );

            let skin_weights = match (&skin, reader.read_joints(0), reader.read_weights(0)) {
                (Some(skin), Some(joints), Some(weights)) => {
                    let joint_names: Vec<String> =
                        skin.joints().map(|j| node_name(j.index())).collect();
                    let inverse_binds: Vec<Mat4> =
                        match skin.reader(buffer_data).read_inverse_bind_matrices() {
                            Some(it) => it.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
                            None => vec![Mat4::IDENTITY; joint_names.len()],
                        };
                    Some(SkinWeights {
                        joint_names,
                        inverse_binds,
                        joints: joints.into_u16().collect(),
                        weights: weights.into_f32().collect(),
                    })
                }
                _ => None,
            };
            if skin_weights.is_none() {
                // Rigid meshes keep their node placement.
                let w = world[ni];
                for p in &mut positions {
                    *p = w.transform_point3(*p);
                }
            }
            primitives.push(MeshPrimitive {
                positions,
                indices,
                base_color,
                skin: skin_weights,
            });
        }
    }

    let mut clips = Vec::new();
    for (ai, anim) in doc.animations().enumerate() {
        let name = anim
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("clip{ai}"));
        let mut channels = Vec::new();
        for ch in anim.channels() {
            let reader = ch.reader(buffer_data);
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let Some(outputs) = reader.read_outputs() else {
                continue;
            };
            let interp = ch.sampler().interpolation();
            let values = match outputs {
                gltf::animation::util::ReadOutputs::Translations(it) => {
                    ChannelValues::Translation(keyframe_values(it.map(Vec3::from), interp))
                }
                gltf::animation::util::ReadOutputs::Scales(it) => {
                    ChannelValues::Scale(keyframe_values(it.map(Vec3::from), interp))
                }
                gltf::animation::util::ReadOutputs::Rotations(it) => ChannelValues::Rotation(
                    keyframe_values(it.into_f32().map(Quat::from_array), interp),
                ),
                gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => continue,
            };
            channels.push(Channel {
                bone: node_name(ch.target().node().index()),
                times,
                values,
                interpolation: match interp {
                    gltf::animation::Interpolation::Step => Interpolation::Step,
                    _ => Interpolation::Linear,
                },
            });
        }
        let clip = AnimationClip::new(name, channels)
            .map_err(|e| RoomError::asset_load(format!("{id}: {e}")))?;
        clips.push(Arc::new(clip));
    }

    Ok(MeshAsset {
        id: id.clone(),
        primitives,
        skeleton,
        clips,
    })
}

/// Cubic-spline outputs store `(in-tangent, value, out-tangent)` triples; keep the values.
fn keyframe_values<T>(
    it: impl Iterator<Item = T>,
    interp: gltf::animation::Interpolation,
) -> Vec<T> {
    match interp {
        gltf::animation::Interpolation::CubicSpline => it.skip(1).step_by(3).collect(),
        _ => it.collect(),
    }
}

fn linear_to_srgb_u8(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let s = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round() as u8
}

// ----- rig JSON -----

#[derive(Debug, Deserialize)]
struct RigDoc {
    #[serde(default)]
    skeleton: Option<SkeletonDoc>,
    primitives: Vec<PrimitiveDoc>,
    #[serde(default)]
    clips: Vec<ClipDoc>,
}

#[derive(Debug, Deserialize)]
struct SkeletonDoc {
    bones: Vec<BoneDoc>,
    #[serde(default = "identity")]
    base: Mat4,
}

#[derive(Debug, Deserialize)]
struct BoneDoc {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(flatten)]
    rest: BoneTransform,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDoc {
    positions: Vec<Vec3>,
    #[serde(default)]
    indices: Option<Vec<u32>>,
    #[serde(default = "white")]
    color: Rgba8,
    #[serde(default)]
    skin: Option<SkinDoc>,
}

#[derive(Debug, Deserialize)]
struct SkinDoc {
    joints: Vec<String>,
    #[serde(default)]
    inverse_binds: Option<Vec<Mat4>>,
    vertex_joints: Vec<[u16; 4]>,
    vertex_weights: Vec<[f32; 4]>,
}

#[derive(Debug, Deserialize)]
struct ClipDoc {
    name: String,
    channels: Vec<ChannelDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ChannelPath {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Deserialize)]
struct ChannelDoc {
    bone: String,
    path: ChannelPath,
    times: Vec<f32>,
    values: Vec<Vec<f32>>,
    #[serde(default)]
    interpolation: Interpolation,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

fn white() -> Rgba8 {
    Rgba8::WHITE
}

/// Decode a rig JSON document.
///
/// Skin palettes without explicit inverse binds default to the inverse rest matrices of the
/// document's own skeleton (identity for bones it does not define).
pub(crate) fn decode_rig_json(id: &AssetId, text: &str) -> RoomResult<MeshAsset> {
    let doc: RigDoc = serde_json::from_str(text)
        .map_err(|e| RoomError::asset_load(format!("{id}: rig document: {e}")))?;

    let skeleton = match doc.skeleton {
        Some(sd) => {
            let mut index: HashMap<&str, usize> = HashMap::new();
            let mut bones = Vec::with_capacity(sd.bones.len());
            for (i, b) in sd.bones.iter().enumerate() {
                let parent = match &b.parent {
                    Some(p) => Some(index.get(p.as_str()).copied().ok_or_else(|| {
                        RoomError::asset_load(format!(
                            "{id}: bone '{}' names unknown or later parent '{p}'",
                            b.name
                        ))
                    })?),
                    None => None,
                };
                index.insert(b.name.as_str(), i);
                bones.push(Bone {
                    name: b.name.clone(),
                    parent,
                    rest: b.rest,
                });
            }
            let sk = Skeleton::new(bones, sd.base)
                .map_err(|e| RoomError::asset_load(format!("{id}: {e}")))?;
            Some(Arc::new(sk))
        }
        None => None,
    };
    let rest_world = skeleton
        .as_ref()
        .map(|sk| sk.world_matrices(&sk.rest_pose()));

    let mut primitives = Vec::with_capacity(doc.primitives.len());
    for p in doc.primitives {
        let indices = p
            .indices
            .unwrap_or_else(|| (0..p.positions.len() as u32).collect());
        let skin = p.skin.map(|s| {
            let inverse_binds = s.inverse_binds.unwrap_or_else(|| {
                s.joints
                    .iter()
                    .map(|name| {
                        let rest = match (&skeleton, &rest_world) {
                            (Some(sk), Some(world)) => sk.bone_index(name).map(|bi| world[bi]),
                            _ => None,
                        };
                        rest.map_or(Mat4::IDENTITY, |m| m.inverse())
                    })
                    .collect()
            });
            SkinWeights {
                joint_names: s.joints,
                inverse_binds,
                joints: s.vertex_joints,
                weights: s.vertex_weights,
            }
        });
        primitives.push(MeshPrimitive {
            positions: p.positions,
            indices,
            base_color: p.color,
            skin,
        });
    }

    let mut clips = Vec::with_capacity(doc.clips.len());
    for c in doc.clips {
        let mut channels = Vec::with_capacity(c.channels.len());
        for ch in c.channels {
            let values = channel_values(&ch)
                .map_err(|e| RoomError::asset_load(format!("{id}: clip '{}': {e}", c.name)))?;
            channels.push(Channel {
                bone: ch.bone,
                times: ch.times,
                values,
                interpolation: ch.interpolation,
            });
        }
        let clip = AnimationClip::new(c.name, channels)
            .map_err(|e| RoomError::asset_load(format!("{id}: {e}")))?;
        clips.push(Arc::new(clip));
    }

    Ok(MeshAsset {
        id: id.clone(),
        primitives,
        skeleton,
        clips,
    })
}

fn channel_values(ch: &ChannelDoc) -> RoomResult<ChannelValues> {
    let want = match ch.path {
        ChannelPath::Translation | ChannelPath::Scale => 3,
        ChannelPath::Rotation => 4,
    };
    if let Some(bad) = ch.values.iter().find(|v| v.len() != want) {
        return Err(RoomError::validation(format!(
            "channel for '{}' expects {want} components per value, got {}",
            ch.bone,
            bad.len()
        )));
    }
    let vec3s = || ch.values.iter().map(|v| Vec3::new(v[0], v[1], v[2])).collect();
    Ok(match ch.path {
        ChannelPath::Translation => ChannelValues::Translation(vec3s()),
        ChannelPath::Scale => ChannelValues::Scale(vec3s()),
        ChannelPath::Rotation => ChannelValues::Rotation(
            ch.values
                .iter()
                .map(|v| Quat::from_xyzw(v[0], v[1], v[2], v[3]).normalize())
                .collect(),
        ),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
