use super::*;

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let d = std::env::temp_dir().join(format!(
        "dressing_room_decode_{tag}_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&d).unwrap();
    d
}

fn b64(bytes: &[u8]) -> String {
    const T: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in bytes.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
        out.push(T[(n >> 18) as usize & 63] as char);
        out.push(T[(n >> 12) as usize & 63] as char);
        out.push(if chunk.len() > 1 {
            T[(n >> 6) as usize & 63] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            T[n as usize & 63] as char
        } else {
            '='
        });
    }
    out
}

/// One skinned triangle bound to `hips`/`spine`, plus a rotation clip on `spine`.
fn skinned_triangle_gltf() -> String {
    let mut buf = Vec::<u8>::new();
    let f32s = |buf: &mut Vec<u8>, vals: &[f32]| {
        for v in vals {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    };
    // 0: positions (36)
    f32s(&mut buf, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    // 36: indices (6) + pad (2)
    for i in [0u16, 1, 2] {
        buf.extend_from_slice(&i.to_le_bytes());
    }
    buf.extend_from_slice(&[0, 0]);
    // 44: joints u8x4 (12)
    buf.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
    // 56: weights (48)
    f32s(
        &mut buf,
        &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    );
    // 104: inverse binds (128)
    f32s(&mut buf, &Mat4::IDENTITY.to_cols_array());
    f32s(
        &mut buf,
        &Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)).to_cols_array(),
    );
    // 232: times (8)
    f32s(&mut buf, &[0.0, 1.0]);
    // 240: rotations (32)
    f32s(
        &mut buf,
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.707_106_8, 0.0, 0.707_106_8],
    );
    assert_eq!(buf.len(), 272);

    serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Armature", "children": [1, 3] },
            { "name": "hips", "children": [2] },
            { "name": "spine", "translation": [0.0, 1.0, 0.0] },
            { "name": "Body", "mesh": 0, "skin": 0 }
        ],
        "skins": [{ "joints": [1, 2], "inverseBindMatrices": 4 }],
        "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }],
        "meshes": [{
            "primitives": [{
                "attributes": { "POSITION": 0, "JOINTS_0": 2, "WEIGHTS_0": 3 },
                "indices": 1,
                "material": 0
            }]
        }],
        "animations": [{
            "name": "Idle",
            "channels": [{ "sampler": 0, "target": { "node": 2, "path": "rotation" } }],
            "samplers": [{ "input": 5, "output": 6, "interpolation": "LINEAR" }]
        }],
        "buffers": [{
            "byteLength": 272,
            "uri": format!("data:application/octet-stream;base64,{}", b64(&buf))
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 12 },
            { "buffer": 0, "byteOffset": 56, "byteLength": 48 },
            { "buffer": 0, "byteOffset": 104, "byteLength": 128 },
            { "buffer": 0, "byteOffset": 232, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 240, "byteLength": 32 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5121, "count": 3, "type": "VEC4" },
            { "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4" },
            { "bufferView": 4, "componentType": 5126, "count": 2, "type": "MAT4" },
            { "bufferView": 5, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 6, "componentType": 5126, "count": 2, "type": "VEC4" }
        ]
    })
    .to_string()
}

#[test]
fn gltf_skin_skeleton_and_clip_decode() {
    let dir = temp_dir("gltf");
    let path = dir.join("bodyhuman.gltf");
    std::fs::write(&path, skinned_triangle_gltf()).unwrap();

    let asset = decode_mesh_file(&AssetId::body("日常").unwrap(), &path).unwrap();
    let sk = asset.skeleton.as_ref().unwrap();
    assert_eq!(sk.len(), 2);
    assert_eq!(sk.bones()[0].name, "hips");
    assert_eq!(sk.bones()[1].parent, Some(0));
    assert!(
        sk.bones()[1]
            .rest
            .translation
            .abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6)
    );

    assert_eq!(asset.primitives.len(), 1);
    let prim = &asset.primitives[0];
    assert_eq!(prim.indices, vec![0, 1, 2]);
    assert_eq!(prim.base_color, Rgba8::rgb(255, 0, 0));
    let skin = prim.skin.as_ref().unwrap();
    assert_eq!(skin.joint_names, vec!["hips".to_string(), "spine".to_string()]);
    assert_eq!(skin.joints[2], [1, 0, 0, 0]);
    assert!(
        skin.inverse_binds[1]
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)), 1e-6)
    );

    assert_eq!(asset.clips.len(), 1);
    assert_eq!(asset.clips[0].name(), "Idle");
    assert_eq!(asset.clips[0].duration(), 1.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn garment_files_lose_their_skeleton() {
    let dir = temp_dir("garment");
    let path = dir.join("outfit.gltf");
    std::fs::write(&path, skinned_triangle_gltf()).unwrap();

    let asset = decode_mesh_file(&AssetId::garment("日常", "A").unwrap(), &path).unwrap();
    assert!(asset.skeleton.is_none());
    assert!(asset.is_skinned());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rig_json_defaults_inverse_binds_from_rest_pose() {
    let doc = serde_json::json!({
        "skeleton": { "bones": [
            { "name": "hips", "translation": [0.0, 1.0, 0.0] },
            { "name": "head", "parent": "hips", "translation": [0.0, 0.5, 0.0] }
        ]},
        "primitives": [{
            "positions": [[0.0, 1.5, 0.0], [0.1, 1.5, 0.0], [0.0, 1.6, 0.0]],
            "color": "#c779d0",
            "skin": {
                "joints": ["head", "elsewhere"],
                "vertex_joints": [[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
                "vertex_weights": [[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]
            }
        }],
        "clips": [{ "name": "nod", "channels": [
            { "bone": "head", "path": "rotation", "times": [0.0, 0.5],
              "values": [[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0]] }
        ]}]
    });
    let asset = decode_rig_json(&AssetId::body("晚宴").unwrap(), &doc.to_string()).unwrap();

    let skin = asset.primitives[0].skin.as_ref().unwrap();
    assert!(
        skin.inverse_binds[0]
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, -1.5, 0.0)), 1e-6)
    );
    assert_eq!(skin.inverse_binds[1], Mat4::IDENTITY);
    assert_eq!(asset.primitives[0].indices, vec![0, 1, 2]);
    assert_eq!(asset.primitives[0].base_color, Rgba8::rgb(0xc7, 0x79, 0xd0));
    assert_eq!(asset.clips[0].duration(), 0.5);
}

#[test]
fn rig_json_rejects_bad_channel_arity_and_forward_parents() {
    let bad_arity = serde_json::json!({
        "skeleton": { "bones": [{ "name": "a" }] },
        "primitives": [{ "positions": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] }],
        "clips": [{ "name": "x", "channels": [
            { "bone": "a", "path": "translation", "times": [0.0], "values": [[1.0, 2.0]] }
        ]}]
    });
    let err = decode_rig_json(&AssetId::host(), &bad_arity.to_string()).unwrap_err();
    assert!(matches!(err, RoomError::AssetLoad(_)));

    let forward = serde_json::json!({
        "skeleton": { "bones": [{ "name": "a", "parent": "b" }, { "name": "b" }] },
        "primitives": []
    });
    assert!(decode_rig_json(&AssetId::host(), &forward.to_string()).is_err());
}

#[test]
fn missing_and_unsupported_files_are_asset_load_errors() {
    let dir = temp_dir("missing");
    let id = AssetId::garment("日常", "Z").unwrap();

    let err = decode_mesh_file(&id, &dir.join("nope.json")).unwrap_err();
    assert!(matches!(err, RoomError::AssetLoad(_)));
    let err = decode_mesh_file(&id, &dir.join("nope.glb")).unwrap_err();
    assert!(matches!(err, RoomError::AssetLoad(_)));
    let err = decode_mesh_file(&id, &dir.join("nope.fbx")).unwrap_err();
    assert!(matches!(err, RoomError::AssetLoad(_)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cyclic_or_shared_node_children_are_asset_load_errors() {
    let dir = temp_dir("cycle");
    let id = AssetId::body("日常").unwrap();
    let graphs = [
        ("loop.gltf", serde_json::json!([
            { "name": "hips", "children": [1] },
            { "name": "spine", "children": [0] }
        ]), serde_json::json!([0])),
        ("self.gltf", serde_json::json!([
            { "name": "hips", "children": [0] }
        ]), serde_json::json!([0])),
        ("shared.gltf", serde_json::json!([
            { "name": "left", "children": [2] },
            { "name": "right", "children": [2] },
            { "name": "hand" }
        ]), serde_json::json!([0, 1])),
    ];
    for (file, nodes, roots) in graphs {
        let doc = serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": roots }],
            "nodes": nodes
        });
        let path = dir.join(file);
        std::fs::write(&path, doc.to_string()).unwrap();
        let err = decode_mesh_file(&id, &path).unwrap_err();
        assert!(matches!(err, RoomError::AssetLoad(_)), "{file}: {err}");
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parse_svg_ok_and_err() {
    let ok = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"></svg>"#;
    let tree = parse_svg(ok).unwrap();
    assert_eq!(tree.size().width(), 4.0);
    assert!(parse_svg(b"not svg").is_err());
}
