use super::*;
use crate::animation::clip::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::assets::mesh::SkinWeights;
use crate::foundation::core::Quat;
use crate::rig::skeleton::{Bone, BoneTransform};

fn skeleton() -> Arc<Skeleton> {
    let bone = |name: &str, parent, y| Bone {
        name: name.to_string(),
        parent,
        rest: BoneTransform {
            translation: Vec3::new(0.0, y, 0.0),
            ..BoneTransform::IDENTITY
        },
    };
    Arc::new(
        Skeleton::new(
            vec![bone("hips", None, 1.0), bone("spine", Some(0), 0.5)],
            Mat4::IDENTITY,
        )
        .unwrap(),
    )
}

fn skinned_triangle(palette: &[&str], color: Rgba8) -> MeshPrimitive {
    MeshPrimitive {
        positions: vec![
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(0.5, 1.5, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ],
        indices: vec![0, 1, 2],
        base_color: color,
        skin: Some(SkinWeights {
            joint_names: palette.iter().map(|s| s.to_string()).collect(),
            inverse_binds: palette
                .iter()
                .map(|_| Mat4::from_translation(Vec3::new(0.0, -1.5, 0.0)))
                .collect(),
            joints: vec![[0, 0, 0, 0]; 3],
            weights: vec![[1.0, 0.0, 0.0, 0.0]; 3],
        }),
    }
}

fn body() -> Arc<MeshAsset> {
    let clip = AnimationClip::new(
        "sway",
        vec![Channel {
            bone: "spine".to_string(),
            times: vec![0.0, 1.0],
            values: ChannelValues::Rotation(vec![
                Quat::IDENTITY,
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            ]),
            interpolation: Interpolation::Linear,
        }],
    )
    .unwrap();
    Arc::new(MeshAsset {
        id: AssetId::body("日常").unwrap(),
        primitives: vec![skinned_triangle(&["spine"], Rgba8::WHITE)],
        skeleton: Some(skeleton()),
        clips: vec![Arc::new(clip)],
    })
}

fn garment(key: &str, palette: &[&str]) -> Arc<MeshAsset> {
    Arc::new(MeshAsset {
        id: AssetId::garment("日常", key).unwrap(),
        primitives: vec![skinned_triangle(palette, Rgba8::rgb(0x4e, 0xcd, 0xc4))],
        skeleton: None,
        clips: Vec::new(),
    })
}

fn placement() -> CategoryPlacement {
    CategoryPlacement {
        offset: [0.0, 0.0, 0.0],
        garment_yaw_deg: 0.0,
        ..CategoryPlacement::default()
    }
}

#[test]
fn bone_map_lists_every_missing_name() {
    let sk = skeleton();
    let ok = BoneMap::build(&sk, &["spine".to_string(), "hips".to_string()]).unwrap();
    assert_eq!(ok.bone_for(0), Some(1));
    assert_eq!(ok.bone_for(1), Some(0));
    assert_eq!(ok.bone_for(2), None);

    let err = BoneMap::build(&sk, &["tail".to_string(), "wing".to_string()]).unwrap_err();
    assert!(matches!(err, RoomError::BindingMismatch(_)));
    let msg = err.to_string();
    assert!(msg.contains("tail") && msg.contains("wing"));
}

#[test]
fn binder_caches_per_pair() {
    let binder = SkeletalBinder::new();
    let b = body();
    let g = garment("A", &["spine"]);
    let first = binder.bind(&b, &g);
    let second = binder.bind(&b, &g);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_bound());
    assert_eq!(binder.len(), 1);

    binder.bind(&b, &garment("B", &["spine"]));
    assert_eq!(binder.len(), 2);
}

#[test]
fn one_unmatched_bone_degrades_to_static() {
    let binder = SkeletalBinder::new();
    let binding = binder.bind(&body(), &garment("C", &["spine", "cape_tip"]));
    assert_eq!(
        *binding,
        GarmentBinding::Static {
            missing: vec!["cape_tip".to_string()]
        }
    );
}

#[test]
fn dressing_twice_is_idempotent() {
    let binder = SkeletalBinder::new();
    let b = body();
    let g = garment("A", &["spine"]);
    let mut fig = Figure::new(Arc::clone(&b), placement(), 1.0, true);
    assert_eq!(fig.node_count(), 1);

    fig.dress(Arc::clone(&g), binder.bind(&b, &g));
    let once: Vec<Vec<Vec3>> = fig
        .posed_primitives()
        .into_iter()
        .map(|p| p.positions)
        .collect();
    fig.dress(Arc::clone(&g), binder.bind(&b, &g));
    let twice: Vec<Vec<Vec3>> = fig
        .posed_primitives()
        .into_iter()
        .map(|p| p.positions)
        .collect();

    assert_eq!(fig.node_count(), 2);
    assert_eq!(once, twice);
}

#[test]
fn bound_garment_follows_body_pose_and_static_one_does_not() {
    let binder = SkeletalBinder::new();
    let b = body();
    let bound = garment("A", &["spine"]);
    let unbound = garment("B", &["spine", "cape_tip"]);

    let mut fig = Figure::new(Arc::clone(&b), placement(), 1.0, false);
    fig.dress(Arc::clone(&bound), binder.bind(&b, &bound));
    fig.advance(1.0);
    let posed = fig.posed_primitives();
    // Spine rotated 90 degrees about Z: the vertex 0.5 above the joint swings to -X.
    let tip = posed[1].positions[2];
    assert!(tip.abs_diff_eq(Vec3::new(-0.5, 1.5, 0.0), 1e-4), "{tip:?}");
    assert!(posed[0].positions[2].abs_diff_eq(tip, 1e-4));

    fig.dress(Arc::clone(&unbound), binder.bind(&b, &unbound));
    let posed = fig.posed_primitives();
    assert_eq!(posed.len(), 2);
    assert!(posed[1].positions[2].abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    assert!(posed[0].positions[2].abs_diff_eq(Vec3::new(-0.5, 1.5, 0.0), 1e-4));
}

#[test]
fn replacing_the_body_rebinds_the_garment() {
    let binder = SkeletalBinder::new();
    let b = body();
    let g = garment("A", &["spine"]);
    let mut fig = Figure::new(Arc::clone(&b), placement(), 1.0, true);
    fig.dress(Arc::clone(&g), binder.bind(&b, &g));

    let other = Arc::new(MeshAsset {
        id: AssetId::body("古装").unwrap(),
        primitives: vec![skinned_triangle(&["hips"], Rgba8::WHITE)],
        skeleton: Some(Arc::new(
            Skeleton::new(
                vec![Bone {
                    name: "hips".to_string(),
                    parent: None,
                    rest: BoneTransform::IDENTITY,
                }],
                Mat4::IDENTITY,
            )
            .unwrap(),
        )),
        clips: Vec::new(),
    });
    fig.replace_body(other, &binder);

    assert_eq!(fig.body().id.category(), "古装");
    let dressed = fig.garment().unwrap();
    assert!(!dressed.binding.is_bound());
    assert_eq!(dressed.binding.missing(), ["spine".to_string()]);
    assert_eq!(binder.len(), 2);
}

#[test]
fn garment_yaw_turns_only_the_garment() {
    let binder = SkeletalBinder::new();
    let b = body();
    let g = garment("A", &["spine"]);
    let mut fig = Figure::new(
        Arc::clone(&b),
        CategoryPlacement {
            garment_yaw_deg: 180.0,
            ..placement()
        },
        1.0,
        true,
    );
    fig.dress(Arc::clone(&g), binder.bind(&b, &g));
    let posed = fig.posed_primitives();
    assert!(posed[0].positions[1].abs_diff_eq(Vec3::new(0.5, 1.5, 0.0), 1e-5));
    assert!(posed[1].positions[1].abs_diff_eq(Vec3::new(-0.5, 1.5, 0.0), 1e-5));
}
