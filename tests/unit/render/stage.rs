use std::sync::Arc;

use super::*;
use crate::assets::id::AssetId;
use crate::assets::mesh::{MeshAsset, MeshPrimitive};
use crate::config::CategoryPlacement;
use crate::foundation::core::{Rgba8, Vec3};
use crate::rig::binder::Figure;

fn figure() -> Figure {
    let host = Arc::new(MeshAsset {
        id: AssetId::host(),
        primitives: vec![MeshPrimitive {
            positions: vec![
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            indices: vec![0, 1, 2],
            base_color: Rgba8::WHITE,
            skin: None,
        }],
        skeleton: None,
        clips: Vec::new(),
    });
    Figure::new(host, CategoryPlacement::default(), 0.5, true)
}

fn small(cfg: ViewportConfig) -> ViewportConfig {
    ViewportConfig {
        width: 16,
        height: 16,
        ..cfg
    }
}

#[test]
fn tick_advances_every_viewport_by_the_same_delta() {
    let mut stage = Stage::new(FrameClock::fixed(0.1).unwrap());
    let host = stage.add_viewport(&small(ViewportConfig::host_default()));
    let model = stage.add_viewport(&small(ViewportConfig::model_default()));
    stage.viewport_mut(host).unwrap().set_figure(figure());

    stage.tick();
    stage.tick();

    for h in [host, model] {
        let vp = stage.viewport(h).unwrap();
        assert!((vp.clock_seconds() - 0.2).abs() < 1e-6);
        assert_eq!(vp.frame(), 2);
    }
    assert_eq!(stage.clock().frame(), 2);
}

#[test]
fn request_capture_reports_handle_or_none() {
    let mut stage = Stage::new(FrameClock::fixed(0.0).unwrap());
    let host = stage.add_viewport(&small(ViewportConfig::host_default()));
    let empty = stage.add_viewport(&small(ViewportConfig::model_default()));
    stage.viewport_mut(host).unwrap().set_figure(figure());

    let cap = stage.request_capture(host).unwrap();
    assert_eq!(cap.viewport, Some(host));
    assert!(stage.request_capture(empty).is_none());

    stage.remove_viewport(host);
    assert!(stage.request_capture(host).is_none());
    let again = stage.add_viewport(&small(ViewportConfig::host_default()));
    assert_ne!(again, host);
}

#[test]
fn zero_sized_viewport_is_skipped_not_fatal() {
    let mut stage = Stage::new(FrameClock::fixed(0.1).unwrap());
    let h = stage.add_viewport(&small(ViewportConfig::model_default()));
    stage.viewport_mut(h).unwrap().resize(0, 0);
    stage.tick();
    assert_eq!(stage.viewport(h).unwrap().frame(), 0);
    assert!((stage.viewport(h).unwrap().clock_seconds() - 0.1).abs() < 1e-6);
}
