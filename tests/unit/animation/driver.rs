use std::sync::Arc;

use super::*;
use crate::animation::clip::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::foundation::core::{Mat4, Vec3};
use crate::rig::skeleton::{Bone, BoneTransform, Skeleton};

fn two_second_clip() -> BoundClip {
    let sk = Skeleton::new(
        vec![Bone {
            name: "root".to_string(),
            parent: None,
            rest: BoneTransform::IDENTITY,
        }],
        Mat4::IDENTITY,
    )
    .unwrap();
    let clip = Arc::new(
        AnimationClip::new(
            "walk",
            vec![Channel {
                bone: "root".to_string(),
                times: vec![0.0, 2.0],
                values: ChannelValues::Translation(vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]),
                interpolation: Interpolation::Linear,
            }],
        )
        .unwrap(),
    );
    clip.bind(&sk)
}

#[test]
fn looping_state_wraps() {
    let mut st = AnimationState::new(Some(two_second_clip()), 0.5, true);
    st.advance(3.0);
    assert!((st.position() - 1.5).abs() < 1e-6);
    st.advance(2.0);
    assert!((st.position() - 0.5).abs() < 1e-6);
}

#[test]
fn non_looping_state_holds_final_pose() {
    let mut st = AnimationState::new(Some(two_second_clip()), 1.0, false);
    st.advance(10.0);
    assert_eq!(st.position(), 2.0);
    st.advance(1.0);
    assert_eq!(st.position(), 2.0);
}

#[test]
fn idle_state_ignores_ticks() {
    let mut st = AnimationState::idle();
    assert_eq!(st.advance(1.0), 0.0);
}

#[test]
fn states_sharing_a_clock_advance_by_their_own_rate() {
    let mut clock = FrameClock::fixed(0.25).unwrap();
    let mut host = AnimationState::new(Some(two_second_clip()), 0.5, true);
    let mut figure = AnimationState::new(Some(two_second_clip()), 0.8, true);
    for _ in 0..4 {
        let dt = clock.tick();
        host.advance(dt);
        figure.advance(dt);
    }
    assert_eq!(clock.frame(), 4);
    assert!((clock.elapsed() - 1.0).abs() < 1e-9);
    assert!((host.position() - 0.5).abs() < 1e-6);
    assert!((figure.position() - 0.8).abs() < 1e-6);
}

#[test]
fn fixed_clock_rejects_negative_step() {
    assert!(FrameClock::fixed(-1.0).is_err());
    assert!(FrameClock::fixed(f32::NAN).is_err());
}

#[test]
fn wall_clock_first_tick_is_zero() {
    let mut clock = FrameClock::wall();
    assert_eq!(clock.tick(), 0.0);
    assert_eq!(clock.frame(), 1);
}
