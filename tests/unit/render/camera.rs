use super::*;

fn model_camera() -> Camera {
    Camera::from_config(&CameraConfig::default())
}

#[test]
fn controls_preserve_initial_placement() {
    let mut cam = model_camera();
    let before = cam.position;
    let orbit = OrbitControls::new(OrbitConfig::default(), &cam);
    orbit.apply(&mut cam);
    assert!(cam.position.abs_diff_eq(before, 1e-5), "{:?}", cam.position);
    assert!((orbit.distance() - before.length()).abs() < 1e-5);
}

#[test]
fn polar_angle_never_goes_below_horizon() {
    let cam = model_camera();
    let mut orbit = OrbitControls::new(OrbitConfig::default(), &cam);
    assert!(orbit.rotate(0.3, 10.0));
    assert!((orbit.polar() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    orbit.rotate(0.0, -10.0);
    assert!((orbit.polar() - 0.001).abs() < 1e-6);
}

#[test]
fn zoom_is_clamped_to_distance_limits() {
    let cam = model_camera();
    let mut orbit = OrbitControls::new(OrbitConfig::default(), &cam);
    orbit.zoom(0.01);
    assert_eq!(orbit.distance(), 2.0);
    orbit.zoom(100.0);
    assert_eq!(orbit.distance(), 10.0);
    assert!(!orbit.zoom(-1.0));
}

#[test]
fn pan_keeps_target_above_ground() {
    let cam = model_camera();
    let mut orbit = OrbitControls::new(OrbitConfig::default(), &cam);
    orbit.pan(0.0, -100.0);
    assert!(orbit.target().y >= -1.0);
    orbit.pan(1.0, 0.0);
    assert!(orbit.target().x.abs() > 0.5);
}

#[test]
fn disabled_interactions_do_nothing() {
    let cam = model_camera();
    let mut orbit = OrbitControls::new(
        OrbitConfig {
            enable_rotate: false,
            enable_pan: false,
            enable_zoom: false,
            ..OrbitConfig::default()
        },
        &cam,
    );
    let before = orbit.clone();
    assert!(!orbit.rotate(1.0, 1.0));
    assert!(!orbit.pan(1.0, 1.0));
    assert!(!orbit.zoom(0.5));
    assert_eq!(orbit, before);
}

#[test]
fn polar_limit_past_the_horizon_keeps_camera_above_ground() {
    let mut cam = model_camera();
    let limits = OrbitConfig {
        max_polar: 3.0,
        ..OrbitConfig::default()
    };
    let ground = limits.ground_y;
    let mut orbit = OrbitControls::new(limits, &cam);
    orbit.pan(0.0, -100.0);
    assert!(orbit.rotate(0.0, 10.0));
    assert!((orbit.polar() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    orbit.apply(&mut cam);
    assert!(cam.position.y >= ground - 1e-4, "{:?}", cam.position);
}

#[test]
fn non_finite_input_is_ignored() {
    let mut cam = model_camera();
    let mut orbit = OrbitControls::new(OrbitConfig::default(), &cam);
    let before = orbit.clone();
    assert!(!orbit.rotate(f32::NAN, 0.0));
    assert!(!orbit.rotate(0.0, f32::INFINITY));
    assert!(!orbit.pan(f32::NAN, 0.0));
    assert!(!orbit.pan(0.0, f32::NEG_INFINITY));
    assert!(!orbit.zoom(f32::NAN));
    assert_eq!(orbit, before);

    orbit.apply(&mut cam);
    assert!(cam.position.is_finite() && cam.target.is_finite());
    assert!(orbit.rotate(0.1, 0.1));
}

#[test]
fn view_projection_maps_target_to_screen_center() {
    let cam = model_camera();
    let clip = cam.view_projection(1.0) * cam.target.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    assert!(ndc.z > -1.0 && ndc.z < 1.0);
}
