use crate::config::{CameraConfig, OrbitConfig};
use crate::foundation::core::{Mat4, Vec3};

/// Perspective camera looking at a target point, +Y up.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub position: Vec3,
    /// Look-at point.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Camera {
    /// Camera placed as configured.
    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self {
            position: Vec3::from(cfg.position),
            target: Vec3::from(cfg.target),
            fov_y_deg: cfg.fov_y_deg,
            near: cfg.near,
            far: cfg.far,
        }
    }

    /// World-to-view transform.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// View-to-clip transform for a viewport of the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_deg.to_radians(), aspect, self.near, self.far)
    }

    /// `projection * view`.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }
}

/// Orbit, dolly and pan interaction around a target, with configured limits.
///
/// State is spherical: `distance` from the target, azimuth about +Y and polar angle measured from
/// +Y. Every mutation re-applies the limits.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    limits: OrbitConfig,
    target: Vec3,
    distance: f32,
    azimuth: f32,
    polar: f32,
}

impl OrbitControls {
    /// Controls starting from the camera's current placement.
    pub fn new(limits: OrbitConfig, camera: &Camera) -> Self {
        let offset = camera.position - camera.target;
        let distance = offset.length().max(f32::EPSILON);
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        let mut controls = Self {
            limits,
            target: camera.target,
            distance,
            azimuth,
            polar,
        };
        controls.clamp();
        controls
    }

    fn clamp(&mut self) {
        self.distance = self
            .distance
            .clamp(self.limits.min_distance, self.limits.max_distance);
        // Past the horizon the camera would sink below a target that sits on the ground.
        let max_polar = self.limits.max_polar.min(std::f32::consts::FRAC_PI_2);
        let min_polar = self.limits.min_polar.min(max_polar);
        self.polar = self.polar.clamp(min_polar, max_polar);
        self.target.y = self.target.y.max(self.limits.ground_y);
    }

    /// Limits in effect.
    pub fn limits(&self) -> &OrbitConfig {
        &self.limits
    }

    /// Current orbit target.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Current camera distance.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Current polar angle from +Y, radians.
    pub fn polar(&self) -> f32 {
        self.polar
    }

    /// Current azimuth about +Y, radians.
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Orbit by the given angle deltas (radians). Returns whether the input was applied; it is
    /// ignored when rotation is disabled or a delta is not finite.
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) -> bool {
        if !self.limits.enable_rotate || !d_azimuth.is_finite() || !d_polar.is_finite() {
            return false;
        }
        self.azimuth += d_azimuth;
        self.polar += d_polar;
        self.clamp();
        true
    }

    /// Scale the camera distance by `factor` (< 1 moves closer). Returns whether zoom is enabled.
    pub fn zoom(&mut self, factor: f32) -> bool {
        if !self.limits.enable_zoom || !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.distance *= factor;
        self.clamp();
        true
    }

    /// Move the target along the camera's screen axes; `dx`/`dy` are in units of distance.
    /// Returns whether the input was applied; non-finite deltas are ignored.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        if !self.limits.enable_pan || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        let forward = (-self.offset()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward).normalize_or(Vec3::Y);
        self.target += (right * dx + up * dy) * self.distance;
        self.clamp();
        true
    }

    fn offset(&self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        Vec3::new(sp * sa, cp, sp * ca) * self.distance
    }

    /// Write the controlled placement into `camera`.
    pub fn apply(&self, camera: &mut Camera) {
        camera.target = self.target;
        camera.position = self.target + self.offset();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/camera.rs"]
mod tests;
