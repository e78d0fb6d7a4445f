//! Deterministic z-buffered triangle rasterizer for posed figures.
//!
//! Shading is flat and two-sided: each triangle gets one Lambert term from an ambient light, a
//! directional light and an unattenuated point light. No anti-aliasing, no textures. Rendering the
//! same primitives with the same camera always produces the same bytes.

use crate::foundation::core::{Rgba8, Vec3};
use crate::foundation::error::RoomResult;
use crate::foundation::math::over_premul;
use crate::render::camera::Camera;
use crate::render::raster::Raster;
use crate::rig::binder::PosedPrimitive;

/// Scene lights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    /// Ambient intensity.
    pub ambient: f32,
    /// Position of the directional light; it shines towards the origin.
    pub directional_from: Vec3,
    /// Directional intensity.
    pub directional: f32,
    /// Point light position.
    pub point_at: Vec3,
    /// Point light intensity.
    pub point: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional_from: Vec3::new(5.0, 5.0, 5.0),
            directional: 1.0,
            point_at: Vec3::new(-5.0, 5.0, -5.0),
            point: 0.5,
        }
    }
}

impl Lighting {
    fn intensity(&self, normal: Vec3, at: Vec3) -> f32 {
        let dir = self.directional_from.normalize_or_zero();
        let to_point = (self.point_at - at).normalize_or_zero();
        self.ambient
            + self.directional * normal.dot(dir).max(0.0)
            + self.point * normal.dot(to_point).max(0.0)
    }
}

#[derive(Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

/// Render `primitives` into a fresh `width x height` raster cleared to `clear`.
pub(crate) fn render_primitives(
    primitives: &[PosedPrimitive<'_>],
    camera: &Camera,
    lighting: &Lighting,
    width: u32,
    height: u32,
    clear: Rgba8,
) -> RoomResult<Raster> {
    let mut raster = Raster::filled(width, height, clear.premul())?;
    let mut depth = vec![f32::INFINITY; (width as usize) * (height as usize)];
    let view_proj = camera.view_projection(width as f32 / height as f32);

    let project = |p: Vec3| -> Option<ScreenVertex> {
        let clip = view_proj * p.extend(1.0);
        if clip.w <= 1e-5 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(ScreenVertex {
            x: (ndc.x * 0.5 + 0.5) * width as f32,
            y: (0.5 - ndc.y * 0.5) * height as f32,
            z: ndc.z,
        })
    };

    for prim in primitives {
        for tri in prim.indices.chunks_exact(3) {
            let fetch = |i: u32| prim.positions.get(i as usize).copied();
            let (Some(a), Some(b), Some(c)) = (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) else {
                continue;
            };
            let mut normal = (b - a).cross(c - a).normalize_or_zero();
            if normal == Vec3::ZERO {
                continue;
            }
            if normal.dot(camera.position - a) < 0.0 {
                normal = -normal;
            }
            let (Some(sa), Some(sb), Some(sc)) = (project(a), project(b), project(c)) else {
                continue;
            };
            let shade = lighting.intensity(normal, (a + b + c) / 3.0).min(1.0);
            let lit = shade_color(prim.color, shade);
            fill_triangle(&mut raster, &mut depth, [sa, sb, sc], lit);
        }
    }
    Ok(raster)
}

fn shade_color(color: Rgba8, shade: f32) -> [u8; 4] {
    let scale = |c: u8| (f32::from(c) * shade).round().clamp(0.0, 255.0) as u8;
    let lit = Rgba8::rgba(scale(color.r), scale(color.g), scale(color.b), color.a);
    lit.premul().to_array()
}

fn edge(a: ScreenVertex, b: ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn fill_triangle(raster: &mut Raster, depth: &mut [f32], v: [ScreenVertex; 3], color: [u8; 4]) {
    let area = edge(v[0], v[1], v[2].x, v[2].y);
    if area.abs() <= f32::EPSILON {
        return;
    }
    let width = raster.width();
    let height = raster.height();
    let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0);
    let max_x = v
        .iter()
        .map(|p| p.x)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(width as f32);
    let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0);
    let max_y = v
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min(height as f32);
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let opaque = color[3] == 255;
    let data = raster.data_mut();
    for y in (min_y as u32)..(max_y as u32) {
        let py = y as f32 + 0.5;
        for x in (min_x as u32)..(max_x as u32) {
            let px = x as f32 + 0.5;
            let w0 = edge(v[1], v[2], px, py) / area;
            let w1 = edge(v[2], v[0], px, py) / area;
            let w2 = edge(v[0], v[1], px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let z = w0 * v[0].z + w1 * v[1].z + w2 * v[2].z;
            if !(-1.0..=1.0).contains(&z) {
                continue;
            }
            let di = (y as usize) * (width as usize) + (x as usize);
            if z >= depth[di] {
                continue;
            }
            depth[di] = z;
            let pi = di * 4;
            let px_out = if opaque {
                color
            } else {
                let mut dst = [0u8; 4];
                dst.copy_from_slice(&data[pi..pi + 4]);
                over_premul(dst, color, 255)
            };
            data[pi..pi + 4].copy_from_slice(&px_out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/software.rs"]
mod tests;
