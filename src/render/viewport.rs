use std::sync::Arc;
use std::time::SystemTime;

use crate::config::ViewportConfig;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{RoomError, RoomResult};
use crate::render::camera::{Camera, OrbitControls};
use crate::render::raster::Raster;
use crate::render::software::{Lighting, render_primitives};
use crate::render::stage::ViewportHandle;
use crate::rig::binder::Figure;

/// One immutable screenshot of a viewport.
#[derive(Clone, Debug)]
pub struct CaptureResult {
    /// Owning stage slot; `None` for a viewport captured outside a stage.
    pub viewport: Option<ViewportHandle>,
    /// Viewport frame counter at capture time.
    pub frame: u64,
    /// Simulated animation time of the viewport, seconds.
    pub clock_seconds: f64,
    /// Wall-clock time the capture was taken.
    pub captured_at: SystemTime,
    /// Captured pixels.
    pub raster: Arc<Raster>,
}

/// A camera, optional orbit controls and at most one figure, rendered into a fixed-size raster.
#[derive(Clone, Debug)]
pub struct Viewport {
    width: u32,
    height: u32,
    clear: Rgba8,
    camera: Camera,
    orbit: Option<OrbitControls>,
    lighting: Lighting,
    figure: Option<Figure>,
    frame: u64,
    clock_seconds: f64,
    last_frame: Option<Arc<Raster>>,
}

impl Viewport {
    /// Empty viewport as configured.
    pub fn from_config(cfg: &ViewportConfig) -> Self {
        let camera = Camera::from_config(&cfg.camera);
        let orbit = cfg
            .orbit
            .clone()
            .map(|limits| OrbitControls::new(limits, &camera));
        let mut vp = Self {
            width: cfg.width,
            height: cfg.height,
            clear: cfg.clear,
            camera,
            orbit,
            lighting: Lighting::default(),
            figure: None,
            frame: 0,
            clock_seconds: 0.0,
            last_frame: None,
        };
        vp.sync_camera();
        vp
    }

    fn sync_camera(&mut self) {
        if let Some(orbit) = &self.orbit {
            orbit.apply(&mut self.camera);
        }
    }

    /// Show `figure`, returning the previous one.
    pub fn set_figure(&mut self, figure: Figure) -> Option<Figure> {
        self.figure.replace(figure)
    }

    /// Remove the figure.
    pub fn clear_figure(&mut self) -> Option<Figure> {
        self.figure.take()
    }

    /// Current figure.
    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    /// Current figure, mutably.
    pub fn figure_mut(&mut self) -> Option<&mut Figure> {
        self.figure.as_mut()
    }

    /// Camera in effect.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Orbit controls, if interaction is enabled for this viewport.
    pub fn orbit(&self) -> Option<&OrbitControls> {
        self.orbit.as_ref()
    }

    /// Replace the lights.
    pub fn set_lighting(&mut self, lighting: Lighting) {
        self.lighting = lighting;
    }

    /// Orbit the camera. Returns `false` when the viewport has no (enabled) rotation.
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) -> bool {
        let changed = self
            .orbit
            .as_mut()
            .is_some_and(|o| o.rotate(d_azimuth, d_polar));
        self.sync_camera();
        changed
    }

    /// Dolly the camera by `factor`.
    pub fn zoom(&mut self, factor: f32) -> bool {
        let changed = self.orbit.as_mut().is_some_and(|o| o.zoom(factor));
        self.sync_camera();
        changed
    }

    /// Pan the orbit target.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        let changed = self.orbit.as_mut().is_some_and(|o| o.pan(dx, dy));
        self.sync_camera();
        changed
    }

    /// Change the raster size. Zero sizes are allowed; such a viewport cannot render.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.last_frame = None;
    }

    /// `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds advanced so far.
    pub fn clock_seconds(&self) -> f64 {
        self.clock_seconds
    }

    /// Most recent rendered frame.
    pub fn last_frame(&self) -> Option<&Arc<Raster>> {
        self.last_frame.as_ref()
    }

    /// Advance the figure's animation by `delta` seconds.
    pub fn advance(&mut self, delta: f32) {
        self.clock_seconds += f64::from(delta);
        if let Some(fig) = &mut self.figure {
            fig.advance(delta);
        }
    }

    /// Render the current state. A viewport without a figure renders its clear color.
    pub fn render_frame(&mut self) -> RoomResult<Arc<Raster>> {
        if self.width == 0 || self.height == 0 {
            return Err(RoomError::capture_unavailable("viewport has zero size"));
        }
        let posed = self
            .figure
            .as_ref()
            .map(|f| f.posed_primitives())
            .unwrap_or_default();
        let raster = render_primitives(
            &posed,
            &self.camera,
            &self.lighting,
            self.width,
            self.height,
            self.clear,
        )?;
        let raster = Arc::new(raster);
        self.frame += 1;
        self.last_frame = Some(Arc::clone(&raster));
        Ok(raster)
    }

    /// Render one pass synchronously and return it as a capture.
    ///
    /// Fails with [`RoomError::CaptureUnavailable`] when the viewport has no figure or no area.
    #[tracing::instrument(skip(self), fields(frame = self.frame))]
    pub fn capture_screenshot(&mut self) -> RoomResult<CaptureResult> {
        if self.figure.is_none() {
            return Err(RoomError::capture_unavailable("viewport has no scene"));
        }
        let raster = self.render_frame()?;
        Ok(CaptureResult {
            viewport: None,
            frame: self.frame,
            clock_seconds: self.clock_seconds,
            captured_at: SystemTime::now(),
            raster,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/viewport.rs"]
mod tests;
