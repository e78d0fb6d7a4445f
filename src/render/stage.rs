use std::collections::BTreeMap;

use crate::animation::driver::FrameClock;
use crate::config::ViewportConfig;
use crate::render::viewport::{CaptureResult, Viewport};

/// Stable identifier of a viewport owned by a [`Stage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewportHandle(u32);

impl ViewportHandle {
    /// Raw slot number.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// The render loop: owns every viewport and the shared frame clock.
///
/// Each `tick` advances all viewports by the same delta, then renders them. Viewports keep
/// independent cameras and controls.
#[derive(Debug)]
pub struct Stage {
    viewports: BTreeMap<ViewportHandle, Viewport>,
    next: u32,
    clock: FrameClock,
}

impl Stage {
    /// Empty stage driven by `clock`.
    pub fn new(clock: FrameClock) -> Self {
        Self {
            viewports: BTreeMap::new(),
            next: 0,
            clock,
        }
    }

    /// Create a viewport from `cfg`.
    pub fn add_viewport(&mut self, cfg: &ViewportConfig) -> ViewportHandle {
        self.insert_viewport(Viewport::from_config(cfg))
    }

    /// Take ownership of an existing viewport.
    pub fn insert_viewport(&mut self, viewport: Viewport) -> ViewportHandle {
        let handle = ViewportHandle(self.next);
        self.next += 1;
        self.viewports.insert(handle, viewport);
        handle
    }

    /// Remove a viewport; its handle is never reused.
    pub fn remove_viewport(&mut self, handle: ViewportHandle) -> Option<Viewport> {
        self.viewports.remove(&handle)
    }

    /// Viewport behind `handle`.
    pub fn viewport(&self, handle: ViewportHandle) -> Option<&Viewport> {
        self.viewports.get(&handle)
    }

    /// Viewport behind `handle`, mutably.
    pub fn viewport_mut(&mut self, handle: ViewportHandle) -> Option<&mut Viewport> {
        self.viewports.get_mut(&handle)
    }

    /// Live handles in creation order.
    pub fn handles(&self) -> impl Iterator<Item = ViewportHandle> + '_ {
        self.viewports.keys().copied()
    }

    /// The shared clock.
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Advance every viewport by one clock tick and render it. Returns the tick delta.
    ///
    /// A viewport that cannot render (zero size) is skipped for this tick.
    pub fn tick(&mut self) -> f32 {
        let delta = self.clock.tick();
        for (handle, vp) in &mut self.viewports {
            vp.advance(delta);
            if let Err(e) = vp.render_frame() {
                tracing::debug!(viewport = handle.0, error = %e, "viewport skipped this tick");
            }
        }
        delta
    }

    /// Synchronous capture of one viewport.
    ///
    /// Returns `None` for an unknown handle or a viewport that has nothing to capture.
    pub fn request_capture(&mut self, handle: ViewportHandle) -> Option<CaptureResult> {
        let vp = self.viewports.get_mut(&handle)?;
        match vp.capture_screenshot() {
            Ok(mut capture) => {
                capture.viewport = Some(handle);
                Some(capture)
            }
            Err(e) => {
                tracing::debug!(viewport = handle.0, error = %e, "capture unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/stage.rs"]
mod tests;
