use std::sync::Arc;

use crate::animation::driver::FrameClock;
use crate::assets::cache::AssetCache;
use crate::assets::id::AssetId;
use crate::collab::{DescriptionProvider, FallbackDescriptions};
use crate::config::RoomConfig;
use crate::foundation::error::{RoomError, RoomResult};
use crate::poster::pipeline::{PendingPoster, PosterImage, PosterPipeline, PosterRequest};
use crate::render::stage::{Stage, ViewportHandle};
use crate::render::viewport::{CaptureResult, Viewport};
use crate::rig::binder::{Figure, GarmentBinding, SkeletalBinder};

/// The two viewports of a dressing room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomView {
    /// Fixed camera on the host.
    Host,
    /// Orbitable view of the dressed figure.
    Model,
}

/// Session facade wiring the asset cache, binder, stage and poster pipeline together.
///
/// Style and outfit are passed to every call that needs them; the session keeps no notion of a
/// "current" selection beyond what its viewports show.
pub struct DressingRoom {
    cfg: RoomConfig,
    assets: Arc<AssetCache>,
    binder: SkeletalBinder,
    stage: Stage,
    host_view: ViewportHandle,
    model_view: ViewportHandle,
    descriptions: Box<dyn DescriptionProvider>,
    posters: PosterPipeline,
}

impl std::fmt::Debug for DressingRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DressingRoom")
            .field("assets", &self.cfg.assets.root)
            .field("bindings", &self.binder.len())
            .field("posters", &self.posters)
            .finish()
    }
}

impl DressingRoom {
    /// Room over `cfg` with a wall clock and generic outfit descriptions.
    pub fn new(cfg: RoomConfig) -> RoomResult<Self> {
        cfg.validate()?;
        let assets = Arc::new(AssetCache::with_layout(cfg.assets.clone()));
        Ok(Self::with_parts(
            cfg,
            assets,
            FrameClock::wall(),
            Box::new(FallbackDescriptions),
        ))
    }

    /// Room from explicit parts. `cfg` is assumed valid.
    pub fn with_parts(
        cfg: RoomConfig,
        assets: Arc<AssetCache>,
        clock: FrameClock,
        descriptions: Box<dyn DescriptionProvider>,
    ) -> Self {
        let mut stage = Stage::new(clock);
        let host_view = stage.add_viewport(&cfg.host_viewport);
        let model_view = stage.add_viewport(&cfg.model_viewport);
        let posters = PosterPipeline::new(cfg.poster.clone());
        Self {
            cfg,
            assets,
            binder: SkeletalBinder::new(),
            stage,
            host_view,
            model_view,
            descriptions,
            posters,
        }
    }

    /// Replace the description source.
    pub fn set_descriptions(&mut self, descriptions: Box<dyn DescriptionProvider>) {
        self.descriptions = descriptions;
    }

    /// Configuration in use.
    pub fn config(&self) -> &RoomConfig {
        &self.cfg
    }

    /// Shared mesh cache.
    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    /// Binding cache.
    pub fn binder(&self) -> &SkeletalBinder {
        &self.binder
    }

    /// Poster pipeline.
    pub fn posters(&self) -> &PosterPipeline {
        &self.posters
    }

    /// Render loop owning both viewports.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Stage handle of `view`.
    pub fn handle(&self, view: RoomView) -> ViewportHandle {
        match view {
            RoomView::Host => self.host_view,
            RoomView::Model => self.model_view,
        }
    }

    /// Viewport for `view`.
    pub fn viewport(&self, view: RoomView) -> Option<&Viewport> {
        self.stage.viewport(self.handle(view))
    }

    /// Mutable viewport for `view`, for orbit, zoom and pan input.
    pub fn viewport_mut(&mut self, view: RoomView) -> Option<&mut Viewport> {
        let handle = self.handle(view);
        self.stage.viewport_mut(handle)
    }

    /// Load the host figure into the host viewport.
    ///
    /// On failure the host viewport keeps whatever it showed before.
    #[tracing::instrument(skip(self))]
    pub fn show_host(&mut self) -> RoomResult<()> {
        let host = AssetId::host();
        let asset = self.assets.load(&host).inspect_err(|e| {
            tracing::warn!(error = %e, "host unavailable, poster will use the placeholder");
        })?;
        let figure = Figure::new(
            asset,
            self.cfg.placement_for(host.category()).clone(),
            self.cfg.animation.host_rate,
            self.cfg.animation.looping,
        );
        if let Some(vp) = self.stage.viewport_mut(self.host_view) {
            vp.set_figure(figure);
        }
        Ok(())
    }

    /// Show `style`'s body wearing `outfit` in the model viewport.
    ///
    /// Body and garment load in parallel. A body failure leaves the viewport unchanged. A garment
    /// failure leaves the body on screen undressed and returns the error. A garment whose bones do
    /// not match the body is still shown, in bind pose.
    #[tracing::instrument(skip(self))]
    pub fn dress(&mut self, style: &str, outfit: &str) -> RoomResult<Arc<GarmentBinding>> {
        let body_id = AssetId::body(style)?;
        let garment_id = AssetId::garment(style, outfit)?;
        let (body, garment) = self.assets.load_pair(&body_id, &garment_id);
        let body = body.inspect_err(|e| tracing::warn!(error = %e, "body unavailable"))?;

        let placement = self.cfg.placement_for(style).clone();
        let animation = self.cfg.animation.clone();
        let vp = self
            .stage
            .viewport_mut(self.model_view)
            .ok_or_else(|| RoomError::capture_unavailable("model viewport missing"))?;

        let same_body = vp.figure().is_some_and(|f| f.body().id == body.id);
        if !same_body {
            vp.set_figure(Figure::dressed_figure(Arc::clone(&body), placement, &animation));
        }
        let Some(figure) = vp.figure_mut() else {
            return Err(RoomError::capture_unavailable("model figure missing"));
        };

        let garment = match garment {
            Ok(g) => g,
            Err(e) => {
                figure.undress();
                tracing::warn!(error = %e, "garment unavailable, showing body only");
                return Err(e);
            }
        };
        let binding = self.binder.bind(&body, &garment);
        figure.dress(garment, Arc::clone(&binding));
        Ok(binding)
    }

    /// Advance and render both viewports. Returns the tick delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.stage.tick()
    }

    /// Synchronous capture of `view`; `None` when it has nothing to show.
    pub fn capture(&mut self, view: RoomView) -> Option<CaptureResult> {
        let handle = self.handle(view);
        self.stage.request_capture(handle)
    }

    /// Poster request for `style`/`outfit` with its description.
    pub fn poster_request(&self, style: &str, outfit: &str) -> PosterRequest {
        PosterRequest::new(style, outfit, self.descriptions.description(style, outfit))
    }

    /// Capture both viewports and compose a poster on this thread.
    pub fn generate_poster(&mut self, style: &str, outfit: &str) -> RoomResult<PosterImage> {
        let req = self.poster_request(style, outfit);
        self.generate_poster_with(&req)
    }

    /// Like [`DressingRoom::generate_poster`] with a caller-built request.
    pub fn generate_poster_with(&mut self, req: &PosterRequest) -> RoomResult<PosterImage> {
        let host = self.capture(RoomView::Host);
        let model = self.capture(RoomView::Model);
        self.posters
            .generate_poster(req, host.as_ref(), model.as_ref())
    }

    /// Capture both viewports now and compose the poster on a worker thread.
    pub fn spawn_poster(&mut self, style: &str, outfit: &str) -> RoomResult<PendingPoster> {
        let req = self.poster_request(style, outfit);
        let host = self.capture(RoomView::Host);
        let model = self.capture(RoomView::Model);
        self.posters.spawn(req, host, model)
    }
}
