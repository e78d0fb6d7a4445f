//! The capture and compositing cycle.
//!
//! One cycle moves `Idle -> Capturing -> Composing -> Done | Failed` and then back to `Idle`.
//! Requests arriving while a cycle runs are rejected with [`RoomError::Busy`], never queued.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::JoinHandle;

use anyhow::Context as _;

use crate::config::PosterConfig;
use crate::foundation::error::{RoomError, RoomResult};
use crate::poster::document::{PosterContent, PosterDocument};
use crate::poster::flatten::flatten;
use crate::poster::icons::IconAtlas;
use crate::poster::sink::PosterSink;
use crate::poster::text::{FontFace, PosterTypeface};
use crate::render::raster::Raster;
use crate::render::viewport::CaptureResult;

/// Where the poster pipeline currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Ready for a request.
    Idle = 0,
    /// Collecting viewport captures.
    Capturing = 1,
    /// Laying out and flattening.
    Composing = 2,
    /// Last cycle produced a poster.
    Done = 3,
    /// Last cycle failed.
    Failed = 4,
}

impl PipelineState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Capturing,
            2 => Self::Composing,
            3 => Self::Done,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// What to put on a poster besides the captures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PosterRequest {
    /// Style key, e.g. `晚宴`.
    pub style: String,
    /// Outfit key, e.g. `D`.
    pub outfit: String,
    /// Outfit description for the card.
    pub description: String,
    /// Footer date; `None` leaves it out.
    pub date_label: Option<String>,
}

impl PosterRequest {
    /// Request without a date label.
    pub fn new(
        style: impl Into<String>,
        outfit: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            style: style.into(),
            outfit: outfit.into(),
            description: description.into(),
            date_label: None,
        }
    }

    /// Same request with a footer date.
    pub fn with_date_label(mut self, date: impl Into<String>) -> Self {
        self.date_label = Some(date.into());
        self
    }

    fn validate(&self) -> RoomResult<()> {
        if self.style.trim().is_empty() || self.outfit.trim().is_empty() {
            return Err(RoomError::validation(
                "poster request needs a style and an outfit",
            ));
        }
        Ok(())
    }
}

/// A finished, immutable poster.
#[derive(Clone, Debug)]
pub struct PosterImage {
    raster: Arc<Raster>,
    filename: String,
    png: OnceLock<Arc<Vec<u8>>>,
}

impl PosterImage {
    fn new(req: &PosterRequest, raster: Raster) -> Self {
        Self {
            raster: Arc::new(raster),
            filename: poster_filename(&req.style, &req.outfit),
            png: OnceLock::new(),
        }
    }

    /// Flattened pixels.
    pub fn raster(&self) -> &Arc<Raster> {
        &self.raster
    }

    /// `{style}_{outfit}_海报.png`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// PNG bytes, encoded once.
    pub fn encode_png(&self) -> RoomResult<Arc<Vec<u8>>> {
        if let Some(png) = self.png.get() {
            return Ok(Arc::clone(png));
        }
        let png = Arc::new(self.raster.encode_png()?);
        Ok(Arc::clone(self.png.get_or_init(|| png)))
    }
}

/// Download name for a poster; path separators in keys become `_`.
pub fn poster_filename(style: &str, outfit: &str) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!("{}_{}_海报.png", clean(style), clean(outfit))
}

struct Shared {
    cfg: PosterConfig,
    state: AtomicU8,
    last: AtomicU8,
    icons: Mutex<IconAtlas>,
    font: Mutex<Option<Option<FontFace>>>,
}

impl Shared {
    /// Resolved once; a failed lookup is retried next cycle.
    fn font_face(&self) -> RoomResult<Option<FontFace>> {
        let mut slot = self.font.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(face) = slot.as_ref() {
            return Ok(face.clone());
        }
        let face = FontFace::resolve(&self.cfg)?;
        if face.is_none() {
            tracing::warn!("no usable font found, posters will have no text");
        }
        *slot = Some(face.clone());
        Ok(face)
    }
}

/// Holds the pipeline out of `Idle` for one cycle.
struct CycleGuard {
    shared: Arc<Shared>,
    outcome: PipelineState,
}

impl CycleGuard {
    fn begin(shared: Arc<Shared>) -> RoomResult<Self> {
        shared
            .state
            .compare_exchange(
                PipelineState::Idle as u8,
                PipelineState::Capturing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|cur| {
                RoomError::busy(format!(
                    "poster cycle already {:?}",
                    PipelineState::from_u8(cur)
                ))
            })?;
        Ok(Self {
            shared,
            outcome: PipelineState::Failed,
        })
    }

    fn enter(&self, state: PipelineState) {
        self.shared.state.store(state as u8, Ordering::Release);
    }

    fn finish<T>(mut self, result: RoomResult<T>) -> RoomResult<T> {
        self.outcome = match result {
            Ok(_) => PipelineState::Done,
            Err(_) => PipelineState::Failed,
        };
        self.enter(self.outcome);
        result
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.shared
            .last
            .store(self.outcome as u8, Ordering::Release);
        self.shared
            .state
            .store(PipelineState::Idle as u8, Ordering::Release);
    }
}

/// Captures frozen for one cycle.
struct CaptureCycle {
    host: Option<Arc<Raster>>,
    model: Option<Arc<Raster>>,
}

impl CaptureCycle {
    fn collect(host: Option<&CaptureResult>, model: Option<&CaptureResult>) -> Self {
        tracing::debug!(
            host_frame = host.map(|c| c.frame),
            model_frame = model.map(|c| c.frame),
            "captures collected"
        );
        Self {
            host: host.map(|c| Arc::clone(&c.raster)),
            model: model.map(|c| Arc::clone(&c.raster)),
        }
    }

    fn compose(self, shared: &Shared, req: &PosterRequest) -> RoomResult<PosterImage> {
        let doc = PosterDocument::build(
            &PosterContent {
                style: &req.style,
                outfit: &req.outfit,
                description: &req.description,
                date_label: req.date_label.as_deref(),
                host: self.host,
                model: self.model,
            },
            &shared.cfg,
        );

        let mut typeface = match shared.font_face()? {
            Some(face) => match PosterTypeface::new(&face) {
                Ok(tf) => Some(tf),
                Err(e) => {
                    tracing::warn!(error = %e, "font unusable, poster text omitted");
                    None
                }
            },
            None => None,
        };

        let raster = {
            let mut icons = shared.icons.lock().unwrap_or_else(PoisonError::into_inner);
            flatten(&doc, shared.cfg.supersample, &mut icons, typeface.as_mut())?
        };
        Ok(PosterImage::new(req, raster))
    }
}

fn as_composition(e: RoomError) -> RoomError {
    match e {
        RoomError::Composition(_) => e,
        other => RoomError::composition(other.to_string()),
    }
}

/// Turns captures into posters, one cycle at a time.
///
/// Cloning shares the cycle state, so a clone observes and blocks the same cycles.
#[derive(Clone)]
pub struct PosterPipeline {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for PosterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterPipeline")
            .field("state", &self.state())
            .field("supersample", &self.shared.cfg.supersample)
            .finish()
    }
}

impl PosterPipeline {
    /// Idle pipeline for `cfg`.
    pub fn new(cfg: PosterConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                state: AtomicU8::new(PipelineState::Idle as u8),
                last: AtomicU8::new(PipelineState::Idle as u8),
                icons: Mutex::new(IconAtlas::new()),
                font: Mutex::new(None),
            }),
        }
    }

    /// Options the pipeline was built with.
    pub fn config(&self) -> &PosterConfig {
        &self.shared.cfg
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// `Done` or `Failed` for the last finished cycle, `Idle` before the first.
    pub fn last_outcome(&self) -> PipelineState {
        PipelineState::from_u8(self.shared.last.load(Ordering::Acquire))
    }

    /// Run one full cycle on the calling thread.
    ///
    /// A missing capture becomes a placeholder. The result is a complete poster or an error,
    /// never a partial image.
    #[tracing::instrument(skip_all, fields(style = %req.style, outfit = %req.outfit))]
    pub fn generate_poster(
        &self,
        req: &PosterRequest,
        host: Option<&CaptureResult>,
        model: Option<&CaptureResult>,
    ) -> RoomResult<PosterImage> {
        req.validate()?;
        let guard = CycleGuard::begin(Arc::clone(&self.shared))?;
        let cycle = CaptureCycle::collect(host, model);
        guard.enter(PipelineState::Composing);
        let result = cycle
            .compose(&self.shared, req)
            .map_err(as_composition);
        if let Err(e) = &result {
            tracing::error!(error = %e, "poster composition failed");
        }
        guard.finish(result)
    }

    /// Run one cycle on a worker thread.
    ///
    /// The pipeline leaves `Idle` before this returns, so a following request is rejected until
    /// the worker finishes.
    pub fn spawn(
        &self,
        req: PosterRequest,
        host: Option<CaptureResult>,
        model: Option<CaptureResult>,
    ) -> RoomResult<PendingPoster> {
        req.validate()?;
        let guard = CycleGuard::begin(Arc::clone(&self.shared))?;
        let cycle = CaptureCycle::collect(host.as_ref(), model.as_ref());
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = std::thread::Builder::new()
            .name("poster-compose".to_string())
            .spawn(move || {
                guard.enter(PipelineState::Composing);
                let shared = Arc::clone(&guard.shared);
                let result = cycle
                    .compose(&shared, &req)
                    .map_err(as_composition)
                    .and_then(|image| {
                        if flag.load(Ordering::Acquire) {
                            return Ok(image);
                        }
                        image.encode_png().map_err(as_composition)?;
                        Ok(image)
                    });
                guard.finish(result)
            })
            .context("spawn poster worker")?;

        Ok(PendingPoster { handle, cancelled })
    }
}

/// Result of a spawned cycle.
#[derive(Debug)]
pub enum PosterOutcome {
    /// Finished poster.
    Done(PosterImage),
    /// The cycle failed.
    Failed(RoomError),
    /// Cancelled before delivery; any result was discarded.
    Cancelled,
}

/// Cancels a [`PendingPoster`] from elsewhere.
#[derive(Clone, Debug)]
pub struct PosterCanceller(Arc<AtomicBool>);

impl PosterCanceller {
    /// Discard the pending result.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A poster cycle running on a worker thread.
#[derive(Debug)]
pub struct PendingPoster {
    handle: JoinHandle<RoomResult<PosterImage>>,
    cancelled: Arc<AtomicBool>,
}

impl PendingPoster {
    /// Discard the result once the worker finishes.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Handle that cancels this poster.
    pub fn canceller(&self) -> PosterCanceller {
        PosterCanceller(Arc::clone(&self.cancelled))
    }

    /// Whether the worker has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker returns.
    pub fn wait(self) -> PosterOutcome {
        let result = match self.handle.join() {
            Ok(r) => r,
            Err(_) => Err(RoomError::composition("poster worker panicked")),
        };
        if self.cancelled.load(Ordering::Acquire) {
            tracing::debug!("poster cancelled, result discarded");
            return PosterOutcome::Cancelled;
        }
        match result {
            Ok(image) => PosterOutcome::Done(image),
            Err(e) => PosterOutcome::Failed(e),
        }
    }

    /// Wait, then hand a finished poster to `sink`.
    pub fn wait_into(self, sink: &mut dyn PosterSink) -> RoomResult<PosterOutcome> {
        let outcome = self.wait();
        if let PosterOutcome::Done(image) = &outcome {
            sink.deliver(image)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/poster/pipeline.rs"]
mod tests;
