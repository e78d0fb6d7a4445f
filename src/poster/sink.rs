use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::RoomResult;
use crate::poster::pipeline::PosterImage;

/// Save/share collaborator receiving finished posters.
///
/// Only completed, non-cancelled posters are delivered.
pub trait PosterSink {
    /// Take ownership of a copy of `poster`.
    fn deliver(&mut self, poster: &PosterImage) -> RoomResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryPosterSink {
    /// Posters in delivery order.
    pub posters: Vec<PosterImage>,
}

impl InMemoryPosterSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PosterSink for InMemoryPosterSink {
    fn deliver(&mut self, poster: &PosterImage) -> RoomResult<()> {
        self.posters.push(poster.clone());
        Ok(())
    }
}

/// Writes each poster as `<dir>/<filename>`.
#[derive(Debug)]
pub struct DirPosterSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirPosterSink {
    /// Sink writing into `dir`, created on first delivery.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl PosterSink for DirPosterSink {
    fn deliver(&mut self, poster: &PosterImage) -> RoomResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create poster dir '{}'", self.dir.display()))?;
        let path = self.dir.join(poster.filename());
        let png = poster.encode_png()?;
        std::fs::write(&path, png.as_slice())
            .with_context(|| format!("write poster '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = png.len(), "poster saved");
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/poster/sink.rs"]
mod tests;
