use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::config::PosterConfig;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{RoomError, RoomResult};

/// Families tried, in order, when no font file is configured.
const SYSTEM_FAMILIES: [&str; 8] = [
    "Noto Sans CJK SC",
    "Noto Sans SC",
    "Source Han Sans SC",
    "WenQuanYi Micro Hei",
    "Microsoft YaHei",
    "PingFang SC",
    "Noto Sans",
    "DejaVu Sans",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Where a font face came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// Configured font file.
    File(PathBuf),
    /// Installed system face, by family name.
    System(String),
}

/// One font face used for all poster text.
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    family: Option<String>,
    source: FontSource,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("source", &self.source)
            .field("index", &self.index)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl FontFace {
    /// Face 0 of a font file.
    pub fn from_file(path: &Path) -> RoomResult<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        Ok(Self {
            data: Arc::new(data),
            index: 0,
            family: None,
            source: FontSource::File(path.to_path_buf()),
        })
    }

    /// A CJK-capable system face, or any installed face when none of the preferred families
    /// exist.
    pub fn system() -> Option<Self> {
        use usvg::fontdb::{Database, Family, Query, Stretch, Style, Weight};

        let mut db = Database::new();
        db.load_system_fonts();
        let families: Vec<Family<'_>> = SYSTEM_FAMILIES
            .iter()
            .map(|name| Family::Name(*name))
            .chain(std::iter::once(Family::SansSerif))
            .collect();
        let id = db
            .query(&Query {
                families: &families,
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            })
            .or_else(|| db.faces().next().map(|f| f.id))?;
        let family = db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))?;
        let (data, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
        tracing::debug!(family = %family, index, "using system font");
        Some(Self {
            data: Arc::new(data),
            index,
            family: Some(family.clone()),
            source: FontSource::System(family),
        })
    }

    /// Face for `cfg`: the configured file, else a system face when allowed.
    ///
    /// An unreadable configured file is an error; a missing system face is not.
    pub fn resolve(cfg: &PosterConfig) -> RoomResult<Option<Self>> {
        if let Some(path) = &cfg.font_path {
            return Self::from_file(path).map(Some);
        }
        if cfg.system_fonts {
            return Ok(Self::system());
        }
        Ok(None)
    }

    /// Where the face came from.
    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Face index inside a collection file.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn font_data(&self) -> vello_cpu::peniko::FontData {
        vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(self.data.as_ref().clone()),
            self.index,
        )
    }
}

/// Parley contexts with one registered face.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    pub(crate) fn new(face: &FontFace) -> RoomResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.data.as_ref().clone()),
            None,
        );
        let names: Vec<String> = families
            .iter()
            .filter_map(|(id, _)| font_ctx.collection.family_name(*id).map(str::to_string))
            .collect();
        let family_name = face
            .family
            .as_ref()
            .and_then(|want| names.iter().find(|n| *n == want).cloned())
            .or_else(|| names.first().cloned())
            .ok_or_else(|| RoomError::composition("no font families registered from font bytes"))?;

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Shape `text` and break it at `max_width_px`.
    pub(crate) fn layout_plain(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> RoomResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(RoomError::composition("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

/// Layout engine plus the matching glyph source for drawing.
pub(crate) struct PosterTypeface {
    pub(crate) engine: TextLayoutEngine,
    pub(crate) font: vello_cpu::peniko::FontData,
}

impl PosterTypeface {
    pub(crate) fn new(face: &FontFace) -> RoomResult<Self> {
        Ok(Self {
            engine: TextLayoutEngine::new(face)?,
            font: face.font_data(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/poster/text.rs"]
mod tests;
