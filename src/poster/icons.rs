use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::parse_svg;
use crate::foundation::error::{RoomError, RoomResult};

/// Largest icon edge, in device pixels.
const MAX_SPRITE_EDGE: u32 = 4_096;

/// Vector pictograms drawn on the poster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Icon {
    /// Four-point sparkle.
    Sparkle,
    /// Sun, for everyday wear.
    Sun,
    /// Pagoda roof, for period costume.
    Pagoda,
    /// Two raised glasses, for evening wear.
    Toast,
    /// Shirt, for unknown styles.
    Shirt,
    /// Microphone, for the host.
    Mic,
}

impl Icon {
    /// SVG document on a 100x100 canvas.
    pub fn svg_source(self) -> &'static str {
        match self {
            Self::Sparkle => SPARKLE,
            Self::Sun => SUN,
            Self::Pagoda => PAGODA,
            Self::Toast => TOAST,
            Self::Shirt => SHIRT,
            Self::Mic => MIC,
        }
    }
}

const SPARKLE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<path d="M50 4 C55 38 62 45 96 50 C62 55 55 62 50 96 C45 62 38 55 4 50 C38 45 45 38 50 4 Z" fill="#FFD54F"/>
<path d="M80 8 C82 17 83 18 92 20 C83 22 82 23 80 32 C78 23 77 22 68 20 C77 18 78 17 80 8 Z" fill="#FFF59D"/>
</svg>"##;

const SUN: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<g stroke="#FFB300" stroke-width="7" stroke-linecap="round">
<line x1="50" y1="5" x2="50" y2="18"/><line x1="50" y1="82" x2="50" y2="95"/>
<line x1="5" y1="50" x2="18" y2="50"/><line x1="82" y1="50" x2="95" y2="50"/>
<line x1="18" y1="18" x2="27" y2="27"/><line x1="73" y1="73" x2="82" y2="82"/>
<line x1="18" y1="82" x2="27" y2="73"/><line x1="73" y1="27" x2="82" y2="18"/>
</g>
<circle cx="50" cy="50" r="24" fill="#FFCA28"/>
</svg>"##;

const PAGODA: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<path d="M50 6 L56 16 L44 16 Z" fill="#B71C1C"/>
<path d="M20 30 Q50 14 80 30 L70 32 L30 32 Z" fill="#C62828"/>
<rect x="34" y="32" width="32" height="14" fill="#FFE0B2"/>
<path d="M12 56 Q50 36 88 56 L76 58 L24 58 Z" fill="#C62828"/>
<rect x="28" y="58" width="44" height="30" fill="#FFE0B2"/>
<rect x="44" y="70" width="12" height="18" fill="#6D4C41"/>
<rect x="10" y="88" width="80" height="6" rx="2" fill="#8D6E63"/>
</svg>"##;

const TOAST: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<g transform="rotate(-14 34 50)">
<path d="M22 14 L46 14 L42 44 Q34 52 26 44 Z" fill="#FFE082"/>
<rect x="32" y="48" width="4" height="28" fill="#ECEFF1"/>
<rect x="24" y="76" width="20" height="4" rx="2" fill="#ECEFF1"/>
</g>
<g transform="rotate(14 66 50)">
<path d="M54 14 L78 14 L74 44 Q66 52 58 44 Z" fill="#FFE082"/>
<rect x="64" y="48" width="4" height="28" fill="#ECEFF1"/>
<rect x="56" y="76" width="20" height="4" rx="2" fill="#ECEFF1"/>
</g>
<circle cx="50" cy="8" r="3" fill="#FFF59D"/>
</svg>"##;

const SHIRT: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<path d="M36 10 L50 20 L64 10 L90 24 L80 44 L70 40 L70 92 L30 92 L30 40 L20 44 L10 24 Z" fill="#42A5F5"/>
<path d="M44 16 L50 20 L56 16 L53 60 L50 64 L47 60 Z" fill="#1E3A5F"/>
</svg>"##;

const MIC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
<rect x="36" y="8" width="28" height="50" rx="14" fill="#B0BEC5"/>
<path d="M26 44 Q26 70 50 70 Q74 70 74 44" fill="none" stroke="#78909C" stroke-width="6"/>
<rect x="47" y="70" width="6" height="16" fill="#78909C"/>
<rect x="34" y="86" width="32" height="6" rx="3" fill="#78909C"/>
</svg>"##;

/// An icon rendered at one device size.
#[derive(Debug)]
pub(crate) struct IconSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Premultiplied RGBA8, row-major.
    pub(crate) pixels: Vec<u8>,
}

/// Parsed icon trees and their rendered sprites, shared across posters.
#[derive(Default)]
pub struct IconAtlas {
    trees: HashMap<Icon, Arc<usvg::Tree>>,
    sprites: HashMap<(Icon, u32, u32), Arc<IconSprite>>,
}

impl IconAtlas {
    /// Empty atlas; trees are parsed on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed tree for `icon`.
    pub fn tree(&mut self, icon: Icon) -> RoomResult<Arc<usvg::Tree>> {
        if let Some(t) = self.trees.get(&icon) {
            return Ok(Arc::clone(t));
        }
        let tree = parse_svg(icon.svg_source().as_bytes())?;
        self.trees.insert(icon, Arc::clone(&tree));
        Ok(tree)
    }

    /// `icon` stretched over `width x height` device pixels. Each size is rendered once.
    pub(crate) fn sprite(
        &mut self,
        icon: Icon,
        width: u32,
        height: u32,
    ) -> RoomResult<Arc<IconSprite>> {
        if width == 0 || height == 0 || width > MAX_SPRITE_EDGE || height > MAX_SPRITE_EDGE {
            return Err(RoomError::composition(format!(
                "icon {icon:?} cannot be drawn at {width}x{height}"
            )));
        }
        if let Some(sprite) = self.sprites.get(&(icon, width, height)) {
            return Ok(Arc::clone(sprite));
        }
        let tree = self.tree(icon)?;
        let sprite = Arc::new(IconSprite {
            width,
            height,
            pixels: render_tree(&tree, width, height)?,
        });
        self.sprites
            .insert((icon, width, height), Arc::clone(&sprite));
        Ok(sprite)
    }

    /// Rendered sprites held by the atlas.
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

fn render_tree(tree: &usvg::Tree, width: u32, height: u32) -> RoomResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RoomError::composition("icon pixmap allocation failed"))?;
    let size = tree.size();
    let fit = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(tree, fit, &mut pixmap.as_mut());
    Ok(pixmap.take())
}

#[cfg(test)]
#[path = "../../tests/unit/poster/icons.rs"]
mod tests;
