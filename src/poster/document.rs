//! The poster as a typed, immutable node list.
//!
//! Layout units are CSS pixels of an 800x1100 card. Nodes are painted in order. Text widths are
//! estimated at build time (CJK glyphs one em, ASCII about half an em), so badge and pill sizes do
//! not depend on which font the flattener ends up with.

use std::sync::Arc;

use crate::config::PosterConfig;
use crate::foundation::core::{Canvas, Rect, Rgba8};
use crate::poster::icons::Icon;
use crate::poster::theme::StyleTheme;
use crate::render::raster::Raster;

/// Layout width of every poster.
pub const POSTER_WIDTH: u32 = 800;
/// Layout height of every poster.
pub const POSTER_HEIGHT: u32 = 1100;

pub(crate) const CARD_RADIUS: f64 = 40.0;
const SLOT_RADIUS: f64 = 30.0;

/// How a shape is filled.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// Flat color.
    Solid(Rgba8),
    /// CSS-style linear gradient; 0 degrees points up, 90 to the right.
    Linear {
        /// Direction in degrees.
        angle_deg: f32,
        /// `(offset in 0..=1, color)` stops, ascending.
        stops: Vec<(f32, Rgba8)>,
    },
    /// Circular glow fading from `color` at the center to transparent.
    Radial {
        /// Center color.
        color: Rgba8,
        /// Fade-out distance as a fraction of the half-diagonal.
        extent: f32,
    },
}

/// Outline of a shape inside its rect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// Axis-aligned rectangle.
    Rect,
    /// Rectangle with uniform corner radius.
    RoundedRect(f64),
    /// Ellipse inscribed in the rect.
    Ellipse,
    /// Rounded-rect outline of `width`, drawn inside the rect.
    Ring {
        /// Outer corner radius.
        radius: f64,
        /// Line width.
        width: f64,
    },
}

/// A filled vector shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    /// Bounds in layout units.
    pub rect: Rect,
    /// Outline.
    pub geometry: Geometry,
    /// Fill.
    pub paint: Paint,
}

/// Which capture an image slot shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRole {
    /// Host avatar.
    Host,
    /// Dressed figure.
    Model,
}

/// Clip applied to an image slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlotClip {
    /// Rounded rectangle.
    Rounded(f64),
    /// Circle inscribed in the slot.
    Circle,
}

/// A captured raster, cover-fitted into `rect`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSlot {
    /// Capture shown.
    pub role: SlotRole,
    /// Bounds in layout units.
    pub rect: Rect,
    /// Clip.
    pub clip: SlotClip,
    /// Pixels.
    pub raster: Arc<Raster>,
}

/// Horizontal alignment inside a text box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    /// Left.
    Start,
    /// Centered.
    Center,
    /// Right.
    End,
}

/// Wrapped text inside a box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSlot {
    /// Content.
    pub text: String,
    /// Box in layout units; text wraps at its width.
    pub rect: Rect,
    /// Font size in layout units.
    pub size_px: f32,
    /// Fill color.
    pub color: Rgba8,
    /// Per-line alignment.
    pub align: TextAlign,
}

/// A vector icon stretched over `rect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IconSlot {
    /// Icon.
    pub icon: Icon,
    /// Bounds in layout units.
    pub rect: Rect,
}

/// One paint operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PosterNode {
    /// Vector shape.
    Shape(Shape),
    /// Captured raster.
    Image(ImageSlot),
    /// Text.
    Text(TextSlot),
    /// Icon.
    Icon(IconSlot),
}

/// Everything a poster shows besides fixed chrome.
#[derive(Clone, Debug)]
pub struct PosterContent<'a> {
    /// Style key.
    pub style: &'a str,
    /// Outfit key.
    pub outfit: &'a str,
    /// Outfit description shown in the card.
    pub description: &'a str,
    /// Date shown in the footer.
    pub date_label: Option<&'a str>,
    /// Host capture; `None` draws the host placeholder.
    pub host: Option<Arc<Raster>>,
    /// Figure capture; `None` draws the style placeholder.
    pub model: Option<Arc<Raster>>,
}

/// A fully laid out poster.
#[derive(Clone, Debug)]
pub struct PosterDocument {
    canvas: Canvas,
    theme: StyleTheme,
    nodes: Vec<PosterNode>,
}

impl PosterDocument {
    /// Lay out a poster for `content`.
    pub fn build(content: &PosterContent<'_>, cfg: &PosterConfig) -> Self {
        let theme = StyleTheme::for_style(content.style, cfg);
        let mut b = Builder { nodes: Vec::new() };

        b.backdrop(&theme);
        b.title(&theme, cfg);
        b.host(&theme, cfg, content.host.clone());
        b.model(&theme, content);
        b.card(&theme, content.description);
        b.footer(cfg, content.date_label);

        Self {
            canvas: Canvas {
                width: POSTER_WIDTH,
                height: POSTER_HEIGHT,
            },
            theme,
            nodes: b.nodes,
        }
    }

    /// Layout size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Theme the poster was built with.
    pub fn theme(&self) -> &StyleTheme {
        &self.theme
    }

    /// Paint operations in order.
    pub fn nodes(&self) -> &[PosterNode] {
        &self.nodes
    }

    /// Text nodes in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &TextSlot> {
        self.nodes.iter().filter_map(|n| match n {
            PosterNode::Text(t) => Some(t),
            _ => None,
        })
    }

    /// The image slot for `role`, absent when its capture was missing.
    pub fn image_slot(&self, role: SlotRole) -> Option<&ImageSlot> {
        self.nodes.iter().find_map(|n| match n {
            PosterNode::Image(s) if s.role == role => Some(s),
            _ => None,
        })
    }

    /// Whether any text node contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.text.contains(needle))
    }
}

/// Rough advance width of `text` at `size_px`.
pub(crate) fn estimate_text_width(text: &str, size_px: f32) -> f64 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            ' ' => 0.3,
            '·' => 0.5,
            c if c.is_ascii() => 0.6,
            _ => 1.0,
        })
        .sum();
    f64::from(em * size_px)
}

fn white(alpha: u8) -> Rgba8 {
    Rgba8::WHITE.with_alpha(alpha)
}

fn light_bar(theme: &StyleTheme) -> Paint {
    Paint::Linear {
        angle_deg: 90.0,
        stops: vec![
            (0.0, theme.color.with_alpha(0)),
            (0.25, theme.color),
            (0.5, Rgba8::WHITE),
            (0.75, theme.color),
            (1.0, theme.color.with_alpha(0)),
        ],
    }
}

struct Builder {
    nodes: Vec<PosterNode>,
}

impl Builder {
    fn shape(&mut self, rect: Rect, geometry: Geometry, paint: Paint) {
        self.nodes.push(PosterNode::Shape(Shape {
            rect,
            geometry,
            paint,
        }));
    }

    fn pill(&mut self, rect: Rect, paint: Paint) {
        self.shape(rect, Geometry::RoundedRect(rect.height() / 2.0), paint);
    }

    fn pill_border(&mut self, rect: Rect, color: Rgba8) {
        self.shape(
            rect,
            Geometry::Ring {
                radius: rect.height() / 2.0,
                width: 1.0,
            },
            Paint::Solid(color),
        );
    }

    fn text(&mut self, text: impl Into<String>, rect: Rect, size_px: f32, color: Rgba8) {
        self.aligned_text(text, rect, size_px, color, TextAlign::Center);
    }

    fn aligned_text(
        &mut self,
        text: impl Into<String>,
        rect: Rect,
        size_px: f32,
        color: Rgba8,
        align: TextAlign,
    ) {
        self.nodes.push(PosterNode::Text(TextSlot {
            text: text.into(),
            rect,
            size_px,
            color,
            align,
        }));
    }

    fn icon(&mut self, icon: Icon, rect: Rect) {
        self.nodes.push(PosterNode::Icon(IconSlot { icon, rect }));
    }

    fn backdrop(&mut self, theme: &StyleTheme) {
        let (w, h) = (f64::from(POSTER_WIDTH), f64::from(POSTER_HEIGHT));
        self.shape(
            Rect::new(0.0, 0.0, w, h),
            Geometry::RoundedRect(CARD_RADIUS),
            Paint::Linear {
                angle_deg: 145.0,
                stops: vec![
                    (0.0, Rgba8::rgb(0x0f, 0x0c, 0x1f)),
                    (0.5, Rgba8::rgb(0x1a, 0x1a, 0x2e)),
                    (1.0, Rgba8::rgb(0x16, 0x21, 0x3e)),
                ],
            },
        );
        self.shape(
            Rect::new(w - 200.0, -100.0, w + 100.0, 200.0),
            Geometry::Ellipse,
            Paint::Radial {
                color: theme.tint(0x30),
                extent: 0.7,
            },
        );
        self.shape(
            Rect::new(-50.0, h - 200.0, 200.0, h + 50.0),
            Geometry::Ellipse,
            Paint::Radial {
                color: theme.tint(0x20),
                extent: 0.7,
            },
        );
        self.shape(Rect::new(0.0, 0.0, w, 5.0), Geometry::Rect, light_bar(theme));
    }

    fn title(&mut self, theme: &StyleTheme, cfg: &PosterConfig) {
        let title_w = estimate_text_width(&cfg.title, 48.0).max(48.0);
        let row_w = 40.0 + 10.0 + title_w + 10.0 + 40.0;
        let x0 = 400.0 - row_w / 2.0;
        self.icon(Icon::Sparkle, Rect::new(x0, 50.0, x0 + 40.0, 90.0));
        self.text(
            cfg.title.clone(),
            Rect::new(x0 + 50.0, 40.0, x0 + 50.0 + title_w, 100.0),
            48.0,
            Rgba8::WHITE,
        );
        let x1 = x0 + row_w - 40.0;
        self.icon(Icon::Sparkle, Rect::new(x1, 50.0, x1 + 40.0, 90.0));

        self.shape(
            Rect::new(250.0, 118.0, 550.0, 121.0),
            Geometry::Rect,
            light_bar(theme),
        );
        self.text(
            cfg.subtitle.clone(),
            Rect::new(40.0, 131.0, 760.0, 155.0),
            18.0,
            white(204),
        );
    }

    fn host(&mut self, theme: &StyleTheme, cfg: &PosterConfig, capture: Option<Arc<Raster>>) {
        self.shape(
            Rect::new(37.0, 137.0, 143.0, 243.0),
            Geometry::Ring {
                radius: 53.0,
                width: 3.0,
            },
            Paint::Solid(theme.color),
        );
        let avatar = Rect::new(40.0, 140.0, 140.0, 240.0);
        self.shape(
            avatar,
            Geometry::Ellipse,
            Paint::Solid(Rgba8::rgb(0x1a, 0x1a, 0x2e)),
        );
        match capture {
            Some(raster) => self.nodes.push(PosterNode::Image(ImageSlot {
                role: SlotRole::Host,
                rect: avatar,
                clip: SlotClip::Circle,
                raster,
            })),
            None => {
                self.shape(avatar, Geometry::Ellipse, Paint::Solid(theme.tint(0x40)));
                self.icon(Icon::Mic, Rect::new(70.0, 170.0, 110.0, 210.0));
            }
        }
        self.text(
            cfg.host_name.clone(),
            Rect::new(30.0, 252.0, 150.0, 274.0),
            16.0,
            Rgba8::WHITE,
        );
        self.text(
            cfg.host_title.clone(),
            Rect::new(30.0, 279.0, 150.0, 295.0),
            12.0,
            theme.color,
        );
    }

    fn model(&mut self, theme: &StyleTheme, content: &PosterContent<'_>) {
        self.shape(
            Rect::new(138.0, 196.0, 662.0, 720.0),
            Geometry::Ring {
                radius: 42.0,
                width: 2.0,
            },
            Paint::Solid(theme.tint(0x60)),
        );
        let slot = Rect::new(150.0, 208.0, 650.0, 708.0);
        match &content.model {
            Some(raster) => self.nodes.push(PosterNode::Image(ImageSlot {
                role: SlotRole::Model,
                rect: slot,
                clip: SlotClip::Rounded(SLOT_RADIUS),
                raster: Arc::clone(raster),
            })),
            None => {
                self.shape(
                    slot,
                    Geometry::RoundedRect(SLOT_RADIUS),
                    Paint::Linear {
                        angle_deg: 135.0,
                        stops: vec![(0.0, theme.tint(0x30)), (1.0, theme.tint(0x60))],
                    },
                );
                self.icon(theme.icon, Rect::new(360.0, 377.0, 440.0, 457.0));
                self.text(
                    theme.name.clone(),
                    Rect::new(150.0, 477.0, 650.0, 507.0),
                    24.0,
                    Rgba8::WHITE,
                );
                self.text(
                    format!("款式 {}", content.outfit),
                    Rect::new(150.0, 517.0, 650.0, 539.0),
                    18.0,
                    Rgba8::WHITE,
                );
            }
        }
        self.shape(
            Rect::new(146.0, 204.0, 654.0, 712.0),
            Geometry::Ring {
                radius: SLOT_RADIUS + 4.0,
                width: 4.0,
            },
            Paint::Solid(theme.color),
        );

        let badge = format!("{} · 款", content.outfit);
        let bw = estimate_text_width(&badge, 18.0) + 40.0;
        let badge_rect = Rect::new(630.0 - bw, 228.0, 630.0, 266.0);
        self.pill(badge_rect, Paint::Solid(theme.color));
        self.text(badge, badge_rect.inset(-8.0), 18.0, Rgba8::WHITE);

        let tag_w = 16.0 + 6.0 + estimate_text_width(&theme.name, 16.0) + 40.0;
        let tag = Rect::new(170.0, 652.0, 170.0 + tag_w, 688.0);
        self.pill(tag, Paint::Solid(Rgba8::BLACK.with_alpha(153)));
        self.pill_border(tag, theme.color);
        self.icon(theme.icon, Rect::new(190.0, 662.0, 206.0, 678.0));
        self.aligned_text(
            theme.name.clone(),
            Rect::new(212.0, 660.0, tag.x1 - 20.0, 682.0),
            16.0,
            Rgba8::WHITE,
            TextAlign::Start,
        );
    }

    fn card(&mut self, theme: &StyleTheme, description: &str) {
        let card = Rect::new(76.0, 762.0, 724.0, 1002.0);
        self.shape(card, Geometry::RoundedRect(30.0), Paint::Solid(white(26)));
        self.shape(
            card,
            Geometry::Ring {
                radius: 30.0,
                width: 1.0,
            },
            Paint::Solid(white(51)),
        );
        self.text(
            description,
            Rect::new(106.0, 802.0, 694.0, 910.0),
            20.0,
            Rgba8::WHITE,
        );

        let label = "场合推荐";
        let w1 = 14.0 + 6.0 + estimate_text_width(label, 14.0) + 50.0;
        let w2 = estimate_text_width(&theme.occasions, 14.0) + 50.0;
        let x0 = 400.0 - (w1 + 15.0 + w2) / 2.0;
        let (top, bottom) = (935.0, 972.0);

        let p1 = Rect::new(x0, top, x0 + w1, bottom);
        self.pill(p1, Paint::Solid(white(38)));
        self.pill_border(p1, white(51));
        self.icon(Icon::Sparkle, Rect::new(x0 + 25.0, 946.5, x0 + 39.0, 960.5));
        self.aligned_text(
            label,
            Rect::new(x0 + 45.0, 944.0, p1.x1 - 20.0, 964.0),
            14.0,
            Rgba8::WHITE,
            TextAlign::Start,
        );

        let p2 = Rect::new(p1.x1 + 15.0, top, p1.x1 + 15.0 + w2, bottom);
        self.pill(p2, Paint::Solid(theme.color));
        self.text(
            theme.occasions.clone(),
            Rect::new(p2.x0 + 20.0, 944.0, p2.x1 - 20.0, 964.0),
            14.0,
            Rgba8::WHITE,
        );
    }

    fn footer(&mut self, cfg: &PosterConfig, date_label: Option<&str>) {
        let color = white(77);
        let (top, bottom) = (1054.0, 1070.0);
        let mut right = 760.0;
        if let Some(date) = date_label {
            let w = estimate_text_width(date, 12.0);
            self.aligned_text(
                date,
                Rect::new(right - w - 12.0, top, right, bottom),
                12.0,
                color,
                TextAlign::End,
            );
            right -= w + 20.0;
        }
        let w = estimate_text_width(&cfg.footer, 12.0);
        self.icon(Icon::Sparkle, Rect::new(right - 12.0, top + 2.0, right, bottom - 2.0));
        let text_right = right - 16.0;
        self.aligned_text(
            cfg.footer.clone(),
            Rect::new(text_right - w - 12.0, top, text_right, bottom),
            12.0,
            color,
            TextAlign::End,
        );
        let left = text_right - w - 4.0;
        self.icon(Icon::Sparkle, Rect::new(left - 12.0, top + 2.0, left, bottom - 2.0));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/poster/document.rs"]
mod tests;
