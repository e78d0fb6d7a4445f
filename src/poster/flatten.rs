//! Rasterizes a [`PosterDocument`] with the CPU vector renderer.
//!
//! Solid fills go straight to `vello_cpu` as paths. Gradients, outlines and clipped captures are
//! shaded per device pixel with signed-distance coverage and drawn as images at integer offsets,
//! the same way icons and captures are drawn. All coordinates are scaled by the supersample
//! factor before any pixel work, so edges stay crisp at every output size.

use std::sync::Arc;

use kurbo::Shape as _;

use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8};
use crate::foundation::error::{RoomError, RoomResult};
use crate::foundation::math::mul_div255_u8;
use crate::poster::document::{
    CARD_RADIUS, Geometry, IconSlot, ImageSlot, Paint, PosterDocument, PosterNode, Shape,
    SlotClip, TextAlign, TextSlot,
};
use crate::poster::icons::IconAtlas;
use crate::poster::text::{PosterTypeface, TextBrushRgba8};
use crate::render::raster::Raster;

/// Device size of `canvas` at `scale`.
pub(crate) fn output_size(canvas: Canvas, scale: f32) -> RoomResult<(u16, u16)> {
    let s = f64::from(scale);
    if !s.is_finite() || s <= 0.0 {
        return Err(RoomError::composition("poster scale must be finite and > 0"));
    }
    let w = (f64::from(canvas.width) * s).round();
    let h = (f64::from(canvas.height) * s).round();
    let max = f64::from(u16::MAX);
    if w < 1.0 || h < 1.0 || w > max || h > max {
        return Err(RoomError::composition(format!(
            "poster output size {w}x{h} is out of range"
        )));
    }
    Ok((w as u16, h as u16))
}

/// Paint every node of `doc` into a premultiplied raster.
///
/// Without a typeface the text nodes are skipped and the rest of the poster still renders.
#[tracing::instrument(skip_all, fields(scale = scale, nodes = doc.nodes().len()))]
pub(crate) fn flatten(
    doc: &PosterDocument,
    scale: f32,
    icons: &mut IconAtlas,
    mut typeface: Option<&mut PosterTypeface>,
) -> RoomResult<Raster> {
    let (w, h) = output_size(doc.canvas(), scale)?;
    let s = f64::from(scale);
    let device = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    let mut skipped_text = 0usize;

    for node in doc.nodes() {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        match node {
            PosterNode::Shape(shape) => draw_shape(&mut ctx, shape, s, device)?,
            PosterNode::Image(slot) => draw_image_slot(&mut ctx, slot, s, device)?,
            PosterNode::Icon(slot) => draw_icon(&mut ctx, icons, slot, s)?,
            PosterNode::Text(text) => match typeface.as_deref_mut() {
                Some(tf) => draw_text(&mut ctx, tf, text, s)?,
                None => skipped_text += 1,
            },
        }
    }
    if skipped_text > 0 {
        tracing::warn!(skipped_text, "no font available, poster text omitted");
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    let mut data = pixmap.data_as_u8_slice().to_vec();
    clip_card_corners(&mut data, device, CARD_RADIUS * s);
    Raster::from_premul(u32::from(w), u32::from(h), data)
}

fn scale_rect(r: Rect, s: f64) -> Rect {
    Rect::new(r.x0 * s, r.y0 * s, r.x1 * s, r.y1 * s)
}

fn draw_shape(
    ctx: &mut vello_cpu::RenderContext,
    shape: &Shape,
    s: f64,
    device: Rect,
) -> RoomResult<()> {
    let rect = scale_rect(shape.rect, s);
    match (&shape.paint, shape.geometry) {
        (Paint::Solid(c), Geometry::Rect | Geometry::RoundedRect(_) | Geometry::Ellipse) => {
            let path = match shape.geometry {
                Geometry::RoundedRect(r) => kurbo::RoundedRect::from_rect(rect, r * s).to_path(0.1),
                Geometry::Ellipse => kurbo::Ellipse::from_rect(rect).to_path(0.1),
                _ => rect.to_path(0.1),
            };
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(color_to_cpu(*c));
            ctx.fill_path(&bezpath_to_cpu(&path));
            Ok(())
        }
        (paint, geometry) => {
            let outline = Outline::new(geometry, rect, s);
            let fill = Fill::new(paint, rect);
            draw_generated(ctx, rect, device, |x, y| {
                let cov = outline.coverage(x, y);
                if cov <= 0.0 {
                    return [0; 4];
                }
                to_premul_u8(fill.sample(x, y), cov)
            })
        }
    }
}

fn draw_image_slot(
    ctx: &mut vello_cpu::RenderContext,
    slot: &ImageSlot,
    s: f64,
    device: Rect,
) -> RoomResult<()> {
    let rect = scale_rect(slot.rect, s);
    let outline = match slot.clip {
        SlotClip::Rounded(r) => Outline::Rounded {
            rect,
            radius: r * s,
        },
        SlotClip::Circle => {
            let side = rect.width().min(rect.height());
            Outline::Ellipse(Rect::from_center_size(rect.center(), (side, side)))
        }
    };

    let src = Arc::clone(&slot.raster);
    let (iw, ih) = (f64::from(src.width()), f64::from(src.height()));
    // Cover fit: fill the slot, crop the overflow evenly.
    let fit = (rect.width() / iw).max(rect.height() / ih);
    let ox = rect.x0 + (rect.width() - iw * fit) / 2.0;
    let oy = rect.y0 + (rect.height() - ih * fit) / 2.0;

    draw_generated(ctx, rect, device, |x, y| {
        let cov = outline.coverage(x, y);
        if cov <= 0.0 {
            return [0; 4];
        }
        to_premul_u8(sample_bilinear(&src, (x - ox) / fit, (y - oy) / fit), cov)
    })
}

fn draw_icon(
    ctx: &mut vello_cpu::RenderContext,
    icons: &mut IconAtlas,
    slot: &IconSlot,
    s: f64,
) -> RoomResult<()> {
    let rect = scale_rect(slot.rect, s);
    if !(rect.width() > 0.0 && rect.height() > 0.0) {
        return Ok(());
    }
    let w = rect.width().ceil() as u32;
    let h = rect.height().ceil() as u32;
    let sprite = icons.sprite(slot.icon, w, h)?;
    let paint = premul_image(&sprite.pixels, sprite.width, sprite.height)?;

    // The sprite covers whole pixels; shrink it back onto the fractional slot.
    let place = Affine::translate((rect.x0, rect.y0))
        * Affine::scale_non_uniform(rect.width() / f64::from(w), rect.height() / f64::from(h));
    ctx.set_transform(affine_to_cpu(place));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(w),
        f64::from(h),
    ));
    Ok(())
}

fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    typeface: &mut PosterTypeface,
    slot: &TextSlot,
    s: f64,
) -> RoomResult<()> {
    let rect = scale_rect(slot.rect, s);
    let layout = typeface.engine.layout_plain(
        &slot.text,
        slot.size_px * s as f32,
        TextBrushRgba8::from(slot.color),
        Some(rect.width() as f32),
    )?;
    let dy = (rect.height() - f64::from(layout.height())) / 2.0;

    for line in layout.lines() {
        let advance = f64::from(line.metrics().advance);
        let dx = match slot.align {
            TextAlign::Start => 0.0,
            TextAlign::Center => (rect.width() - advance) / 2.0,
            TextAlign::End => rect.width() - advance,
        };
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            rect.x0 + dx,
            rect.y0 + dy,
        )));

        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&typeface.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    Ok(())
}

/// Shade every device pixel of `bounds` (clipped to `device`) and draw the result as an image.
fn draw_generated(
    ctx: &mut vello_cpu::RenderContext,
    bounds: Rect,
    device: Rect,
    mut pixel: impl FnMut(f64, f64) -> [u8; 4],
) -> RoomResult<()> {
    let x0 = bounds.x0.floor().clamp(device.x0, device.x1) as u32;
    let y0 = bounds.y0.floor().clamp(device.y0, device.y1) as u32;
    let x1 = bounds.x1.ceil().clamp(device.x0, device.x1) as u32;
    let y1 = bounds.y1.ceil().clamp(device.y0, device.y1) as u32;
    if x1 <= x0 || y1 <= y0 {
        return Ok(());
    }

    let (w, h) = (x1 - x0, y1 - y0);
    let mut data = Vec::with_capacity(w as usize * h as usize * 4);
    for y in y0..y1 {
        for x in x0..x1 {
            data.extend_from_slice(&pixel(f64::from(x) + 0.5, f64::from(y) + 0.5));
        }
    }

    let paint = premul_image(&data, w, h)?;
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        f64::from(x0),
        f64::from(y0),
    )));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(w),
        f64::from(h),
    ));
    Ok(())
}

fn clip_card_corners(data: &mut [u8], device: Rect, radius: f64) {
    let outline = Outline::Rounded {
        rect: device,
        radius,
    };
    let w = device.width() as usize;
    let h = device.height() as usize;
    let r = radius.ceil() as usize;
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        let (x, y) = (i % w, i / w);
        if (x >= r && x + r < w) || (y >= r && y + r < h) {
            continue;
        }
        let cov = outline.coverage(x as f64 + 0.5, y as f64 + 0.5);
        let cov = (cov * 255.0).round() as u16;
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), cov);
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Outline {
    Rounded {
        rect: Rect,
        radius: f64,
    },
    Ellipse(Rect),
    Ring {
        outer: Rect,
        outer_radius: f64,
        inner: Rect,
        inner_radius: f64,
    },
}

impl Outline {
    fn new(geometry: Geometry, rect: Rect, s: f64) -> Self {
        match geometry {
            Geometry::Rect => Self::Rounded { rect, radius: 0.0 },
            Geometry::RoundedRect(r) => Self::Rounded {
                rect,
                radius: r * s,
            },
            Geometry::Ellipse => Self::Ellipse(rect),
            Geometry::Ring { radius, width } => {
                let width = width * s;
                Self::Ring {
                    outer: rect,
                    outer_radius: radius * s,
                    inner: rect.inset(-width),
                    inner_radius: (radius * s - width).max(0.0),
                }
            }
        }
    }

    /// Signed distance in device pixels, negative inside.
    fn distance(&self, x: f64, y: f64) -> f64 {
        match *self {
            Self::Rounded { rect, radius } => rounded_rect_distance(rect, radius, x, y),
            Self::Ellipse(rect) => ellipse_distance(rect, x, y),
            Self::Ring {
                outer,
                outer_radius,
                inner,
                inner_radius,
            } => rounded_rect_distance(outer, outer_radius, x, y)
                .max(-rounded_rect_distance(inner, inner_radius, x, y)),
        }
    }

    /// Pixel coverage in `0..=1`.
    fn coverage(&self, x: f64, y: f64) -> f64 {
        (0.5 - self.distance(x, y)).clamp(0.0, 1.0)
    }
}

fn rounded_rect_distance(rect: Rect, radius: f64, x: f64, y: f64) -> f64 {
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return f64::INFINITY;
    }
    let r = radius
        .min(rect.width() / 2.0)
        .min(rect.height() / 2.0)
        .max(0.0);
    let c = rect.center();
    let qx = (x - c.x).abs() - rect.width() / 2.0 + r;
    let qy = (y - c.y).abs() - rect.height() / 2.0 + r;
    qx.max(0.0).hypot(qy.max(0.0)) + qx.max(qy).min(0.0) - r
}

fn ellipse_distance(rect: Rect, x: f64, y: f64) -> f64 {
    let (a, b) = (rect.width() / 2.0, rect.height() / 2.0);
    if a <= 0.0 || b <= 0.0 {
        return f64::INFINITY;
    }
    let c = rect.center();
    let nx = (x - c.x) / a;
    let ny = (y - c.y) / b;
    (nx.hypot(ny) - 1.0) * a.min(b)
}

/// Color source in device space, premultiplied, channels in `0..=255`.
enum Fill<'a> {
    Solid([f32; 4]),
    Linear {
        center: Point,
        dir: (f64, f64),
        length: f64,
        stops: &'a [(f32, Rgba8)],
    },
    Radial {
        center: Point,
        radius: f64,
        color: [f32; 4],
    },
}

impl<'a> Fill<'a> {
    fn new(paint: &'a Paint, rect: Rect) -> Self {
        match paint {
            Paint::Solid(c) => Self::Solid(premul_f32(*c)),
            Paint::Linear { angle_deg, stops } => {
                // CSS angles: 0deg points up and turns clockwise; y grows downwards.
                let theta = f64::from(*angle_deg).to_radians();
                let (sin, cos) = theta.sin_cos();
                Self::Linear {
                    center: rect.center(),
                    dir: (sin, -cos),
                    length: ((rect.width() * sin).abs() + (rect.height() * cos).abs()).max(1e-9),
                    stops,
                }
            }
            Paint::Radial { color, extent } => Self::Radial {
                center: rect.center(),
                radius: (f64::from(*extent) * rect.width().hypot(rect.height()) / 2.0).max(1e-9),
                color: premul_f32(*color),
            },
        }
    }

    fn sample(&self, x: f64, y: f64) -> [f32; 4] {
        match self {
            Self::Solid(c) => *c,
            Self::Linear {
                center,
                dir,
                length,
                stops,
            } => {
                let t = ((x - center.x) * dir.0 + (y - center.y) * dir.1) / length + 0.5;
                sample_stops(stops, t as f32)
            }
            Self::Radial {
                center,
                radius,
                color,
            } => {
                let t = ((x - center.x).hypot(y - center.y) / radius).min(1.0) as f32;
                (*color).map(|c| c * (1.0 - t))
            }
        }
    }
}

fn premul_f32(c: Rgba8) -> [f32; 4] {
    let a = f32::from(c.a) / 255.0;
    [
        f32::from(c.r) * a,
        f32::from(c.g) * a,
        f32::from(c.b) * a,
        f32::from(c.a),
    ]
}

fn sample_stops(stops: &[(f32, Rgba8)], t: f32) -> [f32; 4] {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return [0.0; 4];
    };
    if t <= first.0 {
        return premul_f32(first.1);
    }
    for pair in stops.windows(2) {
        let ((t0, c0), (t1, c1)) = (pair[0], pair[1]);
        if t <= t1 {
            let k = ((t - t0) / (t1 - t0).max(1e-6)).clamp(0.0, 1.0);
            let (a, b) = (premul_f32(c0), premul_f32(c1));
            return std::array::from_fn(|i| a[i] + (b[i] - a[i]) * k);
        }
    }
    premul_f32(last.1)
}

fn to_premul_u8(c: [f32; 4], coverage: f64) -> [u8; 4] {
    let k = coverage as f32;
    c.map(|v| (v * k).round().clamp(0.0, 255.0) as u8)
}

/// Bilinear sample at source-pixel coordinates `(u, v)`, clamped to the edges.
fn sample_bilinear(src: &Raster, u: f64, v: f64) -> [f32; 4] {
    let (w, h) = (src.width() as i64, src.height() as i64);
    let fx = u - 0.5;
    let fy = v - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = (fx - x0) as f32;
    let ty = (fy - y0) as f32;

    let data = src.data();
    let at = |x: i64, y: i64| -> [f32; 4] {
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        let i = (y * w as usize + x) * 4;
        [
            f32::from(data[i]),
            f32::from(data[i + 1]),
            f32::from(data[i + 2]),
            f32::from(data[i + 3]),
        ]
    };

    let (x0, y0) = (x0 as i64, y0 as i64);
    let p00 = at(x0, y0);
    let p10 = at(x0 + 1, y0);
    let p01 = at(x0, y0 + 1);
    let p11 = at(x0 + 1, y0 + 1);
    std::array::from_fn(|i| {
        let top = p00[i] + (p10[i] - p00[i]) * tx;
        let bottom = p01[i] + (p11[i] - p01[i]) * tx;
        top + (bottom - top) * ty
    })
}

fn premul_image(rgba8_premul: &[u8], width: u32, height: u32) -> RoomResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| RoomError::composition("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| RoomError::composition("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(RoomError::composition("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/poster/flatten.rs"]
mod tests;
