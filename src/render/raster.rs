use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{RoomError, RoomResult};
use crate::foundation::math::Fnv1a64;

/// A tightly packed, row-major, premultiplied RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("checksum", &format_args!("{:016x}", self.checksum()))
            .finish()
    }
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> RoomResult<Self> {
        Self::filled(width, height, Rgba8Premul::transparent())
    }

    /// Raster cleared to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> RoomResult<Self> {
        let canvas = Canvas::new(width, height)?;
        let px = color.to_array();
        let mut data = Vec::with_capacity(canvas.byte_len());
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap premultiplied bytes.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> RoomResult<Self> {
        let canvas = Canvas::new(width, height)?;
        if data.len() != canvas.byte_len() {
            return Err(RoomError::validation(format!(
                "raster byte len mismatch: {} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size as a canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }

    /// Stable FNV-1a digest of the size and pixels.
    pub fn checksum(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_bytes(&self.data);
        h.finish()
    }

    /// Straight-alpha copy for encoding.
    pub fn to_rgba_image(&self) -> RoomResult<image::RgbaImage> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| RoomError::validation("raster buffer does not match its size"))
    }

    /// PNG bytes of this raster.
    pub fn encode_png(&self) -> RoomResult<Vec<u8>> {
        let img = self.to_rgba_image()?;
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(buf)
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
