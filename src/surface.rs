//! Drawing surface abstraction
//!
//! The compositor only talks to a [`Surface`], so the order/clip/overwrite
//! rules can be tested without a real rasterization backend.

use image::{Rgba, RgbaImage};

use crate::error::{RedactError, Result};
use crate::stroke::BrushFootprint;

/// An addressable RGBA pixel surface
pub trait Surface {
    /// Surface size in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Replace the whole surface with `image` (same dimensions required)
    fn draw_image(&mut self, image: &RgbaImage) -> Result<()>;

    fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>>;

    fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>);

    /// Stroke `footprint` using `paint` as the pattern: every covered pixel
    /// takes the value of the same pixel in `paint`, everything else is
    /// left alone.
    fn stroke_path(&mut self, footprint: &BrushFootprint<'_>, paint: &RgbaImage) -> Result<()> {
        let (width, height) = self.dimensions();
        ensure_same_size(paint, width, height)?;

        let Some(mask) = footprint.rasterize(width, height) else {
            return Ok(());
        };
        for &(y, start, end) in mask.spans() {
            for x in start..end {
                self.set_pixel(x, y, *paint.get_pixel(x, y));
            }
        }
        Ok(())
    }
}

pub(crate) fn ensure_same_size(image: &RgbaImage, width: u32, height: u32) -> Result<()> {
    if image.dimensions() != (width, height) {
        return Err(RedactError::Render(format!(
            "Paint is {}x{}, surface is {}x{}",
            image.width(),
            image.height(),
            width,
            height
        )));
    }
    Ok(())
}

/// In-memory surface backed by an [`RgbaImage`]
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Create a surface holding a copy of `image`
    pub fn from_image(image: &RgbaImage) -> Self {
        Self {
            pixels: image.clone(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

impl Surface for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn draw_image(&mut self, image: &RgbaImage) -> Result<()> {
        ensure_same_size(image, self.pixels.width(), self.pixels.height())?;
        self.pixels.copy_from_slice(image.as_raw());
        Ok(())
    }

    fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        if x < self.pixels.width() && y < self.pixels.height() {
            self.pixels.put_pixel(x, y, pixel);
        }
    }

    /// Copies whole runs instead of going pixel by pixel
    fn stroke_path(&mut self, footprint: &BrushFootprint<'_>, paint: &RgbaImage) -> Result<()> {
        let (width, height) = self.pixels.dimensions();
        ensure_same_size(paint, width, height)?;

        let Some(mask) = footprint.rasterize(width, height) else {
            return Ok(());
        };

        let stride = width as usize * 4;
        let src = paint.as_raw();
        let dst: &mut [u8] = &mut self.pixels;
        for &(y, start, end) in mask.spans() {
            let from = y as usize * stride + start as usize * 4;
            let to = y as usize * stride + end as usize * 4;
            dst[from..to].copy_from_slice(&src[from..to]);
        }
        Ok(())
    }
}
