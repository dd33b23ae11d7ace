//! Effect renderers
//!
//! Each renderer transforms the *whole* source image and returns a buffer of
//! the same size. Clipping to a stroke happens later, in the compositor.

mod gaussian;
mod mosaic;
mod motion;
mod pixelate;

pub use gaussian::{gaussian_blur, gaussian_kernel};
pub use mosaic::mosaic;
pub use motion::motion_blur;
pub use pixelate::pixelate;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::stroke::{EffectKind, MIN_STRENGTH};

/// Fewest offset copies accumulated by the motion blur
pub const MIN_MOTION_COPIES: usize = 15;
/// Most offset copies accumulated by the motion blur
pub const MAX_MOTION_COPIES: usize = 20;

/// Renderer knobs that are not part of a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Number of offset copies averaged by the motion blur
    pub motion_blur_copies: usize,
    /// Fill behind the pixelate dots
    pub pixelate_background: [u8; 4],
    /// Full-image effect renders held in memory at once while compositing
    pub max_live_variants: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            motion_blur_copies: 16,
            pixelate_background: [248, 250, 252, 255],
            max_live_variants: 4,
        }
    }
}

impl RenderOptions {
    pub fn motion_copies(&self) -> usize {
        self.motion_blur_copies
            .clamp(MIN_MOTION_COPIES, MAX_MOTION_COPIES)
    }

    /// Variant batch size, at least one
    pub fn live_variants(&self) -> usize {
        self.max_live_variants.max(1)
    }

    pub fn background(&self) -> Rgba<u8> {
        Rgba(self.pixelate_background)
    }
}

/// Render `kind` over the entire source image
pub fn render_effect(
    kind: EffectKind,
    source: &RgbaImage,
    strength: f32,
    angle: f32,
    options: &RenderOptions,
) -> RgbaImage {
    tracing::debug!(
        "Rendering {} ({}x{}, strength {}, angle {})",
        kind.label(),
        source.width(),
        source.height(),
        strength,
        angle
    );

    match kind {
        EffectKind::Mosaic => mosaic(source, strength),
        EffectKind::Pixelate => pixelate(source, strength, options.background()),
        EffectKind::GaussianBlur => gaussian_blur(source, strength),
        EffectKind::MotionBlur => motion_blur(source, strength, angle, options.motion_copies()),
    }
}

/// Straight RGBA to premultiplied floats; blurs accumulate in this space so
/// the colour of transparent pixels never leaks into their neighbours
pub(crate) fn premultiply(pixel: [u8; 4]) -> [f32; 4] {
    let alpha = pixel[3] as f32;
    let scale = alpha / 255.0;
    [
        pixel[0] as f32 * scale,
        pixel[1] as f32 * scale,
        pixel[2] as f32 * scale,
        alpha,
    ]
}

/// Premultiplied floats back to straight RGBA; zero alpha comes out as
/// transparent black
pub(crate) fn unpremultiply(acc: [f32; 4]) -> [u8; 4] {
    let alpha = acc[3].round().clamp(0.0, 255.0);
    if alpha <= 0.0 || acc[3] <= 0.0 {
        return [0, 0, 0, 0];
    }
    let scale = 255.0 / acc[3];
    let channel = |c: f32| (c * scale).round().clamp(0.0, 255.0) as u8;
    [channel(acc[0]), channel(acc[1]), channel(acc[2]), alpha as u8]
}

/// Block side for mosaic/pixelate: `strength` rounded, never below 2
pub fn block_size(strength: f32) -> u32 {
    if !strength.is_finite() {
        return MIN_STRENGTH as u32;
    }
    strength.round().max(MIN_STRENGTH) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            Rgba([v, (x * 7) as u8, (y * 5) as u8, 255])
        })
    }

    #[test]
    fn test_block_size_floor() {
        assert_eq!(block_size(0.0), 2);
        assert_eq!(block_size(-4.0), 2);
        assert_eq!(block_size(f32::NAN), 2);
        assert_eq!(block_size(9.6), 10);
    }

    #[test]
    fn test_every_effect_keeps_dimensions() {
        let source = checker(23, 17);
        let options = RenderOptions::default();
        for kind in [
            EffectKind::Mosaic,
            EffectKind::Pixelate,
            EffectKind::GaussianBlur,
            EffectKind::MotionBlur,
        ] {
            let out = render_effect(kind, &source, 6.0, 30.0, &options);
            assert_eq!(out.dimensions(), source.dimensions(), "{}", kind.label());
        }
    }

    #[test]
    fn test_every_effect_handles_one_pixel() {
        let source = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let options = RenderOptions::default();
        for kind in [
            EffectKind::Mosaic,
            EffectKind::GaussianBlur,
            EffectKind::MotionBlur,
        ] {
            let out = render_effect(kind, &source, 50.0, 90.0, &options);
            assert_eq!(out.get_pixel(0, 0), &Rgba([10, 20, 30, 255]), "{}", kind.label());
        }
        let out = render_effect(EffectKind::Pixelate, &source, 50.0, 0.0, &options);
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn test_premultiply_round_trip() {
        assert_eq!(unpremultiply(premultiply([200, 100, 50, 255])), [200, 100, 50, 255]);
        assert_eq!(unpremultiply(premultiply([200, 100, 50, 128])), [200, 100, 50, 128]);
        // Colour under zero alpha is dropped
        assert_eq!(unpremultiply(premultiply([90, 80, 70, 0])), [0, 0, 0, 0]);
    }

    #[test]
    fn test_blurs_do_not_darken_transparent_edges() {
        // Opaque white on the left, fully transparent black on the right
        let source = RgbaImage::from_fn(40, 4, |x, _| {
            if x < 20 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        let blurred = gaussian_blur(&source, 4.0);
        let edge = blurred.get_pixel(22, 2).0;
        assert_eq!([edge[0], edge[1], edge[2]], [255, 255, 255]);
        assert!(edge[3] > 0 && edge[3] < 255);

        let smeared = motion_blur(&source, 20.0, 0.0, 16);
        let edge = smeared.get_pixel(25, 2).0;
        assert_eq!([edge[0], edge[1], edge[2]], [255, 255, 255]);
        assert!(edge[3] > 0 && edge[3] < 255);

        // Far from the edge nothing changes
        assert_eq!(blurred.get_pixel(2, 2).0, [255, 255, 255, 255]);
        assert_eq!(blurred.get_pixel(39, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_motion_copies_are_clamped() {
        let options = RenderOptions {
            motion_blur_copies: 3,
            ..Default::default()
        };
        assert_eq!(options.motion_copies(), MIN_MOTION_COPIES);

        let options = RenderOptions {
            motion_blur_copies: 100,
            ..Default::default()
        };
        assert_eq!(options.motion_copies(), MAX_MOTION_COPIES);
    }
}
