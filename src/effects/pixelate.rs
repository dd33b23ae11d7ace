//! Pixelate - one round dot per block on a light background

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use super::block_size;

/// Dot radius as a fraction of the block side
const DOT_RADIUS_RATIO: f32 = 0.45;

/// Render each block as a filled circle coloured from the block's centre
/// pixel, over `background`.
pub fn pixelate(source: &RgbaImage, strength: f32, background: Rgba<u8>) -> RgbaImage {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return source.clone();
    }

    let block = block_size(strength);
    let half = block as f32 * 0.5;
    let radius = block as f32 * DOT_RADIUS_RATIO;
    let radius_sq = radius * radius;

    let stride = width as usize * 4;
    let mut out = vec![0u8; stride * height as usize];

    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let y = y as u32;
            let block_y = y / block * block;
            let centre_y = block_y as f32 + half;
            let sample_y = (block_y + block / 2).min(height - 1);
            let dy = y as f32 + 0.5 - centre_y;

            for x in 0..width {
                let block_x = x / block * block;
                let centre_x = block_x as f32 + half;
                let dx = x as f32 + 0.5 - centre_x;

                let pixel = if dx * dx + dy * dy <= radius_sq {
                    let sample_x = (block_x + block / 2).min(width - 1);
                    *source.get_pixel(sample_x, sample_y)
                } else {
                    background
                };

                let i = x as usize * 4;
                row_out[i..i + 4].copy_from_slice(&pixel.0);
            }
        });

    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| source.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::mosaic;

    const BG: Rgba<u8> = Rgba([248, 250, 252, 255]);

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 6) as u8, (y * 6) as u8, 40, 255])
        })
    }

    #[test]
    fn test_dot_centre_and_corner() {
        let source = gradient(20, 20);
        let out = pixelate(&source, 10.0, BG);

        // Centre of the first block takes the centre sample
        assert_eq!(out.get_pixel(5, 5), source.get_pixel(5, 5));
        assert_eq!(out.get_pixel(4, 6), source.get_pixel(5, 5));
        // Corners fall outside the dot
        assert_eq!(out.get_pixel(0, 0), &BG);
        assert_eq!(out.get_pixel(9, 9), &BG);
        assert_eq!(out.get_pixel(10, 0), &BG);
    }

    #[test]
    fn test_differs_from_mosaic() {
        let source = gradient(30, 30);
        let dots = pixelate(&source, 10.0, BG);
        let blocks = mosaic(&source, 10.0);
        assert_eq!(dots.dimensions(), blocks.dimensions());
        assert_ne!(dots, blocks);
    }

    #[test]
    fn test_edge_block_samples_inside_image() {
        let source = gradient(12, 12);
        let out = pixelate(&source, 10.0, BG);
        // Block at (10, 10) is clipped to 2x2; its dot centre (15, 15) is off image
        assert_eq!(out.dimensions(), (12, 12));
        assert_eq!(out.get_pixel(11, 11), &BG);
    }
}
