//! Mosaic - nearest-neighbour block downsample and upsample

use image::RgbaImage;
use rayon::prelude::*;

use super::block_size;

/// Fill every `block x block` cell with the colour of its top-left pixel.
///
/// No averaging: blocks keep crisp edges and exact source colours.
pub fn mosaic(source: &RgbaImage, strength: f32) -> RgbaImage {
    let (width, height) = source.dimensions();
    let block = block_size(strength);
    if width == 0 || height == 0 {
        return source.clone();
    }

    let stride = width as usize * 4;
    let src = source.as_raw();
    let mut out = vec![0u8; src.len()];

    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let sample_y = (y as u32 / block) * block;
            let row_in = &src[sample_y as usize * stride..(sample_y as usize + 1) * stride];
            for x in 0..width as usize {
                let sample_x = (x as u32 / block * block) as usize;
                let sample = &row_in[sample_x * 4..sample_x * 4 + 4];
                row_out[x * 4..x * 4 + 4].copy_from_slice(sample);
            }
        });

    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| source.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 3) as u8, (y * 3) as u8, ((x ^ y) * 5) as u8, 255])
        })
    }

    #[test]
    fn test_blocks_are_uniform() {
        let source = gradient(40, 40);
        let out = mosaic(&source, 8.0);

        for by in (0..40).step_by(8) {
            for bx in (0..40).step_by(8) {
                let expected = source.get_pixel(bx, by);
                for y in by..by + 8 {
                    for x in bx..bx + 8 {
                        assert_eq!(out.get_pixel(x, y), expected, "pixel ({x}, {y})");
                    }
                }
            }
        }
    }

    #[test]
    fn test_partial_edge_blocks() {
        let source = gradient(13, 7);
        let out = mosaic(&source, 5.0);

        assert_eq!(out.get_pixel(12, 6), source.get_pixel(10, 5));
        assert_eq!(out.get_pixel(4, 4), source.get_pixel(0, 0));
    }

    #[test]
    fn test_strength_below_floor_still_blocks() {
        let source = gradient(4, 4);
        let out = mosaic(&source, 0.0);
        assert_eq!(out.get_pixel(1, 1), source.get_pixel(0, 0));
        assert_eq!(out.get_pixel(2, 3), source.get_pixel(2, 2));
    }
}
