//! Motion blur - average of offset copies along one direction

use image::RgbaImage;
use rayon::prelude::*;

use super::{premultiply, unpremultiply};

/// Smear the image along `angle` (degrees) by averaging `copies` samples
/// spread evenly over `strength` pixels, centred on each pixel.
///
/// Samples are averaged with premultiplied alpha. With zero strength every
/// copy lands on the pixel itself and the source comes back unchanged,
/// apart from colour stored under zero alpha.
pub fn motion_blur(source: &RgbaImage, strength: f32, angle: f32, copies: usize) -> RgbaImage {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return source.clone();
    }

    let distance = if strength.is_finite() { strength.max(0.0) } else { 0.0 };
    let radians = if angle.is_finite() { angle.to_radians() } else { 0.0 };
    let (dir_y, dir_x) = radians.sin_cos();
    let copies = copies.max(2);

    let offsets: Vec<(f32, f32)> = (0..copies)
        .map(|i| {
            let t = (i as f32 / (copies - 1) as f32 - 0.5) * distance;
            (dir_x * t, dir_y * t)
        })
        .collect();
    let weight = 1.0 / copies as f32;

    let stride = width as usize * 4;
    let mut out = vec![0u8; stride * height as usize];

    out.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..width as usize {
                let mut acc = [0f32; 4];
                for &(ox, oy) in &offsets {
                    let sample = sample_bilinear(source, x as f32 + ox, y as f32 + oy);
                    for c in 0..4 {
                        acc[c] += sample[c];
                    }
                }
                for value in &mut acc {
                    *value *= weight;
                }
                row_out[x * 4..x * 4 + 4].copy_from_slice(&unpremultiply(acc));
            }
        });

    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| source.clone())
}

/// Bilinear sample at pixel coordinates, clamped to the image edge.
///
/// Returns premultiplied RGBA.
fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> [f32; 4] {
    let max_x = (image.width() - 1) as f32;
    let max_y = (image.height() - 1) as f32;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);

    let p00 = premultiply(image.get_pixel(x0, y0).0);
    let p10 = premultiply(image.get_pixel(x1, y0).0);
    let p01 = premultiply(image.get_pixel(x0, y1).0);
    let p11 = premultiply(image.get_pixel(x1, y1).0);

    let mut out = [0f32; 4];
    for c in 0..4 {
        let top = p00[c] * (1.0 - fx) + p10[c] * fx;
        let bottom = p01[c] * (1.0 - fx) + p11[c] * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn stripes(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            let v = if x % 8 < 4 { 255 } else { 0 };
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let source = stripes(24, 12);
        assert_eq!(motion_blur(&source, 0.0, 45.0, 16), source);
    }

    #[test]
    fn test_horizontal_smear_flattens_vertical_stripes() {
        let source = stripes(64, 8);
        let out = motion_blur(&source, 16.0, 0.0, 16);

        let before = source.get_pixel(32, 4).0[0] as i32 - source.get_pixel(36, 4).0[0] as i32;
        let after = out.get_pixel(32, 4).0[0] as i32 - out.get_pixel(36, 4).0[0] as i32;
        assert!(after.abs() < before.abs());
    }

    #[test]
    fn test_smear_follows_angle() {
        // Vertical smear leaves vertical stripes alone
        let source = stripes(32, 32);
        let out = motion_blur(&source, 10.0, 90.0, 16);
        assert_eq!(out.get_pixel(1, 16), source.get_pixel(1, 16));
        assert_eq!(out.get_pixel(5, 16), source.get_pixel(5, 16));
    }

    #[test]
    fn test_bilinear_clamps_outside() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        assert_eq!(sample_bilinear(&image, -5.0, 9.0), [10.0, 20.0, 30.0, 255.0]);
    }
}
