//! Gaussian blur - separable convolution with edge clamping
//!
//! Both passes run on premultiplied alpha.

use image::RgbaImage;
use rayon::prelude::*;

use super::{premultiply, unpremultiply};

/// Normalized 1D Gaussian weights for `sigma`, covering ±3 sigma.
///
/// `max_radius` bounds the kernel; taps past the image edge would only
/// repeat the clamped edge pixel.
pub fn gaussian_kernel(sigma: f32, max_radius: usize) -> Vec<f32> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return vec![1.0];
    }

    let radius = ((3.0 * sigma).ceil() as usize).min(max_radius);
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=radius * 2)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / denom).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Blur the whole image with a Gaussian of standard deviation `strength`
pub fn gaussian_blur(source: &RgbaImage, strength: f32) -> RgbaImage {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return source.clone();
    }

    let max_radius = width.max(height) as usize;
    let kernel = gaussian_kernel(strength, max_radius);
    if kernel.len() == 1 {
        return source.clone();
    }
    let radius = (kernel.len() / 2) as isize;

    let w = width as usize;
    let h = height as usize;
    let src = source.as_raw();

    let premultiplied: Vec<f32> = src
        .par_chunks(4)
        .flat_map_iter(|px| premultiply([px[0], px[1], px[2], px[3]]))
        .collect();

    // Horizontal pass stays in premultiplied f32 to avoid double rounding
    let mut horizontal = vec![0f32; w * h * 4];
    horizontal
        .par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &premultiplied[y * w * 4..(y + 1) * w * 4];
            for x in 0..w {
                let mut acc = [0f32; 4];
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - radius).clamp(0, w as isize - 1) as usize;
                    let px = &row_in[sx * 4..sx * 4 + 4];
                    for c in 0..4 {
                        acc[c] += px[c] * weight;
                    }
                }
                row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
            }
        });

    let mut out = vec![0u8; w * h * 4];
    out.par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..w {
                let mut acc = [0f32; 4];
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = (y as isize + k as isize - radius).clamp(0, h as isize - 1) as usize;
                    let i = (sy * w + x) * 4;
                    for c in 0..4 {
                        acc[c] += horizontal[i + c] * weight;
                    }
                }
                row_out[x * 4..x * 4 + 4].copy_from_slice(&unpremultiply(acc));
            }
        });

    RgbaImage::from_raw(width, height, out).unwrap_or_else(|| source.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2.0, 100);
        assert_eq!(kernel.len(), 13);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[12]).abs() < 1e-7);
        assert!(kernel[6] > kernel[5]);
    }

    #[test]
    fn test_kernel_radius_is_bounded() {
        assert_eq!(gaussian_kernel(50.0, 4).len(), 9);
        assert_eq!(gaussian_kernel(0.0, 4), vec![1.0]);
        assert_eq!(gaussian_kernel(f32::NAN, 4), vec![1.0]);
    }

    #[test]
    fn test_uniform_image_is_unchanged() {
        let source = RgbaImage::from_pixel(16, 16, Rgba([120, 60, 30, 255]));
        assert_eq!(gaussian_blur(&source, 5.0), source);
    }

    #[test]
    fn test_blur_spreads_a_bright_pixel() {
        let mut source = RgbaImage::from_pixel(21, 21, Rgba([0, 0, 0, 255]));
        source.put_pixel(10, 10, Rgba([255, 255, 255, 255]));

        let out = gaussian_blur(&source, 2.0);
        let centre = out.get_pixel(10, 10).0[0];
        let neighbour = out.get_pixel(11, 10).0[0];
        let far = out.get_pixel(0, 0).0[0];

        assert!(centre < 255);
        assert!(neighbour > 0);
        assert!(centre >= neighbour);
        assert_eq!(far, 0);
        assert_eq!(out.get_pixel(10, 10).0[3], 255);
    }
}
