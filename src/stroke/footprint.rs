//! Brush footprint rasterization
//!
//! A footprint is the polyline of a stroke thickened to the brush width with
//! round caps and joins. Coverage is binary: a pixel is inside when its
//! centre lies within half the brush width of any segment.

use image::{GrayImage, Luma};

use super::Point;

/// Clip shape of one stroke
#[derive(Debug, Clone, Copy)]
pub struct BrushFootprint<'a> {
    points: &'a [Point],
    radius: f32,
}

impl<'a> BrushFootprint<'a> {
    pub fn new(points: &'a [Point], brush_width: f32) -> Self {
        let radius = if brush_width.is_finite() {
            brush_width.max(0.0) * 0.5
        } else {
            0.0
        };
        Self { points, radius }
    }

    /// Half the brush width
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// A footprint without points or width covers nothing
    pub fn is_empty(&self) -> bool {
        self.radius <= 0.0 || !self.points.iter().any(Point::is_finite)
    }

    /// Whether the given image-space position is covered
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let p = Point::new(x, y);
        let r2 = self.radius * self.radius;
        self.segments()
            .any(|(a, b)| distance_sq_to_segment(&p, &a, &b) <= r2)
    }

    /// Consecutive point pairs; a lone point becomes a zero-length segment
    fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let finite: Vec<Point> = self.points.iter().copied().filter(Point::is_finite).collect();
        let pairs: Vec<(Point, Point)> = if finite.len() == 1 {
            vec![(finite[0], finite[0])]
        } else {
            finite.windows(2).map(|w| (w[0], w[1])).collect()
        };
        pairs.into_iter()
    }

    /// Rasterize the footprint against a `width`x`height` pixel grid.
    ///
    /// Returns `None` when nothing inside the grid is covered.
    pub fn rasterize(&self, width: u32, height: u32) -> Option<FootprintMask> {
        if self.is_empty() || width == 0 || height == 0 {
            return None;
        }

        let r = self.radius;
        let r2 = r * r;
        let segments: Vec<(Point, Point)> = self.segments().collect();

        let (min_x, min_y, max_x, max_y) = segments.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(x0, y0, x1, y1), (a, b)| {
                (
                    x0.min(a.x).min(b.x),
                    y0.min(a.y).min(b.y),
                    x1.max(a.x).max(b.x),
                    y1.max(a.y).max(b.y),
                )
            },
        );
        let (bx0, by0, bx1, by1) =
            pixel_range(min_x - r, min_y - r, max_x + r, max_y + r, width, height)?;
        let box_width = (bx1 - bx0 + 1) as usize;
        let box_height = (by1 - by0 + 1) as usize;
        let mut coverage = vec![false; box_width * box_height];

        let mut left = u32::MAX;
        let mut top = u32::MAX;
        let mut right = 0u32;
        let mut bottom = 0u32;

        for (a, b) in &segments {
            let Some((x0, y0, x1, y1)) = pixel_range(
                a.x.min(b.x) - r,
                a.y.min(b.y) - r,
                a.x.max(b.x) + r,
                a.y.max(b.y) + r,
                width,
                height,
            ) else {
                continue;
            };

            for py in y0..=y1 {
                let row = (py - by0) as usize * box_width;
                for px in x0..=x1 {
                    let idx = row + (px - bx0) as usize;
                    if coverage[idx] {
                        continue;
                    }
                    let centre = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                    if distance_sq_to_segment(&centre, a, b) <= r2 {
                        coverage[idx] = true;
                        left = left.min(px);
                        top = top.min(py);
                        right = right.max(px);
                        bottom = bottom.max(py);
                    }
                }
            }
        }

        if left > right || top > bottom {
            return None;
        }

        let mut spans: Vec<(u32, u32, u32)> = Vec::new();
        for py in top..=bottom {
            let row = (py - by0) as usize * box_width;
            let mut run_start: Option<u32> = None;
            for px in left..=right {
                let covered = coverage[row + (px - bx0) as usize];
                match (covered, run_start) {
                    (true, None) => run_start = Some(px),
                    (false, Some(start)) => {
                        spans.push((py, start, px));
                        run_start = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = run_start {
                spans.push((py, start, right + 1));
            }
        }

        Some(FootprintMask {
            left,
            top,
            right: right + 1,
            bottom: bottom + 1,
            spans,
        })
    }
}

/// Clamp a float rectangle to the pixel indices whose centres may fall in it
fn pixel_range(
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
    width: u32,
    height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let x0 = (min_x - 0.5).ceil().max(0.0);
    let y0 = (min_y - 0.5).ceil().max(0.0);
    let x1 = (max_x - 0.5).floor().min(width as f32 - 1.0);
    let y1 = (max_y - 0.5).floor().min(height as f32 - 1.0);

    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

fn distance_sq_to_segment(p: &Point, a: &Point, b: &Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;

    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    };

    let dx = p.x - (a.x + abx * t);
    let dy = p.y - (a.y + aby * t);
    dx * dx + dy * dy
}

/// Rasterized footprint as horizontal pixel runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootprintMask {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    /// (row, start, end) with `end` exclusive
    spans: Vec<(u32, u32, u32)>,
}

impl FootprintMask {
    /// Bounding box as (left, top, right, bottom), right/bottom exclusive
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }

    /// Covered runs as (row, start, end) with `end` exclusive
    pub fn spans(&self) -> &[(u32, u32, u32)] {
        &self.spans
    }

    pub fn pixel_count(&self) -> u64 {
        self.spans
            .iter()
            .map(|&(_, start, end)| u64::from(end - start))
            .sum()
    }

    /// Set every covered pixel of `target` to full coverage
    pub fn paint_into(&self, target: &mut GrayImage) {
        let (width, height) = target.dimensions();
        for &(y, start, end) in &self.spans {
            if y >= height {
                continue;
            }
            for x in start..end.min(width) {
                target.put_pixel(x, y, Luma([255]));
            }
        }
    }
}
