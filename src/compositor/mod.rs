//! Mask compositor - layers each stroke's effect onto the result
//!
//! For every stroke, in order:
//! 1. render the stroke's effect over the *original* source image
//! 2. clip it to the stroke's brush footprint
//! 3. paint it onto the result, leaving everything outside the footprint
//!    as earlier strokes left it
//!
//! Because every stroke reads from the pristine source, overlapping strokes
//! never compound: the later stroke's effect fully replaces the earlier one
//! inside the overlap.
//!
//! Strokes are processed in order, in batches that need at most
//! [`RenderOptions::max_live_variants`] distinct renders; a batch's renders
//! are freed before the next batch starts.

use std::collections::HashMap;

use image::RgbaImage;
use rayon::prelude::*;

use crate::effects::{render_effect, RenderOptions};
use crate::error::Result;
use crate::stroke::{EffectKind, Stroke};
use crate::surface::{RasterSurface, Surface};

/// Identity of one rendered effect variant.
///
/// Strokes sharing kind, strength and (for motion blur) angle produce the
/// same full-image render, so it is computed once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VariantKey {
    kind: EffectKind,
    strength_bits: u32,
    angle_bits: u32,
}

impl VariantKey {
    fn of(stroke: &Stroke) -> Self {
        let angle = match stroke.effect_kind() {
            EffectKind::MotionBlur => stroke.angle(),
            EffectKind::Mosaic | EffectKind::Pixelate | EffectKind::GaussianBlur => 0.0,
        };
        Self {
            kind: stroke.effect_kind(),
            strength_bits: stroke.strength().to_bits(),
            angle_bits: angle.to_bits(),
        }
    }

    fn strength(&self) -> f32 {
        f32::from_bits(self.strength_bits)
    }

    fn angle(&self) -> f32 {
        f32::from_bits(self.angle_bits)
    }
}

/// Outcome of one composite pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeReport {
    /// Strokes painted onto the result
    pub applied: usize,
    /// Strokes skipped (empty footprint or paint failure)
    pub skipped: usize,
    /// Effect renders performed, summed over batches
    pub variants: usize,
}

/// Renders stroke lists onto source images
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    options: RenderOptions,
}

impl Compositor {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Composite `actions` over a copy of `source` and return the result
    pub fn render(&self, source: &RgbaImage, actions: &[Stroke]) -> Result<RgbaImage> {
        let mut surface = RasterSurface::new(source.width(), source.height());
        self.composite(&mut surface, source, actions)?;
        Ok(surface.into_image())
    }

    /// Composite `actions` onto `surface`, which is first reset to `source`.
    ///
    /// A stroke that fails to paint is logged and skipped; the remaining
    /// strokes still apply.
    pub fn composite<S: Surface>(
        &self,
        surface: &mut S,
        source: &RgbaImage,
        actions: &[Stroke],
    ) -> Result<CompositeReport> {
        surface.draw_image(source)?;

        let mut report = CompositeReport::default();
        let mut start = 0;
        while start < actions.len() {
            let (end, keys) = self.next_batch(actions, start);
            let variants = self.render_variants(source, keys);
            report.variants += variants.len();

            for (offset, action) in actions[start..end].iter().enumerate() {
                self.paint_action(surface, start + offset, action, &variants, &mut report);
            }
            // Variants of this batch are dropped before the next one renders
            start = end;
        }

        tracing::debug!(
            "Composited {} strokes ({} skipped, {} variants)",
            report.applied,
            report.skipped,
            report.variants
        );
        Ok(report)
    }

    /// Extend a batch from `start` while its strokes need no more than
    /// `live_variants` distinct renders. Returns the exclusive end index and
    /// the keys in first-use order.
    fn next_batch(&self, actions: &[Stroke], start: usize) -> (usize, Vec<VariantKey>) {
        let limit = self.options.live_variants();
        let mut keys: Vec<VariantKey> = Vec::new();
        let mut end = start;

        while end < actions.len() {
            let action = &actions[end];
            if !action.footprint().is_empty() {
                let key = VariantKey::of(action);
                if !keys.contains(&key) {
                    if keys.len() == limit {
                        break;
                    }
                    keys.push(key);
                }
            }
            end += 1;
        }
        (end, keys)
    }

    fn paint_action<S: Surface>(
        &self,
        surface: &mut S,
        index: usize,
        action: &Stroke,
        variants: &HashMap<VariantKey, RgbaImage>,
        report: &mut CompositeReport,
    ) {
        let footprint = action.footprint();
        if footprint.is_empty() {
            tracing::debug!("Skipping stroke {}: empty footprint", index);
            report.skipped += 1;
            return;
        }

        let Some(paint) = variants.get(&VariantKey::of(action)) else {
            tracing::warn!("Skipping stroke {}: no rendered variant", index);
            report.skipped += 1;
            return;
        };

        match surface.stroke_path(&footprint, paint) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                tracing::warn!(
                    "Skipping stroke {} ({}): {}",
                    index,
                    action.effect_kind().label(),
                    e
                );
                report.skipped += 1;
            }
        }
    }

    /// Render one batch of effect variants in parallel
    fn render_variants(
        &self,
        source: &RgbaImage,
        keys: Vec<VariantKey>,
    ) -> HashMap<VariantKey, RgbaImage> {
        keys.into_par_iter()
            .map(|key| {
                let rendered =
                    render_effect(key.kind, source, key.strength(), key.angle(), &self.options);
                (key, rendered)
            })
            .collect()
    }
}

/// Composite with default render options
pub fn composite(source: &RgbaImage, actions: &[Stroke]) -> Result<RgbaImage> {
    Compositor::default().render(source, actions)
}
