//! Stroke model - committed redaction strokes and the tool that draws them

mod capture;
mod footprint;

pub use capture::{StrokeCapture, ViewportMapper};
pub use footprint::BrushFootprint;

use serde::{Deserialize, Serialize};

/// Smallest brush width the tool panel offers (pixels)
pub const MIN_BRUSH_WIDTH: f32 = 5.0;
/// Largest brush width the tool panel offers (pixels)
pub const MAX_BRUSH_WIDTH: f32 = 250.0;
/// Strength floor; anything lower degenerates into a no-op effect
pub const MIN_STRENGTH: f32 = 2.0;
/// Strength ceiling
pub const MAX_STRENGTH: f32 = 100.0;

/// A point in source-image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Effect applied under a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    /// Flat square blocks sampled from each block's top-left pixel
    #[default]
    Mosaic,
    /// Round dots on a light background, one per block
    Pixelate,
    /// Gaussian blur with sigma = strength
    GaussianBlur,
    /// Directional smear along the stroke angle
    MotionBlur,
}

impl EffectKind {
    pub fn label(&self) -> &'static str {
        match self {
            EffectKind::Mosaic => "mosaic",
            EffectKind::Pixelate => "pixelate",
            EffectKind::GaussianBlur => "gaussian-blur",
            EffectKind::MotionBlur => "motion-blur",
        }
    }
}

/// Tool configuration applied to new strokes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    pub effect_kind: EffectKind,
    /// Stroke width in image pixels
    pub brush_width: f32,
    /// Block size, blur radius or smear distance depending on the effect
    pub strength: f32,
    /// Smear direction in degrees (motion blur only)
    pub angle: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            effect_kind: EffectKind::Mosaic,
            brush_width: 30.0,
            strength: 15.0,
            angle: 0.0,
        }
    }
}

impl ToolSettings {
    /// Clamp every field into the range the tool panel allows.
    ///
    /// Non-finite values fall back to the defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| {
            if value.is_finite() {
                value
            } else {
                fallback
            }
        };

        Self {
            effect_kind: self.effect_kind,
            brush_width: finite_or(self.brush_width, defaults.brush_width)
                .clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH),
            strength: finite_or(self.strength, defaults.strength)
                .clamp(MIN_STRENGTH, MAX_STRENGTH),
            angle: finite_or(self.angle, defaults.angle).rem_euclid(360.0),
        }
    }
}

/// A committed redaction stroke.
///
/// Points are fixed once the stroke exists; later strokes are composited
/// after earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StrokeRecord")]
pub struct Stroke {
    points: Vec<Point>,
    brush_width: f32,
    effect_kind: EffectKind,
    strength: f32,
    angle: f32,
}

/// Wire form of a [`Stroke`]; deserialized strokes are rebuilt through
/// [`Stroke::new`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrokeRecord {
    points: Vec<Point>,
    brush_width: f32,
    effect_kind: EffectKind,
    strength: f32,
    angle: f32,
}

impl TryFrom<StrokeRecord> for Stroke {
    type Error = String;

    fn try_from(record: StrokeRecord) -> Result<Self, Self::Error> {
        let tool = ToolSettings {
            effect_kind: record.effect_kind,
            brush_width: record.brush_width,
            strength: record.strength,
            angle: record.angle,
        };
        Stroke::new(record.points, tool).ok_or_else(|| "stroke has no finite points".to_string())
    }
}

impl Stroke {
    /// Package captured points with the tool settings in effect.
    ///
    /// Non-finite points are dropped. Returns `None` when nothing usable
    /// is left.
    pub fn new(points: Vec<Point>, tool: ToolSettings) -> Option<Self> {
        let points: Vec<Point> = points.into_iter().filter(Point::is_finite).collect();
        if points.is_empty() {
            return None;
        }

        let tool = tool.normalized();
        Some(Self {
            points,
            brush_width: tool.brush_width,
            effect_kind: tool.effect_kind,
            strength: tool.strength,
            angle: tool.angle,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    pub fn effect_kind(&self) -> EffectKind {
        self.effect_kind
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Smear direction in degrees; only meaningful for motion blur
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// The brush footprint used to clip this stroke's effect
    pub fn footprint(&self) -> BrushFootprint<'_> {
        BrushFootprint::new(&self.points, self.brush_width)
    }
}
