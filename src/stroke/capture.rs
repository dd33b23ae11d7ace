//! Stroke capture - turns pointer events into image-space polylines

use super::Point;

/// Maps on-screen pointer positions onto source-image pixels.
///
/// The editor displays the image scaled into a rectangle; the ratio of
/// native resolution to displayed size converts between the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMapper {
    left: f32,
    top: f32,
    scale_x: f32,
    scale_y: f32,
}

impl ViewportMapper {
    /// Identity mapping: the image is displayed at its native size at the origin
    pub fn identity() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Build a mapper for an image of `image_width`x`image_height` pixels shown
    /// in a display rectangle.
    pub fn new(
        image_width: u32,
        image_height: u32,
        display_left: f32,
        display_top: f32,
        display_width: f32,
        display_height: f32,
    ) -> Self {
        Self {
            left: finite_or_zero(display_left),
            top: finite_or_zero(display_top),
            scale_x: Self::axis_scale(image_width, display_width),
            scale_y: Self::axis_scale(image_height, display_height),
        }
    }

    fn axis_scale(native: u32, displayed: f32) -> f32 {
        if !displayed.is_finite() || displayed < f32::EPSILON {
            return 1.0;
        }
        native.max(1) as f32 / displayed
    }

    /// Convert a client-space position into image pixel space.
    ///
    /// Positions outside the displayed rectangle are not clamped; a drag
    /// that leaves the image still contributes to the path.
    pub fn map(&self, client_x: f32, client_y: f32) -> Point {
        Point::new(
            (client_x - self.left) * self.scale_x,
            (client_y - self.top) * self.scale_y,
        )
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }
}

impl Default for ViewportMapper {
    fn default() -> Self {
        Self::identity()
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Pointer-driven capture of a single in-progress stroke
#[derive(Debug, Clone, Default)]
pub struct StrokeCapture {
    mapper: ViewportMapper,
    min_distance: f32,
    current: Option<Vec<Point>>,
}

impl StrokeCapture {
    pub fn new(mapper: ViewportMapper, min_distance: f32) -> Self {
        Self {
            mapper,
            min_distance: finite_or_zero(min_distance).max(0.0),
            current: None,
        }
    }

    pub fn set_mapper(&mut self, mapper: ViewportMapper) {
        self.mapper = mapper;
    }

    pub fn mapper(&self) -> &ViewportMapper {
        &self.mapper
    }

    /// Whether a drag is in progress
    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    /// Points of the in-progress stroke (empty when not drawing)
    pub fn current_points(&self) -> &[Point] {
        self.current.as_deref().unwrap_or(&[])
    }

    /// Start a new point sequence seeded with the down position.
    ///
    /// A second down while already drawing abandons the previous sequence.
    pub fn pointer_down(&mut self, client_x: f32, client_y: f32) {
        let point = self.mapper.map(client_x, client_y);
        if self.current.is_some() {
            tracing::debug!("Pointer down while drawing, restarting stroke");
        }
        self.current = Some(vec![point]);
    }

    /// Append a position to the active stroke.
    ///
    /// Returns `true` if the point was recorded. Moves before a down, and
    /// moves closer than the minimum distance to the last point, are ignored.
    pub fn pointer_move(&mut self, client_x: f32, client_y: f32) -> bool {
        let Some(points) = self.current.as_mut() else {
            return false;
        };

        let point = self.mapper.map(client_x, client_y);
        if let Some(last) = points.last() {
            if last.distance(&point) < self.min_distance {
                return false;
            }
        }

        points.push(point);
        true
    }

    /// Finish the active stroke and hand back its points.
    ///
    /// Returns `None` if no drag was active or no point was captured.
    pub fn pointer_up(&mut self) -> Option<Vec<Point>> {
        self.current.take().filter(|points| !points.is_empty())
    }

    /// Leaving the surface while drawing finishes the stroke like a release
    pub fn pointer_leave(&mut self) -> Option<Vec<Point>> {
        self.pointer_up()
    }

    /// Drop the in-progress stroke without producing anything
    pub fn reset(&mut self) {
        self.current = None;
    }
}
