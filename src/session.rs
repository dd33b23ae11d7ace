//! Editing session - one image opened for redaction
//!
//! A session owns the untouched source image, the committed strokes, the
//! stroke being drawn and the current tool. It ends with either
//! [`EditingSession::confirm`] (renders the result) or
//! [`EditingSession::cancel`] (no output); both consume it.

use std::sync::Arc;

use image::{GrayImage, Rgba, RgbaImage};

use crate::codec::{self, OutputFormat};
use crate::compositor::Compositor;
use crate::config::{Limits, RedactConfig};
use crate::error::{RedactError, Result};
use crate::history::ActionHistory;
use crate::stroke::{BrushFootprint, Point, Stroke, StrokeCapture, ToolSettings, ViewportMapper};

/// Decode image bytes off the async executor.
///
/// Completes before any session (and so any renderer) sees the pixels.
/// Images beyond `limits` are refused from their header.
pub async fn decode_image(bytes: Vec<u8>, limits: Limits) -> Result<RgbaImage> {
    tokio::task::spawn_blocking(move || codec::decode_bytes_with_limits(&bytes, &limits))
        .await
        .map_err(|e| RedactError::Decode(format!("Decode task failed: {}", e)))?
}

/// Result handed back on confirm
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub image: RgbaImage,
    pub format: OutputFormat,
}

impl RenderedImage {
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(&self.image, self.format)
    }

    pub fn to_data_url(&self) -> Result<String> {
        codec::to_data_url(&self.image, self.format)
    }
}

/// Detached state for drawing the mask preview
#[derive(Debug, Clone)]
pub struct MaskPreview {
    source: Arc<RgbaImage>,
    strokes: Vec<Stroke>,
    in_progress: Vec<Point>,
    in_progress_width: f32,
    opacity: f32,
}

impl MaskPreview {
    /// Coverage of every stroke in the snapshot, 255 where covered
    pub fn mask(&self) -> GrayImage {
        let (width, height) = self.source.dimensions();
        let mut mask = GrayImage::new(width, height);

        let in_progress = BrushFootprint::new(&self.in_progress, self.in_progress_width);
        let footprints = self
            .strokes
            .iter()
            .map(Stroke::footprint)
            .chain(std::iter::once(in_progress));

        for footprint in footprints {
            if let Some(raster) = footprint.rasterize(width, height) {
                raster.paint_into(&mut mask);
            }
        }
        mask
    }

    /// Source darkened by the preview opacity under the mask
    pub fn render(&self) -> RgbaImage {
        let mask = self.mask();
        let keep = 1.0 - self.opacity;
        let mut out = RgbaImage::clone(&self.source);

        for (pixel, coverage) in out.pixels_mut().zip(mask.pixels()) {
            if coverage.0[0] == 0 {
                continue;
            }
            let [r, g, b, a] = pixel.0;
            let shade = |c: u8| (c as f32 * keep).round() as u8;
            *pixel = Rgba([shade(r), shade(g), shade(b), a]);
        }
        out
    }
}

/// One image open in the redaction editor
#[derive(Debug)]
pub struct EditingSession {
    source: Arc<RgbaImage>,
    history: ActionHistory,
    capture: StrokeCapture,
    tool: ToolSettings,
    config: RedactConfig,
}

impl EditingSession {
    /// Start a session on an already decoded image
    pub fn new(source: RgbaImage, config: RedactConfig) -> Result<Self> {
        config
            .limits
            .check_dimensions(source.width(), source.height())?;

        tracing::info!(
            "Opening redaction session: {}x{}",
            source.width(),
            source.height()
        );

        Ok(Self {
            capture: StrokeCapture::new(ViewportMapper::identity(), config.min_point_distance),
            tool: config.tool.normalized(),
            history: ActionHistory::new(),
            source: Arc::new(source),
            config,
        })
    }

    /// Decode `bytes` and start a session on the result.
    ///
    /// A decode failure is returned as-is and no session is created.
    pub async fn open(bytes: Vec<u8>, config: RedactConfig) -> Result<Self> {
        let source = decode_image(bytes, config.limits).await?;
        Self::new(source, config)
    }

    /// Open from a `data:` URL
    pub async fn open_data_url(url: &str, config: RedactConfig) -> Result<Self> {
        let bytes = codec::parse_data_url(url)?;
        Self::open(bytes, config).await
    }

    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    pub fn actions(&self) -> &[Stroke] {
        self.history.actions()
    }

    pub fn tool(&self) -> ToolSettings {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolSettings) {
        self.tool = tool.normalized();
        tracing::debug!("Tool set to {:?}", self.tool);
    }

    pub fn is_drawing(&self) -> bool {
        self.capture.is_drawing()
    }

    /// Tell the session where the image is displayed on screen
    pub fn set_display_rect(&mut self, left: f32, top: f32, width: f32, height: f32) {
        let (image_width, image_height) = self.source.dimensions();
        self.capture.set_mapper(ViewportMapper::new(
            image_width,
            image_height,
            left,
            top,
            width,
            height,
        ));
    }

    pub fn pointer_down(&mut self, client_x: f32, client_y: f32) {
        self.capture.pointer_down(client_x, client_y);
    }

    pub fn pointer_move(&mut self, client_x: f32, client_y: f32) -> bool {
        self.capture.pointer_move(client_x, client_y)
    }

    /// Finish the active stroke and commit it with the current tool.
    ///
    /// Returns `true` if a stroke was added to the history.
    pub fn pointer_up(&mut self) -> bool {
        let points = self.capture.pointer_up();
        self.commit(points)
    }

    pub fn pointer_leave(&mut self) -> bool {
        let points = self.capture.pointer_leave();
        self.commit(points)
    }

    fn commit(&mut self, points: Option<Vec<Point>>) -> bool {
        let Some(points) = points else {
            return false;
        };

        if self.history.len() >= self.config.limits.max_actions {
            tracing::warn!(
                "Stroke dropped: session already holds {} strokes",
                self.history.len()
            );
            return false;
        }

        match Stroke::new(points, self.tool) {
            Some(stroke) => {
                tracing::debug!(
                    "Committed {} stroke with {} points",
                    stroke.effect_kind().label(),
                    stroke.points().len()
                );
                self.history.append(stroke);
                true
            }
            None => {
                tracing::debug!("Dropped degenerate stroke");
                false
            }
        }
    }

    /// Remove the newest stroke; never fails
    pub fn undo(&mut self) -> bool {
        self.history.undo_last().is_some()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.capture.reset();
    }

    /// Capture what the mask preview needs.
    ///
    /// Cheap: the source is shared, only stroke points are copied. The
    /// returned snapshot renders without borrowing the session.
    pub fn preview_snapshot(&self) -> MaskPreview {
        MaskPreview {
            source: Arc::clone(&self.source),
            strokes: self.history.actions().to_vec(),
            in_progress: self.capture.current_points().to_vec(),
            in_progress_width: self.tool.brush_width,
            opacity: self.config.preview_opacity,
        }
    }

    /// Coverage of every committed stroke plus the one being drawn
    pub fn preview_mask(&self) -> GrayImage {
        self.preview_snapshot().mask()
    }

    /// Source image darkened under the preview mask
    pub fn preview(&self) -> RgbaImage {
        self.preview_snapshot().render()
    }

    /// Composite the committed strokes without ending the session
    pub fn render(&self) -> Result<RgbaImage> {
        Compositor::new(self.config.render).render(&self.source, self.history.actions())
    }

    /// Render the final image and end the session
    pub fn confirm(self) -> Result<RenderedImage> {
        let image = self.render()?;
        tracing::info!(
            "Session confirmed with {} strokes",
            self.history.len()
        );
        Ok(RenderedImage {
            image,
            format: self.config.output,
        })
    }

    /// End the session without output
    pub fn cancel(self) {
        tracing::info!(
            "Session cancelled, discarding {} strokes",
            self.history.len()
        );
    }
}
