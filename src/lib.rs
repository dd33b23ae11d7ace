//! Redactor - privacy redaction brush engine
//!
//! Freehand strokes capture regions of an image; on confirm each stroke's
//! effect (mosaic, pixelate, gaussian blur, motion blur) is rendered over the
//! original image and composited inside the stroke's footprint.

pub mod codec;
pub mod commands;
pub mod compositor;
pub mod config;
pub mod effects;
pub mod error;
pub mod history;
pub mod session;
pub mod stroke;
pub mod surface;

pub use compositor::{composite, CompositeReport, Compositor};
pub use config::{Limits, RedactConfig};
pub use error::RedactError;
pub use history::ActionHistory;
pub use session::{decode_image, EditingSession, MaskPreview, RenderedImage};
pub use stroke::{EffectKind, Point, Stroke, ToolSettings};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging. Safe to call more than once.
pub fn init_logging() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redactor_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Redactor logging initialized");
    }
}
