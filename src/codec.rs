//! Image decode/encode and data URL helpers

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::error::{RedactError, Result};

/// Prefix given to exported redacted images
pub const OUTPUT_PREFIX: &str = "protected_";

/// Encoding used for the confirmed result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless, keeps alpha
    #[default]
    Png,
    /// Lossy; alpha is flattened onto white
    Jpeg { quality: u8 },
    /// Lossless WebP
    WebP,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::WebP => "webp",
        }
    }
}

/// Decode any supported container into RGBA8 under the default [`Limits`]
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    decode_bytes_with_limits(bytes, &Limits::default())
}

/// Decode into RGBA8, refusing oversized images before any pixel buffer is
/// allocated.
///
/// The header is read first and checked against `limits`; the decoder then
/// runs with matching `image` limits so a lying header cannot allocate more.
pub fn decode_bytes_with_limits(bytes: &[u8], limits: &Limits) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(RedactError::Decode("empty input".into()));
    }

    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(decode_error)?;
    limits.check_dimensions(width, height)?;

    let mut decoder_limits = image::Limits::default();
    decoder_limits.max_image_width = Some(limits.max_dimension);
    decoder_limits.max_image_height = Some(limits.max_dimension);
    // Room for the widest pixel format plus the RGBA8 conversion
    decoder_limits.max_alloc = Some(limits.max_pixels.saturating_mul(MAX_BYTES_PER_PIXEL));

    let mut reader = reader(bytes)?;
    reader.limits(decoder_limits);
    let image = reader.decode().map_err(decode_error)?;
    Ok(image.to_rgba8())
}

/// RGBA 32-bit float
const MAX_BYTES_PER_PIXEL: u64 = 16;

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RedactError::Decode(e.to_string()))
}

fn decode_error(e: ImageError) -> RedactError {
    match e {
        ImageError::Limits(limit) => RedactError::LimitExceeded(limit.to_string()),
        other => RedactError::Decode(other.to_string()),
    }
}

/// Extract the payload of a `data:<mime>;base64,<payload>` URL
pub fn parse_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RedactError::InvalidInput("Not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RedactError::InvalidInput("Data URL has no payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(RedactError::InvalidInput(
            "Only base64 data URLs are supported".into(),
        ));
    }
    Ok(BASE64.decode(payload.trim())?)
}

/// Decode an image from a base64 data URL
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    decode_bytes(&parse_data_url(url)?)
}

/// Encode an RGBA image in the requested format
pub fn encode(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => image.write_to(&mut buf, ImageFormat::Png)?,
        OutputFormat::WebP => image.write_to(&mut buf, ImageFormat::WebP)?,
        OutputFormat::Jpeg { quality } => {
            let flattened = flatten_onto(image, Rgba([255, 255, 255, 255]));
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(flattened).write_with_encoder(encoder)?;
        }
    }
    Ok(buf.into_inner())
}

/// Encode an RGBA image as a base64 data URL
pub fn to_data_url(image: &RgbaImage, format: OutputFormat) -> Result<String> {
    let bytes = encode(image, format)?;
    Ok(format!(
        "data:{};base64,{}",
        format.mime_type(),
        BASE64.encode(bytes)
    ))
}

/// Composite straight-alpha RGBA over an opaque background
fn flatten_onto(image: &RgbaImage, background: Rgba<u8>) -> image::RgbImage {
    image::RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let mix = |fg: u8, bg: u8| (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        image::Rgb([
            mix(r, background.0[0]),
            mix(g, background.0[1]),
            mix(b, background.0[2]),
        ])
    })
}

/// Download name for a redacted file: `protected_<stem>.<ext>`
pub fn output_file_name(original: &str, format: OutputFormat) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{}{}.{}", OUTPUT_PREFIX, stem, format.extension())
}
