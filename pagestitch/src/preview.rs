//! Page previews.
//!
//! Every page of a newly loaded source gets one small raster preview. The
//! pipeline renders pages strictly one after another and drops each bitmap
//! as soon as it has been encoded, so peak memory stays at one page per
//! document no matter how many pages the document has.
//!
//! Rendering itself sits behind the [`PageRenderer`] trait. The built-in
//! [`FrameRenderer`] produces a deterministic page frame sized from the page
//! geometry; hosts with a full rasterizer plug in their own implementation.

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageBuffer, Rgb, Rgba};
use lopdf::Document;
use lopdf::content::Content;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, StitchError};
use crate::source::SourceDocument;
use crate::utils::{self, PageGeometry};

/// RGBA bitmap produced by a renderer.
pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Error type returned by renderers.
pub type RenderFailure = Box<dyn std::error::Error + Send + Sync>;

/// Default down-scale factor applied to native page size.
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.4;

/// Default lossy quality (0.7 on a 0..1 scale).
pub const DEFAULT_PREVIEW_QUALITY: u8 = 70;

/// Largest bitmap edge, in pixels, a renderer may produce.
pub const MAX_PREVIEW_EDGE: u32 = 4096;

/// Encoded image format for previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    /// Lossy JPEG (default).
    #[default]
    Jpeg,
    /// Lossless PNG; quality is ignored.
    Png,
}

impl PreviewFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for PreviewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("jpeg"),
            Self::Png => f.write_str("png"),
        }
    }
}

impl FromStr for PreviewFormat {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid preview format: {s}. Must be one of: jpeg, png"
            ))),
        }
    }
}

/// Tunable preview parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Scale relative to the page's native size in points.
    pub scale: f32,
    /// Encoder quality, 1..=100.
    pub quality: u8,
    /// Encoded image format.
    pub format: PreviewFormat,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_PREVIEW_SCALE,
            quality: DEFAULT_PREVIEW_QUALITY,
            format: PreviewFormat::Jpeg,
        }
    }
}

impl PreviewSettings {
    /// Check that scale and quality are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 4.0 {
            return Err(StitchError::invalid_config(format!(
                "Preview scale must be in (0, 4], got {}",
                self.scale
            )));
        }

        if !(1..=100).contains(&self.quality) {
            return Err(StitchError::invalid_config(format!(
                "Preview quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        Ok(())
    }
}

/// An encoded preview of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
    format: PreviewFormat,
}

impl Preview {
    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded format.
    pub fn format(&self) -> PreviewFormat {
        self.format
    }
}

/// Rasterizes a single page.
pub trait PageRenderer: Send + Sync {
    /// Render page `page_index` (0-based) of `document` at `scale`.
    fn render_page(
        &self,
        document: &Document,
        page_index: usize,
        scale: f32,
    ) -> std::result::Result<RgbaImage, RenderFailure>;
}

/// Deterministic renderer that draws the page frame.
///
/// The bitmap has the page's effective MediaBox size (after `/Rotate`) times
/// the scale, a white fill and a grey border. The page content stream must
/// decode, so corrupt pages are reported as render failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameRenderer;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME: Rgba<u8> = Rgba([200, 200, 200, 255]);

impl PageRenderer for FrameRenderer {
    fn render_page(
        &self,
        document: &Document,
        page_index: usize,
        scale: f32,
    ) -> std::result::Result<RgbaImage, RenderFailure> {
        let page_id = utils::page_id_at(document, page_index)
            .ok_or_else(|| format!("page {} does not exist", page_index + 1))?;

        let content = document.get_page_content(page_id)?;
        Content::decode(&content)?;

        let geometry = PageGeometry::of(document, page_id);
        let (width_pt, height_pt) = geometry.display_size();

        let scale = clamped_scale(width_pt, height_pt, scale);
        let width = (width_pt * scale).round();
        let height = (height_pt * scale).round();
        if width < 1.0 || height < 1.0 {
            return Err(format!("page renders to an empty {width}x{height} bitmap").into());
        }

        let width = (width as u32).min(MAX_PREVIEW_EDGE);
        let height = (height as u32).min(MAX_PREVIEW_EDGE);
        let mut image = RgbaImage::from_pixel(width, height, PAPER);

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, FRAME);
                image.put_pixel(x, height - 1, FRAME);
            }
            for y in 0..height {
                image.put_pixel(0, y, FRAME);
                image.put_pixel(width - 1, y, FRAME);
            }
        }

        Ok(image)
    }
}

/// Lower `scale` so the longest edge of the bitmap fits [`MAX_PREVIEW_EDGE`].
fn clamped_scale(width_pt: f32, height_pt: f32, scale: f32) -> f32 {
    let longest = width_pt.max(height_pt);
    if longest * scale > MAX_PREVIEW_EDGE as f32 {
        MAX_PREVIEW_EDGE as f32 / longest
    } else {
        scale
    }
}

/// Encode a bitmap.
///
/// # Errors
///
/// Returns [`StitchError::Encode`] if the encoder rejects the bitmap.
pub fn encode(bitmap: &RgbaImage, format: PreviewFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    match format {
        PreviewFormat::Jpeg => {
            let rgb: ImageBuffer<Rgb<u8>, Vec<u8>> = bitmap.convert();
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .encode_image(&rgb)?;
        }
        PreviewFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(
                bitmap.as_raw(),
                bitmap.width(),
                bitmap.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }

    Ok(buffer)
}

/// Renders one preview per page of a source document.
#[derive(Clone)]
pub struct PreviewPipeline {
    renderer: Arc<dyn PageRenderer>,
    settings: PreviewSettings,
}

impl fmt::Debug for PreviewPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewPipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PreviewPipeline {
    /// Create a pipeline with the built-in frame renderer.
    pub fn new(settings: PreviewSettings) -> Self {
        Self::with_renderer(Arc::new(FrameRenderer), settings)
    }

    /// Create a pipeline around a custom renderer.
    pub fn with_renderer(renderer: Arc<dyn PageRenderer>, settings: PreviewSettings) -> Self {
        Self { renderer, settings }
    }

    /// Settings in use.
    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    /// Render previews for every page of `source`, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::Render`] for the first page that fails to
    /// render or encode. No previews are returned in that case.
    pub fn render_previews(&self, source: &SourceDocument) -> Result<Vec<Preview>> {
        let mut previews = Vec::with_capacity(source.page_count());

        for page_index in 0..source.page_count() {
            previews.push(self.render_one(source, page_index)?);
        }

        tracing::debug!(
            source = %source.id(),
            pages = previews.len(),
            "rendered previews"
        );

        Ok(previews)
    }

    fn render_one(&self, source: &SourceDocument, page_index: usize) -> Result<Preview> {
        let bitmap = self
            .renderer
            .render_page(source.document(), page_index, self.settings.scale)
            .map_err(|e| StitchError::render(source.name(), page_index, e.to_string()))?;

        let (width, height) = bitmap.dimensions();
        let bytes = encode(&bitmap, self.settings.format, self.settings.quality)
            .map_err(|e| StitchError::render(source.name(), page_index, e.to_string()))?;
        drop(bitmap);

        Ok(Preview {
            bytes: bytes.into(),
            width,
            height,
            format: self.settings.format,
        })
    }
}

impl Default for PreviewPipeline {
    fn default() -> Self {
        Self::new(PreviewSettings::default())
    }
}
