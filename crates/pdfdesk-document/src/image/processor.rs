// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode uploads, normalise colour mode to RGB, and
// re-encode as JPEG. Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use pdfdesk_core::error::PdfdeskError;
use tracing::{debug, info, instrument};

/// A single decoded raster image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// can be chained:
///
/// ```ignore
/// let rgb = ImageProcessor::open("scan.png")?.into_rgb();
/// let jpeg = rgb.to_jpeg_bytes(80)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path. The format is sniffed from the content,
    /// not the extension, so staged files with arbitrary names still decode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfdeskError> {
        let path_ref = path.as_ref();
        let img = image::ImageReader::open(path_ref)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|err| {
                PdfdeskError::ImageError(format!(
                    "cannot identify image file {}: {}",
                    display_name(path_ref),
                    err
                ))
            })?
            .decode()
            .map_err(|err| {
                PdfdeskError::ImageError(format!(
                    "cannot identify image file {}: {}",
                    display_name(path_ref),
                    err
                ))
            })?;
        info!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfdeskError> {
        let img = image::load_from_memory(data).map_err(|err| {
            PdfdeskError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Decode JPEG bytes, as found in a PDF `/DCTDecode` stream.
    pub fn from_jpeg_bytes(data: &[u8]) -> Result<Self, PdfdeskError> {
        let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg).map_err(|err| {
            PdfdeskError::ImageError(format!("failed to decode JPEG: {}", err))
        })?;
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True when the image is already 8-bit three-channel RGB.
    pub fn is_rgb(&self) -> bool {
        self.image.color() == ColorType::Rgb8
    }

    /// True for single-channel images without alpha.
    pub fn is_grayscale(&self) -> bool {
        matches!(self.image.color(), ColorType::L8 | ColorType::L16)
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Normalise to three-channel 8-bit RGB. Alpha is dropped, palette and
    /// grayscale images are expanded. Already-RGB images pass through.
    pub fn into_rgb(self) -> Self {
        if self.is_rgb() {
            return self;
        }
        debug!(from = ?self.image.color(), "Converting image to RGB");
        Self {
            image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    ///
    /// Grayscale images are written as single-channel JPEG, everything else
    /// as RGB.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, PdfdeskError> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let result = if self.is_grayscale() {
            self.image.to_luma8().write_with_encoder(encoder)
        } else {
            self.image.to_rgb8().write_with_encoder(encoder)
        };
        result.map_err(|err| PdfdeskError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PdfdeskError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PdfdeskError::ImageError(format!("image encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Final path component, for messages that reach the client.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
