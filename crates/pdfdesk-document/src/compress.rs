// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compression.
//
// Pages are copied unmodified into a fresh document. Depending on the
// compression profile, embedded raster images are then re-encoded as JPEG at
// the profile's quality, and finally every uncompressed stream is Flate
// compressed. A re-encoded image replaces the original only when it is
// smaller. Images that serve as another image's soft mask or stencil mask
// keep their samples as they are.

use std::collections::BTreeSet;
use std::path::Path;

use ::image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfdesk_core::error::PdfdeskError;
use pdfdesk_core::{CompressionLevel, CompressionProfile};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::pdf::reader::{PdfReader, save_to_vec};

/// Summary of one compression run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionReport {
    /// Pages in the output (always equal to the input).
    pub pages: usize,
    /// Images replaced by a smaller JPEG.
    pub images_reencoded: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

/// Rewrites PDFs according to a [`CompressionProfile`].
pub struct PdfCompressor {
    profile: CompressionProfile,
}

impl PdfCompressor {
    pub fn new(level: CompressionLevel) -> Self {
        Self::with_profile(level.profile())
    }

    pub fn with_profile(profile: CompressionProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> CompressionProfile {
        self.profile
    }

    /// Compress the PDF at `input` and write the result to `output`.
    #[instrument(skip_all, fields(input = %input.as_ref().display(), quality = self.profile.image_quality))]
    pub fn compress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<CompressionReport, PdfdeskError> {
        let input_bytes = std::fs::metadata(input.as_ref())?.len();
        let reader = PdfReader::open(input)?;
        let (bytes, mut report) = self.compress_reader(reader)?;
        std::fs::write(output.as_ref(), &bytes)?;
        report.input_bytes = input_bytes;
        info!(
            pages = report.pages,
            images_reencoded = report.images_reencoded,
            input_bytes = report.input_bytes,
            output_bytes = report.output_bytes,
            "PDF compressed"
        );
        Ok(report)
    }

    /// Compress an in-memory PDF.
    pub fn compress_bytes(&self, data: &[u8]) -> Result<(Vec<u8>, CompressionReport), PdfdeskError> {
        let reader = PdfReader::from_bytes(data)?;
        let (bytes, mut report) = self.compress_reader(reader)?;
        report.input_bytes = data.len() as u64;
        Ok((bytes, report))
    }

    fn compress_reader(&self, reader: PdfReader) -> Result<(Vec<u8>, CompressionReport), PdfdeskError> {
        let mut document = reader.copy_pages()?;
        let mut report = CompressionReport {
            pages: document.get_pages().len(),
            ..CompressionReport::default()
        };

        if self.profile.reencode_images {
            report.images_reencoded = reencode_images(&mut document, self.profile.image_quality);
        }

        document.prune_objects();
        document.compress();

        let bytes = save_to_vec(&mut document)?;
        report.output_bytes = bytes.len() as u64;
        Ok((bytes, report))
    }
}

/// Re-encode every eligible image XObject in `document`. Returns how many
/// were replaced.
fn reencode_images(document: &mut Document, quality: u8) -> usize {
    let masks = mask_targets(document);
    let mut replaced = 0;
    for (object_id, object) in document.objects.iter_mut() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if !is_image(stream) || masks.contains(object_id) {
            continue;
        }
        match reencode_image(stream, quality) {
            Ok(true) => replaced += 1,
            Ok(false) => {}
            Err(err) => debug!(?object_id, %err, "Image left as-is"),
        }
    }
    replaced
}

/// Objects referenced from an image's `/SMask` or `/Mask` entry.
fn mask_targets(document: &Document) -> BTreeSet<ObjectId> {
    let mut targets = BTreeSet::new();
    for object in document.objects.values() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if !is_image(stream) {
            continue;
        }
        for key in [b"SMask".as_slice(), b"Mask".as_slice()] {
            if let Ok(id) = stream.dict.get(key).and_then(Object::as_reference) {
                targets.insert(id);
            }
        }
    }
    targets
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

/// Replace the image's data with a JPEG at `quality` if that is smaller.
///
/// Supported sources are JPEG (`/DCTDecode`) images in a DeviceRGB,
/// DeviceGray or DeviceCMYK colour space, and 8-bit DeviceRGB or DeviceGray
/// images stored raw or with plain `/FlateDecode`. Anything else (masks,
/// ICC-based or indexed colour, predictors, JBIG2, JPX) is left untouched.
fn reencode_image(stream: &mut Stream, quality: u8) -> Result<bool, PdfdeskError> {
    let dict = &stream.dict;
    if dict.has(b"DecodeParms") || dict.has(b"Decode") {
        return Ok(false);
    }
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Ok(false);
    }

    let decoded = match single_filter(stream)?.as_deref() {
        Some("DCTDecode") => {
            if !has_device_colour_space(dict) {
                return Ok(false);
            }
            ImageProcessor::from_jpeg_bytes(&stream.content)?
        }
        Some("FlateDecode") => {
            let raw = stream
                .decompressed_content()
                .map_err(|err| PdfdeskError::PdfError(err.to_string()))?;
            decode_raw_samples(stream, raw)?
        }
        None => decode_raw_samples(stream, stream.content.clone())?,
        Some(_) => return Ok(false),
    };

    let jpeg = decoded.to_jpeg_bytes(quality)?;
    if jpeg.len() >= stream.content.len() {
        return Ok(false);
    }

    let color_space: &[u8] = if decoded.is_grayscale() {
        b"DeviceGray"
    } else {
        b"DeviceRGB"
    };
    stream.dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    stream.dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    stream.dict.set("BitsPerComponent", Object::Integer(8));
    stream.set_content(jpeg);
    stream.allows_compression = false;
    Ok(true)
}

/// True when `/ColorSpace` names one of the device colour spaces a JPEG
/// decode maps back onto.
fn has_device_colour_space(dict: &Dictionary) -> bool {
    matches!(
        dict.get(b"ColorSpace").and_then(Object::as_name),
        Ok(b"DeviceRGB" | b"DeviceGray" | b"DeviceCMYK")
    )
}

/// The stream's filter when it has at most one. Filter chains are reported as
/// an unsupported marker.
fn single_filter(stream: &Stream) -> Result<Option<String>, PdfdeskError> {
    let name = match stream.dict.get(b"Filter") {
        Err(_) => return Ok(None),
        Ok(Object::Name(name)) => name.as_slice(),
        Ok(Object::Array(filters)) if filters.len() == 1 => filters[0]
            .as_name()
            .map_err(|err| PdfdeskError::PdfError(err.to_string()))?,
        Ok(_) => return Ok(Some("<chain>".to_string())),
    };
    Ok(Some(String::from_utf8_lossy(name).into_owned()))
}

/// Interpret raw 8-bit samples using the stream's width, height, and colour
/// space.
fn decode_raw_samples(stream: &Stream, samples: Vec<u8>) -> Result<ImageProcessor, PdfdeskError> {
    let dict = &stream.dict;
    let dimension = |key: &[u8]| -> Result<u32, PdfdeskError> {
        dict.get(key)
            .and_then(Object::as_i64)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                PdfdeskError::PdfError(format!(
                    "image without usable /{}",
                    String::from_utf8_lossy(key)
                ))
            })
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;

    let bits = dict.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8);
    if bits != 8 {
        return Err(PdfdeskError::PdfError(format!("{bits}-bit images are not re-encoded")));
    }

    let color_space = dict
        .get(b"ColorSpace")
        .and_then(Object::as_name)
        .map(|name| name.to_vec())
        .unwrap_or_default();

    let image = match color_space.as_slice() {
        b"DeviceRGB" => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        b"DeviceGray" => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        other => {
            return Err(PdfdeskError::PdfError(format!(
                "colour space {} is not re-encoded",
                String::from_utf8_lossy(other)
            )));
        }
    };

    image.map(ImageProcessor::from_dynamic).ok_or_else(|| {
        PdfdeskError::PdfError("image data shorter than its dimensions".to_string())
    })
}
