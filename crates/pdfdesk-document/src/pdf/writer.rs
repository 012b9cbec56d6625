// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: compose new PDF documents from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use pdfdesk_core::error::PdfdeskError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;

/// Output resolution for image pages.
pub const DEFAULT_DPI: f32 = 100.0;

/// Title recorded in the PDF metadata.
const DOCUMENT_TITLE: &str = "Pdfdesk Images";

/// Millimetres per inch.
const MM_PER_INCH: f32 = 25.4;

/// Creates new PDF documents from raster images.
///
/// Each image becomes one page sized to the image at the writer's resolution,
/// so a 1000x500 pixel image at 100 DPI yields a 10x5 inch page.
pub struct PdfWriter {
    /// Pixels per inch used to size pages.
    dpi: f32,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl PdfWriter {
    /// Create a new writer at the given resolution.
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Page size in millimetres for an image of the given pixel dimensions.
    pub fn page_size_for(&self, width_px: u32, height_px: u32) -> (Mm, Mm) {
        (
            Mm(width_px as f32 / self.dpi * MM_PER_INCH),
            Mm(height_px as f32 / self.dpi * MM_PER_INCH),
        )
    }

    // -- Images to PDF --------------------------------------------------------

    /// Compose a multi-page PDF, one page per image, in the given order.
    ///
    /// The first image is the base page; the rest are appended after it. Every
    /// image is normalised to RGB before embedding.
    #[instrument(skip_all, fields(images = images.len(), dpi = self.dpi))]
    pub fn create_from_images(&self, images: Vec<ImageProcessor>) -> Result<Vec<u8>, PdfdeskError> {
        if images.is_empty() {
            return Err(PdfdeskError::EmptyInput);
        }

        info!(title = DOCUMENT_TITLE, pages = images.len(), "Composing image PDF");

        let mut doc = PdfDocument::new(DOCUMENT_TITLE);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for (index, image) in images.into_iter().enumerate() {
            let rgb = image.into_rgb();
            let (width, height) = (rgb.width(), rgb.height());
            let (page_w, page_h) = self.page_size_for(width, height);

            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_dynamic().into_rgb8().into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // At the page's own DPI the image covers the page exactly.
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            debug!(
                page = index + 1,
                width,
                height,
                page_w_mm = page_w.0,
                page_h_mm = page_h.0,
                "Image page added"
            );
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }

        Ok(output)
    }

    // -- File output convenience ----------------------------------------------

    /// Compose an image PDF and write it directly to a file.
    pub fn write_images_to_file(
        &self,
        images: Vec<ImageProcessor>,
        path: impl AsRef<Path>,
    ) -> Result<usize, PdfdeskError> {
        let bytes = self.create_from_images(images)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote image PDF to {}", path.as_ref().display());
        Ok(bytes.len())
    }
}
