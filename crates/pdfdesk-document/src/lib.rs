// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfdesk-document: Document conversion routines for the Pdfdesk service.
//
// Provides image decoding and colour normalisation, PDF operations (load,
// page copy, merge, compose from images), PDF compression by image
// re-encoding, and PDF to DOCX conversion. All APIs are synchronous; the
// server runs them on blocking threads.

pub mod compress;
pub mod image;
pub mod pdf;
pub mod word;

// Re-export the primary structs so callers can use `pdfdesk_document::PdfReader` etc.
pub use compress::{CompressionReport, PdfCompressor};
pub use image::processor::ImageProcessor;
pub use pdf::merge::PdfMerger;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use word::PdfToWordConverter;
