// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pdfdesk conversion service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PdfdeskError;

/// Random token embedded in every scratch file and workspace name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScratchToken(pub Uuid);

impl ScratchToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScratchToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScratchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output document types produced by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// MIME type for the `Content-Type` response header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Docx => ".docx",
        }
    }
}

/// The four operations the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversion {
    ImagesToPdf,
    MergePdfs,
    PdfToWord,
    CompressPdf,
}

impl Conversion {
    /// Filename offered to the client in `Content-Disposition`.
    pub fn download_name(&self) -> &'static str {
        match self {
            Self::ImagesToPdf => "converted.pdf",
            Self::MergePdfs => "merged.pdf",
            Self::PdfToWord => "converted.docx",
            Self::CompressPdf => "compressed.pdf",
        }
    }

    /// Type of the produced document.
    pub fn output_type(&self) -> DocumentType {
        match self {
            Self::PdfToWord => DocumentType::Docx,
            _ => DocumentType::Pdf,
        }
    }
}

impl std::fmt::Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ImagesToPdf => "images-to-pdf",
            Self::MergePdfs => "merge-pdfs",
            Self::PdfToWord => "pdf-to-word",
            Self::CompressPdf => "compress-pdf",
        };
        f.write_str(name)
    }
}

/// Whether a client-supplied filename names a PDF.
///
/// The check is case-sensitive: `report.PDF` is rejected.
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.ends_with(".pdf")
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// Compression level requested by the client (1 = lightest, 4 = strongest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    /// Level used when the client does not send one.
    pub const DEFAULT: Self = Self(2);

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Image re-encoding parameters for this level.
    pub fn profile(&self) -> CompressionProfile {
        match self.0 {
            1 => CompressionProfile {
                reencode_images: false,
                image_quality: 100,
            },
            2 => CompressionProfile {
                reencode_images: true,
                image_quality: 80,
            },
            3 => CompressionProfile {
                reencode_images: true,
                image_quality: 60,
            },
            _ => CompressionProfile {
                reencode_images: true,
                image_quality: 30,
            },
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for CompressionLevel {
    type Error = PdfdeskError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(PdfdeskError::InvalidLevel(value.to_string()))
        }
    }
}

impl std::str::FromStr for CompressionLevel {
    type Err = PdfdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| PdfdeskError::InvalidLevel(s.to_string()))?;
        Self::try_from(value)
    }
}

/// Parameters derived from a [`CompressionLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionProfile {
    /// Re-encode embedded raster images as JPEG.
    pub reencode_images: bool,
    /// JPEG quality (1-100) used when re-encoding.
    pub image_quality: u8,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A finished conversion, ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    pub conversion: Conversion,
    pub bytes: Vec<u8>,
}

impl ConvertedArtifact {
    pub fn new(conversion: Conversion, bytes: Vec<u8>) -> Self {
        Self { conversion, bytes }
    }

    pub fn filename(&self) -> &'static str {
        self.conversion.download_name()
    }

    pub fn mime_type(&self) -> &'static str {
        self.conversion.output_type().mime_type()
    }
}
