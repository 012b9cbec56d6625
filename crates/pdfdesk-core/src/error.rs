// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pdfdesk.

use thiserror::Error;

/// Top-level error type for all Pdfdesk operations.
#[derive(Debug, Error)]
pub enum PdfdeskError {
    // -- Validation errors (client input, raised before anything is staged) --
    #[error("Please upload at least one image")]
    EmptyInput,

    #[error("Please upload at least {required} PDF files")]
    InsufficientInput { required: usize, actual: usize },

    #[error("Please upload a PDF file")]
    NotPdf { filename: String },

    #[error("Invalid compression level")]
    InvalidLevel(String),

    #[error("missing upload field `{0}`")]
    MissingFile(&'static str),

    #[error("malformed multipart request: {0}")]
    Multipart(String),

    // -- Conversion errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("Word conversion failed: {0}")]
    WordError(String),

    #[error("scratch storage error: {0}")]
    Storage(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -- Startup --
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Whether an error was caused by the caller or by the conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or missing input. Nothing was written to disk.
    Validation,
    /// Staging, decoding, or a library call failed.
    Conversion,
}

impl PdfdeskError {
    /// Classify this error for status mapping.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyInput
            | Self::InsufficientInput { .. }
            | Self::NotPdf { .. }
            | Self::InvalidLevel(_)
            | Self::MissingFile(_)
            | Self::Multipart(_) => ErrorClass::Validation,
            _ => ErrorClass::Conversion,
        }
    }

    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InsufficientInput { .. } => "INSUFFICIENT_INPUT",
            Self::NotPdf { .. } => "NOT_PDF",
            Self::InvalidLevel(_) => "INVALID_LEVEL",
            Self::MissingFile(_) => "MISSING_FILE",
            Self::Multipart(_) => "BAD_MULTIPART",
            Self::Config(_) => "CONFIG",
            _ => "CONVERSION_FAILED",
        }
    }

    /// Message shown to the caller.
    ///
    /// Conversion failures expose the underlying library text as-is, without
    /// the category prefix used in logs.
    pub fn detail(&self) -> String {
        match self {
            Self::PdfError(msg)
            | Self::ImageError(msg)
            | Self::WordError(msg)
            | Self::Storage(msg) => msg.clone(),
            Self::Io(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfdeskError>;
