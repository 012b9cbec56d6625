// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request handlers.
//
// Every conversion follows the same path: collect the form, validate it
// before touching the disk, stage the uploads into a request workspace, run
// the library call on a blocking thread, and answer with the result bytes as
// an attachment. The workspace moves into the blocking job so it is removed
// only after the library is done with it.

use std::path::PathBuf;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use pdfdesk_core::error::PdfdeskError;
use pdfdesk_core::{CompressionLevel, Conversion, ConvertedArtifact, has_pdf_extension};
use pdfdesk_document::{ImageProcessor, PdfCompressor, PdfMerger, PdfToWordConverter, PdfWriter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::multipart::{Upload, UploadForm};
use crate::scratch::RequestWorkspace;
use crate::state::AppState;

pub const IMAGES_FIELD: &str = "images";
pub const PDFS_FIELD: &str = "pdfs";
pub const PDF_FIELD: &str = "pdf";
pub const LEVEL_FIELD: &str = "compression_level";

/// Minimum number of documents a merge needs.
const MIN_MERGE_INPUTS: usize = 2;

type HandlerResult = Result<Response, ApiError>;

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Combine images into one PDF, one page per image in upload order.
#[utoipa::path(
    post,
    path = "/images-to-pdf/",
    tag = "images",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "One or more `images` file parts"
    ),
    responses(
        (status = 200, description = "converted.pdf", content_type = "application/pdf"),
        (status = 400, description = "No images uploaded", body = ErrorBody),
        (status = 500, description = "An image could not be decoded or the PDF could not be written", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn images_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let mut form = UploadForm::collect(multipart?).await?;
    let images = form.take_files(IMAGES_FIELD);
    if images.is_empty() {
        return Err(PdfdeskError::EmptyInput.into());
    }

    let workspace = state.scratch.workspace()?;
    let staged = stage_all(&workspace, &images).await?;
    let output = output_path(&workspace, Conversion::ImagesToPdf);

    let artifact = run_conversion(Conversion::ImagesToPdf, workspace, move || {
        let decoded = staged
            .iter()
            .map(|path| ImageProcessor::open(path).map(ImageProcessor::into_rgb))
            .collect::<Result<Vec<_>, _>>()?;
        PdfWriter::default().write_images_to_file(decoded, &output)?;
        Ok(output)
    })
    .await?;

    Ok(attachment(artifact))
}

/// Concatenate PDFs in upload order.
#[utoipa::path(
    post,
    path = "/merge-pdfs/",
    tag = "pdf",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "Two or more `pdfs` file parts"
    ),
    responses(
        (status = 200, description = "merged.pdf", content_type = "application/pdf"),
        (status = 400, description = "Fewer than two PDFs uploaded", body = ErrorBody),
        (status = 500, description = "An input could not be parsed", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn merge_pdfs(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let mut form = UploadForm::collect(multipart?).await?;
    let pdfs = form.take_files(PDFS_FIELD);
    if pdfs.len() < MIN_MERGE_INPUTS {
        return Err(PdfdeskError::InsufficientInput {
            required: MIN_MERGE_INPUTS,
            actual: pdfs.len(),
        }
        .into());
    }

    let workspace = state.scratch.workspace()?;
    let staged = stage_all(&workspace, &pdfs).await?;
    let output = output_path(&workspace, Conversion::MergePdfs);

    let artifact = run_conversion(Conversion::MergePdfs, workspace, move || {
        let mut merger = PdfMerger::new();
        for path in &staged {
            merger.append(path)?;
        }
        merger.write(&output)?;
        merger.close();
        Ok(output)
    })
    .await?;

    Ok(attachment(artifact))
}

/// Convert a PDF's text into a Word document.
#[utoipa::path(
    post,
    path = "/pdf-to-word/",
    tag = "convert",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "A single `pdf` file part whose name ends in `.pdf`"
    ),
    responses(
        (status = 200, description = "converted.docx",
            content_type = "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        (status = 400, description = "Missing file or not a `.pdf` name", body = ErrorBody),
        (status = 500, description = "The PDF could not be converted", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn pdf_to_word(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    let mut form = UploadForm::collect(multipart?).await?;
    let pdf = require_pdf(&mut form)?;

    let workspace = state.scratch.workspace()?;
    let staged = workspace.stage(&pdf).await?;
    let output = output_path(&workspace, Conversion::PdfToWord);

    let artifact = run_conversion(Conversion::PdfToWord, workspace, move || {
        let converter = PdfToWordConverter::open(&staged)?;
        converter.convert(&output)?;
        converter.close();
        Ok(output)
    })
    .await?;

    Ok(attachment(artifact))
}

/// Query string accepted by `/compress-pdf/`.
#[derive(Debug, Default, Deserialize)]
pub struct CompressParams {
    pub compression_level: Option<String>,
}

/// Shrink a PDF by re-encoding its images according to the compression level.
#[utoipa::path(
    post,
    path = "/compress-pdf/",
    tag = "pdf",
    params(
        ("compression_level" = Option<i64>, Query, description = "1 (lightest) to 4 (strongest), default 2. A `compression_level` form field takes precedence.")
    ),
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "A single `pdf` file part whose name ends in `.pdf`, optionally with a `compression_level` text field"
    ),
    responses(
        (status = 200, description = "compressed.pdf", content_type = "application/pdf"),
        (status = 400, description = "Missing file, not a `.pdf` name, or invalid compression level", body = ErrorBody),
        (status = 500, description = "The PDF could not be compressed", body = ErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn compress_pdf(
    State(state): State<AppState>,
    query: Result<Query<CompressParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HandlerResult {
    // Only `compression_level` is read from the query, so any rejection is about it.
    let Query(params) =
        query.map_err(|rejection| PdfdeskError::InvalidLevel(rejection.body_text()))?;
    let mut form = UploadForm::collect(multipart?).await?;
    let pdf = require_pdf(&mut form)?;
    let level = match form.text(LEVEL_FIELD).or(params.compression_level.as_deref()) {
        Some(raw) => raw.parse::<CompressionLevel>()?,
        None => CompressionLevel::default(),
    };

    let workspace = state.scratch.workspace()?;
    let staged = workspace.stage(&pdf).await?;
    let output = output_path(&workspace, Conversion::CompressPdf);

    let artifact = run_conversion(Conversion::CompressPdf, workspace, move || {
        PdfCompressor::new(level).compress_file(&staged, &output)?;
        Ok(output)
    })
    .await?;

    Ok(attachment(artifact))
}

// ---------------------------------------------------------------------------
// Informational
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Welcome message. Also answers `HEAD`.
#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses((status = 200, description = "Welcome message", body = WelcomeResponse))
)]
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Pdfdesk API".to_string(),
    })
}

/// Liveness check with the running version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The single `pdf` upload, which must carry a `.pdf` filename.
fn require_pdf(form: &mut UploadForm) -> Result<Upload, PdfdeskError> {
    let pdf = form
        .take_file(PDF_FIELD)
        .ok_or(PdfdeskError::MissingFile(PDF_FIELD))?;
    if !has_pdf_extension(&pdf.filename) {
        return Err(PdfdeskError::NotPdf {
            filename: pdf.filename,
        });
    }
    Ok(pdf)
}

/// Where the conversion writes its result inside the workspace.
fn output_path(workspace: &RequestWorkspace, conversion: Conversion) -> PathBuf {
    workspace.allocate_path(conversion.output_type().extension())
}

async fn stage_all(
    workspace: &RequestWorkspace,
    uploads: &[Upload],
) -> Result<Vec<PathBuf>, PdfdeskError> {
    let mut staged = Vec::with_capacity(uploads.len());
    for upload in uploads {
        staged.push(workspace.stage(upload).await?);
    }
    Ok(staged)
}

/// Run `job` on a blocking thread, read the file it produced, then release
/// the workspace.
async fn run_conversion<F>(
    conversion: Conversion,
    workspace: RequestWorkspace,
    job: F,
) -> Result<ConvertedArtifact, PdfdeskError>
where
    F: FnOnce() -> Result<PathBuf, PdfdeskError> + Send + 'static,
{
    let bytes = tokio::task::spawn_blocking(move || {
        let output = job()?;
        let bytes = std::fs::read(&output)?;
        drop(workspace);
        Ok::<_, PdfdeskError>(bytes)
    })
    .await
    .map_err(|err| PdfdeskError::Storage(format!("{conversion} task did not complete: {err}")))??;

    info!(%conversion, output_bytes = bytes.len(), "Conversion finished");
    Ok(ConvertedArtifact::new(conversion, bytes))
}

fn attachment(artifact: ConvertedArtifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename());
    (
        [
            (header::CONTENT_TYPE, artifact.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}
