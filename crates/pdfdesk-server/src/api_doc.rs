// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OpenAPI description of the HTTP surface, served at `/openapi.json` and
// browsable at `/docs`.

use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pdfdesk API",
        description = "Document conversion service: images to PDF, PDF merge, PDF to Word and PDF compression. Uploads are multipart forms; results come back as attachments. Failures use a `{detail, code}` JSON body."
    ),
    paths(
        // Conversions
        handlers::images_to_pdf,
        handlers::merge_pdfs,
        handlers::pdf_to_word,
        handlers::compress_pdf,
        // Service
        handlers::root,
        handlers::health,
    ),
    components(schemas(ErrorBody, handlers::WelcomeResponse, handlers::HealthResponse)),
    tags(
        (name = "images", description = "Image conversions"),
        (name = "pdf", description = "PDF manipulation"),
        (name = "convert", description = "Office format export"),
        (name = "service", description = "Welcome and health endpoints")
    )
)]
pub struct ApiDoc;
