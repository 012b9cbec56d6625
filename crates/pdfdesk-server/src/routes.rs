// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Router and middleware.

use axum::{Json, Router};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// Conversion routes answer with and without the trailing slash. The OpenAPI
/// document is served at `/openapi.json` with a RapiDoc viewer at `/docs`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/images-to-pdf/", post(handlers::images_to_pdf))
        .route("/images-to-pdf", post(handlers::images_to_pdf))
        .route("/merge-pdfs/", post(handlers::merge_pdfs))
        .route("/merge-pdfs", post(handlers::merge_pdfs))
        .route("/pdf-to-word/", post(handlers::pdf_to_word))
        .route("/pdf-to-word", post(handlers::pdf_to_word))
        .route("/compress-pdf/", post(handlers::compress_pdf))
        .route("/compress-pdf", post(handlers::compress_pdf))
        .route("/openapi.json", get(openapi_json))
        .merge(RapiDoc::new("/openapi.json").path("/docs"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Any origin, method and header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
