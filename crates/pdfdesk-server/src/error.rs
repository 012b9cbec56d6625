// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error envelope.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pdfdesk_core::{ErrorClass, PdfdeskError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

/// A [`PdfdeskError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub PdfdeskError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.class() {
            ErrorClass::Validation => StatusCode::BAD_REQUEST,
            ErrorClass::Conversion => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PdfdeskError> for ApiError {
    fn from(err: PdfdeskError) -> Self {
        Self(err)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(PdfdeskError::Multipart(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();
        match self.0.class() {
            ErrorClass::Validation => tracing::warn!(error = %self.0, code, "Request rejected"),
            ErrorClass::Conversion => tracing::error!(error = %self.0, code, "Conversion failed"),
        }

        let body = ErrorBody {
            detail: self.0.detail(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
