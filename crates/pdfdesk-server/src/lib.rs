// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfdesk-server: HTTP front end for the Pdfdesk conversion service.
//
// Exposes images to PDF, PDF merge, PDF to Word and PDF compression as
// multipart POST endpoints, backed by per-request scratch workspaces.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod routes;
pub mod scratch;
pub mod server;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ApiError, ErrorBody};
pub use routes::build_router;
pub use scratch::{RequestWorkspace, ScratchStorage, ShutdownGuard};
pub use server::start_server;
pub use state::AppState;
