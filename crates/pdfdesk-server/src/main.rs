// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pdfdesk: document conversion service.
//
// Entry point. Initialises logging, loads configuration, prepares the scratch
// directory and serves HTTP until shutdown.

use std::process::ExitCode;

use pdfdesk_core::AppConfig;
use pdfdesk_core::error::Result;
use pdfdesk_server::{AppState, build_router, start_server};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Pdfdesk starting");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Pdfdesk stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;
    let state = AppState::new(config.clone());

    state.scratch.on_start()?;
    // Purges the scratch directory however the server loop ends.
    let _shutdown = state.scratch.shutdown_guard();

    let app = build_router(state);
    start_server(&config, app).await
}
