// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared state handed to every handler.

use std::sync::Arc;

use pdfdesk_core::AppConfig;

use crate::scratch::ScratchStorage;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scratch: ScratchStorage,
}

impl AppState {
    /// State rooted at the configured scratch directory.
    pub fn new(config: AppConfig) -> Self {
        let scratch = ScratchStorage::new(config.scratch_dir.clone());
        Self {
            config: Arc::new(config),
            scratch,
        }
    }
}
