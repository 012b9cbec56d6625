// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scratch storage for staged uploads and conversion results.
//
// Every request works inside its own workspace directory under the scratch
// root. The workspace is removed when its guard is dropped, whichever way the
// request ends. The whole root is swept at start-up and at shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdfdesk_core::ScratchToken;
use pdfdesk_core::error::{PdfdeskError, Result};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::multipart::Upload;

/// Prefix of request workspace directory names.
const WORKSPACE_PREFIX: &str = "ws-";

/// Handle to the shared scratch directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ScratchStorage {
    root: Arc<PathBuf>,
}

impl ScratchStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the scratch directory if it does not exist yet.
    pub fn ensure_directory(&self) -> Result<()> {
        std::fs::create_dir_all(self.root.as_path()).map_err(|err| {
            PdfdeskError::Storage(format!(
                "cannot create scratch directory {}: {}",
                self.root.display(),
                err
            ))
        })
    }

    /// A fresh path directly under the scratch root, ending in `suffix`.
    pub fn allocate_path(&self, suffix: &str) -> PathBuf {
        self.root.join(format!("{}{}", ScratchToken::new(), suffix))
    }

    /// Delete every file and leftover workspace in the scratch directory.
    ///
    /// Individual failures are logged and skipped. Returns the number of
    /// entries removed.
    pub fn purge_all(&self) -> usize {
        let entries = match std::fs::read_dir(self.root.as_path()) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %self.root.display(), %err, "Scratch directory not readable; nothing to purge");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            let result = if file_type.is_file() {
                std::fs::remove_file(&path)
            } else if file_type.is_dir() && is_workspace_name(&path) {
                std::fs::remove_dir_all(&path)
            } else {
                continue;
            };

            match result {
                Ok(()) => removed += 1,
                Err(err) => warn!(path = %path.display(), %err, "Could not remove scratch entry"),
            }
        }

        debug!(removed, "Scratch directory purged");
        removed
    }

    /// Acquire a new request workspace. The scratch directory must exist.
    pub fn workspace(&self) -> Result<RequestWorkspace> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(self.root.as_path())
            .map_err(|err| {
                PdfdeskError::Storage(format!("cannot create request workspace: {err}"))
            })?;
        debug!(dir = %dir.path().display(), "Request workspace created");
        Ok(RequestWorkspace { dir: Some(dir) })
    }

    /// Start-up hook: create the directory and clear anything left over from
    /// a previous run.
    pub fn on_start(&self) -> Result<usize> {
        self.ensure_directory()?;
        let removed = self.purge_all();
        info!(dir = %self.root.display(), removed, "Scratch storage ready");
        Ok(removed)
    }

    /// Shutdown hook: clear the scratch directory.
    pub fn on_shutdown(&self) -> usize {
        let removed = self.purge_all();
        info!(dir = %self.root.display(), removed, "Scratch storage cleared");
        removed
    }

    /// A guard that runs [`ScratchStorage::on_shutdown`] when dropped.
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        ShutdownGuard {
            storage: self.clone(),
        }
    }
}

fn is_workspace_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(WORKSPACE_PREFIX))
}

/// A per-request directory, recursively deleted on drop.
#[derive(Debug)]
pub struct RequestWorkspace {
    /// Only `None` while dropping.
    dir: Option<TempDir>,
}

impl RequestWorkspace {
    pub fn path(&self) -> &Path {
        self.dir.as_ref().map(TempDir::path).unwrap_or_else(|| Path::new(""))
    }

    /// A fresh path inside this workspace, ending in `suffix`.
    pub fn allocate_path(&self, suffix: &str) -> PathBuf {
        self.path().join(format!("{}{}", ScratchToken::new(), suffix))
    }

    /// Write an upload's bytes to a new file in the workspace.
    ///
    /// The client's filename only contributes its extension; the stored name
    /// is always generated.
    pub async fn stage(&self, upload: &Upload) -> Result<PathBuf> {
        let path = self.allocate_path(&upload.extension());
        tokio::fs::write(&path, &upload.data).await.map_err(|err| {
            PdfdeskError::Storage(format!("cannot stage {}: {}", upload.filename, err))
        })?;
        debug!(filename = %upload.filename, bytes = upload.data.len(), "Upload staged");
        Ok(path)
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(dir = %path.display(), "Request workspace removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(dir = %path.display(), %err, "Could not remove request workspace"),
        }
    }
}

/// Runs the shutdown purge when dropped.
#[derive(Debug)]
pub struct ShutdownGuard {
    storage: ScratchStorage,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.storage.on_shutdown();
    }
}
