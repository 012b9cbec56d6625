// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart form collection.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use pdfdesk_core::error::PdfdeskError;
use tracing::debug;

/// One uploaded file, held in memory until it is staged.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Form field the file arrived in.
    pub field: String,
    /// Client-supplied filename.
    pub filename: String,
    pub data: Bytes,
}

impl Upload {
    /// The filename's extension including the dot, or an empty string.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }
}

/// Every part of a multipart request, split into files and text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    uploads: Vec<Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read the whole request body.
    ///
    /// Parts carrying a filename are uploads, kept in arrival order. Parts
    /// without one are text fields; a repeated text field keeps its last
    /// value. A file input left empty by a browser (blank filename, no bytes)
    /// is ignored.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, PdfdeskError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| PdfdeskError::Multipart(err.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|err| PdfdeskError::Multipart(err.body_text()))?;

            match filename {
                Some(filename) if filename.is_empty() && data.is_empty() => {}
                Some(filename) => form.uploads.push(Upload {
                    field: name,
                    filename,
                    data,
                }),
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&data).into_owned());
                }
            }
        }

        debug!(
            uploads = form.uploads.len(),
            fields = form.fields.len(),
            "Multipart form collected"
        );
        Ok(form)
    }

    /// Remove and return every upload sent under `field`, in arrival order.
    pub fn take_files(&mut self, field: &str) -> Vec<Upload> {
        let (taken, rest) = std::mem::take(&mut self.uploads)
            .into_iter()
            .partition(|upload| upload.field == field);
        self.uploads = rest;
        taken
    }

    /// Remove and return the first upload sent under `field`.
    pub fn take_file(&mut self, field: &str) -> Option<Upload> {
        let index = self.uploads.iter().position(|upload| upload.field == field)?;
        Some(self.uploads.remove(index))
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}
