// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered PDF merge session.

use std::path::Path;

use lopdf::Document;
use pdfdesk_core::error::PdfdeskError;
use tracing::{debug, info, instrument};

use crate::pdf::reader::{PdfReader, concatenate, save_to_path, save_to_vec};

/// Accumulates PDFs in order and writes them out as one document.
///
/// ```ignore
/// let mut merger = PdfMerger::new();
/// merger.append("a.pdf")?;
/// merger.append("b.pdf")?;
/// merger.write("merged.pdf")?;
/// merger.close();
/// ```
#[derive(Default)]
pub struct PdfMerger {
    /// Parsed inputs, in the order they were appended.
    documents: Vec<Document>,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the PDF at `path` and queue all of its pages.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn append(&mut self, path: impl AsRef<Path>) -> Result<(), PdfdeskError> {
        let reader = PdfReader::open(path)?;
        self.append_reader(reader);
        Ok(())
    }

    /// Queue an already-open document.
    pub fn append_reader(&mut self, reader: PdfReader) {
        debug!(
            position = self.documents.len() + 1,
            pages = reader.page_count(),
            "Queued PDF for merge"
        );
        self.documents.push(reader.into_document());
    }

    /// Number of queued documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total pages across all queued documents.
    pub fn page_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.get_pages().len()).sum()
    }

    /// Merge everything queued so far and write it to `path`. Returns the
    /// number of pages written. The queue is emptied.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn write(&mut self, path: impl AsRef<Path>) -> Result<usize, PdfdeskError> {
        let mut merged = self.take_merged()?;
        let pages = merged.get_pages().len();
        let bytes = save_to_path(&mut merged, path.as_ref())?;
        info!(pages, output_bytes = bytes, "Merged PDF written");
        Ok(pages)
    }

    /// Merge everything queued so far and return the serialised bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, PdfdeskError> {
        let mut merged = self.take_merged()?;
        save_to_vec(&mut merged)
    }

    /// End the session, releasing every parsed input.
    pub fn close(self) {
        debug!(pending = self.documents.len(), "Merge session closed");
    }

    fn take_merged(&mut self) -> Result<Document, PdfdeskError> {
        let documents = std::mem::take(&mut self.documents);
        info!(documents = documents.len(), "Merging PDFs");
        concatenate(documents)
    }
}
