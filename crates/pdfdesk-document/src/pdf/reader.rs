// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open and inspect existing PDF documents using the `lopdf`
// crate, and copy their pages into fresh documents.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfdesk_core::error::PdfdeskError;
use tracing::{debug, info, instrument, warn};

use crate::image::processor::display_name;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees with cyclic /Parent links.
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Reads existing PDF files.
///
/// Wraps `lopdf::Document` and provides the inspection and page-copy
/// primitives the merge and compression paths are built on.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfdeskError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PdfdeskError::PdfError(format!(
                "failed to open {}: {}",
                display_name(path_ref),
                err
            ))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfdeskError> {
        let document = Document::load_mem(data).map_err(|err| {
            PdfdeskError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    /// Wrap an already-parsed document.
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            source_path: None,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// 1-indexed page numbers in document order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.document.get_pages().keys().copied().collect()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// The document `/Title` from the trailer's `/Info` dictionary, if any.
    pub fn title(&self) -> Option<String> {
        let info_id = self.document.trailer.get(b"Info").ok()?.as_reference().ok()?;
        let info = self.document.get_dictionary(info_id).ok()?;
        match info.get(b"Title").ok()? {
            Object::String(bytes, _) => {
                let title = decode_text_string(bytes);
                let trimmed = title.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        }
    }

    /// Extract the text of a single page (1-indexed).
    pub fn page_text(&self, page_number: u32) -> Result<String, PdfdeskError> {
        self.document
            .extract_text(&[page_number])
            .map_err(|err| PdfdeskError::PdfError(err.to_string()))
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume the reader and return the underlying lopdf document.
    pub fn into_document(self) -> Document {
        self.document
    }

    // -- Page copy ------------------------------------------------------------

    /// Copy every page of this document, unmodified and in order, into a new
    /// document with a fresh page tree.
    #[instrument(skip(self))]
    pub fn copy_pages(self) -> Result<Document, PdfdeskError> {
        concatenate(vec![self.document])
    }

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, PdfdeskError> {
        save_to_vec(&mut self.document)
    }
}

/// Build one document holding every page of `documents`, in argument order.
///
/// Object ids of each input are shifted past those of the previous inputs so
/// all objects can live side by side. Pages keep their content and resources;
/// attributes they inherited from their old page tree are copied onto the page
/// itself before the old tree is discarded. Outlines are dropped.
pub(crate) fn concatenate(documents: Vec<Document>) -> Result<Document, PdfdeskError> {
    if documents.is_empty() {
        return Err(PdfdeskError::PdfError(
            "no documents to concatenate".to_string(),
        ));
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut catalog: Option<Dictionary> = None;

    for (index, mut doc) in documents.into_iter().enumerate() {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (page_number, page_id) in doc.get_pages() {
            let mut page = doc.get_dictionary(page_id).cloned().map_err(|err| {
                PdfdeskError::PdfError(format!(
                    "document #{}: cannot read page {}: {}",
                    index + 1,
                    page_number,
                    err
                ))
            })?;
            inherit_page_attributes(&doc, &mut page);
            pages.push((page_id, page));
        }

        if catalog.is_none() {
            catalog = doc.catalog().ok().cloned();
        }

        objects.extend(doc.objects);
    }

    let mut output = Document::with_version("1.5");

    for (object_id, object) in objects {
        match dictionary_type(&object).as_deref() {
            Some("Catalog" | "Pages" | "Page" | "Outlines" | "Outline") => {}
            _ => {
                output.objects.insert(object_id, object);
            }
        }
    }

    output.max_id = max_id;
    let pages_id = output.new_object_id();
    let catalog_id = output.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for (page_id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        output.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    output.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = catalog.unwrap_or_else(Dictionary::new);
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    catalog.remove(b"Outlines");
    output.objects.insert(catalog_id, Object::Dictionary(catalog));
    output.trailer.set("Root", Object::Reference(catalog_id));

    output.renumber_objects();

    debug!(pages = output.get_pages().len(), "Documents concatenated");
    Ok(output)
}

/// Copy inheritable attributes from the page's ancestors onto the page.
fn inherit_page_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_PAGE_TREE_DEPTH {
            warn!("page tree deeper than {MAX_PAGE_TREE_DEPTH} levels, stopping inheritance walk");
            break;
        }
        let Ok(node) = doc.get_dictionary(parent_id) else {
            break;
        };
        for key in INHERITABLE_PAGE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
}

/// The `/Type` name of a dictionary or stream object.
fn dictionary_type(object: &Object) -> Option<String> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    let name = dict.get(b"Type").and_then(Object::as_name).ok()?;
    Some(String::from_utf8_lossy(name).into_owned())
}

/// Decode a PDF text string: UTF-16BE when it carries a byte-order mark,
/// otherwise treated as single-byte text.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Serialise a document into memory.
pub(crate) fn save_to_vec(document: &mut Document) -> Result<Vec<u8>, PdfdeskError> {
    let mut output = Vec::new();
    document.save_to(&mut output).map_err(|err| {
        PdfdeskError::PdfError(format!("failed to serialise PDF: {}", err))
    })?;
    Ok(output)
}

/// Serialise a document to `path`.
pub(crate) fn save_to_path(document: &mut Document, path: &Path) -> Result<u64, PdfdeskError> {
    let bytes = save_to_vec(document)?;
    std::fs::write(path, &bytes)?;
    Ok(bytes.len() as u64)
}
