// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum_test::TestServer;
use axum_test::multipart::Part;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdfdesk_core::AppConfig;
use pdfdesk_server::{AppState, build_router};
use tempfile::TempDir;

/// A running test server with its own scratch directory.
pub struct TestApp {
    pub server: TestServer,
    pub scratch_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let scratch_dir = temp_dir.path().join("scratch");
        let config = AppConfig {
            scratch_dir: scratch_dir.clone(),
            ..AppConfig::default()
        };

        let state = AppState::new(config);
        state.scratch.on_start().expect("scratch storage");
        let server = TestServer::new(build_router(state)).expect("Failed to create test server");

        Self {
            server,
            scratch_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Entries currently in the scratch directory.
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        list_dir(&self.scratch_dir)
    }
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.flatten().map(|entry| entry.path()).collect())
        .unwrap_or_default()
}

/// A PNG of the given size. `rgba` selects a four-channel image.
pub fn png(width: u32, height: u32, rgba: bool) -> Vec<u8> {
    let image = if rgba {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 100])))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([250, 20, 20])))
    };
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

/// An `n`-page PDF whose page `i` shows the text `"{label} {i}"`.
pub fn labelled_pdf(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    let font_id = doc.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut kids = Vec::new();
    for i in 1..=pages {
        let text = format!("BT /F1 24 Tf 72 720 Td ({label} {i}) Tj ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(resources.clone()));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(pages as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save pdf");
    out
}

/// Text of every page, in order.
pub fn page_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("response is a PDF");
    doc.get_pages()
        .keys()
        .map(|&number| doc.extract_text(&[number]).unwrap_or_default())
        .collect()
}

pub fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).expect("response is a PDF").get_pages().len()
}

pub fn file_part(data: Vec<u8>, filename: &str, mime: &str) -> Part {
    Part::bytes(Bytes::from(data)).file_name(filename).mime_type(mime)
}

pub fn pdf_part(data: Vec<u8>, filename: &str) -> Part {
    file_part(data, filename, "application/pdf")
}
