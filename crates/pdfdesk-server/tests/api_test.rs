// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP API integration tests.
//
// Run with: `cargo test -p pdfdesk-server --test api_test`

mod common;

use std::io::{Cursor, Read};

use axum::http::{Method, StatusCode};
use axum_test::multipart::MultipartForm;
use common::{TestApp, file_part, labelled_pdf, page_count, page_texts, pdf_part, png};
use futures::future::join_all;
use pdfdesk_server::ErrorBody;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn assert_attachment(response: &axum_test::TestResponse, mime: &str, filename: &str) {
    assert_eq!(response.header("content-type"), mime);
    assert_eq!(
        response.header("content-disposition"),
        format!("attachment; filename=\"{filename}\"").as_str()
    );
}

fn error_body(response: &axum_test::TestResponse) -> ErrorBody {
    response.json::<ErrorBody>()
}

// ---------------------------------------------------------------------------
// Informational endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_returns_welcome() {
    let app = TestApp::new().await;
    let response = app.server.get("/").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Welcome to the Pdfdesk API");
}

#[tokio::test]
async fn root_answers_head() {
    let app = TestApp::new().await;
    let response = app.server.method(Method::HEAD, "/").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::new().await;
    let body: serde_json::Value = app.server.get("/health").await.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = TestApp::new().await;
    let response = app
        .server
        .get("/")
        .add_header("Origin", "https://example.org")
        .await;
    assert_eq!(response.header("access-control-allow-origin"), "*");
}

#[tokio::test]
async fn openapi_document_lists_every_conversion() {
    let app = TestApp::new().await;
    let response = app.server.get("/openapi.json").await;
    response.assert_status_ok();

    let spec: serde_json::Value = response.json();
    assert_eq!(spec["info"]["title"], "Pdfdesk API");
    for path in ["/images-to-pdf/", "/merge-pdfs/", "/pdf-to-word/", "/compress-pdf/"] {
        assert!(spec["paths"][path]["post"].is_object(), "{path} missing from {spec}");
    }
    assert!(spec["paths"]["/health"]["get"].is_object());
}

#[tokio::test]
async fn docs_page_is_served() {
    let app = TestApp::new().await;
    let response = app.server.get("/docs").await;
    response.assert_status_ok();
    assert!(response.text().contains("openapi.json"));
}

// ---------------------------------------------------------------------------
// Images to PDF
// ---------------------------------------------------------------------------

#[tokio::test]
async fn images_become_one_page_each_in_upload_order() {
    let app = TestApp::new().await;
    let form = MultipartForm::new()
        .add_part("images", file_part(png(300, 200, false), "first.png", "image/png"))
        .add_part("images", file_part(png(100, 400, true), "second.png", "image/png"))
        .add_part("images", file_part(png(50, 50, false), "third.png", "image/png"));

    let response = app.server.post("/images-to-pdf/").multipart(form).await;
    response.assert_status_ok();
    assert_attachment(&response, "application/pdf", "converted.pdf");

    let pdf = response.as_bytes().to_vec();
    assert_eq!(page_count(&pdf), 3);

    // Pages are sized at 100 DPI: 300x200 px is 216x144 pt.
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    let sizes = doc
        .get_pages()
        .values()
        .map(|&page| {
            let media_box = doc
                .get_dictionary(page)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|value| value.as_float().unwrap())
                .collect::<Vec<f32>>();
            (media_box[2] - media_box[0], media_box[3] - media_box[1])
        })
        .collect::<Vec<_>>();
    let expected = [(216.0, 144.0), (72.0, 288.0), (36.0, 36.0)];
    assert_eq!(sizes.len(), expected.len());
    for (index, (&(width, height), (want_width, want_height))) in
        sizes.iter().zip(expected).enumerate()
    {
        let page = index + 1;
        assert!((width - want_width).abs() < 1.0, "page {page}: {sizes:?}");
        assert!((height - want_height).abs() < 1.0, "page {page}: {sizes:?}");
    }

    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn images_to_pdf_without_images_is_rejected() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_text("note", "nothing here");

    let response = app.server.post("/images-to-pdf/").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = error_body(&response);
    assert_eq!(body.detail, "Please upload at least one image");
    assert_eq!(body.code, "EMPTY_INPUT");
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn undecodable_image_is_a_server_error_and_leaves_nothing() {
    let app = TestApp::new().await;
    let form = MultipartForm::new()
        .add_part("images", file_part(png(10, 10, false), "ok.png", "image/png"))
        .add_part("images", file_part(b"not an image".to_vec(), "bad.png", "image/png"));

    let response = app.server.post("/images-to-pdf/").multipart(form).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(&response);
    assert_eq!(body.code, "CONVERSION_FAILED");
    assert!(body.detail.contains("cannot identify image file"));
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn non_multipart_body_gets_error_envelope() {
    let app = TestApp::new().await;
    let response = app
        .server
        .post("/images-to-pdf/")
        .text("plain text body")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&response).code, "BAD_MULTIPART");
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn merge_concatenates_in_upload_order() {
    let app = TestApp::new().await;
    let form = MultipartForm::new()
        .add_part("pdfs", pdf_part(labelled_pdf("Alpha", 2), "a.pdf"))
        .add_part("pdfs", pdf_part(labelled_pdf("Beta", 1), "b.pdf"))
        .add_part("pdfs", pdf_part(labelled_pdf("Gamma", 3), "c.pdf"));

    let response = app.server.post("/merge-pdfs/").multipart(form).await;
    response.assert_status_ok();
    assert_attachment(&response, "application/pdf", "merged.pdf");

    let texts = page_texts(response.as_bytes());
    let expected = ["Alpha 1", "Alpha 2", "Beta 1", "Gamma 1", "Gamma 2", "Gamma 3"];
    assert_eq!(texts.len(), expected.len());
    for (text, label) in texts.iter().zip(expected) {
        assert!(text.contains(label), "expected {label}, got {text:?}");
    }
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn merge_needs_two_documents() {
    let app = TestApp::new().await;

    for count in [0, 1] {
        let mut form = MultipartForm::new().add_text("note", "x");
        for i in 0..count {
            form = form.add_part("pdfs", pdf_part(labelled_pdf("Solo", 1), &format!("{i}.pdf")));
        }
        let response = app.server.post("/merge-pdfs/").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body = error_body(&response);
        assert_eq!(body.detail, "Please upload at least 2 PDF files");
        assert_eq!(body.code, "INSUFFICIENT_INPUT");
    }
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn merge_with_a_broken_input_fails_cleanly() {
    let app = TestApp::new().await;
    let form = MultipartForm::new()
        .add_part("pdfs", pdf_part(labelled_pdf("Good", 1), "good.pdf"))
        .add_part("pdfs", pdf_part(b"garbage".to_vec(), "broken.pdf"));

    let response = app.server.post("/merge-pdfs/").multipart(form).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(&response).code, "CONVERSION_FAILED");
    assert!(app.scratch_entries().is_empty());
}

// ---------------------------------------------------------------------------
// PDF to Word
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pdf_to_word_returns_docx_with_page_text() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("Section", 2), "doc.pdf"));

    let response = app.server.post("/pdf-to-word/").multipart(form).await;
    response.assert_status_ok();
    assert_attachment(&response, DOCX_MIME, "converted.docx");

    let bytes = response.as_bytes().to_vec();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut document)
        .unwrap();
    let first = document.find("Section 1").unwrap();
    let second = document.find("Section 2").unwrap();
    assert!(first < second);
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn pdf_to_word_checks_extension_case_sensitively() {
    let app = TestApp::new().await;

    for name in ["notes.txt", "REPORT.PDF"] {
        let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("X", 1), name));
        let response = app.server.post("/pdf-to-word/").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body = error_body(&response);
        assert_eq!(body.detail, "Please upload a PDF file");
        assert_eq!(body.code, "NOT_PDF");
    }
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn pdf_to_word_without_file_is_rejected() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_text("note", "x");
    let response = app.server.post("/pdf-to-word/").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&response).code, "MISSING_FILE");
}

#[tokio::test]
async fn pdf_to_word_accepts_pdf_name_with_bad_content_then_fails() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_part("pdf", pdf_part(b"hello".to_vec(), "fake.pdf"));

    let response = app.server.post("/pdf-to-word/").multipart(form).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(&response);
    assert_eq!(body.code, "CONVERSION_FAILED");
    assert!(!body.detail.is_empty());
    assert!(app.scratch_entries().is_empty());
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

#[tokio::test]
async fn compression_preserves_page_count_at_every_level() {
    let app = TestApp::new().await;

    for level in 1..=4 {
        let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("Page", 4), "in.pdf"));
        let response = app
            .server
            .post("/compress-pdf/")
            .add_query_param("compression_level", level)
            .multipart(form)
            .await;
        response.assert_status_ok();
        assert_attachment(&response, "application/pdf", "compressed.pdf");
        assert_eq!(page_count(response.as_bytes()), 4);
    }
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn compression_defaults_to_level_two() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("Page", 2), "in.pdf"));
    let response = app.server.post("/compress-pdf/").multipart(form).await;
    response.assert_status_ok();
    assert_eq!(page_count(response.as_bytes()), 2);
}

#[tokio::test]
async fn invalid_compression_levels_are_rejected() {
    let app = TestApp::new().await;

    for level in ["0", "5", "-1", "high", "2.5"] {
        let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("Page", 1), "in.pdf"));
        let response = app
            .server
            .post("/compress-pdf/")
            .add_query_param("compression_level", level)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body = error_body(&response);
        assert_eq!(body.detail, "Invalid compression level", "level {level}");
        assert_eq!(body.code, "INVALID_LEVEL");
    }
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn repeated_query_level_gets_error_envelope() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("Page", 1), "in.pdf"));
    let response = app
        .server
        .post("/compress-pdf/")
        .add_query_param("compression_level", 1)
        .add_query_param("compression_level", 2)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = error_body(&response);
    assert_eq!(body.detail, "Invalid compression level");
    assert_eq!(body.code, "INVALID_LEVEL");
    assert!(app.scratch_entries().is_empty());
}

#[tokio::test]
async fn form_level_overrides_query_level() {
    let app = TestApp::new().await;

    let form = MultipartForm::new()
        .add_part("pdf", pdf_part(labelled_pdf("Page", 1), "in.pdf"))
        .add_text("compression_level", "9");
    let response = app
        .server
        .post("/compress-pdf/")
        .add_query_param("compression_level", 3)
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let form = MultipartForm::new()
        .add_part("pdf", pdf_part(labelled_pdf("Page", 1), "in.pdf"))
        .add_text("compression_level", "3");
    let response = app
        .server
        .post("/compress-pdf/")
        .add_query_param("compression_level", 9)
        .multipart(form)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn compress_rejects_non_pdf_name() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_part("pdf", pdf_part(labelled_pdf("Page", 1), "in.Pdf"));
    let response = app.server.post("/compress-pdf/").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&response).code, "NOT_PDF");
}

#[tokio::test]
async fn compress_malformed_pdf_is_a_server_error() {
    let app = TestApp::new().await;
    let form = MultipartForm::new().add_part("pdf", pdf_part(b"%PDF-1.7 junk".to_vec(), "in.pdf"));
    let response = app.server.post("/compress-pdf/").multipart(form).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.scratch_entries().is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_get_their_own_output() {
    let app = TestApp::new().await;
    let server = &app.server;

    let requests = (1..=6).map(|pages| async move {
        let form = MultipartForm::new()
            .add_part("pdfs", pdf_part(labelled_pdf(&format!("Req{pages}"), pages), "a.pdf"))
            .add_part("pdfs", pdf_part(labelled_pdf("Tail", 1), "b.pdf"));
        let response = server.post("/merge-pdfs/").multipart(form).await;
        (pages, response)
    });

    for (pages, response) in join_all(requests).await {
        response.assert_status_ok();
        let texts = page_texts(response.as_bytes());
        assert_eq!(texts.len(), pages + 1);
        assert!(texts[0].contains(&format!("Req{pages} 1")));
        assert!(texts[pages].contains("Tail 1"));
    }
    assert!(app.scratch_entries().is_empty());
}
