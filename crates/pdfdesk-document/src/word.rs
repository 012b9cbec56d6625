// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF to Word conversion.
//
// Text is pulled from each page with lopdf and laid out as a minimal
// WordprocessingML package: one paragraph per text line, a hard page break
// between source pages. Layout, fonts and images are not reconstructed.

use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use pdfdesk_core::error::PdfdeskError;
use tracing::{debug, info, instrument, warn};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::pdf::reader::PdfReader;

/// A single-use PDF to DOCX conversion session.
pub struct PdfToWordConverter {
    reader: PdfReader,
}

impl PdfToWordConverter {
    /// Open the source PDF. Load failures carry the parser's message as-is.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfdeskError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfdeskError> {
        let document =
            lopdf::Document::load_mem(data).map_err(|err| PdfdeskError::WordError(err.to_string()))?;
        Ok(Self {
            reader: PdfReader::from_document(document),
        })
    }

    /// Number of pages that will be converted.
    pub fn page_count(&self) -> usize {
        self.reader.page_count()
    }

    /// Convert the whole document and write the DOCX to `output`.
    pub fn convert(&self, output: impl AsRef<Path>) -> Result<usize, PdfdeskError> {
        let bytes = self.convert_to_bytes()?;
        std::fs::write(output.as_ref(), &bytes)?;
        info!(output_bytes = bytes.len(), "Word document written");
        Ok(bytes.len())
    }

    /// Convert the whole document into DOCX bytes.
    #[instrument(skip_all, fields(pages = self.reader.page_count()))]
    pub fn convert_to_bytes(&self) -> Result<Vec<u8>, PdfdeskError> {
        let pages: Vec<String> = self
            .reader
            .page_numbers()
            .into_iter()
            .map(|number| match self.reader.page_text(number) {
                Ok(text) => text,
                Err(err) => {
                    warn!(page = number, %err, "No text extracted from page");
                    String::new()
                }
            })
            .collect();

        let title = self.reader.title().unwrap_or_default();
        build_docx(&title, &pages)
    }

    /// End the session.
    pub fn close(self) {
        debug!("Word conversion session closed");
    }
}

/// Assemble a DOCX package with one section per entry in `pages`.
pub fn build_docx(title: &str, pages: &[String]) -> Result<Vec<u8>, PdfdeskError> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, String); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/document.xml", document_xml(pages)),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", STYLES.to_string()),
            ("docProps/core.xml", core_xml(title)),
            ("docProps/app.xml", app_xml(pages.len())),
        ];

        for (name, body) in parts {
            zip.start_file(name, options).map_err(word_error)?;
            zip.write_all(body.as_bytes())?;
        }
        zip.finish().map_err(word_error)?;
    }
    Ok(buffer)
}

fn word_error(err: zip::result::ZipError) -> PdfdeskError {
    PdfdeskError::WordError(err.to_string())
}

fn document_xml(pages: &[String]) -> String {
    let mut body = String::new();
    for (index, text) in pages.iter().enumerate() {
        if index > 0 {
            body.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
        }
        for line in text.lines().map(str::trim_end).filter(|line| !line.trim().is_empty()) {
            body.push_str(r#"<w:p><w:r><w:t xml:space="preserve">"#);
            body.push_str(&escape_xml(line));
            body.push_str("</w:t></w:r></w:p>");
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body>{}",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        body
    )
}

fn core_xml(title: &str) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title><dc:creator>Pdfdesk</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        title = escape_xml(title),
        now = now
    )
}

fn app_xml(pages: usize) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            "<Application>Pdfdesk</Application><Pages>{}</Pages></Properties>"
        ),
        pages
    )
}

/// Escape XML markup and drop characters XML 1.0 cannot carry.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' => out.push(ch),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
    "</Types>"
);

const PACKAGE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    "</Relationships>"
);

const DOCUMENT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    "</Relationships>"
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
    r#"<w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/>"#,
    r#"</w:rPr></w:rPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
    "</w:styles>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::tests::labelled_pdf;
    use std::io::Read;

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut out = String::new();
        part.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn package_has_every_part() {
        let docx = build_docx("Report", &["hello".to_string()]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "docProps/core.xml",
            "docProps/app.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
        assert!(read_part(&docx, "docProps/core.xml").contains("<dc:title>Report</dc:title>"));
    }

    #[test]
    fn pages_are_separated_by_breaks() {
        let pages = vec!["one\ntwo".to_string(), "three".to_string()];
        let xml = document_xml(&pages);
        assert_eq!(xml.matches(r#"w:type="page""#).count(), 1);
        let one = xml.find(">one<").unwrap();
        let three = xml.find(">three<").unwrap();
        assert!(one < three);
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_xml("a < b & \"c\"\u{1}"), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn converts_pdf_text_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        let output = dir.path().join("converted.docx");
        std::fs::write(&input, labelled_pdf("Chapter", 3)).unwrap();

        let converter = PdfToWordConverter::open(&input).unwrap();
        assert_eq!(converter.page_count(), 3);
        converter.convert(&output).unwrap();
        converter.close();

        let docx = std::fs::read(&output).unwrap();
        let xml = read_part(&docx, "word/document.xml");
        let first = xml.find("Chapter 1").unwrap();
        let third = xml.find("Chapter 3").unwrap();
        assert!(first < third);
        assert_eq!(xml.matches(r#"w:type="page""#).count(), 2);
        assert!(read_part(&docx, "docProps/app.xml").contains("<Pages>3</Pages>"));
    }

    #[test]
    fn malformed_pdf_reports_raw_parser_error() {
        let err = PdfToWordConverter::from_bytes(b"%PDF-garbage").err().unwrap();
        assert!(matches!(err, PdfdeskError::WordError(_)));
        assert!(!err.detail().starts_with("Word conversion failed"));
    }
}
