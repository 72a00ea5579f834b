//! Minimal WordprocessingML package carrying the Typst source as text.
//!
//! There is no Typst-to-Word layout path; the export embeds the markup
//! verbatim under a short note recommending PDF.

use std::io::{self, Cursor, Write};

use quick_xml::escape::escape;
use thiserror::Error;
use zip::{CompressionMethod, ZipWriter, result::ZipError, write::SimpleFileOptions};

pub(crate) const DOCX_NOTE: &str =
    "Note: This is a basic export. For best results, use PDF export.";
pub(crate) const DOCX_SOURCE_HEADING: &str = "Typst Source:";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_CLOSE: &str = "<w:sectPr/></w:body></w:document>";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("failed to assemble docx archive: {0}")]
    Zip(#[from] ZipError),
    #[error("failed to write docx part: {0}")]
    Io(#[from] io::Error),
}

/// Builds a `.docx` whose body is the note, a blank line, a bold heading
/// and then `markup` with its line breaks preserved.
pub fn build_source_docx(markup: &str) -> Result<Vec<u8>, DocxError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));

    archive.start_file("[Content_Types].xml", options)?;
    archive.write_all(CONTENT_TYPES.as_bytes())?;
    archive.start_file("_rels/.rels", options)?;
    archive.write_all(PACKAGE_RELS.as_bytes())?;
    archive.start_file("word/document.xml", options)?;
    archive.write_all(document_xml(markup).as_bytes())?;

    Ok(archive.finish()?.into_inner())
}

fn document_xml(markup: &str) -> String {
    let mut xml = String::with_capacity(DOCUMENT_OPEN.len() + markup.len() * 2 + 512);
    xml.push_str(DOCUMENT_OPEN);

    xml.push_str(r#"<w:p><w:r><w:rPr><w:i/><w:sz w:val="20"/></w:rPr><w:t>"#);
    xml.push_str(DOCX_NOTE);
    xml.push_str("</w:t></w:r></w:p>");
    xml.push_str("<w:p/>");
    xml.push_str("<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>");
    xml.push_str(DOCX_SOURCE_HEADING);
    xml.push_str("</w:t></w:r></w:p>");

    xml.push_str("<w:p><w:r>");
    for (index, line) in markup.lines().enumerate() {
        if index > 0 {
            xml.push_str("<w:br/>");
        }
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape(xml_safe(line).as_str()));
        xml.push_str("</w:t>");
    }
    xml.push_str("</w:r></w:p>");

    xml.push_str(DOCUMENT_CLOSE);
    xml
}

/// Drops control characters XML 1.0 cannot represent.
fn xml_safe(line: &str) -> String {
    line.chars()
        .filter(|&c| c == '\t' || !c.is_control() || u32::from(c) >= 0x80)
        .collect()
}
