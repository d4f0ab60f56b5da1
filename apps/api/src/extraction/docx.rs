use std::io::{Cursor, Read};

use quick_xml::events::Event;

use crate::extraction::{Extractor, RawText};
use crate::parsing::errors::ParseError;

const DOCUMENT_PART: &str = "word/document.xml";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Upper bound on the decompressed body part. Uploads are capped compressed,
/// so this is what bounds memory for a highly compressible package.
pub const MAX_DOCUMENT_XML_BYTES: u64 = 16 * 1024 * 1024;

/// Reads the run text of `word/document.xml`, one line per paragraph.
pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extract(&self, bytes: &[u8]) -> Result<RawText, ParseError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            tracing::warn!("DOCX open failed: {e}");
            ParseError::extraction_failed(
                "Could not open the Word document. It may be corrupted or password-protected.",
            )
        })?;

        let part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            ParseError::extraction_failed("The Word document has no readable body text.")
        })?;
        if part.size() > MAX_DOCUMENT_XML_BYTES {
            tracing::warn!(declared = part.size(), "DOCX body exceeds size cap");
            return Err(body_too_large());
        }
        let xml = read_capped(part, MAX_DOCUMENT_XML_BYTES)?;

        let paragraphs = parse_paragraphs(&xml)?;
        Ok(RawText::exact(paragraphs.join("\n")))
    }
}

/// `application/msword` uploads. Only Office Open XML packages mislabeled as
/// `.doc` are readable; the legacy binary format is refused.
pub struct LegacyWordExtractor;

impl Extractor for LegacyWordExtractor {
    fn name(&self) -> &'static str {
        "legacy_word"
    }

    fn extract(&self, bytes: &[u8]) -> Result<RawText, ParseError> {
        if bytes.starts_with(ZIP_MAGIC) {
            return DocxExtractor.extract(bytes);
        }
        Err(ParseError::extraction_failed(
            "Legacy .doc files are not supported. Please save the resume as DOCX or PDF.",
        ))
    }
}

fn body_too_large() -> ParseError {
    ParseError::extraction_failed("The Word document body is too large to read.")
}

/// Reads at most `limit` bytes; anything past it fails rather than truncating.
/// The declared size in the zip directory is not trusted.
fn read_capped(reader: impl Read, limit: u64) -> Result<String, ParseError> {
    let mut raw = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut raw)
        .map_err(|e| {
            tracing::warn!("DOCX body read failed: {e}");
            ParseError::extraction_failed("Could not read the Word document body.")
        })?;
    if raw.len() as u64 > limit {
        tracing::warn!(limit, "DOCX body exceeds size cap");
        return Err(body_too_large());
    }
    String::from_utf8(raw)
        .map_err(|_| ParseError::extraction_failed("The Word document body is malformed."))
}

/// One line per `w:p`. Paragraphs can nest (text boxes sit inside a run of
/// the enclosing paragraph), so the outer text is flushed before the inner
/// paragraph starts. `mc:Fallback` repeats `mc:Choice` content and is skipped.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ParseError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut fallback_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf);
        if fallback_depth > 0 {
            match event {
                Ok(Event::Start(e)) if e.name().as_ref() == b"mc:Fallback" => fallback_depth += 1,
                Ok(Event::End(e)) if e.name().as_ref() == b"mc:Fallback" => fallback_depth -= 1,
                Ok(Event::Eof) => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:p" => flush_paragraph(&mut current, &mut paragraphs),
                b"mc:Fallback" => fallback_depth = 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => flush_paragraph(&mut current, &mut paragraphs),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e.unescape().map_err(|err| {
                        tracing::warn!("DOCX text decode failed: {err}");
                        ParseError::extraction_failed("The Word document body is malformed.")
                    })?;
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    "DOCX XML error at position {}: {err}",
                    reader.buffer_position()
                );
                return Err(ParseError::extraction_failed(
                    "The Word document body is malformed.",
                ));
            }
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn flush_paragraph(current: &mut String, paragraphs: &mut Vec<String>) {
    let text = current.trim();
    if !text.is_empty() {
        paragraphs.push(text.to_string());
    }
    current.clear();
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parsing::errors::ErrorKind;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Builds a minimal DOCX package with one `w:p` per paragraph.
    pub(crate) fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        package(&xml)
    }

    fn package(document_xml: &str) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let bytes = docx_fixture(&["Jane Doe", "jane@x.com", "Skills: Go, Rust"]);
        let out = DocxExtractor.extract(&bytes).unwrap();
        assert_eq!(out.text, "Jane Doe\njane@x.com\nSkills: Go, Rust");
    }

    #[test]
    fn test_runs_in_one_paragraph_are_joined() {
        let xml = "<w:document><w:body><w:p>\
                   <w:r><w:rPr><w:b/></w:rPr><w:t>Jane</w:t></w:r>\
                   <w:r><w:t xml:space=\"preserve\"> Doe</w:t></w:r>\
                   <w:r><w:tab/><w:t>Engineer</w:t></w:r>\
                   </w:p></w:body></w:document>";
        let out = DocxExtractor.extract(&package(xml)).unwrap();
        assert_eq!(out.text, "Jane Doe\tEngineer");
    }

    #[test]
    fn test_escaped_entities_are_decoded() {
        let bytes = docx_fixture(&["R&amp;D &lt;lead&gt;"]);
        let out = DocxExtractor.extract(&bytes).unwrap();
        assert_eq!(out.text, "R&D <lead>");
    }

    #[test]
    fn test_empty_paragraphs_skipped() {
        let xml = "<w:document><w:body><w:p/><w:p><w:r><w:t>  </w:t></w:r></w:p>\
                   <w:p><w:r><w:t>Ada</w:t></w:r></w:p></w:body></w:document>";
        let out = DocxExtractor.extract(&package(xml)).unwrap();
        assert_eq!(out.text, "Ada");
    }

    #[test]
    fn test_text_box_inside_paragraph_keeps_outer_text() {
        let xml = "<w:document><w:body><w:p>\
                   <w:r><w:t>Jane Doe</w:t></w:r>\
                   <w:r><w:t xml:space=\"preserve\"> Senior Engineer</w:t></w:r>\
                   <w:r><mc:AlternateContent><mc:Choice Requires=\"wps\"><w:drawing>\
                   <wps:txbx><w:txbxContent><w:p><w:r><w:t>Skills: Rust</w:t></w:r></w:p>\
                   </w:txbxContent></wps:txbx></w:drawing></mc:Choice>\
                   <mc:Fallback><w:pict><v:textbox><w:txbxContent>\
                   <w:p><w:r><w:t>Skills: Rust</w:t></w:r></w:p>\
                   </w:txbxContent></v:textbox></w:pict></mc:Fallback>\
                   </mc:AlternateContent></w:r>\
                   <w:r><w:t>London</w:t></w:r>\
                   </w:p></w:body></w:document>";
        let out = DocxExtractor.extract(&package(xml)).unwrap();
        assert_eq!(out.text, "Jane Doe Senior Engineer\nSkills: Rust\nLondon");
    }

    #[test]
    fn test_oversized_body_is_refused() {
        let xml = format!(
            "<w:document><w:body>{}</w:body></w:document>",
            " ".repeat(MAX_DOCUMENT_XML_BYTES as usize)
        );
        let bytes = package(&xml);
        assert!(bytes.len() < crate::parsing::document::MAX_UPLOAD_BYTES);

        let err = DocxExtractor.extract(&bytes).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailed);
        assert!(err.message.contains("too large"));
    }

    #[test]
    fn test_read_capped_ignores_declared_size() {
        let body = "x".repeat(65);
        let err = read_capped(body.as_bytes(), 64).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailed);
        assert_eq!(read_capped(&body.as_bytes()[..64], 64).unwrap().len(), 64);
    }

    #[test]
    fn test_not_a_zip_fails_extraction() {
        let err = DocxExtractor.extract(b"definitely not a zip").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_zip_without_document_part_fails() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = DocxExtractor.extract(&bytes).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_legacy_word_reads_mislabeled_docx() {
        let bytes = docx_fixture(&["Ada Lovelace"]);
        assert_eq!(LegacyWordExtractor.extract(&bytes).unwrap().text, "Ada Lovelace");
    }

    #[test]
    fn test_legacy_word_binary_refused() {
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        let err = LegacyWordExtractor.extract(&ole).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtractionFailed);
        assert!(err.message.contains("DOCX or PDF"));
    }
}
