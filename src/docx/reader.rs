//! DOCX package reading.
//!
//! Manual ZIP + XML parsing; the crates that write WordprocessingML do not
//! read it back, so the package is streamed with quick-xml directly.

use crate::docx::xml::{collect_subtree, get_attr, get_attr_i64, parse_paragraph, TWIPS_PER_INCH};
use crate::error::{Error, Result};
use crate::model::{Document, Margins, Metadata, Section};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// Path of the main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Path of the core-properties part.
pub const CORE_PART: &str = "docProps/core.xml";

/// Read a DOCX file into the document model.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let data = fs::read(path)?;
    read_document_from_bytes(&data)
}

/// Read a DOCX package from bytes into the document model.
pub fn read_document_from_bytes(data: &[u8]) -> Result<Document> {
    crate::detect::detect_format_from_bytes(data)?;

    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let document_xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.into()))?;

    let mut doc = parse_document_xml(&document_xml)?;

    if let Some(core_xml) = read_part(&mut archive, CORE_PART)? {
        doc.metadata = parse_core_xml(&core_xml)?;
    }

    log::debug!(
        "read {} paragraphs, {} sections",
        doc.paragraph_count(),
        doc.sections.len()
    );
    Ok(doc)
}

/// Read one archive entry, `None` if the part is absent.
pub fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            Ok(Some(content))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_document_xml(xml: &[u8]) -> Result<Document> {
    let mut doc = Document::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    // Paragraphs inside tables belong to their cells, not to the body.
    let mut table_depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" if table_depth == 0 => {
                    let start = e.into_owned();
                    let events = collect_subtree(&mut reader, start)?;
                    if let Some(section) = section_from_events(&events) {
                        doc.sections.push(section);
                    }
                    doc.add_paragraph(parse_paragraph(&events));
                }
                b"w:sectPr" if table_depth == 0 => {
                    let start = e.into_owned();
                    let events = collect_subtree(&mut reader, start)?;
                    doc.sections.push(parse_section(&events));
                }
                _ => {}
            },
            Event::End(e) => {
                if e.name().as_ref() == b"w:tbl" && table_depth > 0 {
                    table_depth -= 1;
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"w:p" && table_depth == 0 {
                    doc.add_paragraph(Default::default());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

/// A mid-document section boundary lives inside the paragraph's `w:pPr`.
fn section_from_events(paragraph_events: &[Event<'static>]) -> Option<Section> {
    let start = paragraph_events
        .iter()
        .position(|ev| matches!(ev, Event::Start(e) if e.name().as_ref() == b"w:sectPr"))?;
    let end = crate::docx::xml::subtree_end(paragraph_events, start);
    Some(parse_section(&paragraph_events[start..=end]))
}

fn parse_section(events: &[Event<'static>]) -> Section {
    let mut section = Section::default();

    for event in events {
        if let Event::Start(e) | Event::Empty(e) = event {
            match e.name().as_ref() {
                b"w:pgMar" => {
                    let inches = |key: &[u8]| {
                        get_attr_i64(e, key).map(|t| t as f32 / TWIPS_PER_INCH)
                    };
                    let mut margins = Margins::default();
                    if let Some(v) = inches(b"w:top") {
                        margins.top = v;
                    }
                    if let Some(v) = inches(b"w:right") {
                        margins.right = v;
                    }
                    if let Some(v) = inches(b"w:bottom") {
                        margins.bottom = v;
                    }
                    if let Some(v) = inches(b"w:left") {
                        margins.left = v;
                    }
                    section.margins = margins;
                }
                b"w:headerReference" => {
                    let is_default = get_attr(e, b"w:type").map_or(true, |t| t == "default");
                    if is_default {
                        if let Some(rid) = get_attr(e, b"r:id") {
                            section.header_refs.push(rid);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    section
}

fn parse_core_xml(xml: &[u8]) -> Result<Metadata> {
    let mut metadata = Metadata::default();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<&'static str> = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                current = match e.name().as_ref() {
                    b"dc:title" => Some("title"),
                    b"dc:creator" => Some("creator"),
                    b"dc:subject" => Some("subject"),
                    b"dcterms:created" => Some("created"),
                    b"dcterms:modified" => Some("modified"),
                    _ => None,
                };
            }
            Event::Text(t) => {
                if let Some(field) = current {
                    let text = match t.unescape() {
                        Ok(cow) => cow.to_string(),
                        Err(_) => continue,
                    };
                    match field {
                        "title" => metadata.title = Some(text),
                        "creator" => metadata.author = Some(text),
                        "subject" => metadata.subject = Some(text),
                        "created" => metadata.created = parse_w3c_date(&text),
                        "modified" => metadata.modified = parse_w3c_date(&text),
                        _ => {}
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(metadata)
}

/// Core properties use W3CDTF; be tolerant of date-only values.
fn parse_w3c_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Alignment;

    fn docx_with_document_xml(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut writer, xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_read_paragraphs_and_section() {
        let data = docx_with_document_xml(concat!(
            r#"<w:p><w:r><w:rPr><w:sz w:val="48"/></w:rPr><w:t>Title</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Body text</w:t></w:r></w:p>"#,
            r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
            r#"<w:pgMar w:top="720" w:right="1440" w:bottom="1440" w:left="1440" w:header="708"/></w:sectPr>"#,
        ));

        let doc = read_document_from_bytes(&data).unwrap();
        assert_eq!(doc.paragraph_count(), 2);
        assert_eq!(doc.paragraphs[0].plain_text(), "Title");
        assert_eq!(doc.paragraphs[0].max_font_size(), Some(24.0));
        assert_eq!(doc.paragraphs[1].style.alignment, Alignment::Center);

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].margins.top, 0.5);
        assert_eq!(doc.sections[0].margins.left, 1.0);
    }

    #[test]
    fn test_table_paragraphs_skipped() {
        let data = docx_with_document_xml(concat!(
            r#"<w:p><w:r><w:t>outside</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>inside cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        ));

        let doc = read_document_from_bytes(&data).unwrap();
        assert_eq!(doc.paragraph_count(), 1);
        assert_eq!(doc.plain_text(), "outside");
    }

    #[test]
    fn test_header_reference_collected() {
        let data = docx_with_document_xml(concat!(
            r#"<w:p><w:r><w:t>x</w:t></w:r></w:p>"#,
            r#"<w:sectPr><w:headerReference w:type="default" r:id="rId7"/>"#,
            r#"<w:headerReference w:type="even" r:id="rId8"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440"/></w:sectPr>"#,
        ));

        let doc = read_document_from_bytes(&data).unwrap();
        assert_eq!(doc.sections[0].header_refs, vec!["rId7".to_string()]);
    }

    #[test]
    fn test_parse_w3c_date() {
        let dt = parse_w3c_date("2024-03-02T10:15:30Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-02T10:15:30+00:00");

        assert!(parse_w3c_date("2024-03-02").is_some());
        assert!(parse_w3c_date("not a date").is_none());
    }

    #[test]
    fn test_not_a_docx() {
        let result = read_document_from_bytes(b"plain text");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
