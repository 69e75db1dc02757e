//! Integration tests for end-to-end DOCX formatting.

use std::io::{Cursor, Read, Write};

use apadoc::{format_bytes, read_document_from_bytes, Alignment, BodySpacing, FormatOptions};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

/// Build a minimal DOCX package around the given document body XML.
fn build_docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
    );

    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zw.start_file("[Content_Types].xml", options).unwrap();
    zw.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    zw.start_file("word/_rels/document.xml.rels", options).unwrap();
    zw.write_all(DOCUMENT_RELS.as_bytes()).unwrap();
    zw.start_file("word/document.xml", options).unwrap();
    zw.write_all(document.as_bytes()).unwrap();
    zw.finish().unwrap().into_inner()
}

fn read_zip_part(data: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(_) => return None,
    };
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    Some(content)
}

fn sized_paragraph(text: &str, half_points: u32) -> String {
    format!(
        r#"<w:p><w:r><w:rPr><w:sz w:val="{half_points}"/></w:rPr><w:t>{text}</w:t></w:r></w:p>"#
    )
}

fn body_paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"#)
}

const SECT_PR: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="720" w:right="720" w:bottom="720" w:left="720" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

#[test]
fn test_heading_levels_by_font_size() {
    let body = [
        sized_paragraph("Results", 48),     // 24pt -> level 1
        sized_paragraph("Participants", 40), // 20pt -> level 2
        sized_paragraph("Sampling", 36),    // 18pt -> level 3
        sized_paragraph("Subgroup", 32),    // 16pt -> level 4
        body_paragraph("We recruited forty adults."),
    ]
    .concat()
        + SECT_PR;

    let (out, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();

    assert_eq!(report.paragraphs, 5);
    assert_eq!(report.headings, [1, 1, 1, 1, 0]);
    assert_eq!(report.body, 1);

    let doc = read_document_from_bytes(&out).unwrap();
    // Level 1: centered, bold, no indent
    assert_eq!(doc.paragraphs[0].style.alignment, Alignment::Center);
    assert!(doc.paragraphs[0].runs.iter().all(|r| r.style.bold));
    assert_eq!(doc.paragraphs[0].style.first_line_indent, Some(0.0));
    // Level 2: left, bold
    assert_eq!(doc.paragraphs[1].style.alignment, Alignment::Left);
    assert!(doc.paragraphs[1].runs.iter().all(|r| r.style.bold));
    // Level 3: left, bold italic
    assert!(doc.paragraphs[2].runs.iter().all(|r| r.style.bold && r.style.italic));
    // Level 4: half-inch indent, bold
    assert_eq!(doc.paragraphs[3].style.first_line_indent, Some(36.0));
    assert!(doc.paragraphs[3].runs.iter().all(|r| r.style.bold));
    // Body: justified, half-inch indent, not bold
    assert_eq!(doc.paragraphs[4].style.alignment, Alignment::Justify);
    assert_eq!(doc.paragraphs[4].style.first_line_indent, Some(36.0));
    assert!(doc.paragraphs[4].runs.iter().all(|r| !r.style.bold));
}

#[test]
fn test_heading_threshold_boundary() {
    // 15pt (30 half-points) is body; anything above is a heading
    let body = [
        sized_paragraph("Still body", 30),
        sized_paragraph("Lowest heading", 31),
    ]
    .concat()
        + SECT_PR;

    let (_, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();
    assert_eq!(report.body, 1);
    assert_eq!(report.headings, [0, 0, 0, 0, 1]);
}

#[test]
fn test_trailing_period_on_low_headings() {
    let body = [
        sized_paragraph("Apparatus", 32),          // level 4, no period
        sized_paragraph("Procedure.", 32),         // level 4, already has one
        sized_paragraph("Stimuli", 31),            // level 5, no period
        sized_paragraph("Discussion", 48),         // level 1, never gets one
    ]
    .concat()
        + SECT_PR;

    let (out, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();
    assert_eq!(report.periods_appended, 2);

    let doc = read_document_from_bytes(&out).unwrap();
    assert_eq!(doc.paragraphs[0].plain_text(), "Apparatus.");
    assert_eq!(doc.paragraphs[1].plain_text(), "Procedure.");
    assert_eq!(doc.paragraphs[2].plain_text(), "Stimuli.");
    assert_eq!(doc.paragraphs[3].plain_text(), "Discussion");
}

#[test]
fn test_body_run_styling_forced() {
    let body = format!(
        r#"<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/><w:sz w:val="20"/></w:rPr><w:t>ten point arial</w:t></w:r></w:p>{SECT_PR}"#
    );
    let (out, _) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();

    let doc = read_document_from_bytes(&out).unwrap();
    let run = &doc.paragraphs[0].runs[0];
    assert_eq!(run.style.font_name.as_deref(), Some("Times New Roman"));
    assert_eq!(run.style.font_size, Some(12.0));
}

#[test]
fn test_body_emphasis_preserved() {
    // Bold inside body text is the author's emphasis, not heading noise
    let body = format!(
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>significant</w:t></w:r><w:r><w:t> difference</w:t></w:r></w:p>{SECT_PR}"#
    );
    let (out, _) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();

    let doc = read_document_from_bytes(&out).unwrap();
    assert!(doc.paragraphs[0].runs[0].style.bold);
    assert!(!doc.paragraphs[0].runs[1].style.bold);
}

#[test]
fn test_margins_and_spacing() {
    let body = body_paragraph("text") + SECT_PR;
    let (out, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();
    assert_eq!(report.sections, 1);

    let doc = read_document_from_bytes(&out).unwrap();
    let margins = &doc.sections[0].margins;
    assert_eq!(margins.top, 1.0);
    assert_eq!(margins.right, 1.0);
    assert_eq!(margins.bottom, 1.0);
    assert_eq!(margins.left, 1.0);

    assert_eq!(doc.paragraphs[0].style.line_spacing, Some(2.0));
    assert_eq!(doc.paragraphs[0].style.space_before, Some(0.0));
    assert_eq!(doc.paragraphs[0].style.space_after, Some(0.0));
}

#[test]
fn test_body_spacing_option() {
    let body = body_paragraph("text") + SECT_PR;
    let options = FormatOptions::new().with_body_spacing(BodySpacing::OnePointFive);
    let (out, _) = format_bytes(&build_docx(&body), "paper", &options).unwrap();

    let doc = read_document_from_bytes(&out).unwrap();
    assert_eq!(doc.paragraphs[0].style.line_spacing, Some(1.5));
}

#[test]
fn test_header_part_added() {
    let body = body_paragraph("text") + SECT_PR;
    let (out, report) = format_bytes(&build_docx(&body), "my thesis", &FormatOptions::default()).unwrap();
    assert_eq!(report.headers_written, 1);

    let header = read_zip_part(&out, "word/header1.xml").expect("header part missing");
    assert!(header.contains("MY THESIS"));
    assert!(header.contains("PAGE"));
    assert!(header.contains("w:tbl"));

    let rels = read_zip_part(&out, "word/_rels/document.xml.rels").unwrap();
    assert!(rels.contains("header1.xml"));
    assert!(rels.contains("relationships/header"));

    let types = read_zip_part(&out, "[Content_Types].xml").unwrap();
    assert!(types.contains("/word/header1.xml"));

    let document = read_zip_part(&out, "word/document.xml").unwrap();
    assert!(document.contains("w:headerReference"));
}

#[test]
fn test_explicit_running_head() {
    let body = body_paragraph("text") + SECT_PR;
    let options = FormatOptions::new().with_running_head("WORKING MEMORY");
    let (out, _) = format_bytes(&build_docx(&body), "draft3", &options).unwrap();

    let header = read_zip_part(&out, "word/header1.xml").unwrap();
    assert!(header.contains("WORKING MEMORY"));
    assert!(!header.contains("DRAFT3"));
}

#[test]
fn test_no_header_option() {
    let body = body_paragraph("text") + SECT_PR;
    let options = FormatOptions::new().with_header(false);
    let (out, report) = format_bytes(&build_docx(&body), "paper", &options).unwrap();

    assert_eq!(report.headers_written, 0);
    assert!(read_zip_part(&out, "word/header1.xml").is_none());
    let document = read_zip_part(&out, "word/document.xml").unwrap();
    assert!(!document.contains("w:headerReference"));
}

#[test]
fn test_table_content_untouched() {
    let table = r#"<w:tbl><w:tr><w:tc><w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
    let body = format!("{}{}{}", body_paragraph("before"), table, SECT_PR);
    let (out, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();

    // Table paragraphs are neither counted nor rewritten
    assert_eq!(report.paragraphs, 1);
    let document = read_zip_part(&out, "word/document.xml").unwrap();
    assert!(document.contains(r#"<w:jc w:val="right"/>"#));
}

#[test]
fn test_unknown_parts_pass_through() {
    let body = body_paragraph("text") + SECT_PR;
    let mut data = build_docx(&body);

    // Append an extra part the formatter knows nothing about
    let mut archive = ZipArchive::new(Cursor::new(data.as_slice())).unwrap();
    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).unwrap();
        zw.raw_copy_file(file).unwrap();
    }
    zw.start_file("word/media/image1.png", SimpleFileOptions::default())
        .unwrap();
    zw.write_all(b"\x89PNG\r\n\x1a\nfake").unwrap();
    data = zw.finish().unwrap().into_inner();

    let (out, _) = format_bytes(&data, "paper", &FormatOptions::default()).unwrap();
    let mut result = ZipArchive::new(Cursor::new(out.as_slice())).unwrap();
    let mut media = result.by_name("word/media/image1.png").unwrap();
    let mut bytes = Vec::new();
    media.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, b"\x89PNG\r\n\x1a\nfake");
}

#[test]
fn test_empty_paragraphs_survive() {
    let body = format!("{}<w:p/>{}{SECT_PR}", body_paragraph("a"), body_paragraph("b"));
    let (out, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();

    assert_eq!(report.paragraphs, 3);
    let doc = read_document_from_bytes(&out).unwrap();
    assert_eq!(doc.paragraphs.len(), 3);
    assert!(doc.paragraphs[1].is_empty());
}

#[test]
fn test_format_file_output_path() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("my thesis.docx");
    std::fs::write(&input, build_docx(&(body_paragraph("text") + SECT_PR))).unwrap();

    let outcome = apadoc::format_file(&input).unwrap();
    assert_eq!(outcome.output_path, dir.path().join("my thesis_APA.docx"));
    assert!(outcome.output_path.exists());

    // The written file is itself a valid DOCX
    let data = std::fs::read(&outcome.output_path).unwrap();
    let doc = read_document_from_bytes(&data).unwrap();
    assert_eq!(doc.paragraphs.len(), 1);
}

#[test]
fn test_not_a_docx() {
    let result = format_bytes(b"%PDF-1.7 not a zip", "x", &FormatOptions::default());
    assert!(result.is_err());
}

#[test]
fn test_mixed_sizes_use_largest() {
    // A paragraph with one oversized run is a heading at that run's level
    let body = format!(
        r#"<w:p><w:r><w:rPr><w:sz w:val="24"/></w:rPr><w:t>small </w:t></w:r><w:r><w:rPr><w:sz w:val="44"/></w:rPr><w:t>Method</w:t></w:r></w:p>{SECT_PR}"#
    );
    let (_, report) = format_bytes(&build_docx(&body), "paper", &FormatOptions::default()).unwrap();
    // 22pt -> level 2
    assert_eq!(report.headings, [0, 1, 0, 0, 0]);
}
