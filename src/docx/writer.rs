//! DOCX package transformation.
//!
//! The main document part is rewritten in a single streaming pass: each
//! body-level paragraph subtree is buffered, classified, and re-emitted
//! with its properties replaced. Every other archive entry is copied
//! through raw, except headers being replaced and the two package-level
//! parts that need a new relationship when a header part is added.

use crate::classify::{classify, FormatDirective};
use crate::docx::header::{header_xml, HEADER_CONTENT_TYPE, HEADER_REL_TYPE};
use crate::docx::reader::{read_part, DOCUMENT_PART};
use crate::docx::xml::{
    collect_subtree, empty_with_attrs, get_attr, inches_to_twips, pt_to_half_points, pt_to_twips,
    spacing_to_line_units, subtree_end,
};
use crate::error::{Error, Result};
use crate::format::{FormatOptions, FormatReport};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;
use std::io::{Cursor, Write as _};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// One `<Relationship>` from a rels part.
#[derive(Debug, Clone)]
struct RelEntry {
    id: String,
    rel_type: String,
    target: String,
}

/// State threaded through the document pass.
struct TransformState {
    /// Relationship IDs of default headers referenced by any section
    header_rids: Vec<String>,
    /// Relationship ID to hand out if a section has no default header
    new_header_rid: Option<String>,
    /// Whether `new_header_rid` was actually referenced
    new_header_inserted: bool,
    report: FormatReport,
}

/// Apply APA formatting to a DOCX package.
///
/// `stem` is the input file stem, used to derive the running head when the
/// options do not name one. Returns the new package bytes and a report.
pub fn transform(data: &[u8], stem: &str, options: &FormatOptions) -> Result<(Vec<u8>, FormatReport)> {
    crate::detect::detect_format_from_bytes(data)?;
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let rels_xml = read_part(&mut archive, RELS_PART)?;
    let rels = match &rels_xml {
        Some(xml) => parse_rels(xml)?,
        None => Vec::new(),
    };

    let entry_names: HashSet<String> = archive.file_names().map(String::from).collect();
    let new_header_part = free_header_part(&entry_names);

    let mut state = TransformState {
        header_rids: Vec::new(),
        new_header_rid: options.write_header.then(|| next_rid(&rels)),
        new_header_inserted: false,
        report: FormatReport::new(),
    };

    let document_xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.into()))?;
    let new_document = transform_document_xml(&document_xml, options, &mut state)?;

    // Existing default header parts get their content replaced wholesale.
    let header_parts: HashSet<String> = if options.write_header {
        state
            .header_rids
            .iter()
            .filter_map(|rid| rels.iter().find(|r| &r.id == rid))
            .map(|r| resolve_target(&r.target))
            .collect()
    } else {
        HashSet::new()
    };

    let running_head = options.resolve_running_head(stem);
    let header_content = header_xml(&running_head, options);

    let new_rels = if state.new_header_inserted {
        let rid = state.new_header_rid.as_deref().unwrap_or("rId1");
        let target = new_header_part.trim_start_matches("word/");
        Some(match &rels_xml {
            Some(xml) => augment_rels(xml, rid, target)?,
            None => fresh_rels(rid, target).into_bytes(),
        })
    } else {
        None
    };

    let new_content_types = if state.new_header_inserted {
        let ct_xml = read_part(&mut archive, CONTENT_TYPES_PART)?
            .ok_or_else(|| Error::MissingPart(CONTENT_TYPES_PART.into()))?;
        Some(augment_content_types(&ct_xml, &new_header_part)?)
    } else {
        None
    };

    // Reassemble the package.
    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default();
    let mut wrote_rels = false;

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();

        if name == DOCUMENT_PART {
            zw.start_file(&*name, file_options)?;
            zw.write_all(&new_document)?;
        } else if name == RELS_PART && new_rels.is_some() {
            zw.start_file(&*name, file_options)?;
            zw.write_all(new_rels.as_deref().unwrap_or_default())?;
            wrote_rels = true;
        } else if name == CONTENT_TYPES_PART && new_content_types.is_some() {
            zw.start_file(&*name, file_options)?;
            zw.write_all(new_content_types.as_deref().unwrap_or_default())?;
        } else if header_parts.contains(&name) {
            zw.start_file(&*name, file_options)?;
            zw.write_all(header_content.as_bytes())?;
            state.report.headers_written += 1;
        } else {
            let file = archive.by_index_raw(i)?;
            zw.raw_copy_file(file)?;
        }
    }

    if state.new_header_inserted {
        zw.start_file(&*new_header_part, file_options)?;
        zw.write_all(header_content.as_bytes())?;
        state.report.headers_written += 1;

        if !wrote_rels {
            if let Some(rels) = &new_rels {
                zw.start_file(RELS_PART, file_options)?;
                zw.write_all(rels)?;
            }
        }
    }

    let out = zw
        .finish()
        .map_err(|e| Error::Write(e.to_string()))?
        .into_inner();

    log::info!("formatted {stem}: {}", state.report);
    Ok((out, state.report))
}

/// Rewrite `word/document.xml`.
fn transform_document_xml(
    xml: &[u8],
    options: &FormatOptions,
    state: &mut TransformState,
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + xml.len() / 4));
    let mut buf = Vec::new();
    let mut table_depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"w:tbl" => {
                        table_depth += 1;
                        writer.write_event(Event::Start(e.into_owned()))?;
                    }
                    b"w:p" if table_depth == 0 => {
                        let events = collect_subtree(&mut reader, e.into_owned())?;
                        for event in rewrite_paragraph(events, options, state) {
                            writer.write_event(event)?;
                        }
                    }
                    b"w:sectPr" if table_depth == 0 => {
                        let events = collect_subtree(&mut reader, e.into_owned())?;
                        for event in rewrite_sectpr(&events, options, state) {
                            writer.write_event(event)?;
                        }
                    }
                    _ => writer.write_event(Event::Start(e.into_owned()))?,
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"w:tbl" && table_depth > 0 {
                    table_depth -= 1;
                }
                writer.write_event(Event::End(e.into_owned()))?;
            }
            Event::Empty(e) if e.name().as_ref() == b"w:p" && table_depth == 0 => {
                // An empty paragraph still gets body formatting.
                let events = vec![
                    Event::Start(BytesStart::new("w:p")),
                    Event::End(BytesEnd::new("w:p")),
                ];
                for event in rewrite_paragraph(events, options, state) {
                    writer.write_event(event)?;
                }
            }
            Event::Eof => break,
            event => writer.write_event(event.into_owned())?,
        }
    }

    Ok(writer.into_inner())
}

/// Rewrite one buffered `w:p` subtree.
fn rewrite_paragraph(
    events: Vec<Event<'static>>,
    options: &FormatOptions,
    state: &mut TransformState,
) -> Vec<Event<'static>> {
    let paragraph = crate::docx::xml::parse_paragraph(&events);
    let level = classify(&paragraph.runs);
    state.report.record(level);
    let directive = FormatDirective::for_classification(level, options.body_spacing.multiplier());

    let mut out = Vec::with_capacity(events.len() + 16);
    out.push(events[0].clone());

    // w:pPr must be the first child when present.
    let mut i = 1;
    match events.get(1) {
        Some(Event::Start(e)) if e.name().as_ref() == b"w:pPr" => {
            let end = subtree_end(&events, 1);
            out.extend(rewrite_ppr(Some(&events[1..=end]), &directive, options, state));
            i = end + 1;
        }
        Some(Event::Empty(e)) if e.name().as_ref() == b"w:pPr" => {
            out.extend(rewrite_ppr(None, &directive, options, state));
            i = 2;
        }
        _ => out.extend(rewrite_ppr(None, &directive, options, state)),
    }

    // Direct children; whole subtrees are skipped over so everything seen
    // here really is body-level run content.
    let last = events.len() - 1;
    while i < last {
        match &events[i] {
            Event::Start(e) if e.name().as_ref() == b"w:r" => {
                let end = subtree_end(&events, i);
                out.extend(rewrite_run(&events[i..=end], &directive, options));
                i = end + 1;
            }
            Event::Start(_) => {
                let end = subtree_end(&events, i);
                out.extend_from_slice(&events[i..=end]);
                i = end + 1;
            }
            event => {
                out.push(event.clone());
                i += 1;
            }
        }
    }

    if directive.trailing_period && !paragraph.plain_text().trim().ends_with('.') {
        out.extend(period_run(&directive, options));
        state.report.periods_appended += 1;
    }

    out.push(events[last].clone());
    out
}

/// Replace spacing, indent, and alignment in a `w:pPr`, preserving its
/// other children. `w:rPr` (paragraph mark) and `w:sectPr` keep their
/// trailing position.
fn rewrite_ppr(
    subtree: Option<&[Event<'static>]>,
    directive: &FormatDirective,
    options: &FormatOptions,
    state: &mut TransformState,
) -> Vec<Event<'static>> {
    let mut before: Vec<Event<'static>> = Vec::new();
    let mut after: Vec<Event<'static>> = Vec::new();
    let mut ind_attrs: Vec<(String, String)> = Vec::new();

    if let Some(events) = subtree {
        let last = events.len() - 1;
        let mut i = 1;
        while i < last {
            let (name, end) = match &events[i] {
                Event::Start(e) => (e.name().as_ref().to_vec(), subtree_end(events, i)),
                Event::Empty(e) => (e.name().as_ref().to_vec(), i),
                _ => {
                    before.push(events[i].clone());
                    i += 1;
                    continue;
                }
            };
            match name.as_slice() {
                b"w:jc" | b"w:spacing" => {}
                b"w:ind" => {
                    if let Event::Start(e) | Event::Empty(e) = &events[i] {
                        for attr in e.attributes().flatten() {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            // firstLine and hanging are mutually exclusive;
                            // both give way to the directive.
                            if key != "w:firstLine" && key != "w:hanging" {
                                let val = String::from_utf8_lossy(&attr.value).to_string();
                                ind_attrs.push((key, val));
                            }
                        }
                    }
                }
                b"w:rPr" => after.extend_from_slice(&events[i..=end]),
                b"w:sectPr" => after.extend(rewrite_sectpr(&events[i..=end], options, state)),
                _ => before.extend_from_slice(&events[i..=end]),
            }
            i = end + 1;
        }
    }

    let line = spacing_to_line_units(directive.line_spacing).to_string();
    let first_line = pt_to_twips(directive.first_line_indent).to_string();

    let mut out = Vec::with_capacity(before.len() + after.len() + 6);
    out.push(Event::Start(BytesStart::new("w:pPr")));
    out.extend(before);
    out.push(empty_with_attrs(
        "w:spacing",
        &[
            ("w:before", "0"),
            ("w:after", "0"),
            ("w:line", &line),
            ("w:lineRule", "auto"),
        ],
    ));
    let mut ind = BytesStart::new("w:ind");
    for (k, v) in &ind_attrs {
        ind.push_attribute((k.as_str(), v.as_str()));
    }
    ind.push_attribute(("w:firstLine", first_line.as_str()));
    out.push(Event::Empty(ind.into_owned()));
    out.push(empty_with_attrs(
        "w:jc",
        &[("w:val", directive.alignment.jc_val())],
    ));
    out.extend(after);
    out.push(Event::End(BytesEnd::new("w:pPr")));
    out
}

/// Rewrite one `w:r` subtree: its `w:rPr` is replaced, everything else
/// passes through.
fn rewrite_run(
    events: &[Event<'static>],
    directive: &FormatDirective,
    options: &FormatOptions,
) -> Vec<Event<'static>> {
    if events.len() < 2 {
        return events.to_vec();
    }

    let mut out = Vec::with_capacity(events.len() + 8);
    out.push(events[0].clone());

    let mut i = 1;
    match &events[1] {
        Event::Start(e) if e.name().as_ref() == b"w:rPr" => {
            let end = subtree_end(events, 1);
            out.extend(rewrite_rpr(Some(&events[1..=end]), directive, options));
            i = end + 1;
        }
        Event::Empty(e) if e.name().as_ref() == b"w:rPr" => {
            out.extend(rewrite_rpr(None, directive, options));
            i = 2;
        }
        _ => out.extend(rewrite_rpr(None, directive, options)),
    }

    out.extend_from_slice(&events[i..]);
    out
}

/// Build the replacement `w:rPr`. Fonts and size are always forced;
/// bold/italic only for heading directives, so body emphasis survives.
fn rewrite_rpr(
    subtree: Option<&[Event<'static>]>,
    directive: &FormatDirective,
    options: &FormatOptions,
) -> Vec<Event<'static>> {
    let mut rstyle: Vec<Event<'static>> = Vec::new();
    let mut preserved: Vec<Event<'static>> = Vec::new();

    if let Some(events) = subtree {
        let last = events.len() - 1;
        let mut i = 1;
        while i < last {
            let (name, end) = match &events[i] {
                Event::Start(e) => (e.name().as_ref().to_vec(), subtree_end(events, i)),
                Event::Empty(e) => (e.name().as_ref().to_vec(), i),
                _ => {
                    preserved.push(events[i].clone());
                    i += 1;
                    continue;
                }
            };
            match name.as_slice() {
                b"w:rFonts" | b"w:sz" | b"w:szCs" => {}
                b"w:b" | b"w:bCs" | b"w:i" | b"w:iCs" if directive.forces_run_style() => {}
                b"w:rStyle" => rstyle.extend_from_slice(&events[i..=end]),
                _ => preserved.extend_from_slice(&events[i..=end]),
            }
            i = end + 1;
        }
    }

    let sz = pt_to_half_points(options.font_size).to_string();
    let font = options.font_name.as_str();

    let mut out = Vec::with_capacity(preserved.len() + 10);
    out.push(Event::Start(BytesStart::new("w:rPr")));
    out.extend(rstyle);
    out.push(empty_with_attrs(
        "w:rFonts",
        &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)],
    ));
    if directive.forces_run_style() {
        if directive.bold {
            out.push(Event::Empty(BytesStart::new("w:b")));
            out.push(Event::Empty(BytesStart::new("w:bCs")));
        } else {
            out.push(empty_with_attrs("w:b", &[("w:val", "0")]));
            out.push(empty_with_attrs("w:bCs", &[("w:val", "0")]));
        }
        if directive.italic {
            out.push(Event::Empty(BytesStart::new("w:i")));
            out.push(Event::Empty(BytesStart::new("w:iCs")));
        } else {
            out.push(empty_with_attrs("w:i", &[("w:val", "0")]));
            out.push(empty_with_attrs("w:iCs", &[("w:val", "0")]));
        }
    }
    out.extend(preserved);
    out.push(empty_with_attrs("w:sz", &[("w:val", &sz)]));
    out.push(empty_with_attrs("w:szCs", &[("w:val", &sz)]));
    out.push(Event::End(BytesEnd::new("w:rPr")));
    out
}

/// The appended trailing-period run, styled like its heading.
fn period_run(directive: &FormatDirective, options: &FormatOptions) -> Vec<Event<'static>> {
    let mut out = vec![Event::Start(BytesStart::new("w:r"))];
    out.extend(rewrite_rpr(None, directive, options));
    out.push(Event::Start(BytesStart::new("w:t")));
    out.push(Event::Text(BytesText::new(".").into_owned()));
    out.push(Event::End(BytesEnd::new("w:t")));
    out.push(Event::End(BytesEnd::new("w:r")));
    out
}

/// Rewrite a `w:sectPr`: margins become uniform, and a default header
/// reference is added when the section has none.
fn rewrite_sectpr(
    events: &[Event<'static>],
    options: &FormatOptions,
    state: &mut TransformState,
) -> Vec<Event<'static>> {
    state.report.sections += 1;

    let mut has_default_header = false;
    for event in events {
        if let Event::Start(e) | Event::Empty(e) = event {
            if e.name().as_ref() == b"w:headerReference" {
                let is_default = get_attr(e, b"w:type").map_or(true, |t| t == "default");
                if is_default {
                    has_default_header = true;
                    if let Some(rid) = get_attr(e, b"r:id") {
                        state.header_rids.push(rid);
                    }
                }
            }
        }
    }

    let mut out = Vec::with_capacity(events.len() + 2);
    out.push(events[0].clone());

    if !has_default_header {
        if let Some(rid) = state.new_header_rid.clone() {
            out.push(empty_with_attrs(
                "w:headerReference",
                &[("w:type", "default"), ("r:id", &rid)],
            ));
            state.new_header_inserted = true;
        }
    }

    let margin_twips = inches_to_twips(options.margins).to_string();
    let mut saw_pgmar = false;
    let last = events.len() - 1;
    let mut i = 1;
    while i < last {
        match &events[i] {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"w:pgMar" => {
                out.push(rewrite_pgmar(e, &margin_twips));
                saw_pgmar = true;
                i = subtree_end(events, i) + 1;
            }
            event => {
                out.push(event.clone());
                i += 1;
            }
        }
    }

    if !saw_pgmar {
        out.push(empty_with_attrs(
            "w:pgMar",
            &[
                ("w:top", &margin_twips),
                ("w:right", &margin_twips),
                ("w:bottom", &margin_twips),
                ("w:left", &margin_twips),
                ("w:header", "720"),
                ("w:footer", "720"),
                ("w:gutter", "0"),
            ],
        ));
    }

    out.push(events[last].clone());
    out
}

/// Force the four page margins, preserving header/footer/gutter distances.
fn rewrite_pgmar(e: &BytesStart, margin_twips: &str) -> Event<'static> {
    let mut pgmar = BytesStart::new("w:pgMar");
    for key in ["w:top", "w:right", "w:bottom", "w:left"] {
        pgmar.push_attribute((key, margin_twips));
    }
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if !matches!(key.as_str(), "w:top" | "w:right" | "w:bottom" | "w:left") {
            let val = String::from_utf8_lossy(&attr.value).to_string();
            pgmar.push_attribute((key.as_str(), val.as_str()));
        }
    }
    Event::Empty(pgmar.into_owned())
}

fn parse_rels(xml: &[u8]) -> Result<Vec<RelEntry>> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                entries.push(RelEntry {
                    id: get_attr(&e, b"Id").unwrap_or_default(),
                    rel_type: get_attr(&e, b"Type").unwrap_or_default(),
                    target: get_attr(&e, b"Target").unwrap_or_default(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// First unused relationship ID of the conventional `rIdN` shape.
fn next_rid(rels: &[RelEntry]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId"))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// First free `word/headerN.xml` part name.
fn free_header_part(names: &HashSet<String>) -> String {
    (1..)
        .map(|n| format!("word/header{n}.xml"))
        .find(|name| !names.contains(name))
        .unwrap_or_else(|| "word/header1.xml".to_string())
}

/// Resolve a rels target against the `word/` base.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        format!("word/{target}")
    }
}

fn augment_rels(xml: &[u8], rid: &str, target: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 128));
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::End(e) if e.name().as_ref() == b"Relationships" => {
                writer.write_event(empty_with_attrs(
                    "Relationship",
                    &[("Id", rid), ("Type", HEADER_REL_TYPE), ("Target", target)],
                ))?;
                writer.write_event(Event::End(e.into_owned()))?;
            }
            Event::Eof => break,
            event => writer.write_event(event.into_owned())?,
        }
    }

    Ok(writer.into_inner())
}

fn fresh_rels(rid: &str, target: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="{rid}" Type="{HEADER_REL_TYPE}" Target="{target}"/></Relationships>"#
    )
}

fn augment_content_types(xml: &[u8], part_name: &str) -> Result<Vec<u8>> {
    let part = format!("/{part_name}");
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 128));
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::End(e) if e.name().as_ref() == b"Types" => {
                writer.write_event(empty_with_attrs(
                    "Override",
                    &[("PartName", &part), ("ContentType", HEADER_CONTENT_TYPE)],
                ))?;
                writer.write_event(Event::End(e.into_owned()))?;
            }
            Event::Eof => break,
            event => writer.write_event(event.into_owned())?,
        }
    }

    Ok(writer.into_inner())
}
