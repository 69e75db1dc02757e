//! WordprocessingML helpers shared by the reader and the transformer.

use crate::error::{Error, Result};
use crate::model::{Alignment, Paragraph, ParagraphStyle, TextRun, TextStyle};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Twentieths of a point per inch.
pub const TWIPS_PER_INCH: f32 = 1440.0;

/// Twentieths of a point per point.
pub const TWIPS_PER_POINT: f32 = 20.0;

/// `w:spacing/@w:line` units per single line when `lineRule` is `auto`.
pub const LINE_UNITS: f32 = 240.0;

/// Extract an attribute value by key from an element.
#[inline]
pub fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(std::result::Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract an attribute value by key and parse as i64.
#[inline]
pub fn get_attr_i64(e: &BytesStart, key: &[u8]) -> Option<i64> {
    get_attr(e, key).and_then(|s| s.parse().ok())
}

/// Check if `w:val` is explicitly "0" or "false" (formatting toggled off).
#[inline]
pub fn check_val_off(e: &BytesStart) -> bool {
    e.attributes().any(|a| {
        if let Ok(attr) = a {
            if attr.key.as_ref() == b"w:val" {
                let v = std::str::from_utf8(&attr.value).unwrap_or_default();
                return v == "0" || v == "false" || v == "none";
            }
        }
        false
    })
}

/// Half-points (`w:sz`) to points.
#[inline]
pub fn half_points_to_pt(val: i64) -> f32 {
    val as f32 / 2.0
}

/// Points to half-points for `w:sz`.
#[inline]
pub fn pt_to_half_points(pt: f32) -> i64 {
    (pt * 2.0).round() as i64
}

/// Points to twips for `w:ind` / `w:spacing`.
#[inline]
pub fn pt_to_twips(pt: f32) -> i64 {
    (pt * TWIPS_PER_POINT).round() as i64
}

/// Inches to twips for `w:pgMar`.
#[inline]
pub fn inches_to_twips(inches: f32) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}

/// Line-spacing multiplier to `w:line` units.
#[inline]
pub fn spacing_to_line_units(multiplier: f32) -> i64 {
    (multiplier * LINE_UNITS).round() as i64
}

/// Collect a complete element subtree, starting from an already-read
/// `Start` event. Nested elements with the same name are depth-counted so
/// a paragraph inside a text box does not terminate its outer paragraph.
pub fn collect_subtree<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    start: BytesStart<'static>,
) -> Result<Vec<Event<'static>>> {
    let name = start.name().as_ref().to_vec();
    let mut events = vec![Event::Start(start)];
    let mut depth = 1usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Eof => {
                return Err(Error::Xml(format!(
                    "unexpected EOF inside <{}>",
                    String::from_utf8_lossy(&name)
                )))
            }
            event => {
                match &event {
                    Event::Start(e) if e.name().as_ref() == name.as_slice() => depth += 1,
                    Event::End(e) if e.name().as_ref() == name.as_slice() => depth -= 1,
                    _ => {}
                }
                events.push(event.into_owned());
                if depth == 0 {
                    return Ok(events);
                }
            }
        }
    }
}

/// Index of the event that closes the subtree opened at `start_idx`.
///
/// `Empty` subtrees close where they open.
pub fn subtree_end(events: &[Event<'static>], start_idx: usize) -> usize {
    let name: Vec<u8> = match &events[start_idx] {
        Event::Start(e) => e.name().as_ref().to_vec(),
        _ => return start_idx,
    };
    let mut depth = 1usize;
    for (i, event) in events.iter().enumerate().skip(start_idx + 1) {
        match event {
            Event::Start(e) if e.name().as_ref() == name.as_slice() => depth += 1,
            Event::End(e) if e.name().as_ref() == name.as_slice() => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    events.len() - 1
}

/// Parse a buffered `w:p` subtree into the document model.
///
/// Only direct children count: a run inside a text box belongs to its own
/// paragraph, not to this one, matching how word processors expose
/// body-level paragraphs.
pub fn parse_paragraph(events: &[Event<'static>]) -> Paragraph {
    let mut paragraph = Paragraph::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current_run: Option<TextRun> = None;

    for event in events {
        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"w:r" if stack.len() == 1 => {
                        current_run = Some(TextRun::default());
                    }
                    _ => {}
                }
                handle_property(e, &stack, &mut paragraph.style, &mut current_run);
                stack.push(name);
            }
            Event::Empty(e) => {
                handle_property(e, &stack, &mut paragraph.style, &mut current_run);
                // Breaks and tabs contribute visible text.
                if stack.len() == 2 && stack[1] == b"w:r" {
                    if let Some(run) = current_run.as_mut() {
                        match e.name().as_ref() {
                            b"w:tab" => run.text.push('\t'),
                            b"w:br" | b"w:cr" => run.text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(t) => {
                // Direct w:t content of a direct run only.
                if stack.len() == 3 && stack[1] == b"w:r" && stack[2] == b"w:t" {
                    if let (Some(run), Ok(text)) = (current_run.as_mut(), t.unescape()) {
                        run.text.push_str(&text);
                    }
                }
            }
            Event::End(e) => {
                stack.pop();
                if e.name().as_ref() == b"w:r" && stack.len() == 1 {
                    if let Some(run) = current_run.take() {
                        paragraph.add_run(run);
                    }
                }
            }
            _ => {}
        }
    }

    paragraph
}

/// Property elements can be `Start` or `Empty`; routing is identical.
fn handle_property(
    e: &BytesStart,
    stack: &[Vec<u8>],
    style: &mut ParagraphStyle,
    current_run: &mut Option<TextRun>,
) {
    let in_ppr = stack.len() == 2 && stack[1] == b"w:pPr";
    let in_rpr = stack.len() == 3 && stack[1] == b"w:r" && stack[2] == b"w:rPr";

    match e.name().as_ref() {
        b"w:jc" if in_ppr => {
            if let Some(val) = get_attr(e, b"w:val") {
                if let Some(alignment) = Alignment::from_jc_val(&val) {
                    style.alignment = alignment;
                }
            }
        }
        b"w:ind" if in_ppr => {
            if let Some(twips) = get_attr_i64(e, b"w:firstLine") {
                style.first_line_indent = Some(twips as f32 / TWIPS_PER_POINT);
            }
        }
        b"w:spacing" if in_ppr => {
            let auto = get_attr(e, b"w:lineRule").map_or(true, |r| r == "auto");
            if auto {
                if let Some(line) = get_attr_i64(e, b"w:line") {
                    style.line_spacing = Some(line as f32 / LINE_UNITS);
                }
            }
            if let Some(before) = get_attr_i64(e, b"w:before") {
                style.space_before = Some(before as f32 / TWIPS_PER_POINT);
            }
            if let Some(after) = get_attr_i64(e, b"w:after") {
                style.space_after = Some(after as f32 / TWIPS_PER_POINT);
            }
        }
        b"w:sz" if in_rpr => {
            if let (Some(run), Some(val)) = (current_run.as_mut(), get_attr_i64(e, b"w:val")) {
                run.style.font_size = Some(half_points_to_pt(val));
            }
        }
        b"w:b" if in_rpr => {
            if let Some(run) = current_run.as_mut() {
                run.style.bold = !check_val_off(e);
            }
        }
        b"w:i" if in_rpr => {
            if let Some(run) = current_run.as_mut() {
                run.style.italic = !check_val_off(e);
            }
        }
        b"w:rFonts" if in_rpr => {
            if let (Some(run), Some(name)) = (current_run.as_mut(), get_attr(e, b"w:ascii")) {
                run.style.font_name = Some(name);
            }
        }
        _ => {}
    }
}

/// Build an owned empty element with attributes.
pub fn empty_with_attrs(name: &str, attrs: &[(&str, &str)]) -> Event<'static> {
    let mut e = BytesStart::new(name.to_string());
    for (k, v) in attrs {
        e.push_attribute((*k, *v));
    }
    Event::Empty(e.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;

    fn paragraph_events(xml: &str) -> Vec<Event<'static>> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.name().as_ref() == b"w:p" => {
                    let start = e.into_owned();
                    return collect_subtree(&mut reader, start).unwrap();
                }
                Event::Eof => panic!("no w:p in fixture"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_parse_runs_and_sizes() {
        let xml = r#"<w:p>
            <w:r><w:rPr><w:sz w:val="44"/><w:b/></w:rPr><w:t>Method</w:t></w:r>
            <w:r><w:t xml:space="preserve"> and more</w:t></w:r>
        </w:p>"#;
        let p = parse_paragraph(&paragraph_events(xml));

        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "Method");
        assert_eq!(p.runs[0].style.font_size, Some(22.0));
        assert!(p.runs[0].style.bold);
        assert_eq!(p.runs[1].style.font_size, None);
        assert_eq!(p.plain_text(), "Method and more");
    }

    #[test]
    fn test_parse_paragraph_style() {
        let xml = r#"<w:p>
            <w:pPr>
                <w:spacing w:before="0" w:after="0" w:line="480" w:lineRule="auto"/>
                <w:ind w:firstLine="720"/>
                <w:jc w:val="both"/>
            </w:pPr>
            <w:r><w:t>body</w:t></w:r>
        </w:p>"#;
        let p = parse_paragraph(&paragraph_events(xml));

        assert_eq!(p.style.alignment, Alignment::Justify);
        assert_eq!(p.style.first_line_indent, Some(36.0));
        assert_eq!(p.style.line_spacing, Some(2.0));
        assert_eq!(p.style.space_before, Some(0.0));
    }

    #[test]
    fn test_bold_toggled_off() {
        let xml = r#"<w:p><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>x</w:t></w:r></w:p>"#;
        let p = parse_paragraph(&paragraph_events(xml));
        assert!(!p.runs[0].style.bold);
    }

    #[test]
    fn test_nested_paragraph_runs_excluded() {
        // A text-box paragraph nested inside a run must not leak its text
        // into the outer paragraph.
        let xml = r#"<w:p>
            <w:r><w:t>outer</w:t>
                <w:pict><w:txbxContent>
                    <w:p><w:r><w:t>inner</w:t></w:r></w:p>
                </w:txbxContent></w:pict>
            </w:r>
        </w:p>"#;
        let p = parse_paragraph(&paragraph_events(xml));
        assert_eq!(p.plain_text(), "outer");
    }

    #[test]
    fn test_subtree_end() {
        let events = paragraph_events(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>t</w:t></w:r></w:p>"#,
        );
        // events[1] opens w:pPr
        let end = subtree_end(&events, 1);
        assert!(matches!(&events[end], Event::End(e) if e.name().as_ref() == b"w:pPr"));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(pt_to_half_points(12.0), 24);
        assert_eq!(half_points_to_pt(44), 22.0);
        assert_eq!(pt_to_twips(36.0), 720);
        assert_eq!(inches_to_twips(1.0), 1440);
        assert_eq!(spacing_to_line_units(2.0), 480);
        assert_eq!(spacing_to_line_units(1.5), 360);
    }
}
