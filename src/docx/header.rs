//! APA running-head header part generation.
//!
//! The header is a borderless 1x2 table spanning the text width: the
//! running-head title flush left, a live `PAGE` field flush right.

use crate::format::FormatOptions;
use crate::docx::xml::pt_to_half_points;
use quick_xml::escape::escape;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship type for header parts.
pub const HEADER_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";

/// Content type for header parts.
pub const HEADER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";

/// Render the complete `word/headerN.xml` part.
pub fn header_xml(running_head: &str, options: &FormatOptions) -> String {
    let title = escape(running_head);
    let font = escape(&options.font_name);
    let sz = pt_to_half_points(options.font_size);
    let rpr = format!(
        r#"<w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/></w:rPr>"#
    );

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}">
<w:tbl>
<w:tblPr>
<w:tblW w:w="9360" w:type="dxa"/>
<w:tblBorders><w:top w:val="none" w:sz="0" w:space="0"/><w:left w:val="none" w:sz="0" w:space="0"/><w:bottom w:val="none" w:sz="0" w:space="0"/><w:right w:val="none" w:sz="0" w:space="0"/><w:insideH w:val="none" w:sz="0" w:space="0"/><w:insideV w:val="none" w:sz="0" w:space="0"/></w:tblBorders>
<w:tblLayout w:type="fixed"/>
</w:tblPr>
<w:tblGrid><w:gridCol w:w="4680"/><w:gridCol w:w="4680"/></w:tblGrid>
<w:tr>
<w:tc>
<w:tcPr><w:tcW w:w="4680" w:type="dxa"/><w:tcBorders><w:top w:val="none"/><w:left w:val="none"/><w:bottom w:val="none"/><w:right w:val="none"/></w:tcBorders></w:tcPr>
<w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r>{rpr}<w:t xml:space="preserve">{title}</w:t></w:r></w:p>
</w:tc>
<w:tc>
<w:tcPr><w:tcW w:w="4680" w:type="dxa"/><w:tcBorders><w:top w:val="none"/><w:left w:val="none"/><w:bottom w:val="none"/><w:right w:val="none"/></w:tcBorders></w:tcPr>
<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r>{rpr}<w:fldChar w:fldCharType="begin"/></w:r><w:r>{rpr}<w:instrText xml:space="preserve"> PAGE </w:instrText></w:r><w:r>{rpr}<w:fldChar w:fldCharType="end"/></w:r></w:p>
</w:tc>
</w:tr>
</w:tbl>
<w:p><w:pPr><w:spacing w:before="0" w:after="0"/></w:pPr></w:p>
</w:hdr>
"#
    )
}
