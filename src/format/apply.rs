//! Directive application against the document model.
//!
//! The XML transformer in [`crate::docx`] performs the same policy directly
//! on WordprocessingML; this model-level applier keeps the policy observable
//! without a container round trip.

use crate::classify::FormatDirective;
use crate::format::FormatOptions;
use crate::model::{Paragraph, TextRun, TextStyle};

/// Apply a formatting directive to a paragraph in place.
///
/// Returns `true` when a trailing-period run was appended. Directives
/// overwrite style state rather than accumulating, so applying the same
/// directive twice is a no-op the second time.
pub fn apply_directive(
    paragraph: &mut Paragraph,
    directive: &FormatDirective,
    options: &FormatOptions,
) -> bool {
    paragraph.style.alignment = directive.alignment;
    paragraph.style.first_line_indent = Some(directive.first_line_indent);
    paragraph.style.line_spacing = Some(directive.line_spacing);
    paragraph.style.space_before = Some(0.0);
    paragraph.style.space_after = Some(0.0);

    for run in &mut paragraph.runs {
        run.style.font_name = Some(options.font_name.clone());
        run.style.font_size = Some(options.font_size);
        if directive.forces_run_style() {
            run.style.bold = directive.bold;
            run.style.italic = directive.italic;
        }
    }

    if directive.trailing_period && !paragraph.plain_text().trim_end().ends_with('.') {
        paragraph.add_run(TextRun {
            text: ".".to_string(),
            style: TextStyle {
                bold: directive.bold,
                italic: directive.italic,
                font_name: Some(options.font_name.clone()),
                font_size: Some(options.font_size),
            },
        });
        return true;
    }

    false
}
