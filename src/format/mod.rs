//! Formatting options, directive application, and reporting.

mod apply;
mod options;
mod report;

pub use apply::apply_directive;
pub use options::{BodySpacing, FormatOptions};
pub use report::FormatReport;

use crate::classify::{classify, FormatDirective};
use crate::model::Document;

/// Apply APA formatting to a parsed document model.
///
/// This is the model-level counterpart of [`crate::format_bytes`]: it
/// classifies every paragraph and applies the matching directive in place,
/// without touching a DOCX container. Useful for previewing what the
/// formatter would do.
pub fn format_document(document: &mut Document, options: &FormatOptions) -> FormatReport {
    let mut report = FormatReport::new();
    let body_spacing = options.body_spacing.multiplier();

    for paragraph in &mut document.paragraphs {
        let level = classify(&paragraph.runs);
        report.record(level);
        let directive = FormatDirective::for_classification(level, body_spacing);
        if apply_directive(paragraph, &directive, options) {
            report.periods_appended += 1;
        }
    }

    report
}
