//! # apadoc
//!
//! APA 7th edition formatting for DOCX documents.
//!
//! The library classifies paragraphs by the font size of their runs:
//! anything over 15 pt is a heading, mapped to one of the five APA
//! heading levels, and everything else is body text. It then rewrites
//! the document so each paragraph carries the alignment, indent,
//! spacing, and run styling its level prescribes, sets one-inch page
//! margins, and installs a page header with the running head on the
//! left and an automatic page number on the right.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apadoc::format_file;
//!
//! fn main() -> apadoc::Result<()> {
//!     // Writes "paper_APA.docx" next to the input
//!     let outcome = format_file("paper.docx")?;
//!     println!("{}", outcome.report);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Font-size heading detection**: five levels from run sizes alone
//! - **Lossless rewriting**: tables, images, and footnotes pass through
//! - **APA page setup**: 1" margins, running head, page numbers
//! - **Trailing periods**: appended to level 4 and 5 headings
//! - **Inspection**: classify without writing anything

pub mod classify;
pub mod detect;
pub mod docx;
pub mod error;
pub mod format;
pub mod model;

// Re-export commonly used types
pub use classify::{classify, FormatDirective, HeadingLevel, HEADING_THRESHOLD_PT};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use docx::{read_document, read_document_from_bytes};
pub use error::{Error, Result};
pub use format::{format_document, BodySpacing, FormatOptions, FormatReport};
pub use model::{
    Alignment, Document, Margins, Metadata, Paragraph, ParagraphStyle, Section, TextRun, TextStyle,
};

use std::path::{Path, PathBuf};

/// Suffix appended to the input file stem for the default output path.
pub const OUTPUT_SUFFIX: &str = "_APA";

/// What a formatting run produced.
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    /// Where the formatted document was written
    pub output_path: PathBuf,
    /// Counts of what was reformatted
    pub report: FormatReport,
}

/// Format a DOCX file with default options.
///
/// The output is written next to the input as `<stem>_APA.docx` and the
/// running head defaults to the uppercased file stem.
///
/// # Example
///
/// ```no_run
/// use apadoc::format_file;
///
/// let outcome = format_file("thesis.docx").unwrap();
/// assert!(outcome.output_path.ends_with("thesis_APA.docx"));
/// ```
pub fn format_file<P: AsRef<Path>>(path: P) -> Result<FormatOutcome> {
    format_file_with_options(path, &FormatOptions::default())
}

/// Format a DOCX file with custom options.
///
/// # Example
///
/// ```no_run
/// use apadoc::{format_file_with_options, BodySpacing, FormatOptions};
///
/// let options = FormatOptions::new()
///     .with_running_head("COGNITIVE LOAD IN UI DESIGN")
///     .with_body_spacing(BodySpacing::OnePointFive);
/// format_file_with_options("thesis.docx", &options).unwrap();
/// ```
pub fn format_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &FormatOptions,
) -> Result<FormatOutcome> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let stem = file_stem(path);

    let (bytes, report) = docx::transform(&data, &stem, options)?;
    let output_path = output_path_for(path);
    std::fs::write(&output_path, bytes)?;

    log::info!("wrote {}", output_path.display());
    Ok(FormatOutcome {
        output_path,
        report,
    })
}

/// Format DOCX bytes in memory.
///
/// `stem` stands in for the file stem when deriving the running head.
pub fn format_bytes(
    data: &[u8],
    stem: &str,
    options: &FormatOptions,
) -> Result<(Vec<u8>, FormatReport)> {
    docx::transform(data, stem, options)
}

/// Default output path for an input: `<stem>_APA.docx` in the same
/// directory.
pub fn output_path_for(path: &Path) -> PathBuf {
    let stem = file_stem(path);
    path.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.docx"))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string())
}

/// Builder for formatting DOCX documents.
///
/// # Example
///
/// ```no_run
/// use apadoc::{Apadoc, BodySpacing};
///
/// let outcome = Apadoc::new()
///     .running_head("WORKING MEMORY AND RECALL")
///     .body_spacing(BodySpacing::Double)
///     .format("paper.docx")?;
/// # Ok::<(), apadoc::Error>(())
/// ```
pub struct Apadoc {
    options: FormatOptions,
    output: Option<PathBuf>,
}

impl Apadoc {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: FormatOptions::default(),
            output: None,
        }
    }

    /// Set the running head shown in the page header.
    pub fn running_head(mut self, title: impl Into<String>) -> Self {
        self.options = self.options.with_running_head(title);
        self
    }

    /// Set the body line spacing.
    pub fn body_spacing(mut self, spacing: BodySpacing) -> Self {
        self.options = self.options.with_body_spacing(spacing);
        self
    }

    /// Set the font applied to every run.
    pub fn font_name(mut self, name: impl Into<String>) -> Self {
        self.options = self.options.with_font_name(name);
        self
    }

    /// Set the font size in points applied to every run.
    pub fn font_size(mut self, size: f32) -> Self {
        self.options = self.options.with_font_size(size);
        self
    }

    /// Skip writing the page header.
    pub fn no_header(mut self) -> Self {
        self.options = self.options.with_header(false);
        self
    }

    /// Write the output to an explicit path instead of `<stem>_APA.docx`.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Format a file.
    pub fn format<P: AsRef<Path>>(self, path: P) -> Result<FormatOutcome> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let stem = file_stem(path);

        let (bytes, report) = docx::transform(&data, &stem, &self.options)?;
        let output_path = self.output.unwrap_or_else(|| output_path_for(path));
        std::fs::write(&output_path, bytes)?;

        log::info!("wrote {}", output_path.display());
        Ok(FormatOutcome {
            output_path,
            report,
        })
    }

    /// Format bytes in memory.
    pub fn format_bytes(self, data: &[u8], stem: &str) -> Result<(Vec<u8>, FormatReport)> {
        docx::transform(data, stem, &self.options)
    }
}

impl Default for Apadoc {
    fn default() -> Self {
        Self::new()
    }
}
