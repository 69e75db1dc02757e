//! Document model types for WordprocessingML content.
//!
//! This module defines the intermediate representation that bridges DOCX
//! parsing and formatting. Only what the formatter needs survives a read:
//! body-level paragraphs with their runs, section geometry, and package
//! metadata. Tables and other block content pass through the transformer
//! untouched and never reach the model.

mod document;
mod paragraph;

pub use document::{Document, Margins, Metadata, Section};
pub use paragraph::{Alignment, Paragraph, ParagraphStyle, TextRun, TextStyle};
