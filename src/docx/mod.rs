//! DOCX package I/O.
//!
//! The reader builds the in-memory [`Document`](crate::model::Document)
//! model; the writer rewrites a package in place at the XML event level so
//! content the model does not represent (tables, images, footnotes) passes
//! through untouched.

pub mod header;
pub mod reader;
pub mod writer;
pub(crate) mod xml;

pub use reader::{read_document, read_document_from_bytes};
pub use writer::transform;
