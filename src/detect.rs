//! DOCX format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

/// ZIP local-file-header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Package part that every WordprocessingML document carries.
const MAIN_PART: &str = "word/document.xml";

/// DOCX container information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Number of parts in the package
    pub part_count: usize,
    /// Whether the package already carries a header part
    pub has_header_part: bool,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOCX ({} parts)", self.part_count)
    }
}

/// Detect DOCX format from a file path.
///
/// # Returns
/// * `Ok(DocxFormat)` if the file is a valid DOCX package
/// * `Err(Error::UnknownFormat)` if the file is not a DOCX
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    detect_format_from_bytes(&data)
}

/// Detect DOCX format from bytes.
///
/// Checks the ZIP magic and the presence of `word/document.xml`; a plain
/// ZIP archive without the main part is rejected.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    if !data.starts_with(ZIP_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let archive = ZipArchive::new(Cursor::new(data)).map_err(|_| Error::UnknownFormat)?;
    let names: Vec<&str> = archive.file_names().collect();

    if !names.iter().any(|n| *n == MAIN_PART) {
        return Err(Error::UnknownFormat);
    }

    Ok(DocxFormat {
        part_count: names.len(),
        has_header_part: names
            .iter()
            .any(|n| n.starts_with("word/header") && n.ends_with(".xml")),
    })
}

/// Check if a file is a valid DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
