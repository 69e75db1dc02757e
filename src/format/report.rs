//! Formatting statistics.

use crate::classify::HeadingLevel;
use serde::{Deserialize, Serialize};

/// Statistics gathered while formatting one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatReport {
    /// Body-level paragraphs seen
    pub paragraphs: usize,

    /// Paragraphs classified as body text
    pub body: usize,

    /// Paragraphs per heading level, index 0 = level 1
    pub headings: [usize; 5],

    /// Trailing-period runs appended
    pub periods_appended: usize,

    /// Header parts written or replaced
    pub headers_written: usize,

    /// Sections whose margins were rewritten
    pub sections: usize,
}

impl FormatReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one classified paragraph.
    pub fn record(&mut self, level: Option<HeadingLevel>) {
        self.paragraphs += 1;
        match level {
            Some(level) => self.headings[(level.rank() - 1) as usize] += 1,
            None => self.body += 1,
        }
    }

    /// Total heading paragraphs across all levels.
    pub fn heading_total(&self) -> usize {
        self.headings.iter().sum()
    }
}

impl std::fmt::Display for FormatReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} paragraphs ({} headings, {} body), {} periods appended, {} headers",
            self.paragraphs,
            self.heading_total(),
            self.body,
            self.periods_appended,
            self.headers_written
        )
    }
}
