//! Heading classification policy.
//!
//! APA 7 uses five heading levels, all at 12 pt in the output; the *input*
//! distinguishes them by oversized fonts. A paragraph is a heading iff any
//! of its runs has an explicit font size above [`HEADING_THRESHOLD_PT`],
//! and the level follows from the largest run size. The per-level
//! formatting lives in a fixed directive table so the policy can be tested
//! without touching a document.

use crate::model::{Alignment, TextRun};
use serde::{Deserialize, Serialize};

/// Font size in points above which a run marks its paragraph as a heading.
pub const HEADING_THRESHOLD_PT: f32 = 15.0;

/// First-line indent used for body text and deep headings, in points (0.5").
pub const HALF_INCH_PT: f32 = 36.0;

/// Line spacing applied to every heading.
pub const HEADING_LINE_SPACING: f32 = 2.0;

/// APA heading level. Level 1 is the most prominent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl HeadingLevel {
    /// Numeric rank, 1..=5.
    pub fn rank(self) -> u8 {
        match self {
            HeadingLevel::One => 1,
            HeadingLevel::Two => 2,
            HeadingLevel::Three => 3,
            HeadingLevel::Four => 4,
            HeadingLevel::Five => 5,
        }
    }

    /// Map a font size to a heading level.
    ///
    /// Thresholds are checked in descending order; the first match wins.
    /// Sizes at or below [`HEADING_THRESHOLD_PT`] are not headings.
    pub fn from_font_size(size_pt: f32) -> Option<Self> {
        if size_pt >= 24.0 {
            Some(HeadingLevel::One)
        } else if size_pt >= 20.0 {
            Some(HeadingLevel::Two)
        } else if size_pt >= 18.0 {
            Some(HeadingLevel::Three)
        } else if size_pt >= 16.0 {
            Some(HeadingLevel::Four)
        } else if size_pt > HEADING_THRESHOLD_PT {
            Some(HeadingLevel::Five)
        } else {
            None
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "H{}", self.rank())
    }
}

/// Classify a paragraph's runs.
///
/// Returns the heading level, or `None` for body text. Runs with no
/// explicit size never contribute; a paragraph whose runs are all
/// sizeless is body text. Total and deterministic in the run sizes alone.
pub fn classify(runs: &[TextRun]) -> Option<HeadingLevel> {
    let max_heading_size = runs
        .iter()
        .filter_map(|r| r.style.font_size)
        .filter(|s| *s > HEADING_THRESHOLD_PT)
        .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |m| m.max(s))));

    max_heading_size.and_then(HeadingLevel::from_font_size)
}

/// Immutable formatting directive for one classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatDirective {
    /// Paragraph alignment
    pub alignment: Alignment,
    /// First-line indent in points
    pub first_line_indent: f32,
    /// Force bold on every run (headings only)
    pub bold: bool,
    /// Force italic on/off on every run (headings only)
    pub italic: bool,
    /// Append a `.` run when the visible text does not end with one
    pub trailing_period: bool,
    /// Line spacing multiplier
    pub line_spacing: f32,
}

/// Per-level heading directives, indexed by `rank - 1`.
const HEADING_DIRECTIVES: [FormatDirective; 5] = [
    // Level 1: centered, bold
    FormatDirective {
        alignment: Alignment::Center,
        first_line_indent: 0.0,
        bold: true,
        italic: false,
        trailing_period: false,
        line_spacing: HEADING_LINE_SPACING,
    },
    // Level 2: flush left, bold
    FormatDirective {
        alignment: Alignment::Left,
        first_line_indent: 0.0,
        bold: true,
        italic: false,
        trailing_period: false,
        line_spacing: HEADING_LINE_SPACING,
    },
    // Level 3: flush left, bold italic
    FormatDirective {
        alignment: Alignment::Left,
        first_line_indent: 0.0,
        bold: true,
        italic: true,
        trailing_period: false,
        line_spacing: HEADING_LINE_SPACING,
    },
    // Level 4: indented, bold, ends with a period
    FormatDirective {
        alignment: Alignment::Left,
        first_line_indent: HALF_INCH_PT,
        bold: true,
        italic: false,
        trailing_period: true,
        line_spacing: HEADING_LINE_SPACING,
    },
    // Level 5: indented, bold italic, ends with a period
    FormatDirective {
        alignment: Alignment::Left,
        first_line_indent: HALF_INCH_PT,
        bold: true,
        italic: true,
        trailing_period: true,
        line_spacing: HEADING_LINE_SPACING,
    },
];

impl FormatDirective {
    /// Directive for a heading level.
    pub fn heading(level: HeadingLevel) -> Self {
        HEADING_DIRECTIVES[(level.rank() - 1) as usize]
    }

    /// Directive for body text at the given line spacing.
    ///
    /// Body bold/italic are never forced; the `bold`/`italic` fields are
    /// ignored by appliers for body directives.
    pub fn body(line_spacing: f32) -> Self {
        FormatDirective {
            alignment: Alignment::Justify,
            first_line_indent: HALF_INCH_PT,
            bold: false,
            italic: false,
            trailing_period: false,
            line_spacing,
        }
    }

    /// Whether this directive forces bold/italic onto every run.
    ///
    /// Every heading level is bold, so this distinguishes heading
    /// directives from body ones; body runs keep their own weight.
    pub fn forces_run_style(&self) -> bool {
        self.bold || self.italic
    }

    /// Directive for a classification outcome.
    pub fn for_classification(level: Option<HeadingLevel>, body_spacing: f32) -> Self {
        match level {
            Some(level) => Self::heading(level),
            None => Self::body(body_spacing),
        }
    }
}
