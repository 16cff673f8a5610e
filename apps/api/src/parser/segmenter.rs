//! Section Segmenter: splits decoded resume text into named sections using
//! line heading heuristics.
//!
//! A line is a heading when it is shorter than `max_heading_chars` and contains
//! one of the configured keywords. Everything between two headings belongs to
//! the first one. Lines before the first heading are discarded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered heading keywords. The first keyword contained in a line wins.
pub const DEFAULT_SECTION_KEYWORDS: &[&str] = &[
    "summary",
    "objective",
    "profile",
    "experience",
    "work experience",
    "employment",
    "education",
    "academic background",
    "skills",
    "technical skills",
    "core competencies",
    "projects",
    "personal projects",
    "key projects",
];

/// Headings at or above this many characters are treated as body text.
pub const DEFAULT_MAX_HEADING_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
}

/// Substrings tested against a matched keyword, in priority order.
const CANONICAL_SUBSTRINGS: &[(&str, SectionKind)] = &[
    ("experience", SectionKind::Experience),
    ("education", SectionKind::Education),
    ("skill", SectionKind::Skills),
    ("project", SectionKind::Projects),
    ("summary", SectionKind::Summary),
    ("objective", SectionKind::Summary),
    ("profile", SectionKind::Summary),
    // second tier for keywords that name none of the above
    ("employment", SectionKind::Experience),
    ("work", SectionKind::Experience),
    ("academic", SectionKind::Education),
    ("competenc", SectionKind::Skills),
];

impl SectionKind {
    /// Maps a heading keyword onto its canonical section.
    pub fn canonicalize(keyword: &str) -> Option<SectionKind> {
        let keyword = keyword.to_lowercase();
        CANONICAL_SUBSTRINGS
            .iter()
            .find(|(needle, _)| keyword.contains(needle))
            .map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRule {
    pub keyword: String,
    pub section: SectionKind,
}

/// Tunable heading heuristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    pub headings: Vec<HeadingRule>,
    pub max_heading_chars: usize,
}

impl SegmenterConfig {
    /// Builds a config from an ordered keyword list. Fails on a keyword that
    /// does not map onto any section.
    pub fn from_keywords<I, S>(keywords: I, max_heading_chars: usize) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut headings = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            let section = SectionKind::canonicalize(&keyword)
                .ok_or_else(|| format!("heading keyword '{keyword}' maps to no section"))?;
            headings.push(HeadingRule { keyword, section });
        }
        if headings.is_empty() {
            return Err("at least one heading keyword is required".to_string());
        }
        Ok(Self {
            headings,
            max_heading_chars,
        })
    }

    /// Returns the section a line opens, if the line is a heading.
    pub fn classify(&self, line: &str) -> Option<SectionKind> {
        if line.chars().count() >= self.max_heading_chars {
            return None;
        }
        let lower = line.to_lowercase();
        self.headings
            .iter()
            .find(|rule| lower.contains(&rule.keyword))
            .map(|rule| rule.section)
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        let headings = DEFAULT_SECTION_KEYWORDS
            .iter()
            .filter_map(|keyword| {
                SectionKind::canonicalize(keyword).map(|section| HeadingRule {
                    keyword: keyword.to_string(),
                    section,
                })
            })
            .collect();
        Self {
            headings,
            max_heading_chars: DEFAULT_MAX_HEADING_CHARS,
        }
    }
}

pub type SectionMap = BTreeMap<SectionKind, String>;

/// Trimmed, non-blank lines of a document.
pub fn significant_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|l| !l.is_empty())
}

struct Fold<'a> {
    sections: SectionMap,
    current: Option<SectionKind>,
    buffer: Vec<&'a str>,
}

impl<'a> Fold<'a> {
    fn flush(mut self) -> SectionMap {
        if let Some(kind) = self.current {
            if !self.buffer.is_empty() {
                self.sections.insert(kind, self.buffer.join("\n"));
            }
        }
        self.sections
    }

    fn step(self, line: &'a str, config: &SegmenterConfig) -> Self {
        match config.classify(line) {
            Some(kind) => Fold {
                sections: self.flush(),
                current: Some(kind),
                buffer: Vec::new(),
            },
            None if self.current.is_some() => {
                let mut buffer = self.buffer;
                buffer.push(line);
                Fold { buffer, ..self }
            }
            None => self,
        }
    }
}

/// Segments trimmed, non-blank lines into a section map. An empty map means
/// no heading was recognised.
pub fn segment<'a, I>(lines: I, config: &SegmenterConfig) -> SectionMap
where
    I: IntoIterator<Item = &'a str>,
{
    let start = Fold {
        sections: SectionMap::new(),
        current: None,
        buffer: Vec::new(),
    };
    lines
        .into_iter()
        .fold(start, |state, line| state.step(line, config))
        .flush()
}

/// Convenience wrapper: segment raw document text.
pub fn segment_text(text: &str, config: &SegmenterConfig) -> SectionMap {
    segment(significant_lines(text), config)
}
