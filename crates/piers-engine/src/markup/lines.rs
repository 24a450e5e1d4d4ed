//! Line productions of the markup grammar.

use std::sync::OnceLock;

use regex::Regex;

/// What a non-blank line produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `#` through `######`.
    Heading(u8),
    Bulleted,
    Numbered,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub kind: LineKind,
    /// The line with its prefix removed, inline markers still present.
    pub content: &'a str,
}

/// Classifies one line, or `None` for a blank line.
pub fn classify(line: &str) -> Option<Line<'_>> {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    static BULLET: OnceLock<Regex> = OnceLock::new();
    static NUMBERED: OnceLock<Regex> = OnceLock::new();

    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let heading =
        HEADING.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("Invalid heading regex"));
    if let Some(caps) = heading.captures(line) {
        let level = caps.get(1).map_or(1, |m| m.len()) as u8;
        let content = caps.get(2).map_or("", |m| m.as_str().trim_end());
        return Some(Line {
            kind: LineKind::Heading(level),
            content,
        });
    }

    let bullet =
        BULLET.get_or_init(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("Invalid bullet regex"));
    if let Some(caps) = bullet.captures(line) {
        return Some(Line {
            kind: LineKind::Bulleted,
            content: caps.get(1).map_or("", |m| m.as_str()),
        });
    }

    let numbered = NUMBERED
        .get_or_init(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").expect("Invalid numbered list regex"));
    if let Some(caps) = numbered.captures(line) {
        return Some(Line {
            kind: LineKind::Numbered,
            content: caps.get(1).map_or("", |m| m.as_str()),
        });
    }

    Some(Line {
        kind: LineKind::Plain,
        content: line,
    })
}
