//! # Element Tree
//!
//! Immutable representation of a document body as nested structural elements.
//!
//! No element stores an absolute offset. Offsets are always derived from a
//! [`Snapshot`] by walking it (see [`offsets`]), so a tree can never disagree
//! with its own index space.
//!
//! ## Modules
//!
//! - **`offsets`**: lazy `(leaf, start)` iterator, `OffsetMap` and block spans
//! - **`extract`**: flattened plain-text projection with optional truncation

pub mod extract;
pub mod offsets;

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Length of `text` in document indices.
///
/// Every length computation in the engine goes through here.
pub fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Identity of one read of a document.
///
/// Two reads of the same document produce different ids, so a range resolved
/// against one read can be told apart from a range resolved against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The body of a document as read at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    id: SnapshotId,
    document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tab_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    body: Vec<StructuralElement>,
}

impl Snapshot {
    pub fn new(
        document_id: impl Into<String>,
        tab_id: Option<String>,
        body: Vec<StructuralElement>,
    ) -> Self {
        Self {
            id: SnapshotId::new(),
            document_id: document_id.into(),
            tab_id,
            title: None,
            body,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn tab_id(&self) -> Option<&str> {
        self.tab_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn body(&self) -> &[StructuralElement] {
        &self.body
    }
}

/// A block-level element of a body or table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StructuralElement {
    Paragraph(Paragraph),
    Table(Table),
    PageBreak,
    Image(Image),
}

impl StructuralElement {
    /// A paragraph holding a single unstyled run.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(Paragraph::new(vec![Run::Text(TextRun::plain(text))]))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub runs: Vec<Run>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParagraphStyle>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs, style: None }
    }

    pub fn styled(mut self, style: ParagraphStyle) -> Self {
        self.style = Some(style);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named_style: Option<NamedStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<ListKind>,
}

/// Built-in paragraph styles understood by the remote document service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NamedStyle {
    #[serde(rename = "NORMAL_TEXT")]
    NormalText,
    #[serde(rename = "TITLE")]
    Title,
    #[serde(rename = "SUBTITLE")]
    Subtitle,
    #[serde(rename = "HEADING_1")]
    Heading1,
    #[serde(rename = "HEADING_2")]
    Heading2,
    #[serde(rename = "HEADING_3")]
    Heading3,
    #[serde(rename = "HEADING_4")]
    Heading4,
    #[serde(rename = "HEADING_5")]
    Heading5,
    #[serde(rename = "HEADING_6")]
    Heading6,
}

impl NamedStyle {
    /// Heading style for a level in `1..=6`.
    pub fn heading(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Heading1),
            2 => Some(Self::Heading2),
            3 => Some(Self::Heading3),
            4 => Some(Self::Heading4),
            5 => Some(Self::Heading5),
            6 => Some(Self::Heading6),
            _ => None,
        }
    }

    /// Heading level, with the title style counting as level 1.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            Self::Title | Self::Heading1 => Some(1),
            Self::Heading2 => Some(2),
            Self::Heading3 => Some(3),
            Self::Heading4 => Some(4),
            Self::Heading5 => Some(5),
            Self::Heading6 => Some(6),
            Self::NormalText | Self::Subtitle => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "NORMAL_TEXT" => Some(Self::NormalText),
            "TITLE" => Some(Self::Title),
            "SUBTITLE" => Some(Self::Subtitle),
            "HEADING_1" => Some(Self::Heading1),
            "HEADING_2" => Some(Self::Heading2),
            "HEADING_3" => Some(Self::Heading3),
            "HEADING_4" => Some(Self::Heading4),
            "HEADING_5" => Some(Self::Heading5),
            "HEADING_6" => Some(Self::Heading6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    Bulleted,
    Numbered,
}

/// An inline piece of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Run {
    Text(TextRun),
    InlineImage(InlineImage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }
}

/// Character formatting carried by a text run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableCell {
    pub content: Vec<StructuralElement>,
}

impl TableCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![StructuralElement::paragraph(text)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_len_counts_scalar_values() {
        assert_eq!(text_len("hello"), 5);
        assert_eq!(text_len("héllo"), 5);
        assert_eq!(text_len(""), 0);
    }

    #[test]
    fn every_read_gets_a_fresh_id() {
        let a = Snapshot::new("doc", None, vec![]);
        let b = Snapshot::new("doc", None, vec![]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn named_style_round_trips_through_its_name() {
        for level in 1..=6 {
            let style = NamedStyle::heading(level).unwrap();
            assert_eq!(style.heading_level(), Some(level));
        }
        assert_eq!(NamedStyle::heading(7), None);
        assert_eq!(NamedStyle::parse("TITLE"), Some(NamedStyle::Title));
        assert_eq!(NamedStyle::parse("HEADING_9"), None);
    }
}
