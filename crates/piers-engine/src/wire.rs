//! # Wire Format
//!
//! The remote document service describes a body as loosely-typed JSON in
//! which every element is an object with optional payload fields. This module
//! deserializes that shape and converts it into the closed [`tree`] types.
//!
//! Payloads the tree does not model are not errors. Structural elements such
//! as horizontal rules are skipped, a table of contents contributes its
//! paragraphs, and unknown inline elements (footnote references, people,
//! rich links, equations) become anonymous inline placeholders spanning the
//! indices the remote reports for them. Elements carrying several payloads or
//! a negative length are rejected.
//!
//! [`tree`]: crate::tree

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::tree::{
    Image, InlineImage, ListKind, NamedStyle, Paragraph, ParagraphStyle, Run, Snapshot,
    StructuralElement, Table, TableCell, TableRow, TextRun, TextStyle,
};

/// Deepest table nesting accepted before the tree is considered malformed.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<WireBody>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<WireTab>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTab {
    #[serde(default)]
    pub tab_properties: Option<TabProperties>,
    #[serde(default)]
    pub document_tab: Option<DocumentTab>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_tabs: Vec<WireTab>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabProperties {
    pub tab_id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentTab {
    #[serde(default)]
    pub body: Option<WireBody>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireBody {
    #[serde(default)]
    pub content: Vec<WireElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<WireParagraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<WireTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_break: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<WireImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<WireTableOfContents>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireTableOfContents {
    #[serde(default)]
    pub content: Vec<WireElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParagraph {
    #[serde(default)]
    pub elements: Vec<WireParagraphElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_style: Option<WireParagraphStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParagraphStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_style_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParagraphElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<WireTextRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_object_element: Option<WireInlineObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_break: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTextRun {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<WireTextStyle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTextStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_font_family: Option<WireFontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<WireDimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<WireColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<WireColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<WireLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFontFamily {
    pub font_family: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireDimension {
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireColor {
    #[serde(default)]
    pub color: Option<WireColorValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireColorValue {
    #[serde(default)]
    pub rgb_color: Option<WireRgb>,
}

/// Channels in `0.0..=1.0`; absent channels are zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireRgb {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireLink {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireInlineObject {
    #[serde(default)]
    pub inline_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage {
    #[serde(default)]
    pub source_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTable {
    #[serde(default)]
    pub table_rows: Vec<WireTableRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTableRow {
    #[serde(default)]
    pub table_cells: Vec<WireTableCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireTableCell {
    #[serde(default)]
    pub content: Vec<WireElement>,
}

impl WireDocument {
    /// A new document whose body is one empty paragraph.
    pub fn blank(document_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            title: title.into(),
            body: Some(WireBody {
                content: vec![WireElement::text("\n")],
            }),
            tabs: vec![],
        }
    }

    /// Converts the body of `tab_id`, or of the first tab, into a snapshot.
    ///
    /// Documents without tabs use their top-level body.
    pub fn into_snapshot(self, tab_id: Option<&str>) -> Result<Snapshot, EngineError> {
        let (selected, body, path) = match tab_id {
            Some(id) => {
                let tab = find_tab(&self.tabs, id).ok_or_else(|| EngineError::MalformedTree {
                    path: "tabs".into(),
                    reason: format!("no tab with id {id:?}"),
                })?;
                (Some(id.to_string()), tab_body(tab), "tab.body")
            }
            None => match self.tabs.first() {
                Some(tab) => (
                    tab.tab_properties.as_ref().map(|p| p.tab_id.clone()),
                    tab_body(tab),
                    "tabs[0].body",
                ),
                None => (None, self.body.as_ref(), "body"),
            },
        };

        let content = match body {
            Some(body) => convert_elements(&body.content, &format!("{path}.content"), 0)?,
            None => vec![],
        };
        Ok(Snapshot::new(self.document_id, selected, content).with_title(self.title))
    }
}

impl WireElement {
    /// A paragraph element holding one unstyled run.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            paragraph: Some(WireParagraph {
                elements: vec![WireParagraphElement {
                    text_run: Some(WireTextRun {
                        content: content.into(),
                        text_style: None,
                    }),
                    ..WireParagraphElement::default()
                }],
                ..WireParagraph::default()
            }),
            ..Self::default()
        }
    }
}

fn find_tab<'a>(tabs: &'a [WireTab], id: &str) -> Option<&'a WireTab> {
    tabs.iter().find_map(|tab| {
        if tab.tab_properties.as_ref().is_some_and(|p| p.tab_id == id) {
            Some(tab)
        } else {
            find_tab(&tab.child_tabs, id)
        }
    })
}

fn tab_body(tab: &WireTab) -> Option<&WireBody> {
    tab.document_tab.as_ref().and_then(|t| t.body.as_ref())
}

fn malformed(path: &str, reason: impl Into<String>) -> EngineError {
    EngineError::MalformedTree {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn convert_elements(
    elements: &[WireElement],
    path: &str,
    depth: usize,
) -> Result<Vec<StructuralElement>, EngineError> {
    if depth > MAX_DEPTH {
        return Err(malformed(path, format!("tables nested deeper than {MAX_DEPTH}")));
    }

    let mut out = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let path = format!("{path}[{i}]");
        if let (Some(start), Some(end)) = (element.start_index, element.end_index)
            && end < start
        {
            return Err(malformed(&path, "negative-length element"));
        }

        let payloads = [
            element.paragraph.is_some(),
            element.table.is_some(),
            element.page_break.is_some(),
            element.image.is_some(),
            element.table_of_contents.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        match payloads {
            0 => {
                log::debug!("skipping {path}: no content the tree models");
                continue;
            }
            1 => {}
            n => return Err(malformed(&path, format!("element has {n} payloads"))),
        }

        if let Some(paragraph) = &element.paragraph {
            convert_paragraph(paragraph, &format!("{path}.paragraph"), &mut out)?;
        } else if let Some(table) = &element.table {
            out.push(StructuralElement::Table(convert_table(
                table,
                &format!("{path}.table"),
                depth,
            )?));
        } else if element.page_break.is_some() {
            out.push(StructuralElement::PageBreak);
        } else if let Some(image) = &element.image {
            out.push(StructuralElement::Image(Image {
                source_uri: image.source_uri.clone(),
            }));
        } else if let Some(contents) = &element.table_of_contents {
            out.extend(convert_elements(
                &contents.content,
                &format!("{path}.tableOfContents.content"),
                depth + 1,
            )?);
        }
    }
    Ok(out)
}

/// Appends the paragraph to `out`, split around any page breaks it holds.
fn convert_paragraph(
    paragraph: &WireParagraph,
    path: &str,
    out: &mut Vec<StructuralElement>,
) -> Result<(), EngineError> {
    let style = convert_paragraph_style(paragraph);
    let mut runs = vec![];

    let flush = |runs: &mut Vec<Run>, out: &mut Vec<StructuralElement>| {
        if !runs.is_empty() {
            let mut p = Paragraph::new(std::mem::take(runs));
            p.style = style.clone();
            out.push(StructuralElement::Paragraph(p));
        }
    };

    for (i, element) in paragraph.elements.iter().enumerate() {
        let path = format!("{path}.elements[{i}]");
        if let (Some(start), Some(end)) = (element.start_index, element.end_index)
            && end < start
        {
            return Err(malformed(&path, "negative-length run"));
        }

        let payloads = [
            element.text_run.is_some(),
            element.inline_object_element.is_some(),
            element.page_break.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        if payloads > 1 {
            return Err(malformed(
                &path,
                format!("paragraph element has {payloads} payloads, expected 1"),
            ));
        }

        if payloads == 0 {
            let span = match (element.start_index, element.end_index) {
                (Some(start), Some(end)) => end - start,
                _ => 1,
            };
            log::debug!("{path}: unmodelled inline element kept as {span} placeholder(s)");
            runs.extend((0..span).map(|_| Run::InlineImage(InlineImage::default())));
        } else if let Some(run) = &element.text_run {
            runs.push(Run::Text(TextRun {
                text: run.content.clone(),
                style: run.text_style.as_ref().map(convert_text_style),
            }));
        } else if let Some(object) = &element.inline_object_element {
            runs.push(Run::InlineImage(InlineImage {
                object_id: object.inline_object_id.clone(),
            }));
        } else {
            flush(&mut runs, out);
            out.push(StructuralElement::PageBreak);
        }
    }
    flush(&mut runs, out);
    Ok(())
}

fn convert_paragraph_style(paragraph: &WireParagraph) -> Option<ParagraphStyle> {
    let named_style = paragraph
        .paragraph_style
        .as_ref()
        .and_then(|s| s.named_style_type.as_deref())
        .and_then(NamedStyle::parse);
    let bullet = paragraph.bullet.as_ref().map(|_| ListKind::Bulleted);
    if named_style.is_none() && bullet.is_none() {
        return None;
    }
    Some(ParagraphStyle {
        named_style,
        bullet,
    })
}

fn convert_text_style(style: &WireTextStyle) -> TextStyle {
    TextStyle {
        bold: style.bold,
        italic: style.italic,
        underline: style.underline,
        strikethrough: style.strikethrough,
        font_family: style
            .weighted_font_family
            .as_ref()
            .map(|f| f.font_family.clone()),
        font_size: style.font_size.as_ref().map(|d| d.magnitude),
        foreground_color: style.foreground_color.as_ref().and_then(hex_color),
        background_color: style.background_color.as_ref().and_then(hex_color),
        link_url: style.link.as_ref().and_then(|l| l.url.clone()),
    }
}

fn hex_color(color: &WireColor) -> Option<String> {
    let rgb = color.color.as_ref()?.rgb_color.as_ref()?;
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(format!(
        "#{:02X}{:02X}{:02X}",
        channel(rgb.red),
        channel(rgb.green),
        channel(rgb.blue)
    ))
}

fn convert_table(table: &WireTable, path: &str, depth: usize) -> Result<Table, EngineError> {
    let rows = table
        .table_rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let cells = row
                .table_cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    let path = format!("{path}.tableRows[{r}].tableCells[{c}].content");
                    Ok(TableCell {
                        content: convert_elements(&cell.content, &path, depth + 1)?,
                    })
                })
                .collect::<Result<Vec<_>, EngineError>>()?;
            Ok(TableRow { cells })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    Ok(Table { rows })
}
