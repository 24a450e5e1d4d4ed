//! Renders a snapshot back into the markup grammar.
//!
//! Only what the grammar can express survives: heading levels, list
//! markers, and bold, italic, strikethrough and link runs. Table cells are
//! rendered as consecutive paragraphs; placeholders are dropped.

use super::kinds::{Emphasis, Link, Prefix, Strike, Strong};
use crate::tree::{ListKind, Paragraph, Run, Snapshot, StructuralElement, TextRun};

pub fn to_markup(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    render_elements(snapshot.body(), &mut out);
    out
}

fn render_elements(elements: &[StructuralElement], out: &mut String) {
    for element in elements {
        match element {
            StructuralElement::Paragraph(paragraph) => render_paragraph(paragraph, out),
            StructuralElement::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    render_elements(&cell.content, out);
                }
            }
            StructuralElement::PageBreak | StructuralElement::Image(_) => {}
        }
    }
}

fn render_paragraph(paragraph: &Paragraph, out: &mut String) {
    let mut line = String::new();
    for run in &paragraph.runs {
        if let Run::Text(run) = run {
            render_run(run, &mut line);
        }
    }
    let line = line.trim_end_matches('\n');
    if line.is_empty() {
        out.push('\n');
        return;
    }

    let style = paragraph.style.as_ref();
    if let Some(level) = style
        .and_then(|s| s.named_style)
        .and_then(|s| s.heading_level())
    {
        out.extend(std::iter::repeat_n(Prefix::HEADING, level as usize));
        out.push(' ');
    } else {
        match style.and_then(|s| s.bullet) {
            Some(ListKind::Bulleted) => out.push_str(Prefix::BULLET),
            Some(ListKind::Numbered) => out.push_str(Prefix::NUMBERED),
            None => {}
        }
    }
    out.push_str(line);
    out.push('\n');
}

/// Wraps the run's text in markers, keeping edge whitespace and line breaks
/// outside them.
fn render_run(run: &TextRun, out: &mut String) {
    let Some(style) = run.style.as_ref() else {
        out.push_str(&run.text);
        return;
    };
    let core = run.text.trim();
    if core.is_empty() {
        out.push_str(&run.text);
        return;
    }
    let lead = &run.text[..run.text.len() - run.text.trim_start().len()];
    let trail = &run.text[lead.len() + core.len()..];

    let mut text = core.to_string();
    if style.italic {
        text = format!("{0}{text}{0}", Emphasis::STAR as char);
    }
    if style.bold {
        text = format!("{0}{text}{0}", Strong::STARS);
    }
    if style.strikethrough {
        text = format!("{0}{text}{0}", Strike::TILDES);
    }
    if let Some(url) = &style.link_url {
        text = format!(
            "{}{text}{}{url}{}",
            Link::OPEN as char,
            Link::LABEL_CLOSE,
            Link::CLOSE as char
        );
    }

    out.push_str(lead);
    out.push_str(&text);
    out.push_str(trail);
}
