//! Inline spans within one line.
//!
//! Precedence at each position: link, strong, strike, then emphasis. A
//! construct whose closer is missing, or whose content would be empty, is
//! left as literal text.

use super::cursor::Cursor;
use super::kinds::{Emphasis, Link, Strike, Strong};
use crate::editing::TextStylePatch;
use crate::tree::text_len;

#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode<'a> {
    Text(&'a str),
    Strong(Vec<InlineNode<'a>>),
    Emphasis(Vec<InlineNode<'a>>),
    Strike(Vec<InlineNode<'a>>),
    Link {
        label: Vec<InlineNode<'a>>,
        url: &'a str,
    },
}

/// Parses `s` into inline nodes covering all of it.
pub fn parse_inline(s: &str) -> Vec<InlineNode<'_>> {
    let mut cur = Cursor::new(s);
    let mut out = vec![];
    let mut text_start = 0;

    fn flush_text<'a>(out: &mut Vec<InlineNode<'a>>, text: &'a str) {
        if !text.is_empty() {
            out.push(InlineNode::Text(text));
        }
    }

    while !cur.eof() {
        let start = cur.pos();
        let node = try_parse_link(&mut cur)
            .or_else(|| try_parse_pair(&mut cur, Strong::STARS, false).map(InlineNode::Strong))
            .or_else(|| {
                try_parse_pair(&mut cur, Strong::UNDERSCORES, true).map(InlineNode::Strong)
            })
            .or_else(|| try_parse_pair(&mut cur, Strike::TILDES, false).map(InlineNode::Strike))
            .or_else(|| try_parse_single(&mut cur, Emphasis::STAR, false).map(InlineNode::Emphasis))
            .or_else(|| {
                try_parse_single(&mut cur, Emphasis::UNDERSCORE, true).map(InlineNode::Emphasis)
            });

        match node {
            Some(node) => {
                flush_text(&mut out, &s[text_start..start]);
                out.push(node);
                text_start = cur.pos();
            }
            None => {
                cur.bump();
            }
        }
    }

    flush_text(&mut out, &s[text_start..]);
    out
}

fn is_word(c: Option<char>) -> bool {
    c.is_some_and(char::is_alphanumeric)
}

/// Attempts `[label](url)` at the cursor. On failure the cursor is restored.
fn try_parse_link<'a>(cur: &mut Cursor<'a>) -> Option<InlineNode<'a>> {
    if cur.peek() != Some(Link::OPEN) {
        return None;
    }
    let saved = cur.clone();
    cur.bump();
    let label_start = cur.pos();
    while !cur.eof() && !cur.starts_with(Link::LABEL_CLOSE.as_bytes()) {
        cur.bump();
    }
    let label = cur.since(label_start);
    if cur.eof() || label.is_empty() {
        *cur = saved;
        return None;
    }
    cur.bump_n(Link::LABEL_CLOSE.len());

    let url_start = cur.pos();
    while !cur.eof() && cur.peek() != Some(Link::CLOSE) {
        cur.bump();
    }
    let url = cur.since(url_start).trim();
    if cur.eof() || url.is_empty() {
        *cur = saved;
        return None;
    }
    cur.bump();

    Some(InlineNode::Link {
        label: parse_inline(label),
        url,
    })
}

/// Attempts a two-byte delimited span such as `**x**` or `~~x~~`.
///
/// With `flanking`, the opener may not follow a word character and the
/// closer may not precede one.
fn try_parse_pair<'a>(
    cur: &mut Cursor<'a>,
    delim: &'static str,
    flanking: bool,
) -> Option<Vec<InlineNode<'a>>> {
    let delim = delim.as_bytes();
    if !cur.starts_with(delim) || (flanking && is_word(cur.prev_char())) {
        return None;
    }
    let saved = cur.clone();
    cur.bump_n(delim.len());
    let inner_start = cur.pos();

    while !cur.eof() {
        if cur.starts_with(delim) && !(flanking && is_word(cur.char_after(delim.len()))) {
            break;
        }
        cur.bump();
    }
    let inner = cur.since(inner_start);
    if cur.eof() || inner.is_empty() {
        *cur = saved;
        return None;
    }
    cur.bump_n(delim.len());
    Some(parse_inline(inner))
}

/// Attempts a single-byte delimited span such as `*x*`.
///
/// Doubled markers inside are skipped as a unit so `*a **b** c*` closes at the
/// last star.
fn try_parse_single<'a>(
    cur: &mut Cursor<'a>,
    marker: u8,
    flanking: bool,
) -> Option<Vec<InlineNode<'a>>> {
    if cur.peek() != Some(marker) || (flanking && is_word(cur.prev_char())) {
        return None;
    }
    let saved = cur.clone();
    cur.bump();
    let inner_start = cur.pos();
    let doubled = [marker, marker];

    while !cur.eof() {
        if cur.pos() > inner_start && cur.starts_with(&doubled) {
            cur.bump_n(2);
            continue;
        }
        if cur.peek() == Some(marker) && !(flanking && is_word(cur.char_after(1))) {
            break;
        }
        cur.bump();
    }
    let inner = cur.since(inner_start);
    if cur.eof() || inner.is_empty() {
        *cur = saved;
        return None;
    }
    cur.bump();
    Some(parse_inline(inner))
}

/// A styled stretch of the visible text, in characters from its start.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    pub start: usize,
    pub end: usize,
    pub patch: TextStylePatch,
}

/// The visible text of a line plus the styles over it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineText {
    pub text: String,
    pub spans: Vec<StyledSpan>,
}

/// Strips markers from `s`, recording each styled span outermost first.
pub fn flatten(s: &str) -> InlineText {
    let mut out = InlineText::default();
    let mut len = 0;
    walk(&parse_inline(s), &mut out, &mut len);
    out
}

fn walk(nodes: &[InlineNode<'_>], out: &mut InlineText, len: &mut usize) {
    for node in nodes {
        let (children, patch) = match node {
            InlineNode::Text(text) => {
                out.text.push_str(text);
                *len += text_len(text);
                continue;
            }
            InlineNode::Strong(children) => (children, TextStylePatch::bold()),
            InlineNode::Emphasis(children) => (children, TextStylePatch::italic()),
            InlineNode::Strike(children) => (children, TextStylePatch::strikethrough()),
            InlineNode::Link { label, url } => (label, TextStylePatch::link(*url)),
        };
        let slot = out.spans.len();
        let start = *len;
        walk(children, out, len);
        out.spans.insert(
            slot,
            StyledSpan {
                start,
                end: *len,
                patch,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn span(start: usize, end: usize, patch: TextStylePatch) -> StyledSpan {
        StyledSpan { start, end, patch }
    }

    #[test]
    fn parse_plain_text() {
        assert_eq!(parse_inline("hello world"), vec![InlineNode::Text("hello world")]);
        assert_eq!(parse_inline(""), vec![]);
    }

    #[test]
    fn parse_each_construct() {
        assert_eq!(
            parse_inline("a **b** ~~c~~ *d* [e](http://x)"),
            vec![
                InlineNode::Text("a "),
                InlineNode::Strong(vec![InlineNode::Text("b")]),
                InlineNode::Text(" "),
                InlineNode::Strike(vec![InlineNode::Text("c")]),
                InlineNode::Text(" "),
                InlineNode::Emphasis(vec![InlineNode::Text("d")]),
                InlineNode::Text(" "),
                InlineNode::Link {
                    label: vec![InlineNode::Text("e")],
                    url: "http://x",
                },
            ]
        );
    }

    #[test]
    fn nested_spans_are_reported_outermost_first() {
        let inline = flatten("**bold _and italic_**");
        assert_eq!(inline.text, "bold and italic");
        assert_eq!(
            inline.spans,
            vec![
                span(0, 15, TextStylePatch::bold()),
                span(5, 15, TextStylePatch::italic()),
            ]
        );
    }

    #[test]
    fn single_star_skips_doubled_stars() {
        let inline = flatten("*a **b** c*");
        assert_eq!(inline.text, "a b c");
        assert_eq!(
            inline.spans,
            vec![
                span(0, 5, TextStylePatch::italic()),
                span(2, 3, TextStylePatch::bold()),
            ]
        );
    }

    #[rstest]
    #[case("**unterminated")]
    #[case("a * b")]
    #[case("~~open")]
    #[case("[label](")]
    #[case("[](http://x)")]
    #[case("****")]
    #[case("snake_case_name")]
    #[case("x__y__z")]
    fn unmatched_markers_stay_literal(#[case] line: &str) {
        let inline = flatten(line);
        assert_eq!(inline.text, line);
        assert_eq!(inline.spans, vec![]);
    }

    #[test]
    fn underscores_work_at_word_edges() {
        let inline = flatten("an _emphasised_ and __strong__ word");
        assert_eq!(inline.text, "an emphasised and strong word");
        assert_eq!(
            inline.spans,
            vec![
                span(3, 13, TextStylePatch::italic()),
                span(18, 24, TextStylePatch::bold()),
            ]
        );
    }

    #[test]
    fn link_labels_may_carry_styles() {
        let inline = flatten("see [the **docs**](https://example.com) now");
        assert_eq!(inline.text, "see the docs now");
        assert_eq!(
            inline.spans,
            vec![
                span(4, 12, TextStylePatch::link("https://example.com")),
                span(8, 12, TextStylePatch::bold()),
            ]
        );
    }

    #[test]
    fn offsets_count_characters() {
        let inline = flatten("héllo **wörld**");
        assert_eq!(inline.spans, vec![span(6, 11, TextStylePatch::bold())]);
    }
}
