//! # Document Service
//!
//! Glue between a [`DocumentProvider`] and the engine: each operation reads a
//! snapshot, resolves its target, sequences one batch and hands it to the
//! provider. Results are human-readable [`Outcome`] messages.

use std::fmt;

use crate::editing::{EditBatch, EditIntent, ParagraphStylePatch, Sequencer, TextStylePatch};
use crate::error::EngineError;
use crate::markup::{TranslateOptions, to_markup, translate};
use crate::providers::DocumentProvider;
use crate::resolve::{Range, Target, expand_to_paragraphs, resolve};
use crate::tree::extract::extract;
use crate::tree::offsets::{OffsetMap, block_spans};
use crate::tree::{Snapshot, text_len};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to {action}: {source}")]
    Provider {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

/// Message reported back to whoever asked for the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    message: String,
}

impl Outcome {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub struct DocsService<P> {
    provider: P,
    default_max_length: Option<usize>,
}

impl<P: DocumentProvider> DocsService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            default_max_length: None,
        }
    }

    /// Limit applied to reads that do not pass their own.
    pub fn with_default_max_length(mut self, max_length: Option<usize>) -> Self {
        self.default_max_length = max_length;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn snapshot(
        &self,
        action: &'static str,
        document_id: &str,
        tab_id: Option<&str>,
    ) -> Result<Snapshot, ServiceError> {
        self.provider
            .get(document_id, tab_id)
            .map_err(|source| ServiceError::Provider { action, source })
    }

    fn apply(&self, action: &'static str, batch: EditBatch) -> Result<(), ServiceError> {
        let document_id = batch.document_id().to_string();
        log::info!(
            "Applying {} intents to {document_id} ({action})",
            batch.len()
        );
        self.provider
            .apply_batch(&document_id, batch)
            .map_err(|source| ServiceError::Provider { action, source })
    }

    /// Sequences and applies `intents` against a fresh read of the document.
    fn edit(
        &self,
        action: &'static str,
        document_id: &str,
        tab_id: Option<&str>,
        build: impl FnOnce(&Snapshot) -> Result<Vec<EditIntent>, ServiceError>,
    ) -> Result<(), ServiceError> {
        let snapshot = self.snapshot(action, document_id, tab_id)?;
        let intents = build(&snapshot)?;
        let mut sequencer = Sequencer::new(&snapshot);
        for intent in intents {
            sequencer.push(intent)?;
        }
        self.apply(action, sequencer.finish())
    }

    pub fn read_document(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        format: ReadFormat,
        max_length: Option<usize>,
    ) -> Result<Outcome, ServiceError> {
        let snapshot = self.snapshot("read document", document_id, tab_id)?;
        let max_length = max_length.or(self.default_max_length).filter(|&m| m > 0);

        let message = match format {
            ReadFormat::Json => {
                let json = serde_json::to_string_pretty(&snapshot)?;
                match truncate(&json, max_length) {
                    Some((kept, total)) => format!("{kept}\n... [JSON truncated: {total} total chars]"),
                    None => json,
                }
            }
            ReadFormat::Markdown => {
                let markup = to_markup(&snapshot);
                match (truncate(&markup, max_length), max_length) {
                    (Some((kept, total)), Some(max)) => format!(
                        "{kept}\n\n... [Markdown truncated to {max} chars of {total} total.]"
                    ),
                    _ => markup,
                }
            }
            ReadFormat::Text => {
                let extracted = extract(&snapshot, max_length);
                if extracted.is_empty() {
                    "Document found, but appears empty.".to_string()
                } else if extracted.truncated {
                    format!(
                        "Content (truncated to {} chars of {} total):\n---\n{}\n\n... [Document continues for {} more characters.]",
                        text_len(&extracted.text),
                        extracted.total_length,
                        extracted.text,
                        extracted.remaining()
                    )
                } else {
                    format!(
                        "Content ({} characters):\n---\n{}",
                        extracted.total_length, extracted.text
                    )
                }
            }
        };
        Ok(Outcome::new(message))
    }

    /// Resolves `target` without editing anything.
    pub fn locate(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        target: &Target,
    ) -> Result<Range, ServiceError> {
        let snapshot = self.snapshot("read document", document_id, tab_id)?;
        Ok(resolve(&snapshot, target)?)
    }

    /// Appends `text` at the end of the body.
    ///
    /// With `add_newline_if_needed`, a newline is put first when the body has
    /// text that does not already end in one.
    pub fn append_text(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        text: &str,
        add_newline_if_needed: bool,
    ) -> Result<Outcome, ServiceError> {
        self.edit("append text", document_id, tab_id, |snapshot| {
            let at = OffsetMap::of(snapshot).end_index();
            let text = if add_newline_if_needed && needs_newline(snapshot) {
                format!("\n{text}")
            } else {
                text.to_string()
            };
            Ok(vec![EditIntent::InsertText { at, text }])
        })?;
        Ok(Outcome::new(format!(
            "Successfully appended text to document {document_id}."
        )))
    }

    pub fn insert_text(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        index: usize,
        text: &str,
    ) -> Result<Outcome, ServiceError> {
        self.edit("insert text", document_id, tab_id, |_| {
            Ok(vec![EditIntent::InsertText {
                at: index,
                text: text.to_string(),
            }])
        })?;
        Ok(Outcome::new(format!(
            "Successfully inserted text at index {index}."
        )))
    }

    pub fn delete_range(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        start: usize,
        end: usize,
    ) -> Result<Outcome, ServiceError> {
        self.edit("delete content", document_id, tab_id, |snapshot| {
            let range = resolve(snapshot, &Target::Explicit { start, end })?;
            Ok(vec![EditIntent::DeleteRange { range }])
        })?;
        Ok(Outcome::new(format!(
            "Successfully deleted content in range {start}-{end}."
        )))
    }

    pub fn apply_text_style(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        target: &Target,
        patch: TextStylePatch,
    ) -> Result<Outcome, ServiceError> {
        self.edit("apply text style", document_id, tab_id, |snapshot| {
            let range = resolve(snapshot, target)?;
            Ok(vec![EditIntent::ApplyTextStyle { range, patch }])
        })?;
        Ok(Outcome::new("Successfully applied text style."))
    }

    /// Styles every paragraph the target touches.
    pub fn apply_paragraph_style(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        target: &Target,
        patch: ParagraphStylePatch,
    ) -> Result<Outcome, ServiceError> {
        self.edit("apply paragraph style", document_id, tab_id, |snapshot| {
            let range = resolve(snapshot, target)?;
            let range = match target {
                Target::Explicit { .. } | Target::Search { .. } => {
                    expand_to_paragraphs(snapshot, range)?
                }
                Target::ParagraphAt { .. } | Target::ParagraphContaining { .. } => range,
            };
            Ok(vec![EditIntent::ApplyParagraphStyle { range, patch }])
        })?;
        Ok(Outcome::new("Successfully applied paragraph style."))
    }

    pub fn insert_table(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        index: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Outcome, ServiceError> {
        self.edit("insert table", document_id, tab_id, |_| {
            Ok(vec![EditIntent::InsertTable {
                at: index,
                rows,
                cols,
            }])
        })?;
        Ok(Outcome::new(format!(
            "Successfully inserted a {rows}x{cols} table at index {index}."
        )))
    }

    pub fn insert_page_break(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        index: usize,
    ) -> Result<Outcome, ServiceError> {
        self.edit("insert page break", document_id, tab_id, |_| {
            Ok(vec![EditIntent::InsertPageBreak { at: index }])
        })?;
        Ok(Outcome::new(format!(
            "Successfully inserted page break at index {index}."
        )))
    }

    /// Inserts an image fetched from `url`, optionally sized in points.
    pub fn insert_image(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        index: usize,
        url: &str,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Outcome, ServiceError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServiceError::InvalidArgument {
                name: "url",
                reason: format!("{url:?} must start with http:// or https://"),
            });
        }
        for (name, size) in [("width", width), ("height", height)] {
            if size.is_some_and(|s| !(s > 0.0)) {
                return Err(ServiceError::InvalidArgument {
                    name,
                    reason: "must be a positive number of points".to_string(),
                });
            }
        }

        self.edit("insert image", document_id, tab_id, |_| {
            Ok(vec![EditIntent::InsertImage {
                at: index,
                url: url.to_string(),
                width,
                height,
            }])
        })?;
        let size = match (width, height) {
            (Some(w), Some(h)) => format!(" with size {w:.0}x{h:.0}pt"),
            _ => String::new(),
        };
        Ok(Outcome::new(format!(
            "Successfully inserted image at index {index}{size}."
        )))
    }

    /// Replaces the body with translated markdown.
    ///
    /// With `preserve_title` the first block stays and everything after it
    /// is replaced instead.
    pub fn replace_with_markdown(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        markdown: &str,
        preserve_title: bool,
        first_heading_as_title: bool,
    ) -> Result<Outcome, ServiceError> {
        let action = "replace document";
        let snapshot = self.snapshot(action, document_id, tab_id)?;
        let first_block = block_spans(&snapshot).into_iter().next();

        let batch = match first_block {
            Some(title) if preserve_title => {
                let end_index = OffsetMap::of(&snapshot).end_index();
                let mut sequencer = Sequencer::new(&snapshot);
                if title.end < end_index {
                    let rest = resolve(
                        &snapshot,
                        &Target::Explicit {
                            start: title.end,
                            end: end_index,
                        },
                    )?;
                    sequencer.push(EditIntent::DeleteRange { range: rest })?;
                }
                sequencer.push_fragment(translate(
                    markdown,
                    &TranslateOptions {
                        start_index: title.end,
                        first_heading_as_title,
                    },
                ))?;
                sequencer.finish()
            }
            _ => {
                let content = translate(
                    markdown,
                    &TranslateOptions {
                        first_heading_as_title,
                        ..TranslateOptions::default()
                    },
                )
                .into_intents();
                let mut sequencer = Sequencer::new(&snapshot);
                sequencer.push(EditIntent::ReplaceBody { content })?;
                sequencer.finish()
            }
        };
        self.apply(action, batch)?;
        Ok(Outcome::new(format!(
            "Successfully replaced document content with {} characters of markdown.",
            text_len(markdown)
        )))
    }

    pub fn append_markdown(
        &self,
        document_id: &str,
        tab_id: Option<&str>,
        markdown: &str,
        add_newline_if_needed: bool,
        first_heading_as_title: bool,
    ) -> Result<Outcome, ServiceError> {
        let action = "append markdown";
        let snapshot = self.snapshot(action, document_id, tab_id)?;
        let at = OffsetMap::of(&snapshot).end_index();

        let mut sequencer = Sequencer::new(&snapshot);
        if add_newline_if_needed && needs_newline(&snapshot) {
            sequencer.push(EditIntent::InsertText {
                at,
                text: "\n".to_string(),
            })?;
        }
        sequencer.push_fragment(translate(
            markdown,
            &TranslateOptions {
                start_index: at,
                first_heading_as_title,
            },
        ))?;
        self.apply(action, sequencer.finish())?;
        Ok(Outcome::new(format!(
            "Successfully appended {} characters of markdown.",
            text_len(markdown)
        )))
    }
}

/// Whether the body has text that does not end in a newline.
fn needs_newline(snapshot: &Snapshot) -> bool {
    let text = extract(snapshot, None).text;
    !text.is_empty() && !text.ends_with('\n')
}

/// The first `max_length` characters of `text` and its full length, when it
/// is longer than that.
fn truncate(text: &str, max_length: Option<usize>) -> Option<(String, usize)> {
    let max = max_length?;
    let total = text_len(text);
    (total > max).then(|| (text.chars().take(max).collect(), total))
}
