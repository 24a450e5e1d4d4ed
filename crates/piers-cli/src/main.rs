use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use piers_config::Config;
use piers_engine::editing::{Alignment, ParagraphStylePatch, TextStylePatch};
use piers_engine::providers::DocumentProvider;
use piers_engine::providers::memory::MemoryDocuments;
use piers_engine::resolve::Target;
use piers_engine::service::{DocsService, ReadFormat};
use piers_engine::tree::NamedStyle;
use piers_engine::JsonDirectory;

#[derive(Parser)]
#[command(name = "piers", about = "Read and edit structured documents", version)]
struct Cli {
    /// Use the built-in mock document instead of a documents directory
    #[arg(long, global = true, env = "MOCK_AUTH")]
    mock: bool,

    /// Directory of `<id>.json` documents (defaults to the config file)
    #[arg(long, global = true)]
    documents: Option<PathBuf>,

    /// Tab to operate on (defaults to the first tab)
    #[arg(long, global = true)]
    tab: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a document as text, JSON or markdown
    Read {
        id: String,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
        #[arg(short, long)]
        max_length: Option<usize>,
    },
    /// Print the index range of a piece of text
    Find {
        id: String,
        needle: String,
        #[arg(short, long, default_value = "1")]
        occurrence: usize,
    },
    /// Insert content at an index
    Insert {
        id: String,
        index: usize,
        #[command(subcommand)]
        content: InsertContent,
    },
    /// Append text to the end of a document
    Append {
        id: String,
        text: String,
        /// Put a newline first if the document does not end with one
        #[arg(long)]
        newline: bool,
    },
    /// Delete the range [start, end)
    Delete { id: String, start: usize, end: usize },
    /// Apply character and/or paragraph formatting
    Style {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        text: TextStyleArgs,
        #[command(flatten)]
        paragraph: ParagraphStyleArgs,
    },
    /// Replace or extend a document with markdown read from a file or stdin
    Markdown {
        id: String,
        #[arg(value_enum)]
        mode: MarkdownMode,
        /// Markdown file; stdin when omitted
        source: Option<PathBuf>,
        /// Keep the first paragraph when replacing
        #[arg(long)]
        preserve_title: bool,
        /// Style a leading level-1 heading as the document title
        #[arg(long)]
        title_heading: bool,
        /// Put a newline first when appending if needed
        #[arg(long)]
        newline: bool,
    },
}

#[derive(Subcommand)]
enum InsertContent {
    Text { text: String },
    Table { rows: usize, cols: usize },
    PageBreak,
    Image {
        url: String,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Markdown,
}

impl From<Format> for ReadFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReadFormat::Text,
            Format::Json => ReadFormat::Json,
            Format::Markdown => ReadFormat::Markdown,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MarkdownMode {
    Replace,
    Append,
}

#[derive(Args)]
struct TargetArgs {
    #[arg(long, requires = "end", conflicts_with_all = ["find", "at"])]
    start: Option<usize>,
    #[arg(long, requires = "start")]
    end: Option<usize>,
    /// Text to locate instead of an explicit range
    #[arg(long, conflicts_with = "at")]
    find: Option<String>,
    #[arg(long, default_value = "1")]
    occurrence: usize,
    /// Any index inside the target paragraph
    #[arg(long)]
    at: Option<usize>,
}

impl TargetArgs {
    fn target(&self) -> Result<Target> {
        match (self.start, self.end, &self.find, self.at) {
            (Some(start), Some(end), None, None) => Ok(Target::Explicit { start, end }),
            (None, None, Some(needle), None) => Ok(Target::Search {
                needle: needle.clone(),
                occurrence: self.occurrence,
            }),
            (None, None, None, Some(index)) => Ok(Target::ParagraphAt { index }),
            _ => bail!("give exactly one of --start/--end, --find or --at"),
        }
    }
}

#[derive(Args)]
struct TextStyleArgs {
    #[arg(long)]
    bold: bool,
    #[arg(long)]
    italic: bool,
    #[arg(long)]
    underline: bool,
    #[arg(long)]
    strikethrough: bool,
    #[arg(long)]
    font_family: Option<String>,
    #[arg(long)]
    font_size: Option<f64>,
    /// Hex colour such as #FF0000
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    background: Option<String>,
    #[arg(long)]
    link: Option<String>,
}

impl TextStyleArgs {
    fn patch(&self) -> TextStylePatch {
        let flag = |set: bool| set.then_some(true);
        TextStylePatch {
            bold: flag(self.bold),
            italic: flag(self.italic),
            underline: flag(self.underline),
            strikethrough: flag(self.strikethrough),
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            foreground_color: self.color.clone(),
            background_color: self.background.clone(),
            link_url: self.link.clone(),
        }
    }
}

#[derive(Args)]
struct ParagraphStyleArgs {
    /// NORMAL_TEXT, TITLE, SUBTITLE or HEADING_1 to HEADING_6
    #[arg(long)]
    named_style: Option<String>,
    /// START, CENTER, END or JUSTIFIED
    #[arg(long)]
    alignment: Option<String>,
    #[arg(long)]
    indent_start: Option<f64>,
    #[arg(long)]
    indent_end: Option<f64>,
    #[arg(long)]
    space_above: Option<f64>,
    #[arg(long)]
    space_below: Option<f64>,
    #[arg(long)]
    keep_with_next: bool,
}

impl ParagraphStyleArgs {
    fn patch(&self) -> Result<ParagraphStylePatch> {
        let named_style = self
            .named_style
            .as_deref()
            .map(|name| {
                NamedStyle::parse(&name.to_ascii_uppercase())
                    .ok_or_else(|| anyhow!("unknown named style {name:?}"))
            })
            .transpose()?;
        let alignment = self
            .alignment
            .as_deref()
            .map(|name| Alignment::parse(name).ok_or_else(|| anyhow!("unknown alignment {name:?}")))
            .transpose()?;
        Ok(ParagraphStylePatch {
            named_style,
            alignment,
            indent_start: self.indent_start,
            indent_end: self.indent_end,
            space_above: self.space_above,
            space_below: self.space_below,
            keep_with_next: self.keep_with_next.then_some(true),
            bullet: None,
        })
    }
}

/// Settings that come from the config file rather than the command line.
#[derive(Debug, Default)]
struct Defaults {
    max_length: Option<usize>,
    first_heading_as_title: bool,
}

fn run<P: DocumentProvider>(
    service: &DocsService<P>,
    tab: Option<&str>,
    command: Command,
    defaults: &Defaults,
) -> Result<String> {
    let message = match command {
        Command::Read {
            id,
            format,
            max_length,
        } => service.read_document(&id, tab, format.into(), max_length)?,
        Command::Find {
            id,
            needle,
            occurrence,
        } => {
            let range = service.locate(&id, tab, &Target::Search { needle, occurrence })?;
            return Ok(format!("{}-{}", range.start(), range.end()));
        }
        Command::Insert { id, index, content } => match content {
            InsertContent::Text { text } => service.insert_text(&id, tab, index, &text)?,
            InsertContent::Table { rows, cols } => {
                service.insert_table(&id, tab, index, rows, cols)?
            }
            InsertContent::PageBreak => service.insert_page_break(&id, tab, index)?,
            InsertContent::Image { url, width, height } => {
                service.insert_image(&id, tab, index, &url, width, height)?
            }
        },
        Command::Append { id, text, newline } => service.append_text(&id, tab, &text, newline)?,
        Command::Delete { id, start, end } => service.delete_range(&id, tab, start, end)?,
        Command::Style {
            id,
            target,
            text,
            paragraph,
        } => {
            let target = target.target()?;
            let text = text.patch();
            let paragraph = paragraph.patch()?;
            if text.is_empty() && paragraph.is_empty() {
                bail!("no style options given");
            }
            let mut messages = vec![];
            if !text.is_empty() {
                messages.push(service.apply_text_style(&id, tab, &target, text)?.into_message());
            }
            if !paragraph.is_empty() {
                messages.push(
                    service
                        .apply_paragraph_style(&id, tab, &target, paragraph)?
                        .into_message(),
                );
            }
            return Ok(messages.join("\n"));
        }
        Command::Markdown {
            id,
            mode,
            source,
            preserve_title,
            title_heading,
            newline,
        } => {
            let markdown = read_source(source)?;
            let as_title = title_heading || defaults.first_heading_as_title;
            match mode {
                MarkdownMode::Replace => {
                    service.replace_with_markdown(&id, tab, &markdown, preserve_title, as_title)?
                }
                MarkdownMode::Append => {
                    service.append_markdown(&id, tab, &markdown, newline, as_title)?
                }
            }
        }
    };
    Ok(message.into_message())
}

fn read_source(source: Option<PathBuf>) -> Result<String> {
    match source {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut markdown = String::new();
            std::io::stdin()
                .read_to_string(&mut markdown)
                .context("failed to read markdown from stdin")?;
            Ok(markdown)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let defaults = config
        .as_ref()
        .map(|config| Defaults {
            max_length: config.default_max_length,
            first_heading_as_title: config.first_heading_as_title,
        })
        .unwrap_or_default();
    let tab = cli.tab.as_deref();

    let output = if cli.mock {
        log::info!("Using the built-in mock document");
        let service = DocsService::new(MemoryDocuments::seeded())
            .with_default_max_length(defaults.max_length);
        run(&service, tab, cli.command, &defaults)?
    } else {
        let documents_path = cli
            .documents
            .or_else(|| config.map(|config| config.documents_path))
            .ok_or_else(|| {
                anyhow!(
                    "no documents directory given; pass --documents or create a config file at {}",
                    Config::config_path().display()
                )
            })?;
        log::info!("Documents directory: {}", documents_path.display());
        let service = DocsService::new(JsonDirectory::new(documents_path))
            .with_default_max_length(defaults.max_length);
        run(&service, tab, cli.command, &defaults)?
    };

    println!("{output}");
    Ok(())
}
