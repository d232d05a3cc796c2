//! Typed content blocks
//!
//! A document's content is an ordered list of blocks. The set of kinds is
//! closed: every capability below is an exhaustive `match`, so adding a kind
//! is a compile error everywhere it needs handling.
//!
//! Block metadata is serialized as JSON tagged by `type`:
//!
//! ```json
//! { "type": "heading", "id": "hd-001", "level": 2, "text": "Setup" }
//! ```
//!
//! Markdown blocks are the exception on disk: their body is stored as raw
//! text in `<id>.md`, with no metadata file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::storage::{StoreError, StoreResult};

/// Maximum preview length for heading text and markdown bodies
const PREVIEW_LIMIT: usize = 100;

/// Maximum preview length for image captions
const CAPTION_PREVIEW_LIMIT: usize = 80;

/// The kind of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Markdown,
    Image,
    Table,
    PageBreak,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Heading,
        BlockKind::Markdown,
        BlockKind::Image,
        BlockKind::Table,
        BlockKind::PageBreak,
    ];

    /// ID prefix, e.g. `hd` in `hd-001`
    pub fn prefix(self) -> &'static str {
        match self {
            BlockKind::Heading => "hd",
            BlockKind::Markdown => "md",
            BlockKind::Image => "img",
            BlockKind::Table => "tbl",
            BlockKind::PageBreak => "pb",
        }
    }

    /// Serialized type name
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Markdown => "markdown",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
            BlockKind::PageBreak => "page_break",
        }
    }

    /// Suffix of the metadata file name (`<id>-<suffix>.json`)
    ///
    /// `None` for markdown, whose content lives in `<id>.md`.
    pub fn file_suffix(self) -> Option<&'static str> {
        match self {
            BlockKind::Heading => Some("heading"),
            BlockKind::Markdown => None,
            BlockKind::Image => Some("image"),
            BlockKind::Table => Some("table"),
            BlockKind::PageBreak => Some("pagebreak"),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heading" => Ok(BlockKind::Heading),
            "markdown" => Ok(BlockKind::Markdown),
            "image" => Ok(BlockKind::Image),
            "table" => Ok(BlockKind::Table),
            "page_break" | "page-break" | "pagebreak" => Ok(BlockKind::PageBreak),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown block type '{}'",
                other
            ))),
        }
    }
}

/// A section heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingBlock {
    #[serde(default)]
    pub id: String,
    /// 1 through 6
    pub level: u8,
    pub text: String,
}

/// Free-form markdown text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownBlock {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
}

/// An image, usually pointing into the document's `assets/` folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub caption: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alt_text: String,
}

/// A table; rows are not required to match the header width
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBreakBlock {
    #[serde(default)]
    pub id: String,
}

/// One content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading(HeadingBlock),
    Markdown(MarkdownBlock),
    Image(ImageBlock),
    Table(TableBlock),
    PageBreak(PageBreakBlock),
}

impl Block {
    /// Create a heading; the ID is assigned when the block is stored
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading(HeadingBlock {
            id: String::new(),
            level,
            text: text.into(),
        })
    }

    pub fn markdown(content: impl Into<String>) -> Self {
        Block::Markdown(MarkdownBlock {
            id: String::new(),
            content: content.into(),
        })
    }

    pub fn image(
        path: impl Into<String>,
        caption: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> Self {
        Block::Image(ImageBlock {
            id: String::new(),
            path: path.into(),
            caption: caption.into(),
            alt_text: alt_text.into(),
        })
    }

    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Block::Table(TableBlock {
            id: String::new(),
            headers,
            rows,
        })
    }

    pub fn page_break() -> Self {
        Block::PageBreak(PageBreakBlock { id: String::new() })
    }

    pub fn id(&self) -> &str {
        match self {
            Block::Heading(b) => &b.id,
            Block::Markdown(b) => &b.id,
            Block::Image(b) => &b.id,
            Block::Table(b) => &b.id,
            Block::PageBreak(b) => &b.id,
        }
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            Block::Heading(b) => b.id = id,
            Block::Markdown(b) => b.id = id,
            Block::Image(b) => b.id = id,
            Block::Table(b) => b.id = id,
            Block::PageBreak(b) => b.id = id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading(_) => BlockKind::Heading,
            Block::Markdown(_) => BlockKind::Markdown,
            Block::Image(_) => BlockKind::Image,
            Block::Table(_) => BlockKind::Table,
            Block::PageBreak(_) => BlockKind::PageBreak,
        }
    }

    /// Check the block's own constraints before it is written
    pub fn validate(&self) -> StoreResult<()> {
        match self {
            Block::Heading(b) if !(1..=6).contains(&b.level) => Err(StoreError::InvalidArgument(
                format!("heading level must be between 1 and 6, got {}", b.level),
            )),
            Block::Heading(_)
            | Block::Markdown(_)
            | Block::Image(_)
            | Block::Table(_)
            | Block::PageBreak(_) => Ok(()),
        }
    }

    /// Render this block as a Markdown fragment
    ///
    /// Used by exporters that assemble a whole document; a page break renders
    /// as the LaTeX `\newpage` command that Pandoc passes through.
    pub fn to_markdown(&self) -> String {
        match self {
            Block::Heading(b) => format!("{} {}", "#".repeat(usize::from(b.level)), b.text),
            Block::Markdown(b) => b.content.clone(),
            Block::Image(b) => {
                let alt = if b.alt_text.is_empty() {
                    &b.caption
                } else {
                    &b.alt_text
                };
                let mut out = format!("![{}]({})", alt, b.path);
                if !b.caption.is_empty() {
                    out.push_str(&format!("\n\n*{}*", b.caption));
                }
                out
            }
            Block::Table(b) => table_to_markdown(&b.headers, &b.rows),
            Block::PageBreak(_) => "\\newpage".to_string(),
        }
    }

    /// Short human-readable summary used in document overviews
    pub fn preview(&self) -> String {
        match self {
            Block::Heading(b) => format!("H{}: {}", b.level, truncate(&b.text, PREVIEW_LIMIT)),
            Block::Markdown(b) => truncate(&b.content, PREVIEW_LIMIT),
            Block::Image(b) if b.caption.is_empty() => "Image".to_string(),
            Block::Image(b) => format!("Image: {}", truncate(&b.caption, CAPTION_PREVIEW_LIMIT)),
            Block::Table(b) => format!(
                "Table: {} columns, {} rows",
                b.headers.len(),
                b.rows.len()
            ),
            Block::PageBreak(_) => "Page Break".to_string(),
        }
    }

    /// Text that search matches against
    pub fn searchable_text(&self) -> String {
        match self {
            Block::Heading(b) => b.text.clone(),
            Block::Markdown(b) => b.content.clone(),
            Block::Image(b) => format!("{} {}", b.caption, b.alt_text),
            Block::Table(b) => {
                let mut text = b.headers.join(" ");
                for row in &b.rows {
                    text.push(' ');
                    text.push_str(&row.join(" "));
                }
                text
            }
            Block::PageBreak(_) => String::new(),
        }
    }
}

fn table_to_markdown(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut out = format!("| {} |\n", headers.join(" | "));
    out.push('|');
    for _ in headers {
        out.push_str(" --- |");
    }
    out.push('\n');

    for row in rows {
        let cells: Vec<&str> = (0..headers.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

/// Trim, then shorten to `limit` characters ending in `...`
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}
