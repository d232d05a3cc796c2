//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::{Context, Result};
use serde::Serialize;

use quire_core::overview::BlockOverview;
use quire_core::{Block, Chapter, DocumentOverview, DocumentSummary, LocatedBlock, SearchResult};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Pretty-print any serializable value
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", text);
        Ok(())
    }

    /// Report a newly created item; quiet mode prints only its ID
    pub fn created(&self, what: &str, id: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ Created {}: {}", what, id),
            OutputFormat::Json => println!("{}", serde_json::json!({ "id": id })),
            OutputFormat::Quiet => println!("{}", id),
        }
    }

    /// Print a list of documents
    pub fn print_documents(&self, documents: &[DocumentSummary]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if documents.is_empty() {
                    println!("No documents found.");
                    return Ok(());
                }
                for doc in documents {
                    let shape = if doc.has_chapters {
                        format!("{} chapter(s)", doc.chapter_count)
                    } else {
                        format!("{} block(s)", doc.block_count)
                    };
                    println!(
                        "{} | {} | {} | {}",
                        truncate(&doc.id, 30),
                        truncate(&doc.title, 35),
                        shape,
                        doc.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} document(s)", documents.len());
            }
            OutputFormat::Json => self.json(documents)?,
            OutputFormat::Quiet => {
                for doc in documents {
                    println!("{}", doc.id);
                }
            }
        }
        Ok(())
    }

    /// Print a document outline
    pub fn print_overview(&self, overview: &DocumentOverview) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", overview.id);
                println!("Title:    {}", overview.title);
                if !overview.author.is_empty() {
                    println!("Author:   {}", overview.author);
                }
                println!(
                    "Chapters: {}",
                    if overview.has_chapters { "yes" } else { "no" }
                );

                if overview.blocks.is_empty() && overview.chapters.is_empty() {
                    println!();
                    println!("(empty)");
                    return Ok(());
                }

                if !overview.blocks.is_empty() {
                    println!();
                    print_block_lines(&overview.blocks, "");
                }
                for chapter in &overview.chapters {
                    println!();
                    println!("── {} {} ({}) ──", chapter.id, chapter.title, chapter.blocks.len());
                    print_block_lines(&chapter.blocks, "  ");
                }
            }
            OutputFormat::Json => self.json(overview)?,
            OutputFormat::Quiet => {
                for block in &overview.blocks {
                    println!("{}", block.id);
                }
                for chapter in &overview.chapters {
                    for block in &chapter.blocks {
                        println!("{}/{}", chapter.id, block.id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Print a document's chapters
    pub fn print_chapters(&self, chapters: &[Chapter]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if chapters.is_empty() {
                    println!("No chapters.");
                    return Ok(());
                }
                for chapter in chapters {
                    println!(
                        "{} | {} | {} block(s)",
                        chapter.id,
                        truncate(&chapter.title, 50),
                        chapter.blocks.len()
                    );
                }
            }
            OutputFormat::Json => self.json(chapters)?,
            OutputFormat::Quiet => {
                for chapter in chapters {
                    println!("{}", chapter.id);
                }
            }
        }
        Ok(())
    }

    /// Print loaded blocks with where they live
    pub fn print_blocks(&self, blocks: &[LocatedBlock]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for (i, located) in blocks.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    println!("────────────────────────────────────────");
                    println!(
                        "{} ({}) in {} at {}",
                        located.block.id(),
                        located.block.kind(),
                        located.location.scope,
                        located.location.index
                    );
                    println!();
                    println!("{}", render_body(&located.block));
                }
            }
            OutputFormat::Json => self.json(blocks)?,
            OutputFormat::Quiet => {
                for located in blocks {
                    println!("{}", located.block.id());
                }
            }
        }
        Ok(())
    }

    /// Print search hits
    pub fn print_search_results(&self, query: &str, results: &[SearchResult]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if results.is_empty() {
                    println!("No matches for '{}'.", query);
                    return Ok(());
                }
                for result in results {
                    let location = if result.chapter_id.is_empty() {
                        result.block_id.clone()
                    } else {
                        format!("{}/{}", result.chapter_id, result.block_id)
                    };
                    println!(
                        "{} [{}] {}",
                        location,
                        result.block_type,
                        result.snippet.replace('\n', " ")
                    );
                }
                println!("\n{} match(es)", results.len());
            }
            OutputFormat::Json => self.json(results)?,
            OutputFormat::Quiet => {
                for result in results {
                    println!("{}", result.block_id);
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_block_lines(blocks: &[BlockOverview], indent: &str) {
    for block in blocks {
        println!("{}{:<8} {}", indent, block.id, block.preview.replace('\n', " "));
    }
}

/// Human rendering of a block body
fn render_body(block: &Block) -> String {
    match block {
        Block::PageBreak(_) => "(page break)".to_string(),
        other => other.to_markdown(),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
