//! Document command handlers

use anyhow::{Context, Result};

use quire_core::Store;

use crate::editor::confirm;
use crate::output::{Output, OutputFormat};

/// Create a new document
pub fn create(
    store: &Store,
    title: &str,
    author: &str,
    has_chapters: bool,
    output: &Output,
) -> Result<()> {
    let id = store
        .create_document(title, has_chapters, author)
        .context("Failed to create document")?;

    output.created("document", &id);
    Ok(())
}

/// List all documents
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let documents = store.document_summaries()?;
    output.print_documents(&documents)
}

/// Show a document outline
pub fn show(store: &Store, id: &str, output: &Output) -> Result<()> {
    let overview = store.overview(id)?;
    output.print_overview(&overview)
}

/// Delete a document
pub fn delete(store: &Store, id: &str, yes: bool, output: &Output) -> Result<()> {
    let doc = store.get_document(id)?;

    if output.should_prompt() && !yes {
        println!(
            "Delete document: {} - {} ({} block(s), {} chapter(s))",
            doc.id,
            doc.title,
            doc.blocks.len(),
            doc.chapters.len()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_document(id)
        .context("Failed to delete document")?;

    output.success(&format!("Deleted document: {}", id));
    Ok(())
}

/// Print the whole document
///
/// Human and quiet modes print Markdown; JSON mode prints every loaded block.
pub fn content(store: &Store, id: &str, output: &Output) -> Result<()> {
    let content = store.content(id)?;

    match output.format {
        OutputFormat::Json => output.json(&content)?,
        OutputFormat::Human | OutputFormat::Quiet => println!("{}", content.to_markdown()),
    }
    Ok(())
}
