//! Chapter command handlers

use anyhow::{Context, Result};

use quire_core::{Position, Store};

use crate::editor::confirm;
use crate::output::Output;

pub fn create(
    store: &Store,
    doc_id: &str,
    title: &str,
    position: &Position,
    output: &Output,
) -> Result<()> {
    let id = store
        .add_chapter(doc_id, title, position)
        .context("Failed to add chapter")?;

    output.created("chapter", &id);
    Ok(())
}

pub fn list(store: &Store, doc_id: &str, output: &Output) -> Result<()> {
    let chapters = store.list_chapters(doc_id)?;
    output.print_chapters(&chapters)
}

pub fn rename(
    store: &Store,
    doc_id: &str,
    chapter_id: &str,
    title: &str,
    output: &Output,
) -> Result<()> {
    store
        .rename_chapter(doc_id, chapter_id, title)
        .context("Failed to rename chapter")?;

    output.success(&format!("Renamed chapter {} to '{}'", chapter_id, title));
    Ok(())
}

/// Delete a chapter along with its blocks
pub fn delete(
    store: &Store,
    doc_id: &str,
    chapter_id: &str,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let chapter = store.get_chapter(doc_id, chapter_id)?;

    if output.should_prompt() && !yes {
        println!(
            "Delete chapter: {} - {} ({} block(s))",
            chapter.id,
            chapter.title,
            chapter.blocks.len()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_chapter(doc_id, chapter_id)
        .context("Failed to delete chapter")?;

    output.success(&format!("Deleted chapter: {}", chapter_id));
    Ok(())
}

pub fn move_to(
    store: &Store,
    doc_id: &str,
    chapter_id: &str,
    position: &Position,
    output: &Output,
) -> Result<()> {
    store
        .move_chapter(doc_id, chapter_id, position)
        .context("Failed to move chapter")?;

    output.success(&format!("Moved chapter {} to {}", chapter_id, position));
    Ok(())
}
