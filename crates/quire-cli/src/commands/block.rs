//! Block command handlers
//!
//! Every add command resolves its placement (document, optional chapter,
//! position) in `main.rs`; these handlers only build the block payload.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};

use quire_core::{Block, BlockKey, Position, Scope, Store};

use crate::editor::{confirm, edit_text, strip_hints};
use crate::output::Output;

/// Cell separator for `--row`
const CELL_SEPARATOR: char = '|';

/// Add one block
pub fn add(
    store: &Store,
    doc_id: &str,
    scope: &Scope,
    block: Block,
    position: &Position,
    output: &Output,
) -> Result<()> {
    let kind = block.kind();
    let id = store
        .add_block(doc_id, scope, block, position)
        .with_context(|| format!("Failed to add {} block", kind))?;

    output.created("block", &id);
    Ok(())
}

/// Add a Markdown block, opening the editor when no content is given
pub fn add_markdown(
    store: &Store,
    doc_id: &str,
    scope: &Scope,
    content: Option<String>,
    position: &Position,
    output: &Output,
) -> Result<()> {
    let content = match content {
        Some(c) => c,
        None => {
            let initial = format!("<!-- Markdown block for: {} ({}) -->\n\n", doc_id, scope);
            let edited = edit_text(&initial, "md").context("Failed to edit block")?;
            strip_hints(&edited)
        }
    };

    if content.trim().is_empty() {
        bail!("Markdown block cannot be empty");
    }

    add(store, doc_id, scope, Block::markdown(content), position, output)
}

/// Copy an image into the document's assets, then reference it from a new block
#[allow(clippy::too_many_arguments)]
pub fn add_image(
    store: &Store,
    doc_id: &str,
    scope: &Scope,
    file: &Path,
    caption: String,
    alt_text: String,
    position: &Position,
    output: &Output,
) -> Result<()> {
    let path = store
        .import_image(doc_id, file)
        .with_context(|| format!("Failed to import image {:?}", file))?;

    add(
        store,
        doc_id,
        scope,
        Block::image(path, caption, alt_text),
        position,
        output,
    )
}

/// Split `a|b|c` row arguments into cells
pub fn parse_rows(rows: &[String]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            row.split(CELL_SEPARATOR)
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect()
}

/// Add a JSON array of blocks as one contiguous run
pub fn import(
    store: &Store,
    doc_id: &str,
    scope: &Scope,
    file: &Path,
    position: &Position,
    output: &Output,
) -> Result<()> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read blocks from stdin")?;
        buf
    } else {
        fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?
    };

    let blocks = parse_blocks(&text)?;
    let ids = store
        .add_blocks(doc_id, scope, blocks, position)
        .context("Failed to import blocks")?;

    if output.is_json() {
        println!("{}", serde_json::json!({ "ids": ids }));
    } else if output.is_quiet() {
        for id in &ids {
            println!("{}", id);
        }
    } else {
        output.success(&format!("Added {} block(s): {}", ids.len(), ids.join(", ")));
    }
    Ok(())
}

/// Parse the import format: a JSON array of tagged blocks
fn parse_blocks(text: &str) -> Result<Vec<Block>> {
    let blocks: Vec<Block> =
        serde_json::from_str(text).context("Expected a JSON array of blocks")?;
    if blocks.is_empty() {
        bail!("No blocks to import");
    }
    Ok(blocks)
}

/// Show one or more blocks
pub fn get(store: &Store, doc_id: &str, keys: &[String], output: &Output) -> Result<()> {
    let keys: Vec<BlockKey> = keys.iter().map(|k| BlockKey::parse(k)).collect();
    let blocks = store.get_blocks(doc_id, &keys)?;
    output.print_blocks(&blocks)
}

/// Replace a block's content
///
/// With `data`, the replacement is parsed from JSON. Otherwise the block is
/// opened in the editor: Markdown as plain text, other kinds as JSON.
pub fn update(
    store: &Store,
    doc_id: &str,
    key: &str,
    data: Option<&str>,
    output: &Output,
) -> Result<()> {
    let current = store.get_block(doc_id, &BlockKey::parse(key))?;
    let exact = BlockKey::in_scope(&current.location.scope, current.block.id());

    let replacement = match data {
        Some(json) => serde_json::from_str::<Block>(json).context("Invalid block JSON")?,
        None => edit_block(&current.block)?,
    };

    let mut compare = replacement.clone();
    compare.set_id(current.block.id());
    if compare == current.block {
        output.message("No changes.");
        return Ok(());
    }

    store
        .update_block(doc_id, &exact, replacement)
        .context("Failed to update block")?;

    output.success(&format!("Updated block: {}", exact));
    Ok(())
}

fn edit_block(block: &Block) -> Result<Block> {
    match block {
        Block::Markdown(b) => {
            let edited = edit_text(&b.content, "md").context("Failed to edit block")?;
            Ok(Block::markdown(edited.trim_end()))
        }
        other => {
            let initial =
                serde_json::to_string_pretty(other).context("Failed to serialize block")?;
            let edited = edit_text(&initial, "json").context("Failed to edit block")?;
            serde_json::from_str(&edited).context("Edited block is not valid JSON")
        }
    }
}

/// Delete a block
pub fn delete(store: &Store, doc_id: &str, key: &str, yes: bool, output: &Output) -> Result<()> {
    let current = store.get_block(doc_id, &BlockKey::parse(key))?;
    let exact = BlockKey::in_scope(&current.location.scope, current.block.id());

    if output.should_prompt() && !yes {
        println!(
            "Delete block: {} - {}",
            exact,
            current.block.preview().replace('\n', " ")
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_block(doc_id, &exact)
        .context("Failed to delete block")?;

    output.success(&format!("Deleted block: {}", exact));
    Ok(())
}

pub fn move_to(
    store: &Store,
    doc_id: &str,
    key: &str,
    position: &Position,
    output: &Output,
) -> Result<()> {
    store
        .move_block(doc_id, &BlockKey::parse(key), position)
        .context("Failed to move block")?;

    output.success(&format!("Moved block {} to {}", key, position));
    Ok(())
}
