//! Status command handler

use std::path::Path;

use anyhow::Result;

use quire_core::{Config, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = store.config();
    let documents = store.document_summaries()?;
    let blocks: usize = documents.iter().map(|d| d.block_count).sum();
    let chapters: usize = documents.iter().map(|d| d.chapter_count).sum();
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_file_path);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "config_file": config_file,
                    "locking": config.locking.to_string(),
                    "counts": {
                        "documents": documents.len(),
                        "chapters": chapters,
                        "top_level_blocks": blocks
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", documents.len());
        }
        OutputFormat::Human => {
            println!("Quire Status");
            println!("============");
            println!();
            println!("Storage:");
            println!("  Location: {}", store.layout().root().display());
            println!("  Config:   {}", config_file.display());
            println!("  Locking:  {}", config.locking);
            println!();
            println!("Contents:");
            println!("  Documents:        {}", documents.len());
            println!("  Chapters:         {}", chapters);
            println!("  Top-level blocks: {}", blocks);
        }
    }

    Ok(())
}
