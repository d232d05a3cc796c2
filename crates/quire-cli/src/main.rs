//! Quire CLI
//!
//! Command-line interface for Quire - documents built from typed blocks.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quire_core::{Config, Position, Scope, StoreError, Store};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Quire - documents built from typed content blocks")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage documents
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },
    /// Manage chapters
    Chapter {
        #[command(subcommand)]
        command: ChapterCommands,
    },
    /// Manage blocks
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Search a document
    Search {
        /// Document ID
        doc: String,
        /// Text to find (case-insensitive)
        query: String,
        /// Only search this chapter
        #[arg(short, long)]
        chapter: Option<String>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show storage status
    Status,
}

#[derive(Subcommand)]
enum DocCommands {
    /// Create a new document
    #[command(alias = "new")]
    Create {
        /// Document title
        title: String,
        /// Author name
        #[arg(short, long, default_value = "")]
        author: String,
        /// Organize blocks into chapters
        #[arg(long)]
        chapters: bool,
    },
    /// List all documents
    #[command(alias = "ls")]
    List,
    /// Show a document outline
    Show {
        /// Document ID
        id: String,
    },
    /// Delete a document and everything in it
    #[command(alias = "rm")]
    Delete {
        /// Document ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the whole document as Markdown
    Content {
        /// Document ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ChapterCommands {
    /// Add a chapter
    #[command(alias = "add")]
    Create {
        /// Document ID
        doc: String,
        /// Chapter title
        title: String,
        /// start, end, or after:<chapter-id>
        #[arg(short, long, default_value = "end")]
        position: String,
    },
    /// List chapters
    #[command(alias = "ls")]
    List {
        /// Document ID
        doc: String,
    },
    /// Change a chapter's title
    Rename {
        /// Document ID
        doc: String,
        /// Chapter ID
        chapter: String,
        /// New title
        title: String,
    },
    /// Delete a chapter and its blocks
    #[command(alias = "rm")]
    Delete {
        /// Document ID
        doc: String,
        /// Chapter ID
        chapter: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a chapter
    Move {
        /// Document ID
        doc: String,
        /// Chapter ID
        chapter: String,
        /// start, end, or after:<chapter-id>
        position: String,
    },
}

/// Where a new block goes
#[derive(Args)]
struct Placement {
    /// Document ID
    doc: String,
    /// Add to this chapter instead of the top-level list
    #[arg(short, long)]
    chapter: Option<String>,
    /// start, end, or after:<block-id>
    #[arg(short, long, default_value = "end")]
    position: String,
}

impl Placement {
    fn scope(&self) -> Scope {
        self.chapter
            .as_deref()
            .map(Scope::from_chapter_id)
            .unwrap_or(Scope::Document)
    }

    fn position(&self) -> Position {
        Position::parse(&self.position)
    }
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Add a heading
    Heading {
        #[command(flatten)]
        placement: Placement,
        /// Heading text
        text: String,
        /// Heading level (1-6)
        #[arg(short, long, default_value_t = 1)]
        level: u8,
    },
    /// Add a Markdown block
    Markdown {
        #[command(flatten)]
        placement: Placement,
        /// Markdown text (opens editor if not provided)
        #[arg(long)]
        content: Option<String>,
    },
    /// Import an image file and add an image block
    Image {
        #[command(flatten)]
        placement: Placement,
        /// Image file to copy into the document
        file: PathBuf,
        /// Caption shown below the image
        #[arg(long, default_value = "")]
        caption: String,
        /// Alternative text
        #[arg(long, default_value = "")]
        alt: String,
    },
    /// Add a table
    Table {
        #[command(flatten)]
        placement: Placement,
        /// Column header (repeatable)
        #[arg(long = "header", required = true)]
        headers: Vec<String>,
        /// Row with cells separated by '|' (repeatable)
        #[arg(long = "row")]
        rows: Vec<String>,
    },
    /// Add a page break
    PageBreak {
        #[command(flatten)]
        placement: Placement,
    },
    /// Add blocks from a JSON array ("-" reads stdin)
    Import {
        #[command(flatten)]
        placement: Placement,
        /// JSON file holding an array of blocks
        file: PathBuf,
    },
    /// Show blocks
    Get {
        /// Document ID
        doc: String,
        /// Block IDs; use chapter/block to pick one chapter
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Replace a block's content (opens editor if --data not provided)
    #[command(alias = "edit")]
    Update {
        /// Document ID
        doc: String,
        /// Block ID or chapter/block
        key: String,
        /// Replacement block as JSON
        #[arg(long)]
        data: Option<String>,
    },
    /// Delete a block
    #[command(alias = "rm")]
    Delete {
        /// Document ID
        doc: String,
        /// Block ID or chapter/block
        key: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a block within its list
    Move {
        /// Document ID
        doc: String,
        /// Block ID or chapter/block
        key: String,
        /// start, end, or after:<block-id>
        position: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, locking, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_deref();

    // Config commands work even when the stored config is unusable
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config = Config::load_with_cli_override(config_path)?;
    init_logging(&config, cli.verbose);
    debug!("Using data directory {:?}", config.data_dir);

    let store = Store::open_with_config(config)?;

    let result = match cli.command {
        Commands::Doc { command } => handle_doc_command(command, &store, &output),
        Commands::Chapter { command } => handle_chapter_command(command, &store, &output),
        Commands::Block { command } => handle_block_command(command, &store, &output),
        Commands::Search {
            doc,
            query,
            chapter,
        } => commands::search::search(&store, &doc, &query, chapter.as_deref(), &output),
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&store, config_path, &output),
    };

    if let Err(ref e) = result {
        if let Some(hint) = e
            .downcast_ref::<StoreError>()
            .and_then(StoreError::recovery_suggestion)
        {
            if !output.is_quiet() {
                eprintln!("hint: {}", hint);
            }
        }
    }

    result
}

fn handle_doc_command(command: DocCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        DocCommands::Create {
            title,
            author,
            chapters,
        } => commands::document::create(store, &title, &author, chapters, output),
        DocCommands::List => commands::document::list(store, output),
        DocCommands::Show { id } => commands::document::show(store, &id, output),
        DocCommands::Delete { id, yes } => commands::document::delete(store, &id, yes, output),
        DocCommands::Content { id } => commands::document::content(store, &id, output),
    }
}

fn handle_chapter_command(command: ChapterCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        ChapterCommands::Create {
            doc,
            title,
            position,
        } => commands::chapter::create(store, &doc, &title, &Position::parse(&position), output),
        ChapterCommands::List { doc } => commands::chapter::list(store, &doc, output),
        ChapterCommands::Rename {
            doc,
            chapter,
            title,
        } => commands::chapter::rename(store, &doc, &chapter, &title, output),
        ChapterCommands::Delete { doc, chapter, yes } => {
            commands::chapter::delete(store, &doc, &chapter, yes, output)
        }
        ChapterCommands::Move {
            doc,
            chapter,
            position,
        } => commands::chapter::move_to(store, &doc, &chapter, &Position::parse(&position), output),
    }
}

fn handle_block_command(command: BlockCommands, store: &Store, output: &Output) -> Result<()> {
    use commands::block;

    match command {
        BlockCommands::Heading {
            placement,
            text,
            level,
        } => block::add(
            store,
            &placement.doc,
            &placement.scope(),
            quire_core::Block::heading(level, text),
            &placement.position(),
            output,
        ),
        BlockCommands::Markdown { placement, content } => block::add_markdown(
            store,
            &placement.doc,
            &placement.scope(),
            content,
            &placement.position(),
            output,
        ),
        BlockCommands::Image {
            placement,
            file,
            caption,
            alt,
        } => block::add_image(
            store,
            &placement.doc,
            &placement.scope(),
            &file,
            caption,
            alt,
            &placement.position(),
            output,
        ),
        BlockCommands::Table {
            placement,
            headers,
            rows,
        } => block::add(
            store,
            &placement.doc,
            &placement.scope(),
            quire_core::Block::table(headers, block::parse_rows(&rows)),
            &placement.position(),
            output,
        ),
        BlockCommands::PageBreak { placement } => block::add(
            store,
            &placement.doc,
            &placement.scope(),
            quire_core::Block::page_break(),
            &placement.position(),
            output,
        ),
        BlockCommands::Import { placement, file } => block::import(
            store,
            &placement.doc,
            &placement.scope(),
            &file,
            &placement.position(),
            output,
        ),
        BlockCommands::Get { doc, keys } => block::get(store, &doc, &keys, output),
        BlockCommands::Update { doc, key, data } => {
            block::update(store, &doc, &key, data.as_deref(), output)
        }
        BlockCommands::Delete { doc, key, yes } => block::delete(store, &doc, &key, yes, output),
        BlockCommands::Move { doc, key, position } => {
            block::move_to(store, &doc, &key, &Position::parse(&position), output)
        }
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug with
/// `--verbose`. Logs go to `config.log_file` when configured, else stderr.
fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quire_core={},quire_cli={}", level, level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore the error if a subscriber is already installed
    match &config.log_file {
        Some(path) => match File::create(path) {
            Ok(file) => {
                let _ = builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", path, e);
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_placement_defaults() {
        let cli = Cli::parse_from(["quire", "block", "page-break", "report"]);
        let Commands::Block {
            command: BlockCommands::PageBreak { placement },
        } = cli.command
        else {
            panic!("expected block page-break");
        };
        assert_eq!(placement.scope(), Scope::Document);
        assert_eq!(placement.position(), Position::End);
    }

    #[test]
    fn test_placement_in_chapter_after() {
        let cli = Cli::parse_from([
            "quire",
            "--json",
            "block",
            "heading",
            "book",
            "Intro",
            "--chapter",
            "ch-002",
            "--position",
            "after:hd-001",
            "--level",
            "2",
        ]);
        assert!(cli.json);
        let Commands::Block {
            command:
                BlockCommands::Heading {
                    placement,
                    text,
                    level,
                },
        } = cli.command
        else {
            panic!("expected block heading");
        };
        assert_eq!(text, "Intro");
        assert_eq!(level, 2);
        assert_eq!(placement.scope(), Scope::Chapter("ch-002".into()));
        assert_eq!(placement.position(), Position::after("hd-001"));
    }
}
