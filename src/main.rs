//! # ZhuNote CLI (`zn`)
//!
//! The `zn` binary is the command-line interface to the note store. It
//! writes individual notes, folds them into the master index, and answers
//! search queries against the index.
//!
//! ## Usage
//!
//! ```bash
//! zn [--config ./zhunote.toml] [--path ./notes] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `zn save --title "<title>"` | Write one note's `.note` and `.txt` files |
//! | `zn merge` | Fold new/changed note files into the master index |
//! | `zn search "<query>"` | Match query words against titles and keywords |
//! | `zn list` | Print every indexed note, sorted by title |
//! | `zn show <name>` | Print one record file (by filename or title) |
//!
//! ## Examples
//!
//! ```bash
//! # Write a note into ./notes
//! zn --path ./notes save --title "Birding Trip" --keyword "heron, lake"
//!
//! # Bring the master index up to date, then query it
//! zn --path ./notes merge
//! zn --path ./notes search heron
//!
//! # Overwrite an existing note without being asked
//! zn --path ./notes save --title "Birding Trip" --body "updated" --force
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zhunote::config::{self, Config};
use zhunote::record::{record_filename, NoteDraft, NoteRecord, RECORD_EXT};
use zhunote::store::{NoteStore, StoreError, MASTER_FILENAME};

const DEFAULT_CONFIG: &str = "zhunote.toml";

const AFTER_HELP: &str = "Typical workflow:
  zn save --title \"Birding Trip\" --keyword \"heron, lake\" --body \"...\"
  zn merge          (fold saved notes into the master index)
  zn search heron   (any query word may match a title or keyword)
  zn list           (browse everything, sorted by title)

Listing entries before a save helps avoid overwriting an existing title.";

/// ZhuNote CLI — a file-backed personal note store with incremental merge
/// and keyword search.
///
/// The note directory is taken from `--path` when given, otherwise from
/// `store.root` in the config file, otherwise the current directory.
#[derive(Parser)]
#[command(
    name = "zn",
    about = "ZhuNote — a file-backed personal note store with incremental merge and keyword search",
    version,
    long_about = "ZhuNote keeps each note as a pair of files (structured .note plus readable .txt) \
    in one flat directory, and maintains a master index over all of them. Saving touches only the \
    note's own files; `zn merge` folds anything new or changed into the index; `zn search` matches \
    query words against titles and keywords.",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, `./zhunote.toml` is used if it exists; otherwise
    /// built-in defaults apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Note directory. Overrides `store.root` from the config file.
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write one note to the store directory.
    ///
    /// Produces two files named after the title (spaces become
    /// underscores): a structured `.note` record and a `.txt` rendering.
    /// If the note already exists, `zn` asks before overwriting when run
    /// interactively and refuses otherwise; `--force` overwrites
    /// unconditionally. The master index is not touched until the next
    /// `zn merge`.
    Save {
        /// Note title; the unique key within the store.
        #[arg(long)]
        title: String,

        /// Comma-delimited keywords, searched together with the title.
        #[arg(long, default_value = "")]
        keyword: String,

        /// Comma-delimited figure filenames (stored as references only).
        #[arg(long, default_value = "")]
        figure: String,

        /// Filename of an associated HTML document (stored as a reference).
        #[arg(long, default_value = "")]
        html: String,

        /// Note body text.
        #[arg(long, default_value = "", conflicts_with = "body_file")]
        body: String,

        /// Read the note body from a file instead of `--body`.
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Overwrite an existing note without asking.
        #[arg(long)]
        force: bool,
    },

    /// Fold new and changed note files into the master index.
    ///
    /// Scans the store directory for `.note` files at least as new as the
    /// index, upserts them into the mapping keyed by title, and rewrites
    /// the index. Unreadable files are skipped and reported, never fatal.
    /// Running it again with no changes is a no-op.
    Merge,

    /// Search the master index.
    ///
    /// Splits the query on whitespace; a note matches when any query word
    /// occurs case-insensitively inside its title or keywords. Results are
    /// sorted by title. Run `zn merge` first to pick up recent saves.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print every indexed note, sorted by title.
    List {
        /// Maximum number of notes to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print one record file.
    ///
    /// Accepts the on-disk filename (`My_First_Note.note`) or the note
    /// title (`"My First Note"`); reads the file directly, bypassing the
    /// master index.
    Show {
        /// Record filename or note title.
        name: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let root = resolve_root(&cli)?;

    match cli.command {
        Commands::Save {
            title,
            keyword,
            figure,
            html,
            body,
            body_file,
            force,
        } => {
            let body = match body_file {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read body file: {}", path.display()))?,
                None => body,
            };
            let draft = NoteDraft {
                title,
                keyword,
                figure,
                html,
                body,
            };
            cmd_save(&root, &draft, force)
        }
        Commands::Merge => cmd_merge(&root),
        Commands::Search { query, limit } => cmd_search(&root, &query, limit),
        Commands::List { limit } => cmd_list(&root, limit),
        Commands::Show { name } => cmd_show(&root, &name),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Note directory precedence: `--path`, then the config file, then `.`.
/// An explicit `--config` must load even when `--path` overrides the root
/// it names; the implicit `./zhunote.toml` is only read when present and
/// only when it would actually be consulted.
fn resolve_root(cli: &Cli) -> Result<PathBuf> {
    let explicit = match &cli.config {
        Some(path) => Some(config::load_config(path)?),
        None => None,
    };
    if let Some(path) = &cli.path {
        return Ok(path.clone());
    }
    if let Some(cfg) = explicit {
        return Ok(cfg.store.root);
    }
    let default = PathBuf::from(DEFAULT_CONFIG);
    if default.exists() {
        return Ok(config::load_config(&default)?.store.root);
    }
    Ok(Config::default().store.root)
}

fn cmd_save(root: &Path, draft: &NoteDraft, force: bool) -> Result<()> {
    let store = NoteStore::open(root)?;
    let saved = if force {
        store.confirm_overwrite_and_save(draft)?
    } else {
        match store.save_record(draft) {
            Ok(saved) => saved,
            Err(StoreError::Conflict { path }) => {
                if !prompt_overwrite(&path)? {
                    bail!(
                        "note file {} already exists; pass --force to overwrite",
                        path.display()
                    );
                }
                store.confirm_overwrite_and_save(draft)?
            }
            Err(e) => return Err(e.into()),
        }
    };
    println!("Saved: {} (Time: {})", saved.filename, saved.time);
    println!("Run `zn merge` to fold it into the master index.");
    Ok(())
}

/// Ask on the terminal whether to overwrite. A non-interactive stdin never
/// confirms, so scripts must opt in with `--force`.
fn prompt_overwrite(path: &Path) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }
    eprint!("Note file {} exists. Overwrite? [y/N] ", path.display());
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn cmd_merge(root: &Path) -> Result<()> {
    let mut store = NoteStore::open(root)?;
    let entries_before = store.len();
    let report = store.merge_and_persist()?;

    for title in &report.added {
        println!("Add new entry: {title}");
    }
    for title in &report.modified {
        println!("Modify existing entry: {title}");
    }
    for skipped in &report.skipped {
        eprintln!("Skipped {}: {}", skipped.filename, skipped.reason);
    }
    println!(
        "Merged {} notes ({} added, {} modified), {} skipped.",
        report.folded(),
        report.added.len(),
        report.modified.len(),
        report.skipped.len()
    );
    println!("Master entries: {} before, {} after.", entries_before, store.len());
    println!(
        "Master index: {}",
        store.root().join(MASTER_FILENAME).display()
    );
    Ok(())
}

fn cmd_search(root: &Path, query: &str, limit: Option<usize>) -> Result<()> {
    let store = NoteStore::open(root)?;
    let hits = store.search(query);
    if hits.is_empty() {
        println!("No matching notes.");
        return Ok(());
    }
    let shown = print_records(&hits, limit);
    if shown < hits.len() {
        println!("{} matching notes (showing first {shown}).", hits.len());
    } else {
        println!("{} matching notes.", hits.len());
    }
    Ok(())
}

fn cmd_list(root: &Path, limit: Option<usize>) -> Result<()> {
    let store = NoteStore::open(root)?;
    let all = store.list_all();
    print_records(&all, limit);
    println!("{} notes.", store.len());
    Ok(())
}

/// One line per record, truncated to `limit`; returns how many were shown.
fn print_records(records: &[&NoteRecord], limit: Option<usize>) -> usize {
    let shown = limit.unwrap_or(records.len()).min(records.len());
    for record in &records[..shown] {
        if record.keyword.is_empty() {
            println!("{}  ({})", record.title, record.time);
        } else {
            println!("{}  ({})  [{}]", record.title, record.time, record.keyword);
        }
    }
    shown
}

fn cmd_show(root: &Path, name: &str) -> Result<()> {
    let store = NoteStore::open(root)?;
    // accept either the exact on-disk name or a title to derive it from
    let filename = if name.ends_with(&format!(".{RECORD_EXT}")) {
        name.to_string()
    } else {
        record_filename(name)
    };
    let record = store.load_single(&filename)?;
    print!("{}", record.render_text());
    Ok(())
}
