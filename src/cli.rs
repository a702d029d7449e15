//! Command-line interface for par-notes.
//!
//! Every command loads the tree from the persistence service, applies one
//! operation, and flushes the resulting sync before exiting.

use crate::app::App;
use crate::transfer::{self, ExportFormat};
use crate::tree::{Item, ItemId, TreeStore, Window, WindowId};
use crate::view::{self, SortMode};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use par_notes_config::Config;
use par_notes_sync::{HttpBackend, SyncBackend};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// par-notes - Hierarchical notes with Miller-column navigation
#[derive(Parser)]
#[command(name = "par-notes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", global = true, value_parser = parse_level)]
    pub log_level: Option<log::LevelFilter>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the note hierarchy
    Tree {
        /// Sort order per column (oldest, newest, alpha, alpha-desc)
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortMode>,

        /// Only show notes whose title contains this text
        #[arg(long, value_name = "TEXT")]
        filter: Option<String>,
    },

    /// Create a note
    Add {
        /// Create the note inside this note instead of at the top level
        #[arg(long, value_name = "ITEM_ID")]
        under: Option<String>,

        /// Title; derived from the numbering rule when omitted
        title: Option<String>,
    },

    /// Rename a note
    Rename { id: String, title: String },

    /// Replace a note's HTML content
    Write { id: String, html: String },

    /// Delete a note and everything beneath it
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Export notes to JSON or plain text
    Export {
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Write to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Export only these notes and their subtrees (repeatable)
        #[arg(long = "item", value_name = "ITEM_ID")]
        items: Vec<String>,
    },

    /// Import a JSON export
    Import { path: PathBuf },

    /// Write the active configuration to the config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Json,
    Text,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Text => ExportFormat::Text,
        }
    }
}

fn parse_level(s: &str) -> std::result::Result<log::LevelFilter, String> {
    s.parse::<log::LevelFilter>()
        .map_err(|_| format!("unknown log level '{s}'"))
}

fn parse_sort(s: &str) -> std::result::Result<SortMode, String> {
    SortMode::parse(s)
        .ok_or_else(|| format!("unknown sort '{s}' (expected oldest, newest, alpha or alpha-desc)"))
}

/// Run `command` against the configured persistence service.
///
/// `config_path` is the `--config` override, if any.
pub fn run(
    command: Commands,
    config: Config,
    config_path: Option<&Path>,
    runtime: &Runtime,
) -> Result<()> {
    if let Commands::InitConfig { force } = command {
        return init_config(&config, config_path, force);
    }

    let mut app = connect(config, runtime)?;

    let mutated = match command {
        Commands::Tree { sort, filter } => {
            let sort = sort.unwrap_or(app.config().default_sort);
            print_tree(&app, filter.as_deref().unwrap_or(""), sort);
            false
        }
        Commands::Add { under, title } => {
            let window = match under {
                Some(parent) => app.open_item(&ItemId::from(parent))?,
                None => WindowId::root(),
            };
            let item = app.create_item(&window, title.as_deref())?;
            println!("{}\t{}", item.id, item.title);
            true
        }
        Commands::Rename { id, title } => {
            let id = ItemId::from(id);
            let window = app.window_of(&id)?;
            app.rename_item(&window, &id, &title)?;
            true
        }
        Commands::Write { id, html } => {
            let id = ItemId::from(id);
            if !app.set_content(&id, &html) {
                anyhow::bail!("Item not found: {}", id);
            }
            true
        }
        Commands::Delete { id, yes } => delete(&mut app, ItemId::from(id), yes)?,
        Commands::Export { format, out, items } => {
            export(&mut app, format.into(), out, items)?;
            false
        }
        Commands::Import { path } => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let report = app.import_json(&json)?;
            println!(
                "Imported {} notes ({} placed at the top level for unresolved lineage)",
                report.created.len(),
                report.rehomed
            );
            true
        }
        // Handled before connecting
        Commands::InitConfig { .. } => false,
    };

    if mutated
        && let Some(outcome) = runtime.block_on(app.flush_sync())?
        && outcome.failed > 0
    {
        eprintln!(
            "Warning: {} of {} rows failed to sync",
            outcome.failed,
            outcome.upserted + outcome.deleted + outcome.failed
        );
    }
    Ok(())
}

/// Save `config` to `path` (or the default location) unless a file exists
fn init_config(config: &Config, path: Option<&Path>, force: bool) -> Result<()> {
    let target = path.map_or_else(Config::config_path, Path::to_path_buf);
    if target.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    match path {
        Some(path) => config.save_to(path),
        None => config.save(),
    }
    .with_context(|| format!("Failed to write {}", target.display()))?;
    println!("Wrote {}", target.display());
    Ok(())
}

/// Build the app and load the stored tree, or start empty when sync is off
fn connect(config: Config, runtime: &Runtime) -> Result<App> {
    if !config.sync_enabled {
        log::warn!("Sync disabled; working on an empty tree");
        return Ok(App::new(config));
    }

    let backend = HttpBackend::new(&config.server_url, config.sync_timeout())
        .context("Invalid server_url")?;
    let backend: Arc<dyn SyncBackend> = Arc::new(backend);
    let mut app = App::with_sync(config, Arc::clone(&backend), runtime.handle().clone());
    app.load_from(backend.as_ref())
        .context("Failed to load notes from the server")?;
    Ok(app)
}

fn print_tree(app: &App, filter: &str, sort: SortMode) {
    if app.store().is_empty() {
        println!("(no notes)");
        return;
    }
    for line in tree_lines(app.store(), filter, sort) {
        println!("{}", line);
    }
}

/// Indented listing of the hierarchy.
///
/// With a filter, an item is listed when its title matches or something
/// beneath it does, and collapsed columns holding a match are expanded.
fn tree_lines(store: &TreeStore, filter: &str, sort: SortMode) -> Vec<String> {
    let keep = (!filter.is_empty()).then(|| view::matching_branches(store, filter));

    let mut lines = Vec::new();
    let mut stack: Vec<(usize, &Item)> = visible(store.root(), sort, keep.as_ref())
        .into_iter()
        .rev()
        .map(|item| (0, item))
        .collect();
    while let Some((depth, item)) = stack.pop() {
        let child = item
            .child_window_id
            .as_ref()
            .and_then(|id| store.window(id));
        let expand = child.is_some_and(|window| !window.collapsed || keep.is_some());
        let marker = match child {
            Some(window) if !expand && !window.items.is_empty() => " [+]",
            _ => "",
        };
        lines.push(format!(
            "{}{}{}  ({})",
            "  ".repeat(depth),
            item.title,
            marker,
            item.id
        ));

        if let Some(window) = child
            && expand
        {
            stack.extend(
                visible(window, sort, keep.as_ref())
                    .into_iter()
                    .rev()
                    .map(|nested| (depth + 1, nested)),
            );
        }
    }
    lines
}

fn visible<'a>(window: &'a Window, sort: SortMode, keep: Option<&HashSet<ItemId>>) -> Vec<&'a Item> {
    view::project(window, "", sort)
        .into_iter()
        .filter(|item| keep.is_none_or(|ids| ids.contains(&item.id)))
        .collect()
}

/// Confirm and cascade-delete; returns whether anything was removed
fn delete(app: &mut App, id: ItemId, skip_prompt: bool) -> Result<bool> {
    let window = app.window_of(&id)?;
    let descendants = app.store().subtree_item_ids(&id).len().saturating_sub(1);
    let title = app
        .store()
        .item(&id)
        .map(|item| item.title.clone())
        .unwrap_or_default();

    if !skip_prompt {
        if descendants > 0 {
            print!(
                "Delete '{}' and {} nested note(s)? [y/N] ",
                title, descendants
            );
        } else {
            print!("Delete '{}'? [y/N] ", title);
        }
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        let response = response.trim().to_lowercase();

        if response != "y" && response != "yes" {
            println!("Deletion cancelled.");
            return Ok(false);
        }
    }

    let report = app.delete_item(&window, &id)?;
    println!(
        "Deleted {} note(s) and {} column(s)",
        report.items.len(),
        report.windows.len()
    );
    Ok(true)
}

fn export(
    app: &mut App,
    format: ExportFormat,
    out: Option<PathBuf>,
    items: Vec<String>,
) -> Result<()> {
    if items.is_empty() {
        app.select_all();
    } else {
        for id in items {
            app.select_subtree(&ItemId::from(id))?;
        }
    }

    let records = app.export_records();
    match out {
        Some(path) => {
            transfer::write_export(&path, &records, format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported {} notes to {}", records.len(), path.display());
        }
        None => {
            let body = app.export(format)?;
            print!("{}", body);
            if format == ExportFormat::Json {
                println!();
            }
        }
    }
    Ok(())
}
