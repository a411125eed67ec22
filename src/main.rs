//! mdpad - launcher for the markdown authoring core.
//!
//! # Usage
//!
//! ```bash
//! mdpad list
//! mdpad import README.md
//! mdpad show > preview.html
//! mdpad export 1712345678901 --out ~/Downloads
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mdpad::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use mdpad::highlight::set_background_mode;
use mdpad::perf;
use mdpad::render::{RenderPipeline, RenderedPane};
use mdpad::store::{
    DirectoryExport, DocumentStore, ExportSink, FileSource, FileStorage, PendingImport,
    StorageStatus,
};

/// Persisted markdown documents with incremental HTML rendering
#[derive(Parser, Debug)]
#[command(name = "mdpad", version, about, long_about = None)]
struct Cli {
    /// Directory holding the persisted documents
    #[arg(long, value_name = "DIR", global = true)]
    storage_dir: Option<PathBuf>,

    /// Code highlight palette
    #[arg(long, value_enum, global = true)]
    theme: Option<ThemeMode>,

    /// Pass raw HTML in documents through instead of escaping it
    #[arg(long, global = true)]
    allow_html: bool,

    /// Release scroll sync on the scroll-completed signal instead of a timer
    #[arg(long, global = true)]
    scroll_end: bool,

    /// Scroll sync settle delay in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    settle_ms: Option<u64>,

    /// Enable performance logging
    #[arg(long, global = true)]
    perf: bool,

    /// Write render debug events to a file
    #[arg(long, value_name = "PATH", global = true)]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List documents (the active one is marked with *)
    List,
    /// Create a blank document and select it
    New,
    /// Print the rendered HTML of a document (default: the active one)
    Show { id: Option<String> },
    /// Select a document
    Select { id: String },
    /// Rename a document
    Rename { id: String, name: String },
    /// Replace a document's content with the contents of a file
    Edit { id: String, file: PathBuf },
    /// Delete a document
    Rm { id: String },
    /// Import a text file as a new document
    Import { path: PathBuf },
    /// Save a document's markdown into a directory
    Export {
        id: String,
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MDPAD_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = ?render_debug_log_path,
            error = %err,
            "failed to initialize render debug log"
        );
    }
    set_background_mode(effective.theme.and_then(ThemeMode::background));

    let mut store = DocumentStore::load(FileStorage::new(effective.storage_dir_or_default()));

    match cli.command.unwrap_or(Command::List) {
        Command::List => {
            for doc in store.documents() {
                let marker = if store.active_id() == Some(doc.id()) { '*' } else { ' ' };
                println!(
                    "{marker} {}  {}  (updated {})",
                    doc.id(),
                    doc.name(),
                    doc.updated_at().format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        Command::New => {
            let doc = store.create();
            println!("{}", doc.id());
        }
        Command::Show { id } => {
            let doc = match id.as_deref() {
                Some(id) => store.get(id).with_context(|| format!("No document with id {id}"))?,
                None => store.active().context("No active document")?,
            };
            let mut pipeline = RenderPipeline::new(effective.render_options());
            let mut pane = RenderedPane::new();
            pipeline.render(doc.content(), &mut pane);
            println!("{}", pane.to_html());
        }
        Command::Select { id } => store.set_active(Some(id.as_str()))?,
        Command::Rename { id, name } => {
            if !store.rename(&id, name) {
                anyhow::bail!("No document with id {id}");
            }
        }
        Command::Edit { id, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if !store.set_content(&id, content) {
                anyhow::bail!("No document with id {id}");
            }
        }
        Command::Rm { id } => {
            if !store.delete(&id) {
                anyhow::bail!("No document with id {id}");
            }
        }
        Command::Import { path } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "imported.md".to_string());
            let pending = PendingImport::spawn(name, FileSource::new(&path));
            let doc = store
                .import_pending(pending)
                .with_context(|| format!("Import of {} failed", path.display()))?;
            println!("{}", doc.id());
        }
        Command::Export { id, out } => {
            let file = store.export_text(&id)?;
            let path = DirectoryExport::new(out)
                .save(&file)
                .context("Export failed")?;
            println!("{}", path.display());
        }
    }

    if let StorageStatus::Degraded(reason) = store.storage_status() {
        anyhow::bail!(
            "Changes were not saved to {}: {reason}",
            store.storage().dir().display()
        );
    }
    Ok(())
}
