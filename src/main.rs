use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use quoteshelf::config::Config;
use quoteshelf::storage::{CategoryFilter, Database, DatabaseError};
use quoteshelf::store::{QuoteError, QuoteStore};
use quoteshelf::sync::{push_in_background, sync_once, RemoteClient, SyncEvent, SyncTask};
use quoteshelf::view;

/// Largest file `import` will read.
const MAX_IMPORT_SIZE: u64 = 5 * 1024 * 1024;

/// Get the config directory path (~/.config/quoteshelf/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("quoteshelf"))
}

/// Write `content` to `dst` via a temp file and rename, so a partial export
/// never replaces a good one.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temporary file '{}'", temp_path.display()))?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all());
    drop(temp_file);
    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to write '{}'", temp_path.display()));
    }

    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst)
            .with_context(|| format!("Failed to replace existing '{}'", dst.display()))?;
    }

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}'",
            temp_path.display(),
            dst.display()
        )
    })?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "quoteshelf", about = "Categorized quotes with periodic remote sync")]
struct Args {
    /// Database file (default: ~/.config/quoteshelf/quotes.db)
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    /// Config file (default: ~/.config/quoteshelf/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a random quote from the selected category
    Random {
        /// Select this category first ("all" clears the filter)
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a quote
    Add {
        text: String,
        category: String,
        /// Skip pushing the new quote to the remote endpoint
        #[arg(long)]
        no_push: bool,
    },
    /// List categories; the selected one is marked with '*'
    Categories,
    /// Select a category ("all" for every quote) and show the matching quotes
    Filter { category: String },
    /// List quotes under the current filter
    List,
    /// Run one sync cycle against the remote endpoint
    Sync,
    /// Sync periodically until interrupted
    Watch,
    /// Write all quotes to a JSON file
    Export { file: PathBuf },
    /// Append quotes from a JSON file
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let db_path = args.db.clone().unwrap_or_else(|| config_dir.join("quotes.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let store = QuoteStore::load(db)
        .await
        .context("Failed to load quotes")?;

    run(args.command, store, config).await
}

async fn run(command: Command, mut store: QuoteStore, config: Config) -> Result<()> {
    let width = config.display_width;

    match command {
        Command::Random { category } => {
            if let Some(category) = category {
                store.set_filter(CategoryFilter::parse(&category)).await?;
            } else {
                store.populate_categories().await?;
            }
            println!("{}", view::render_selection(store.random_quote(), width));
        }
        Command::Add {
            text,
            category,
            no_push,
        } => {
            let quote = match store.add(&text, &category).await {
                Ok(quote) => quote,
                Err(e @ QuoteError::EmptyField(_)) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Failed to add quote"),
            };
            println!("New quote added ({} total)", store.len());

            if config.push_on_add && !no_push {
                let client = RemoteClient::from_config(&config)?;
                // The process would exit before a detached push lands; wait for it.
                if let Err(e) = push_in_background(client, quote).await {
                    tracing::warn!(error = %e, "Push task did not complete");
                }
            }
        }
        Command::Categories => {
            let (categories, selected) = store.populate_categories().await?;
            for category in categories {
                let marker = if category == selected.as_str() { '*' } else { ' ' };
                println!("{} {}", marker, category);
            }
        }
        Command::Filter { category } => {
            let filtered = store.set_filter(CategoryFilter::parse(&category)).await?;
            if filtered.is_empty() {
                println!("{}", view::EMPTY_PLACEHOLDER);
            }
            for quote in filtered {
                println!("{}\n", view::render_quote(quote, width));
            }
        }
        Command::List => {
            store.populate_categories().await?;
            let filtered = store.filtered();
            if filtered.is_empty() {
                println!("{}", view::EMPTY_PLACEHOLDER);
            }
            for quote in filtered {
                let id = quote.id.map(|id| format!("#{} ", id)).unwrap_or_default();
                println!("{}{}\n", id, view::render_quote(quote, width));
            }
        }
        Command::Sync => {
            let client = RemoteClient::from_config(&config)?;
            let shared = Arc::new(Mutex::new(store));
            let event = match sync_once(&shared, &client).await {
                Ok(report) => SyncEvent::Completed {
                    report,
                    at: chrono::Utc::now(),
                },
                Err(e) => SyncEvent::Failed {
                    error: e.to_string(),
                    at: chrono::Utc::now(),
                },
            };
            println!("{}", event.summary());
        }
        Command::Watch => {
            let client = RemoteClient::from_config(&config)?;
            let shared = Arc::new(Mutex::new(store));
            let (event_tx, mut event_rx) = mpsc::channel::<SyncEvent>(16);
            let handle = SyncTask::spawn(shared, client, config.sync_period(), event_tx);

            println!(
                "Syncing every {}s with {} (Ctrl-C to stop)",
                config.sync_interval(),
                config.endpoint
            );
            loop {
                tokio::select! {
                    event = event_rx.recv() => match event {
                        Some(event) => println!("{}", event.summary()),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        handle.cancel();
                        break;
                    }
                }
            }
        }
        Command::Export { file } => {
            if store.is_empty() {
                tracing::warn!("Quote list is empty, exporting an empty array");
            }
            let json = store.export_json()?;
            atomic_write(&file, json.as_bytes())?;
            println!("Exported {} quotes to {}", store.len(), file.display());
        }
        Command::Import { file } => {
            let metadata = std::fs::metadata(&file)
                .with_context(|| format!("Failed to read import file: {}", file.display()))?;
            if !metadata.is_file() {
                anyhow::bail!("Import path must be a regular file");
            }
            if metadata.len() > MAX_IMPORT_SIZE {
                anyhow::bail!(
                    "Import file is {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_IMPORT_SIZE
                );
            }
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read import file: {}", file.display()))?;
            let imported = store
                .import_json(&content)
                .await
                .context("Import failed")?;
            println!("Imported {} quotes ({} total)", imported, store.len());
        }
    }

    Ok(())
}
