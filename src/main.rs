use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemafind::catalog::{
    CachedSource, CatalogSource, DiskSchemaCache, IncrementalLoader, LoaderState, MemorySource,
};
use schemafind::coordinator::{SearchCoordinator, SearchListener};
use schemafind::output;
use schemafind::query::ResultSet;
use schemafind::utils::{get_cache_dir, get_config_path, AppConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on how long the CLI waits for pages to load
const LOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "schemafind")]
#[command(about = "Incremental search over database table and column catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a catalog file
    Search {
        /// JSON catalog with `tables` and `columns` arrays
        catalog: PathBuf,

        /// Search query
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,

        /// Search columns instead of tables
        #[arg(short, long)]
        columns: bool,

        /// Tables fetched per page
        #[arg(long)]
        page_size: Option<usize>,

        /// Only load this schema
        #[arg(long)]
        schema: Option<String>,

        /// Bypass the on-disk page cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Load a catalog fully and show index statistics
    Stats {
        catalog: PathBuf,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
    /// Manage the on-disk page cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached page
    Clear,
    /// Remove pages older than the configured TTL
    Purge,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = AppConfig::load()?;
    let color = !cli.no_color;

    match cli.command {
        Commands::Search {
            catalog,
            query,
            columns,
            page_size,
            schema,
            no_cache,
        } => {
            let mut config = config;
            if let Some(size) = page_size {
                config.loader.page_size = size;
            }
            if no_cache {
                config.cache.disk_cache_enabled = false;
            }
            run_search(&config, &catalog, schema, &query.join(" "), columns, color)?;
        }
        Commands::Stats { catalog } => show_stats(&config, &catalog)?,
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save()?;
                println!("Saved to {}", get_config_path()?.display());
            }
        }
        Commands::Cache { action } => handle_cache_command(&config, action)?,
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "schemafind=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

/// Prints loader status changes to stderr
struct CliListener {
    color: bool,
}

impl SearchListener for CliListener {
    fn results_published(&mut self, results: &ResultSet) {
        tracing::debug!(query = %results.query, count = results.len(), "results published");
    }

    fn status_changed(&mut self, state: LoaderState, message: &str) {
        if state != LoaderState::Loading {
            let _ = output::print_status(message, self.color);
        }
    }
}

fn open_source(config: &AppConfig, path: &Path) -> Result<Arc<dyn CatalogSource>> {
    let source = MemorySource::from_json_file(path)?;
    Ok(match config.disk_cache(path)? {
        Some(cache) => Arc::new(CachedSource::new(source, cache)),
        None => Arc::new(source),
    })
}

fn run_search(
    config: &AppConfig,
    catalog: &Path,
    schema: Option<String>,
    query: &str,
    columns: bool,
    color: bool,
) -> Result<()> {
    let loader = IncrementalLoader::new(open_source(config, catalog)?, schema);
    let mut coordinator =
        SearchCoordinator::new(loader, config.coordinator_config(), CliListener { color });

    coordinator.start();
    if !coordinator.run_until_idle(LOAD_TIMEOUT) {
        anyhow::bail!("Timed out loading {}", catalog.display());
    }

    if columns {
        coordinator.on_mode_toggled();
    }
    coordinator.on_query_changed(query);
    coordinator.search_now();
    if !coordinator.run_until_idle(LOAD_TIMEOUT) {
        anyhow::bail!("Timed out waiting for search to settle");
    }

    let view = coordinator
        .rendered()
        .context("No results for the current catalog")?;
    output::print_view(&view, color)?;
    Ok(())
}

fn show_stats(config: &AppConfig, catalog: &Path) -> Result<()> {
    let mut loader = IncrementalLoader::new(open_source(config, catalog)?, None);
    let page_size = config.loader.page_size.max(1);

    let mut outcome = loader.load_initial(page_size);
    while outcome.loaded() && !loader.is_exhausted() {
        outcome = loader.load_more(page_size);
    }

    let mut index = schemafind::index::CatalogIndex::new();
    index.rebuild(loader.catalog(), loader.generation());
    let (tables, columns) = index.stats();

    println!("Catalog: {}", catalog.display());
    println!("  {}", loader.stats().message());
    println!("  Columns: {}", loader.catalog().column_count());
    println!("  Interned strings: {}", loader.catalog().interned_strings());
    println!("  Generation: {}", loader.generation());
    println!(
        "  Table trie: {} nodes, {} tokens, {} insertions",
        tables.nodes, tables.tokens, tables.insertions
    );
    println!(
        "  Column trie: {} nodes, {} tokens, {} insertions",
        columns.nodes, columns.tokens, columns.insertions
    );
    Ok(())
}

fn handle_cache_command(config: &AppConfig, action: CacheAction) -> Result<()> {
    let root = get_cache_dir()?;
    let ttl = Duration::from_secs(config.cache.disk_cache_ttl_secs);

    // One subdirectory per catalog source
    let mut caches = Vec::new();
    if root.exists() {
        for entry in fs::read_dir(&root).context("Failed to read schema cache")? {
            let path = entry?.path();
            if path.is_dir() {
                caches.push(DiskSchemaCache::with_ttl(path, ttl));
            }
        }
    }

    match action {
        CacheAction::Clear => {
            for cache in &caches {
                cache.clear()?;
            }
            println!("Cleared {} schema caches in {}", caches.len(), root.display());
        }
        CacheAction::Purge => {
            let mut removed = 0;
            for cache in &caches {
                removed += cache.purge_expired()?;
            }
            println!("Removed {} expired pages", removed);
        }
    }

    Ok(())
}
