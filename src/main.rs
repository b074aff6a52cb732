//! Ripplegraph main entry point
//!
//! Command-line interface for the ripplegraph social graph crawler.

use clap::Parser;
use ripplegraph::config::{load_config_with_hash, Config};
use ripplegraph::source::ReplaySource;
use ripplegraph::storage::SqliteStore;
use ripplegraph::ConfigError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Ripplegraph: a credential-rotating social graph crawler
///
/// Ripplegraph walks a remote social graph breadth-first through a rotating
/// pool of access credentials, pruning fan-out by popularity and
/// checkpointing its state so interrupted runs resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "ripplegraph")]
#[command(version = "1.0.0")]
#[command(about = "A credential-rotating social graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl, ignoring previous state
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_edges"])]
    dry_run: bool,

    /// Show statistics from the checkpoint database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_edges"])]
    stats: bool,

    /// Export the edge list from the checkpoint database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_edges: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_edges {
        handle_export_edges(&config)?;
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripplegraph=info,warn"),
            1 => EnvFilter::new("ripplegraph=debug,info"),
            2 => EnvFilter::new("ripplegraph=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== Ripplegraph Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Target nodes: {}", config.crawler.max_nodes);
    println!("  Max leaves per node: {}", config.crawler.max_leaves);
    println!("  Starting node: {}", config.crawler.starting_node);
    println!("  Request pause: {}ms", config.crawler.request_pause_ms);
    match &config.crawler.language_filter {
        Some(lang) => println!(
            "  Language filter: {} (unspecified {})",
            lang,
            if config.crawler.accept_unspecified_language {
                "accepted"
            } else {
                "rejected"
            }
        ),
        None => println!("  Language filter: none"),
    }

    println!("\nCredentials ({}):", config.credentials.len());
    for entry in &config.credentials {
        println!("  - {}", entry.id);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Edge list: {}", config.output.edges_path);
    println!("  Retain checkpoint: {}", config.output.retain_checkpoint);

    if let Some(source) = &config.source {
        println!("\nReplay fixture: {}", source.fixture_path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the checkpoint database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use ripplegraph::output::{load_stats, print_stats};

    println!("Database: {}\n", config.output.database_path);

    let store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let stats = load_stats(&store)?;
    print_stats(&stats);

    Ok(())
}

/// Handles the --export-edges mode: writes the edge list from the checkpoint
fn handle_export_edges(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use ripplegraph::output::write_edge_list;
    use ripplegraph::storage::CheckpointStore;

    let store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let state = store.load()?;

    write_edge_list(&state.graph, Path::new(&config.output.edges_path))?;
    println!("✓ Edge list exported to: {}", config.output.edges_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if interrupted run exists)");
    }

    // The binary crawls a recorded fixture; live transports wire their own
    // DataSource through the library API.
    let Some(source_config) = &config.source else {
        let err = ConfigError::Validation(
            "crawling from the CLI requires a [source] fixture-path".to_string(),
        );
        tracing::error!("{}", err);
        return Err(err.into());
    };

    let source = ReplaySource::from_path(Path::new(&source_config.fixture_path))?;
    tracing::info!(
        "Replay fixture loaded: {} users from {}",
        source.user_count(),
        source_config.fixture_path
    );

    match ripplegraph::crawler::crawl(config, source, config_hash, fresh).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
