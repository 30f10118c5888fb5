use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lorcana_meta::api::state::AppState;
use lorcana_meta::calculate::{AnalyzeOptions, CompareOptions, SimilarityStrategy};
use lorcana_meta::config::AppConfig;
use lorcana_meta::models::{CardEntry, DeckCounts, TournamentDeck};
use lorcana_meta::storage::{merge_corpus_files, read_decklist_file};

#[derive(Parser)]
#[command(name = "lorcana-meta")]
#[command(about = "Compare Disney Lorcana decklists against the tournament meta")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CompareArgs {
    /// Decklist file (JSON or "4 Card Name" lines)
    #[arg(long)]
    deck: PathBuf,

    /// Keep only decks that finished at or above this place
    #[arg(long)]
    top: Option<u32>,

    /// Only compare against decks of --format
    #[arg(long)]
    same_format: bool,

    /// Format for --same-format (e.g. "Core"); defaults to the corpus file's format
    #[arg(long)]
    format: Option<String>,

    /// Number of similar decks to return
    #[arg(long)]
    top_k: Option<usize>,

    /// Similarity floor between 0 and 1
    #[arg(long)]
    min_sim: Option<f64>,

    /// Similarity formula: jaccard or blended
    #[arg(long)]
    strategy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Find the tournament decks closest to a decklist
    Compare(CompareArgs),

    /// Suggest adds and cuts for a decklist
    Suggest(CompareArgs),

    /// Report archetype and card trends
    Analyze {
        /// Only analyze this format
        #[arg(long)]
        format: Option<String>,

        /// End the week/month windows on this date (YYYY-MM-DD)
        #[arg(long)]
        reference: Option<String>,

        /// Size of the card popularity table
        #[arg(long, default_value = "20")]
        cards: usize,
    },

    /// Estimate matchups for an archetype or a decklist
    Matchups {
        /// Archetype label, e.g. "Amber/Steel"
        #[arg(long)]
        archetype: Option<String>,

        /// Decklist file; its archetype is inferred unless --archetype is set
        #[arg(long)]
        deck: Option<PathBuf>,
    },

    /// Merge scraped snapshot files into the corpus
    Ingest {
        /// Corpus file to merge into (defaults to the data directory corpus)
        #[arg(long)]
        into: Option<PathBuf>,

        /// Snapshot files or glob patterns (defaults to <data-dir>/snapshots/*.json)
        patterns: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!("Starting lorcana-meta v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = format!("{}:{}", config.server.host, config.server.port);

            let state = AppState::from_config(config)?;
            let load = state.load_corpus();
            match &load.path {
                Some(path) => tracing::info!("Corpus: {} decks from {:?}", load.corpus.len(), path),
                None => tracing::warn!(
                    "{}",
                    load.note.as_deref().unwrap_or("No tournament meta file found")
                ),
            }

            let app = lorcana_meta::api::build_router(state);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Compare(args) => {
            let cards = read_decklist_file(&args.deck)?;
            let options = compare_options(&args, &config)?;
            let state = AppState::from_config(config)?;
            print_json(&state.compare(&cards, &options))?;
        }
        Commands::Suggest(args) => {
            let cards = read_decklist_file(&args.deck)?;
            let options = compare_options(&args, &config)?;
            let state = AppState::from_config(config)?;
            let (comparison, suggestions) = state.suggest(&cards, &options);
            print_json(&serde_json::json!({
                "comparison": comparison,
                "suggestions": suggestions,
            }))?;
        }
        Commands::Analyze {
            format,
            reference,
            cards,
        } => {
            if cards == 0 {
                bail!("--cards must be at least 1");
            }
            let reference_date = reference
                .as_deref()
                .map(|s| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .with_context(|| format!("Invalid --reference date (expected YYYY-MM-DD): {}", s))
                })
                .transpose()?;
            let options = AnalyzeOptions {
                format,
                reference_date,
                card_limit: cards,
            };

            let state = AppState::from_config(config)?;
            let (report, note) = state.analyze(&options);
            if let Some(note) = note {
                tracing::warn!("{}", note);
            }
            print_json(&report)?;
        }
        Commands::Matchups { archetype, deck } => {
            let cards: Vec<CardEntry> = match &deck {
                Some(path) => read_decklist_file(path)?,
                None => Vec::new(),
            };
            let state = AppState::from_config(config)?;

            let archetype = match archetype {
                Some(a) => a,
                None if !cards.is_empty() => {
                    let deck = TournamentDeck {
                        cards: cards.clone(),
                        ..Default::default()
                    };
                    let inferred = state.rules.infer(&deck);
                    tracing::info!("Inferred archetype: {}", inferred);
                    inferred
                }
                None => bail!("Specify --archetype or --deck"),
            };

            let estimates = state
                .matchups
                .matchups_for(&archetype, &DeckCounts::from_entries(&cards));
            print_json(&estimates)?;
        }
        Commands::Ingest { into, patterns } => {
            let storage = config.storage();
            let target = into
                .or_else(|| config.meta.corpus_path.clone())
                .unwrap_or_else(|| storage.corpus_path());
            let patterns = if patterns.is_empty() {
                vec![storage.snapshots_dir().join("*.json").display().to_string()]
            } else {
                patterns
            };

            let inputs = expand_patterns(&patterns, &target)?;
            if inputs.is_empty() {
                tracing::warn!("No snapshot files matched {:?}", patterns);
                return Ok(());
            }
            tracing::info!("Merging {} snapshot files into {:?}", inputs.len(), target);

            let summary = merge_corpus_files(&target, &inputs)?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

/// Merge CLI flags over the configured comparison defaults.
fn compare_options(args: &CompareArgs, config: &AppConfig) -> Result<CompareOptions> {
    let mut options = config.meta.compare_options();
    options.top = args.top;
    options.same_format = args.same_format;
    options.format = args.format.clone();
    if let Some(top_k) = args.top_k {
        if top_k == 0 {
            bail!("--top-k must be at least 1");
        }
        options.top_k = top_k;
    }
    if let Some(min_sim) = args.min_sim {
        if !(0.0..=1.0).contains(&min_sim) {
            bail!("--min-sim must be between 0 and 1");
        }
        options.min_similarity = min_sim;
    }
    if let Some(strategy) = args.strategy.as_deref() {
        options.strategy = strategy
            .parse::<SimilarityStrategy>()
            .map_err(anyhow::Error::msg)?;
    }
    Ok(options)
}

/// Expand glob patterns into a sorted, de-duplicated file list, skipping
/// the merge target itself.
fn expand_patterns(patterns: &[String], target: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let entries =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        for entry in entries {
            let path = entry?;
            if path.is_file() && path != target {
                paths.push(path);
            }
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
