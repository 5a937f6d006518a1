use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use insight_analytics::{DocIndex, InsightSnapshot, SnapshotStore};
use insight_embedding::{EmbeddingCache, EmbeddingStore, HttpEmbeddingClient};
use insight_pipeline::{InsightPipeline, PipelineConfig, DEFAULT_STALE_AFTER_DAYS};
use insight_ticket::load_records;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod humanize;
mod playbook;
mod summary;
mod support_index;

#[derive(Parser)]
#[command(name = "support-insight")]
#[command(about = "Cluster support tickets and generate playbook insights", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the insight pipeline and refresh playbooks, index, and snapshot
    Analyze(AnalyzeArgs),

    /// Print the summary of the latest persisted snapshot
    Report(ReportArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Directory of ticket export files (*.json)
    #[arg(long, env = "TICKET_INSIGHT_DATA_DIR", default_value = "data/tickets")]
    data_dir: PathBuf,

    /// Directory where playbooks and the support index are written
    #[arg(long, env = "TICKET_INSIGHT_DOCS_DIR", default_value = "docs/support")]
    docs_dir: PathBuf,

    /// Embedding cache directory
    #[arg(
        long,
        env = "TICKET_INSIGHT_CACHE_DIR",
        default_value = ".support-insight/vectors"
    )]
    cache_dir: PathBuf,

    /// Snapshot directory
    #[arg(long, env = "TICKET_INSIGHT_SNAPSHOT_DIR", default_value = "data/insights")]
    snapshot_dir: PathBuf,

    /// Embedding service endpoint
    #[arg(
        long,
        env = "TICKET_INSIGHT_ENDPOINT",
        default_value = "https://api.openai.com/v1/embeddings"
    )]
    endpoint: String,

    /// Embedding model id
    #[arg(long, env = "TICKET_INSIGHT_MODEL", default_value = "text-embedding-3-small")]
    model: String,

    /// Embedding service API key
    #[arg(long, env = "TICKET_INSIGHT_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Seed for centroid initialization (fixed seed reproduces a run)
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Days before the latest snapshot counts as stale
    #[arg(long, default_value_t = DEFAULT_STALE_AFTER_DAYS)]
    stale_days: u64,

    /// Re-cluster even when the latest snapshot is still fresh
    #[arg(long)]
    force: bool,

    /// Print the resulting snapshot as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Snapshot directory
    #[arg(long, env = "TICKET_INSIGHT_SNAPSHOT_DIR", default_value = "data/insights")]
    snapshot_dir: PathBuf,

    /// Print the snapshot as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::Analyze(args) => args.json,
        Commands::Report(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Report(args) => run_report(args).await,
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let records = load_records(&args.data_dir)
        .await
        .with_context(|| format!("Failed to load exports from {}", args.data_dir.display()))?;
    let docs = DocIndex::load(&args.docs_dir).await?;

    let client = HttpEmbeddingClient::new(&args.endpoint, &args.model, &args.api_key)?;
    let cache = EmbeddingCache::new(EmbeddingStore::new(&args.cache_dir), Arc::new(client));
    let pipeline = InsightPipeline::new(
        cache,
        SnapshotStore::new(&args.snapshot_dir),
        docs,
        PipelineConfig {
            stale_after_days: args.stale_days,
            seed: args.seed,
        },
    );

    let now = Utc::now();
    let outcome = if args.force {
        pipeline.run(&records, now).await?
    } else {
        pipeline.run_if_stale(&records, now).await?
    };

    let written = write_docs(&args.docs_dir, &outcome.snapshot).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.snapshot)?);
    } else {
        print!(
            "{}",
            summary::render(&outcome.snapshot, Some(&outcome.report), Some(written))
        );
    }
    Ok(())
}

async fn run_report(args: ReportArgs) -> Result<()> {
    let store = SnapshotStore::new(&args.snapshot_dir);
    let snapshot = store
        .load_latest()
        .await?
        .context("No snapshot found; run `support-insight analyze` first")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", summary::render(&snapshot, None, None));
    }
    Ok(())
}

/// Write one playbook per cluster plus the support index. Returns the number
/// of distinct playbook files written.
async fn write_docs(docs_dir: &Path, snapshot: &InsightSnapshot) -> Result<usize> {
    tokio::fs::create_dir_all(docs_dir).await?;

    let mut written: BTreeSet<String> = BTreeSet::new();
    for cluster in &snapshot.clusters {
        let path = docs_dir.join(format!("{}.md", cluster.slug));
        tokio::fs::write(&path, playbook::render_playbook(cluster)).await?;
        log::debug!("Wrote {}", path.display());
        written.insert(cluster.slug.clone());
    }

    tokio::fs::write(
        docs_dir.join("index.md"),
        support_index::render_index(snapshot),
    )
    .await?;
    log::info!(
        "Wrote {} playbooks + index.md to {}",
        written.len(),
        docs_dir.display()
    );

    Ok(written.len())
}
