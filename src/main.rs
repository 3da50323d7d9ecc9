//! Snapcrawl command-line driver
//!
//! Starts, resumes and inspects epoch-based crawls. Ctrl-C asks the engine to
//! finish the current epoch (drain, snapshot, save) and exit.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use kodegen_tools_snapcrawl::content_store::{ContentStore, StoreMode};
use kodegen_tools_snapcrawl::crawl_engine::SAVED_FILES_DIR;
use kodegen_tools_snapcrawl::utils::{
    DEFAULT_ERROR_RATE, DEFAULT_INTERVAL_MS, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_MAX_WORKERS,
    DEFAULT_MET_CAPACITY, DEFAULT_SAVED_CAPACITY,
};
use kodegen_tools_snapcrawl::{
    CrawlConfig, CrawlEngine, FilterRegistry, RunOptions, latest_snapshot, list_snapshots,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "kodegen-snapcrawl")]
#[command(about = "Bounded, resumable web crawler with snapshot/rollback")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a fresh crawl, discarding anything in the directory
    Crawl {
        #[arg(long, env = "SNAPCRAWL_DIR")]
        dir: PathBuf,

        /// Filter profile: sina, zhibo8 or dongqiudi
        #[arg(long, env = "SNAPCRAWL_PROFILE")]
        profile: String,

        /// Seed URL; repeatable. Defaults to the profile's own seeds
        #[arg(long = "seed")]
        seeds: Vec<String>,

        #[command(flatten)]
        tuning: Tuning,

        #[command(flatten)]
        epochs: EpochArgs,
    },

    /// Resume from the latest (or a named) snapshot; newer snapshots are deleted
    Resume {
        #[arg(long, env = "SNAPCRAWL_DIR")]
        dir: PathBuf,

        #[arg(long)]
        snapshot: Option<String>,

        /// Push this many random profile seeds before each epoch
        #[arg(long, default_value_t = 0)]
        reseed: usize,

        #[command(flatten)]
        epochs: EpochArgs,
    },

    /// List snapshot names, oldest first
    Snapshots {
        #[arg(long, env = "SNAPCRAWL_DIR")]
        dir: PathBuf,
    },

    /// Print stored entries: url, title, content file
    Entries {
        #[arg(long, env = "SNAPCRAWL_DIR")]
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Tuning {
    #[arg(long, env = "SNAPCRAWL_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Base delay between fetches per worker, in milliseconds
    #[arg(long, env = "SNAPCRAWL_INTERVAL_MS", default_value_t = DEFAULT_INTERVAL_MS)]
    interval_ms: u64,

    #[arg(long, env = "SNAPCRAWL_QUEUE_SIZE", default_value_t = DEFAULT_MAX_QUEUE_SIZE)]
    queue_size: usize,

    #[arg(long, default_value_t = DEFAULT_MET_CAPACITY)]
    met_capacity: usize,

    #[arg(long, default_value_t = DEFAULT_SAVED_CAPACITY)]
    saved_capacity: usize,

    #[arg(long, default_value_t = DEFAULT_ERROR_RATE)]
    error_rate: f64,

    #[arg(long, env = "SNAPCRAWL_USER_AGENT")]
    user_agent: Option<String>,

    /// Keep query strings on discovered links
    #[arg(long)]
    keep_query: bool,

    /// Glob pattern for links never to enqueue; repeatable
    #[arg(long = "exclude")]
    excluded: Vec<String>,
}

#[derive(Args, Debug, Clone, Copy)]
struct EpochArgs {
    #[arg(long, env = "SNAPCRAWL_EPOCHS", default_value_t = 2)]
    epochs: usize,

    /// Wall-clock budget per epoch, in seconds
    #[arg(long, env = "SNAPCRAWL_SECS", default_value_t = 30)]
    secs: u64,

    /// Skip the end-of-epoch snapshot
    #[arg(long)]
    no_snapshot: bool,
}

impl EpochArgs {
    fn run_options(self, start_epoch: usize, epoch_count: usize) -> RunOptions {
        RunOptions {
            epoch_count,
            secs_per_epoch: self.secs,
            start_epoch,
            make_snapshot: !self.no_snapshot,
        }
    }
}

/// Raise the engine's stop request on Ctrl-C
fn install_ctrl_c(engine: &Arc<CrawlEngine>) {
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received; finishing the current epoch");
            engine.request_stop();
        }
    });
}

fn build_config(dir: PathBuf, profile: String, tuning: Tuning) -> Result<CrawlConfig> {
    let mut builder = CrawlConfig::builder()
        .storage_dir(dir)
        .filter_profile(profile)
        .max_workers(tuning.workers)
        .interval_ms(tuning.interval_ms)
        .max_queue_size(tuning.queue_size)
        .met_capacity(tuning.met_capacity)
        .saved_capacity(tuning.saved_capacity)
        .error_rate(tuning.error_rate)
        .keep_query(tuning.keep_query);
    if let Some(ua) = tuning.user_agent {
        builder = builder.user_agent(ua);
    }
    if !tuning.excluded.is_empty() {
        builder = builder.excluded_patterns(tuning.excluded);
    }
    builder.build().context("invalid crawl configuration")
}

async fn crawl(
    dir: PathBuf,
    profile: String,
    seeds: Vec<String>,
    tuning: Tuning,
    epochs: EpochArgs,
) -> Result<()> {
    let registry = FilterRegistry::builtin();
    let config = build_config(dir, profile, tuning)?;
    let engine = Arc::new(CrawlEngine::create(config, &registry).context("failed to create crawl")?);

    let seeded = if seeds.is_empty() {
        engine.seed(engine.profile().seeds().to_vec())
    } else {
        engine.seed(seeds)
    };
    if seeded == 0 {
        bail!("no seed URLs: pass --seed or pick a profile with built-in seeds");
    }
    log::info!("Seeded {seeded} URLs");

    install_ctrl_c(&engine);
    let stats = engine.run(epochs.run_options(0, epochs.epochs)).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn resume(
    dir: PathBuf,
    snapshot: Option<String>,
    reseed: usize,
    epochs: EpochArgs,
) -> Result<()> {
    let registry = FilterRegistry::builtin();
    let name = match snapshot {
        Some(name) => name,
        None => latest_snapshot(&dir)?
            .with_context(|| format!("no snapshots under {}", dir.display()))?,
    };
    let engine = Arc::new(
        CrawlEngine::load_snapshot(&dir, &name, &registry)
            .with_context(|| format!("failed to restore snapshot {name}"))?,
    );
    log::info!(
        "Resumed from {name}: {} queued, {} stored",
        engine.frontier().len(),
        engine.file_count()
    );
    install_ctrl_c(&engine);

    // One epoch per run call so random seeds can be pushed in between
    let mut last_stats = engine.stats();
    for epoch in 0..epochs.epochs {
        if reseed > 0 {
            let pushed = engine.reseed_random(reseed);
            log::info!("Pushed {pushed} random seeds");
        }
        last_stats = engine.run(epochs.run_options(epoch, 1)).await?;
        if engine.stop_requested() {
            break;
        }
    }
    println!("{}", serde_json::to_string_pretty(&last_stats)?);
    Ok(())
}

fn print_entries(dir: PathBuf) -> Result<()> {
    let store = ContentStore::open(dir.join(SAVED_FILES_DIR), StoreMode::FullLoad)
        .with_context(|| format!("failed to open content store under {}", dir.display()))?;
    for entry in store.entries() {
        println!(
            "{}\t{}\t{}\t{}",
            entry.fetched_at.to_rfc3339(),
            entry.url,
            entry.title,
            store.content_path(&entry).display()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            dir,
            profile,
            seeds,
            tuning,
            epochs,
        } => crawl(dir, profile, seeds, tuning, epochs).await,
        Commands::Resume {
            dir,
            snapshot,
            reseed,
            epochs,
        } => resume(dir, snapshot, reseed, epochs).await,
        Commands::Snapshots { dir } => {
            for name in list_snapshots(&dir)? {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Entries { dir } => print_entries(dir),
    }
}
