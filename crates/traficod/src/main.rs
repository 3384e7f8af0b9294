//! Trafico daemon - cache-aside lookup API and skewed workload driver

mod lookup;
mod metrics;
mod routes;
mod workload;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tracing::info;
use traficocache::TtlCache;
use traficostore::MemoryStore;

use crate::lookup::LookupService;
use crate::workload::{SkewModel, WorkloadGenerator};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed data file: {"alertas": [...], "atascos": [...]}
    #[arg(short, long, env = "TRAFICO_DATA")]
    data: Option<PathBuf>,

    /// Cache TTL in seconds
    #[arg(long, env = "TRAFICO_TTL_SECS", default_value_t = 300)]
    ttl_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the lookup API over HTTP
    Serve {
        /// Bind address
        #[arg(short, long, env = "TRAFICO_BIND", default_value = "127.0.0.1:5000")]
        bind: String,
    },
    /// Generate a skewed workload and replay it against the lookup path
    Bench {
        /// Access-skew model
        #[arg(long, value_enum, default_value_t = SkewArg::Zipf)]
        distribution: SkewArg,

        /// Number of requests to generate
        #[arg(long, default_value_t = 10_000)]
        samples: usize,

        /// Zipf shape parameter
        #[arg(long, default_value_t = 1.3)]
        zipf_exponent: f64,

        /// Gaussian stddev as a fraction of the population size
        #[arg(long, default_value_t = 1.0 / 3.0)]
        stddev_frac: f64,

        /// RNG seed for reproducible runs
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Mean inter-arrival delay in ms, exponentially distributed;
        /// 0 replays back-to-back
        #[arg(long, default_value_t = 0.0)]
        delay_mean_ms: f64,

        /// Directory for run artifacts
        #[arg(long, default_value = "./out")]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SkewArg {
    Uniform,
    Normal,
    Zipf,
}

fn load_store(data: Option<&Path>) -> Result<MemoryStore> {
    let store = MemoryStore::new();

    if let Some(path) = data {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading seed data from {}", path.display()))?;
        let doc = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed data from {}", path.display()))?;
        let summary = store.load_json(&doc)?;
        info!(
            "Loaded {} records from {} ({} duplicates skipped)",
            summary.inserted,
            path.display(),
            summary.duplicates
        );
    }

    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting traficod v{}", env!("CARGO_PKG_VERSION"));

    // An unreadable store at startup is fatal; nothing is served without it
    let store = load_store(args.data.as_deref())?;
    let ttl = Duration::from_secs(args.ttl_secs);
    let service = Arc::new(LookupService::new(
        Arc::new(store),
        Arc::new(TtlCache::new()),
        ttl,
    ));
    info!("Cache TTL: {}s", args.ttl_secs);

    match args.command {
        Command::Serve { bind } => serve(service, &bind).await,
        Command::Bench {
            distribution,
            samples,
            zipf_exponent,
            stddev_frac,
            seed,
            delay_mean_ms,
            out,
        } => {
            let model = match distribution {
                SkewArg::Uniform => SkewModel::Uniform,
                SkewArg::Normal => SkewModel::Normal { stddev_frac },
                SkewArg::Zipf => SkewModel::Zipf {
                    exponent: zipf_exponent,
                },
            };
            bench(&service, model, samples, seed, delay_mean_ms, &out)
        }
    }
}

async fn serve(service: Arc<LookupService>, bind: &str) -> Result<()> {
    let app = routes::router(service);

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding to {}", bind))?;
    info!("Server listening on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}

fn bench(
    service: &LookupService,
    model: SkewModel,
    samples: usize,
    seed: u64,
    delay_mean_ms: f64,
    out: &Path,
) -> Result<()> {
    let mut generator = WorkloadGenerator::from_service(service, seed)?;
    let population = generator.population().to_vec();
    if population.is_empty() {
        bail!("store holds no records; nothing to bench (did you pass --data?)");
    }
    info!("Population: {} ids, model: {:?}", population.len(), model);

    let sequence = generator.generate(model, samples)?;
    info!("Replaying {} requests sequentially", sequence.len());

    let report = generator.replay(service, &sequence, delay_mean_ms)?;

    info!("Total requests: {}", report.total_requests);
    info!("Cache hits:     {}", report.cache_hits);
    info!("Cache misses:   {}", report.cache_misses);
    info!("Not found:      {}", report.not_found);
    info!("Errors:         {}", report.errors);
    info!("Hit rate:       {:.2}%", report.hit_rate);
    info!("Elapsed:        {:.2}s", report.elapsed_secs);
    info!("Avg cache read: {:.3}ms", report.avg_cache_ms);
    info!("Avg store read: {:.3}ms", report.avg_store_ms);

    fs::create_dir_all(out)
        .with_context(|| format!("creating artifact directory {}", out.display()))?;

    let model_name = match model {
        SkewModel::Uniform => "uniform",
        SkewModel::Normal { .. } => "normal",
        SkewModel::Zipf { .. } => "zipf",
    };

    write_json(&out.join("uuids.json"), &population)?;
    write_json(&out.join(format!("uuids_{}.json", model_name)), &sequence)?;
    write_json(&out.join("hit_rate_results.json"), &report)?;
    info!("Artifacts written to {}", out.display());

    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
