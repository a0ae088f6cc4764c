use anyhow::Context;
use clap::Parser;
use mixdist::{Combination, ContinuousFamily, Job, OutlierPolicy, Scale};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Pairwise distances for mixed-type data
#[derive(Parser, Debug)]
#[command(name = "mixdist")]
#[command(about = "Robust distance matrices for mixed-type data", long_about = None)]
struct Args {
    /// Path to the JSON job file
    input: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rows per block
    #[arg(long)]
    block_rows: Option<usize>,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Emit the upper triangle only
    #[arg(long)]
    condensed: bool,

    /// Continuous scaling: standard, robust, range
    #[arg(long)]
    scale: Option<Scale>,

    /// Outlier policy: none, winsorize[:limit], trim:fraction
    #[arg(long)]
    outlier: Option<OutlierPolicy>,

    /// Combination rule: weighted-mean, weighted-euclidean
    #[arg(long)]
    combination: Option<Combination>,

    /// Continuous difference: absolute, squared, minkowski:p, canberra
    #[arg(long)]
    family: Option<ContinuousFamily>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting mixdist v{}", env!("CARGO_PKG_VERSION"));
    info!("Job file: {:?}", args.input);

    let mut job = Job::from_path(&args.input)?;
    if let Some(scale) = args.scale {
        job.config.scale = scale;
    }
    if let Some(policy) = args.outlier {
        job.config.outlier_policy = policy;
    }
    if let Some(combination) = args.combination {
        job.config.combination = combination;
    }
    if let Some(family) = args.family {
        job.config.family = Some(family);
    }
    if let Some(rows) = args.block_rows {
        job.config.block_rows = Some(rows);
    }
    if let Some(threads) = args.threads {
        job.config.threads = threads;
    }

    info!(
        "Scale: {}, combination: {}, family: {}, threads: {}",
        job.config.scale,
        job.config.combination,
        job.config.continuous_family(),
        job.config.threads
    );

    let output = job.run()?;
    if let Some(ratio) = output.stats.spread_ratio() {
        info!("Max/min distance ratio: {:.3}", ratio);
    }
    if let Some((i, j)) = output.stats.farthest_pair {
        info!("Farthest pair: ({}, {})", i, j);
    }

    let distances = if args.condensed {
        json!(output.matrix.condensed())
    } else {
        json!(output.matrix.to_rows())
    };
    let document = json!({
        "columns": output.columns,
        "n": output.matrix.n(),
        "condensed": args.condensed,
        "distances": distances,
        "stats": output.stats,
    });
    let rendered = serde_json::to_string_pretty(&document)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
