//! Command line entry point for the clustered geo-point generator.
//!
//! Settings come from the environment (and `.env`) first; flags given on the
//! command line take precedence.

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cluster_gen::{generate, k_nearest, rng_from_seed, RTree};
use geocluster_common::{init_tracing, read_dataset, write_dataset, Config};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cluster-gen", version, about = "Generate clustered synthetic geo points")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset and write it as a JSON array
    Generate(GenerateArgs),
    /// Print the k points of a dataset closest to a coordinate
    Nearest(NearestArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Exact number of points to produce
    #[arg(long)]
    total_points: Option<usize>,
    /// Number of cluster centers
    #[arg(long)]
    clusters: Option<usize>,
    /// Standard deviation of the offset around each center, in degrees
    #[arg(long)]
    stddev: Option<f64>,
    /// Seed for a reproducible dataset
    #[arg(long)]
    seed: Option<u64>,
    /// Destination file
    #[arg(short, long)]
    output: Option<String>,
}

impl GenerateArgs {
    fn apply(self, config: &mut Config) {
        if let Some(total_points) = self.total_points {
            config.total_points = total_points;
        }
        if let Some(clusters) = self.clusters {
            config.num_clusters = clusters;
        }
        if let Some(stddev) = self.stddev {
            config.perturbation_stddev_degrees = stddev;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
    }
}

#[derive(Args, Debug)]
struct NearestArgs {
    /// Dataset to search, defaults to the configured output path
    #[arg(short, long)]
    input: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// Number of neighbours to return
    #[arg(short, default_value_t = 10)]
    k: usize,
    /// Scan every point instead of querying the R-tree
    #[arg(long)]
    brute_force: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load config
    let mut config = Config::from_env()?;

    // 2. Initialize logs
    init_tracing("cluster-gen", &config.log_level);

    match cli.command {
        Command::Generate(args) => {
            args.apply(&mut config);
            run_generate(&config)
        }
        Command::Nearest(args) => run_nearest(&config, args),
    }
}

fn run_generate(config: &Config) -> Result<()> {
    let params = config.generation_params();
    info!(
        "Generating {} points across {} clusters (stddev {}°)",
        params.total_points, params.num_clusters, params.perturbation_stddev_degrees
    );
    if let Some(seed) = config.seed {
        info!("Using fixed seed {}", seed);
    }

    let points = generate(params, rng_from_seed(config.seed))
        .context("Failed to generate points")?;

    write_dataset(&config.output_path, &points)
        .with_context(|| format!("Failed to write dataset to {}", config.output_path))?;

    info!("Generated {} points and saved to {}", points.len(), config.output_path);
    Ok(())
}

fn run_nearest(config: &Config, args: NearestArgs) -> Result<()> {
    let input = args.input.as_deref().unwrap_or(&config.output_path);
    let points =
        read_dataset(input).with_context(|| format!("Failed to read dataset from {}", input))?;
    info!("Loaded {} points from {}", points.len(), input);

    let neighbors = if args.brute_force {
        k_nearest(&points, args.lat, args.lon, args.k)?
    } else {
        let tree = RTree::bulk_load(&points);
        info!("Indexed {} points, R-tree depth {}", tree.len(), tree.depth());
        tree.nearest(args.lat, args.lon, args.k)?
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &neighbors)?;
    writeln!(out)?;
    Ok(())
}
