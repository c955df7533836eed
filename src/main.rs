use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;

use reliasim::aco::AcoOptimizer;
use reliasim::config::{self, RunConfig};
use reliasim::graph::{standard_error, Graph};
use reliasim::loader::load_graph;
use reliasim::percolation;
use reliasim::report::{self, OptimizationReport, ReportMetadata};

/// Network reliability estimation and sparse topology search
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a YAML run configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for all random streams (overrides the configuration)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate the all-terminal reliability of a network
    Estimate {
        /// Network file (edge list, or .gml)
        file: PathBuf,

        /// Monte Carlo trials
        #[arg(short, long)]
        trials: Option<u64>,

        /// Reliability for GML links that carry none
        #[arg(short, long)]
        prob: Option<f64>,
    },

    /// Search for a reliable sub-topology with a fixed number of links
    Optimize {
        /// Network file (edge list, or .gml)
        file: PathBuf,

        /// Iteration budget
        #[arg(short = 'n', long)]
        iterations: Option<usize>,

        /// Ant population size
        #[arg(short, long)]
        ants: Option<usize>,

        /// Links every candidate must keep
        #[arg(short, long)]
        max_links: Option<usize>,

        /// Reliability for GML links that carry none
        #[arg(short, long)]
        prob: Option<f64>,

        /// Directory for JSON and text reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Chart reliability against removed links and link reliability
    Percolation {
        /// Network file (edge list, or .gml)
        file: PathBuf,

        /// Repetitions averaged per cell
        #[arg(short, long)]
        repetitions: Option<usize>,

        /// Monte Carlo trials per repetition
        #[arg(short, long)]
        trials: Option<u64>,

        /// Probability increment between columns
        #[arg(short, long)]
        step: Option<f64>,

        /// Reliability for GML links that carry none
        #[arg(short, long)]
        prob: Option<f64>,

        /// Output table
        #[arg(short, long, default_value = "data/percolation.plot")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let mut run_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => RunConfig::default(),
    };
    if cli.seed.is_some() {
        run_config.seed = cli.seed;
    }
    if let Some(threads) = cli.threads {
        run_config.threads = threads;
    }

    if run_config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(run_config.threads)
            .build_global()
            .wrap_err("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Estimate { file, trials, prob } => {
            if let Some(trials) = trials {
                run_config.estimate.trials = trials;
            }
            if let Some(prob) = prob {
                run_config.estimate.default_reliability = prob;
            }
            run_config.validate()?;
            run_estimate(&file, &run_config)
        }
        Commands::Optimize {
            file,
            iterations,
            ants,
            max_links,
            prob,
            output,
        } => {
            if let Some(iterations) = iterations {
                run_config.aco.iterations = iterations;
            }
            if let Some(ants) = ants {
                run_config.aco.ants = ants;
            }
            if let Some(max_links) = max_links {
                run_config.aco.max_links = max_links;
            }
            if let Some(prob) = prob {
                run_config.estimate.default_reliability = prob;
            }
            run_config.validate()?;
            run_optimize(&file, &run_config, output.as_deref())
        }
        Commands::Percolation {
            file,
            repetitions,
            trials,
            step,
            prob,
            output,
        } => {
            if let Some(repetitions) = repetitions {
                run_config.percolation.repetitions = repetitions;
            }
            if let Some(trials) = trials {
                run_config.percolation.mc_trials = trials;
            }
            if let Some(step) = step {
                run_config.percolation.step = step;
            }
            if let Some(prob) = prob {
                run_config.estimate.default_reliability = prob;
            }
            run_config.validate()?;
            run_percolation(&file, &run_config, &output)
        }
    }
}

fn load(file: &Path, run_config: &RunConfig) -> Result<Graph> {
    info!("Trying to load {}", file.display());
    let mut graph = load_graph(file, run_config.estimate.default_reliability)
        .wrap_err_with(|| format!("Problem with loading of file '{}'", file.display()))?;
    if let Some(seed) = run_config.seed {
        graph.set_seed(seed);
    }
    Ok(graph)
}

fn run_estimate(file: &Path, run_config: &RunConfig) -> Result<()> {
    let mut graph = load(file, run_config)?;
    let cancel = run_config.cancel_token();
    let trials = run_config.estimate.trials;

    let reliability = graph.estimate_reliability_with(trials, false, Some(&cancel))?;
    println!(
        "All-terminal reliability = {} (±{:.6}), calculated from {} simulations",
        reliability,
        standard_error(reliability, trials),
        trials
    );
    Ok(())
}

fn run_optimize(file: &Path, run_config: &RunConfig, output: Option<&Path>) -> Result<()> {
    let mut graph = load(file, run_config)?;

    let mut optimizer =
        AcoOptimizer::new(run_config.aco.clone()).with_cancel(run_config.cancel_token());
    if let Some(seed) = run_config.seed {
        optimizer = optimizer.with_seed(seed);
    }
    let outcome = optimizer.run(&mut graph)?;

    let report = OptimizationReport {
        metadata: ReportMetadata::new(file, &graph, run_config.seed),
        parameters: run_config.aco.clone(),
        pheromones: graph.pheromone_summary(),
        outcome,
    };
    print!("{}", report::format_optimization_text(&report));

    if let Some(output_dir) = output {
        fs::create_dir_all(output_dir).wrap_err_with(|| {
            format!("Failed to create output directory '{}'", output_dir.display())
        })?;
        report::write_json(&report, &output_dir.join("optimization_report.json"))?;
        report::write_optimization_text(&report, &output_dir.join("optimization_report.txt"))?;
    }
    Ok(())
}

fn run_percolation(file: &Path, run_config: &RunConfig, output: &Path) -> Result<()> {
    let graph = load(file, run_config)?;
    let cancel = run_config.cancel_token();

    let surface = percolation::sweep(&graph, &run_config.percolation, Some(&cancel))?;
    report::write_percolation_table(&surface, output)?;
    println!(
        "Percolation surface: {} rows x {} columns written to {}",
        surface.rows.len(),
        surface.probabilities.len(),
        output.display()
    );
    Ok(())
}
