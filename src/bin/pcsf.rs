//! PCSF - Prize-Collecting Steiner Forest CLI
//!
//! Command-line interface for network inference on a protein interactome.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use pcsf_network::analysis::{seed_path_costs, sort_annotations, AnnotationKey, PathCostConfig};
use pcsf_network::error::{PcsfError, Result};
use pcsf_network::graph::{AugmentedGraph, DummyMode, Interactome, NodePrizes, PrizeTable};
use pcsf_network::io::{
    read_de_results, read_interactome, read_prizes, write_communities_tsv, write_edges_tsv,
    write_forest_tsv, write_nodes_tsv, write_text, IdMap,
};
use pcsf_network::pipeline::{NetworkPipeline, PcsfConfig};
use pcsf_network::sensitivity::{run_sensitivity_sweep, SensitivityConfig, SimilarityMetric};
use std::path::{Path, PathBuf};

/// CLI-friendly dummy mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDummyMode {
    /// Root connects to terminals
    Terminals,
    /// Root connects to every node
    All,
    /// Root connects to non-terminals
    Others,
}

impl From<CliDummyMode> for DummyMode {
    fn from(mode: CliDummyMode) -> Self {
        match mode {
            CliDummyMode::Terminals => DummyMode::Terminals,
            CliDummyMode::All => DummyMode::All,
            CliDummyMode::Others => DummyMode::Others,
        }
    }
}

/// CLI-friendly similarity metric enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMetric {
    /// Jaccard over node sets
    Nodes,
    /// Jaccard over edge sets
    Edges,
}

impl From<CliMetric> for SimilarityMetric {
    fn from(metric: CliMetric) -> Self {
        match metric {
            CliMetric::Nodes => SimilarityMetric::Nodes,
            CliMetric::Edges => SimilarityMetric::Edges,
        }
    }
}

/// Prize-Collecting Steiner Forest network inference
#[derive(Parser)]
#[command(name = "pcsf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Interactome, seeds and identifier translation.
#[derive(Args, Debug)]
struct InputArgs {
    /// Interactome table (protein1, protein2, cost)
    #[arg(short, long)]
    interactome: PathBuf,

    /// Seed table with name and prize columns
    #[arg(short, long, conflicts_with = "de_results", required_unless_present = "de_results")]
    prizes: Option<PathBuf>,

    /// Differential expression results used as seeds instead of a prize table
    #[arg(long)]
    de_results: Option<PathBuf>,

    /// Signed score column in the DE results
    #[arg(long, default_value = "log2FoldChange")]
    score_column: String,

    /// Adjusted p-value cutoff for DE seeds
    #[arg(long, default_value = "0.05")]
    padj: f64,

    /// Identifier map TSV (STRING, display name) for readable output
    #[arg(long)]
    id_map: Option<PathBuf>,
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug)]
struct ParamArgs {
    /// Run configuration YAML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dummy edge cost
    #[arg(short, long)]
    w: Option<f64>,

    /// Prize multiplier
    #[arg(short, long)]
    b: Option<f64>,

    /// Hub penalty exponent (0 disables)
    #[arg(short, long)]
    g: Option<f64>,

    /// Root wiring
    #[arg(long, value_enum)]
    dummy_mode: Option<CliDummyMode>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve once and write the forest, node table and communities
    Solve {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        params: ParamArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Attribute used to order the node table
        #[arg(long, default_value = "prize")]
        sort_by: String,
    },

    /// Run the robustness ensemble and write the consensus network
    Ensemble {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        params: ParamArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Noisy-edge repetitions (robustness needs at least one)
        #[arg(long)]
        reps: Option<usize>,

        /// Random-terminal repetitions
        #[arg(long)]
        random_terminal_reps: Option<usize>,

        /// Relative edge noise
        #[arg(long)]
        edge_noise: Option<f64>,

        /// Minimum robustness kept in the consensus network
        #[arg(long)]
        threshold: Option<f64>,

        /// Attribute used to order the node table
        #[arg(long, default_value = "robustness")]
        sort_by: String,
    },

    /// Solve over a (w, b) grid and compare the solutions
    Sweep {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        params: ParamArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated w values
        #[arg(long)]
        w_values: Option<String>,

        /// Comma-separated b values
        #[arg(long)]
        b_values: Option<String>,

        /// Element set compared between solutions
        #[arg(long, value_enum, default_value = "nodes")]
        metric: CliMetric,

        /// Use a small 2 x 2 grid
        #[arg(long)]
        quick: bool,
    },

    /// Shortest-path costs between seed pairs, used to choose w
    PathCosts {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        params: ParamArgs,

        /// Output TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Fraction of seed pairs evaluated
        #[arg(long, default_value = "1.0")]
        proportion: f64,
    },

    /// Write an example configuration file
    Example {
        /// Output path for example YAML
        #[arg(short, long, default_value = "pcsf_config.yaml")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Solve {
            input,
            params,
            output,
            sort_by,
        } => cmd_solve(&input, &params, &output, &sort_by),

        Commands::Ensemble {
            input,
            params,
            output,
            reps,
            random_terminal_reps,
            edge_noise,
            threshold,
            sort_by,
        } => cmd_ensemble(
            &input,
            &params,
            &output,
            reps,
            random_terminal_reps,
            edge_noise,
            threshold,
            &sort_by,
        ),

        Commands::Sweep {
            input,
            params,
            output,
            w_values,
            b_values,
            metric,
            quick,
        } => cmd_sweep(
            &input,
            &params,
            &output,
            w_values.as_deref(),
            b_values.as_deref(),
            metric,
            quick,
        ),

        Commands::PathCosts {
            input,
            params,
            output,
            proportion,
        } => cmd_path_costs(&input, &params, &output, proportion),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

fn load_config(args: &ParamArgs) -> Result<PcsfConfig> {
    let mut config = match &args.config {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            PcsfConfig::from_path(path)?
        }
        None => PcsfConfig::default(),
    };
    if let Some(w) = args.w {
        config.params.w = w;
    }
    if let Some(b) = args.b {
        config.params.b = b;
    }
    if let Some(g) = args.g {
        config.params.g = g;
    }
    if let Some(mode) = args.dummy_mode {
        config.params.dummy_mode = mode.into();
    }
    if let Some(seed) = args.seed {
        config.params.seed = seed;
    }
    Ok(config)
}

struct Inputs {
    interactome: Interactome,
    prizes: NodePrizes,
    id_map: Option<IdMap>,
}

fn load_inputs(args: &InputArgs) -> Result<Inputs> {
    eprintln!("Loading interactome from {:?}...", args.interactome);
    let interactome = read_interactome(&args.interactome)?;

    let table = match (&args.prizes, &args.de_results) {
        (Some(path), _) => read_prizes(path)?,
        (None, Some(path)) => {
            let rows = read_de_results(path, &args.score_column)?;
            PrizeTable::from_de_results(&rows, args.padj)?
        }
        (None, None) => {
            return Err(PcsfError::InvalidParameter(
                "either --prizes or --de-results is required".to_string(),
            ))
        }
    };
    let prizes = NodePrizes::assign(&interactome, &table)?;

    eprintln!(
        "Loaded {} nodes x {} edges, {} terminals ({} seeds not found)",
        interactome.n_nodes(),
        interactome.n_edges(),
        prizes.n_terminals(),
        prizes.dropped_seeds().len()
    );

    let id_map = match &args.id_map {
        Some(path) => Some(IdMap::from_tsv(path)?),
        None => None,
    };

    Ok(Inputs {
        interactome,
        prizes,
        id_map,
    })
}

fn parse_values(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|v| {
            v.trim().parse::<f64>().map_err(|_| {
                PcsfError::InvalidParameter(format!("Invalid number '{}'", v.trim()))
            })
        })
        .collect()
}

fn parse_key(s: &str) -> Result<AnnotationKey> {
    s.parse::<AnnotationKey>().map_err(PcsfError::InvalidParameter)
}

fn run_and_write(
    inputs: &Inputs,
    config: PcsfConfig,
    output_dir: &Path,
    sort_by: AnnotationKey,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;
    let pipeline = NetworkPipeline::new(config);
    eprintln!("Running '{}'...", pipeline.config().name);
    let mut result = pipeline.run(&inputs.interactome, &inputs.prizes)?;

    let graph = AugmentedGraph::new(&inputs.interactome, &pipeline.config().params)?;
    let id_map = inputs.id_map.as_ref();
    sort_annotations(&mut result.annotations, sort_by, sort_by != AnnotationKey::Name);

    write_forest_tsv(output_dir.join("forest.tsv"), &graph, &result.forest, id_map)?;
    write_nodes_tsv(output_dir.join("nodes.tsv"), &result.annotations, id_map)?;
    write_edges_tsv(output_dir.join("edges.tsv"), &graph, &result.consensus, id_map)?;
    write_communities_tsv(
        output_dir.join("communities.tsv"),
        &graph,
        &result.communities,
        id_map,
    )?;
    write_text(output_dir.join("summary.json"), &result.summary_json()?)?;
    if let Some(ensemble) = &result.ensemble {
        write_text(output_dir.join("ensemble.json"), &ensemble.to_json()?)?;
    }

    eprintln!("Wrote results to {:?}", output_dir);
    eprintln!();
    println!("{}", result.summary);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_solve(
    input: &InputArgs,
    params: &ParamArgs,
    output_dir: &PathBuf,
    sort_by: &str,
) -> Result<()> {
    let sort_by = parse_key(sort_by)?;
    let config = load_config(params)?.with_ensemble(None);
    let inputs = load_inputs(input)?;
    run_and_write(&inputs, config, output_dir, sort_by)
}

#[allow(clippy::too_many_arguments)]
fn cmd_ensemble(
    input: &InputArgs,
    params: &ParamArgs,
    output_dir: &PathBuf,
    reps: Option<usize>,
    random_terminal_reps: Option<usize>,
    edge_noise: Option<f64>,
    threshold: Option<f64>,
    sort_by: &str,
) -> Result<()> {
    let sort_by = parse_key(sort_by)?;
    let mut config = load_config(params)?;
    let mut ensemble = config.ensemble.clone().unwrap_or_default();
    if let Some(reps) = reps {
        ensemble = ensemble.with_noisy_edge_reps(reps);
    }
    if let Some(reps) = random_terminal_reps {
        ensemble = ensemble.with_random_terminal_reps(reps);
    }
    if let Some(noise) = edge_noise {
        config.params.edge_noise = noise;
    }
    if let Some(threshold) = threshold {
        config.consensus_threshold = threshold;
    }
    let config = config.with_ensemble(Some(ensemble));
    config.validate()?;

    let inputs = load_inputs(input)?;
    run_and_write(&inputs, config, output_dir, sort_by)
}

fn cmd_sweep(
    input: &InputArgs,
    params: &ParamArgs,
    output_dir: &PathBuf,
    w_values: Option<&str>,
    b_values: Option<&str>,
    metric: CliMetric,
    quick: bool,
) -> Result<()> {
    let config = load_config(params)?;
    let mut sweep_config = if quick {
        SensitivityConfig::quick()
    } else {
        config.sensitivity.clone()
    };
    if let Some(values) = w_values {
        sweep_config = sweep_config.with_w_values(parse_values(values)?);
    }
    if let Some(values) = b_values {
        sweep_config = sweep_config.with_b_values(parse_values(values)?);
    }
    let sweep_config = sweep_config.with_metric(metric.into());
    sweep_config.validate()?;

    let inputs = load_inputs(input)?;
    let graph = AugmentedGraph::new(&inputs.interactome, &config.params)?;

    eprintln!(
        "Sweeping {} x {} parameter grid...",
        sweep_config.w_values.len(),
        sweep_config.b_values.len()
    );
    let sweep = run_sensitivity_sweep(&graph, &inputs.prizes, &sweep_config)?;

    std::fs::create_dir_all(output_dir)?;
    write_text(output_dir.join("sweep.csv"), &sweep.to_csv())?;
    write_text(output_dir.join("similarity.tsv"), &sweep.similarity_tsv())?;
    write_text(output_dir.join("edit_distance.tsv"), &sweep.edit_distance_tsv())?;
    write_text(output_dir.join("sweep.json"), &sweep.to_json()?)?;

    eprintln!("Wrote sweep results to {:?}", output_dir);
    eprintln!();
    println!("{}", sweep);
    Ok(())
}

fn cmd_path_costs(
    input: &InputArgs,
    params: &ParamArgs,
    output_path: &PathBuf,
    proportion: f64,
) -> Result<()> {
    let config = load_config(params)?;
    let inputs = load_inputs(input)?;
    let graph = AugmentedGraph::new(&inputs.interactome, &config.params)?;

    let path_config = PathCostConfig {
        sampled_proportion: proportion,
        seed: config.params.seed,
    };
    let costs = seed_path_costs(&graph, inputs.prizes.terminals(), &path_config)?;

    write_text(output_path, &costs.to_tsv(&inputs.interactome))?;
    eprintln!("Wrote {} pair costs to {:?}", costs.pairs.len(), output_path);
    eprintln!();
    println!("{}", costs.summary());
    Ok(())
}

fn cmd_example(output_path: &PathBuf) -> Result<()> {
    let mut config = PcsfConfig::default().with_name("example-pcsf");
    config.description = Some(
        "Example PCSF run: noisy-edge ensemble, consensus at 0.5 and Louvain communities"
            .to_string(),
    );
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_ensemble_reps_help() {
        let mut cli = Cli::command();
        let ensemble = cli
            .find_subcommand_mut("ensemble")
            .expect("ensemble subcommand");
        let reps = ensemble
            .get_arguments()
            .find(|a| a.get_id() == "reps")
            .expect("reps argument");
        let help = reps.get_help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("at least one"));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
