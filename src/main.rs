use pdb_heuristics::canonical::CanonicalPatternDatabases;
use pdb_heuristics::config::{Cli, Config};
use pdb_heuristics::hillclimbing::{collection_size, HillClimber};
use pdb_heuristics::sampling::sample_states;
use pdb_heuristics::task_file::{PatternReport, ResultFile, TaskFile};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level)?)
        .init();
    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    let task_file = TaskFile::load_from_file(&config.task_path)?;
    let task = &task_file.task;
    info!(
        "Loaded task with {} variables and {} operators",
        task.num_variables(),
        task.operators.len()
    );

    let (patterns, stats) = if let Some(patterns) = config.patterns.clone() {
        config.validate_patterns(task)?;
        info!("Using {} given patterns, skipping hill climbing", patterns.len());
        (patterns, None)
    } else {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut samples = task_file.samples.clone();
        samples.extend(sample_states(task, config.num_samples, &mut rng));
        if samples.is_empty() {
            warn!("No sample states, hill climbing will keep the initial collection");
        }

        let mut climber = HillClimber::new(task, config.size_bound, samples);
        if let Some(max_iterations) = config.max_iterations {
            climber = climber.with_max_iterations(max_iterations);
        }
        if let Some(max_time) = config.max_time() {
            climber = climber.with_max_time(max_time);
        }
        let patterns = climber.run();
        (patterns, Some(climber.stats().clone()))
    };

    let cpdbs = CanonicalPatternDatabases::new(task, &patterns);
    let initial_heuristic = task_file
        .initial_state
        .as_ref()
        .map(|state| cpdbs.compute_heuristic(state));
    for (pattern, pdb) in patterns.iter().zip(cpdbs.pdbs()) {
        info!(
            "pattern {pattern}: {} abstract states",
            pdb.projection().num_abstract_states()
        );
    }
    if let Some(h) = initial_heuristic {
        info!("Initial state heuristic value: {h}");
    }

    if let Some(output_path) = &config.output_path {
        let result = ResultFile {
            patterns: cpdbs
                .pdbs()
                .iter()
                .map(|pdb| PatternReport {
                    pattern: pdb.pattern().clone(),
                    abstract_states: pdb.projection().num_abstract_states(),
                })
                .collect(),
            total_abstract_states: collection_size(task, &patterns).unwrap_or(usize::MAX),
            maximal_additive_sets: cpdbs.maximal_additive_sets().to_vec(),
            initial_heuristic,
            stats,
        };
        result.write_to_file(output_path)?;
        info!("Result written to {output_path}");
    }

    Ok(())
}
