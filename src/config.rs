use crate::hillclimbing::collection_size;
use crate::task::{Pattern, TnfTask};

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "PDB hill climbing",
    about = "Pattern database heuristics with hill-climbing pattern selection.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the TNF task file (YAML or JSON)")]
    pub task_path: Option<String>,

    #[arg(long, help = "Path to the output file (YAML or JSON)")]
    pub output_path: Option<String>,

    #[arg(long, help = "Bound on the summed number of abstract states")]
    pub size_bound: Option<usize>,

    #[arg(long, help = "Number of random sample states")]
    pub num_samples: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Maximum number of hill-climbing iterations")]
    pub max_iterations: Option<usize>,

    #[arg(long, help = "Time limit for hill climbing in seconds")]
    pub max_time_secs: Option<f64>,

    #[arg(
        long = "pattern",
        help = "Use this pattern instead of hill climbing, e.g. --pattern 0,2,3 (repeatable)"
    )]
    pub patterns: Vec<String>,

    #[arg(long, help = "Log level or tracing filter directive")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub task_path: String,
    pub output_path: Option<String>,
    pub size_bound: usize,
    pub num_samples: usize,
    pub seed: u64,
    pub max_iterations: Option<usize>,
    pub max_time_secs: Option<f64>,
    pub patterns: Option<Vec<Pattern>>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            task_path: "task_file/interacting-chain.yaml".to_string(),
            output_path: None,
            size_bound: 2_000_000,
            num_samples: 1000,
            seed: 0,
            max_iterations: None,
            max_time_secs: None,
            patterns: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(task_path) = &cli.task_path {
            self.task_path = task_path.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(size_bound) = cli.size_bound {
            self.size_bound = size_bound;
        }
        if let Some(num_samples) = cli.num_samples {
            self.num_samples = num_samples;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(max_iterations) = cli.max_iterations {
            self.max_iterations = Some(max_iterations);
        }
        if let Some(max_time_secs) = cli.max_time_secs {
            self.max_time_secs = Some(max_time_secs);
        }
        if !cli.patterns.is_empty() {
            let patterns = cli
                .patterns
                .iter()
                .map(|arg| parse_pattern(arg))
                .collect::<anyhow::Result<Vec<_>>>()?;
            self.patterns = Some(patterns);
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_secs.map(Duration::from_secs_f64)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.size_bound == 0 {
            return Err(anyhow!("Size bound must be greater than 0"));
        }
        if let Some(max_time_secs) = self.max_time_secs {
            if !max_time_secs.is_finite() || max_time_secs < 0.0 {
                return Err(anyhow!(
                    "Time limit must be a non-negative number of seconds, got {}",
                    max_time_secs
                ));
            }
        }
        if self.patterns.as_ref().is_some_and(|p| p.is_empty()) {
            return Err(anyhow!("Pattern list must not be empty"));
        }
        Ok(())
    }

    /// Checks explicitly given patterns against the task and the size bound
    /// before any pattern database is built.
    pub fn validate_patterns(&self, task: &TnfTask) -> anyhow::Result<()> {
        let Some(patterns) = &self.patterns else {
            return Ok(());
        };
        for pattern in patterns {
            task.validate_pattern(pattern)
                .with_context(|| format!("pattern {pattern} does not fit the task"))?;
        }
        match collection_size(task, patterns) {
            Some(size) if size < self.size_bound => Ok(()),
            Some(size) => Err(anyhow!(
                "Patterns have {} abstract states, size bound is {}",
                size,
                self.size_bound
            )),
            None => Err(anyhow!(
                "Patterns have more abstract states than fit in memory, size bound is {}",
                self.size_bound
            )),
        }
    }
}

/// Parses a comma separated list of variable ids such as `0,2,3`.
fn parse_pattern(arg: &str) -> anyhow::Result<Pattern> {
    let variables = arg
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid variable id {part:?} in pattern {arg:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Pattern::new(variables).with_context(|| format!("invalid pattern {arg:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_yaml() {
        let config = Config::from_yaml_str(
            "task_path: a.yaml\nsize_bound: 50\npatterns:\n  - [0, 2]\n  - [1]\n",
        )
        .unwrap();
        assert_eq!(config.task_path, "a.yaml");
        assert_eq!(config.size_bound, 50);
        assert_eq!(config.num_samples, Config::default().num_samples);
        let patterns = config.patterns.unwrap();
        assert_eq!(patterns[0].variables(), &[0, 2]);
        assert_eq!(patterns[1].variables(), &[1]);
    }

    #[test]
    fn test_config_rejects_bad_yaml() {
        assert!(Config::from_yaml_str("patterns:\n  - []\n").is_err());
        assert!(Config::from_yaml_str("size_bonud: 3\n").is_err());
    }

    #[test]
    fn test_command_line_overrides() {
        let cli = Cli::parse_from([
            "pdb-hillclimb",
            "--size-bound",
            "12",
            "--seed",
            "9",
            "--pattern",
            "0, 2",
            "--pattern",
            "1",
        ]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert_eq!(config.size_bound, 12);
        assert_eq!(config.seed, 9);
        let patterns = config.patterns.unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].variables(), &[0, 2]);
    }

    #[test]
    fn test_validation() {
        let cli = Cli::parse_from(["pdb-hillclimb", "--size-bound", "0"]);
        assert!(Config::default().override_from_command_line(&cli).is_err());

        let cli = Cli::parse_from(["pdb-hillclimb", "--pattern", "1,1"]);
        assert!(Config::default().override_from_command_line(&cli).is_err());

        let config = Config {
            max_time_secs: Some(-1.0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_given_patterns_checked_against_size_bound() {
        let task = TnfTask::new(vec![100_000, 100_000], vec![], vec![0, 0]).unwrap();
        let cli = Cli::parse_from(["pdb-hillclimb", "--pattern", "0,1", "--size-bound", "10"]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert!(config.validate_patterns(&task).is_err());

        let cli = Cli::parse_from(["pdb-hillclimb", "--pattern", "0", "--pattern", "1"]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert!(config.validate_patterns(&task).is_ok());

        let huge = TnfTask::new(vec![1 << 33, 1 << 33], vec![], vec![0, 0]).unwrap();
        let cli = Cli::parse_from(["pdb-hillclimb", "--pattern", "0,1"]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert!(config.validate_patterns(&huge).is_err());

        let cli = Cli::parse_from(["pdb-hillclimb", "--pattern", "2"]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert!(config.validate_patterns(&task).is_err());
    }
}
