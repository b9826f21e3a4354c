use crate::stat::Stats;
use crate::task::{Distance, Pattern, TnfState, TnfTask};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

/// A TNF task as stored on disk, with an optional initial state and optional
/// fixed sample states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(flatten)]
    pub task: TnfTask,
    #[serde(default)]
    pub initial_state: Option<TnfState>,
    #[serde(default)]
    pub samples: Vec<TnfState>,
}

impl TaskFile {
    /// Reads a `.json` file as JSON and anything else as YAML, then validates it.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open task file {path}"))?;
        let reader = BufReader::new(file);
        let task_file: TaskFile = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        task_file
            .validate()
            .with_context(|| format!("invalid task in {path}"))?;
        Ok(task_file)
    }

    pub fn validate(&self) -> Result<()> {
        self.task.validate()?;
        if let Some(initial_state) = &self.initial_state {
            self.task
                .validate_state(initial_state)
                .context("invalid initial state")?;
        }
        for (index, sample) in self.samples.iter().enumerate() {
            self.task
                .validate_state(sample)
                .with_context(|| format!("invalid sample {index}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternReport {
    pub pattern: Pattern,
    pub abstract_states: usize,
}

/// Outcome of one pattern selection run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultFile {
    pub patterns: Vec<PatternReport>,
    pub total_abstract_states: usize,
    pub maximal_additive_sets: Vec<Vec<usize>>,
    pub initial_heuristic: Option<Distance>,
    pub stats: Option<Stats>,
}

impl ResultFile {
    pub fn write_to_file(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
        let mut writer = io::BufWriter::new(file);
        let data = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        writer.write_all(data.as_bytes())?;

        Ok(())
    }
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
}
