use crate::canonical::CanonicalPatternDatabases;
use crate::stat::{micros, Stats};
use crate::task::{Distance, Pattern, TnfState, TnfTask, VariableId};

use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// For every variable, the variables that are causally relevant for it.
///
/// In general `v` is causally relevant for `w` if `v` is a predecessor of `w`
/// in the causal graph, or a successor that is mentioned in the goal. Every
/// variable of a TNF task is mentioned in the goal, so this reduces to `v`
/// and `w` being neighbours in the causal graph: they occur in the same
/// operator and at least one of the two entries changes its variable.
pub fn compute_causally_relevant_variables(task: &TnfTask) -> Vec<BTreeSet<VariableId>> {
    let mut relevant = vec![BTreeSet::new(); task.num_variables()];
    for operator in &task.operators {
        for e1 in &operator.entries {
            for e2 in &operator.entries {
                if e1.variable_id != e2.variable_id && (e1.is_change() || e2.is_change()) {
                    relevant[e1.variable_id].insert(e2.variable_id);
                }
            }
        }
    }
    relevant
}

/// Canonical heuristic value of every sample under a freshly built collection.
pub fn score(task: &TnfTask, collection: &[Pattern], samples: &[TnfState]) -> Vec<Distance> {
    let cpdbs = CanonicalPatternDatabases::new(task, collection);
    samples
        .iter()
        .map(|sample| cpdbs.compute_heuristic(sample))
        .collect()
}

/// Number of samples whose value strictly increased.
pub fn improvement(current: &[Distance], candidate: &[Distance]) -> usize {
    debug_assert_eq!(current.len(), candidate.len());
    current
        .iter()
        .zip(candidate)
        .filter(|(old, new)| new > old)
        .count()
}

/// Total number of abstract states over all patterns; `None` on overflow.
pub fn collection_size(task: &TnfTask, collection: &[Pattern]) -> Option<usize> {
    collection.iter().try_fold(0usize, |acc, pattern| {
        acc.checked_add(pattern.num_abstract_states(&task.variable_domains)?)
    })
}

/// Local search over pattern collections, guided by the number of sample
/// states whose canonical heuristic value improves.
pub struct HillClimber<'a> {
    task: &'a TnfTask,
    size_bound: usize,
    samples: Vec<TnfState>,
    causally_relevant_variables: Vec<BTreeSet<VariableId>>,
    max_iterations: Option<usize>,
    max_time: Option<Duration>,
    stats: Stats,
}

impl<'a> HillClimber<'a> {
    pub fn new(task: &'a TnfTask, size_bound: usize, samples: Vec<TnfState>) -> Self {
        HillClimber {
            task,
            size_bound,
            samples,
            causally_relevant_variables: compute_causally_relevant_variables(task),
            max_iterations: None,
            max_time: None,
            stats: Stats::default(),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// True iff the summed abstract state count is strictly below the bound.
    pub fn fits_size_bound(&self, collection: &[Pattern]) -> bool {
        collection_size(self.task, collection).is_some_and(|size| size < self.size_bound)
    }

    /// Every variable occurs in the goal of a TNF task, so each one gets a singleton.
    pub fn compute_initial_collection(&self) -> Vec<Pattern> {
        (0..self.task.num_variables()).map(Pattern::singleton).collect()
    }

    /// Collections `C ∪ {P ∪ {v}}` for every pattern `P` in `C` and every
    /// variable `v` causally relevant for `P`, skipping patterns already in
    /// `C` and collections that exceed the size bound.
    pub fn compute_neighbors(&self, collection: &[Pattern]) -> Vec<Vec<Pattern>> {
        let mut neighbors = Vec::new();

        for pattern in collection {
            let mut candidates: BTreeSet<VariableId> = pattern
                .variables()
                .iter()
                .flat_map(|&v| self.causally_relevant_variables[v].iter().copied())
                .collect();
            candidates.retain(|&v| !pattern.contains(v));

            for variable in candidates {
                let extended = pattern.extended_with(variable);
                if collection.iter().any(|p| p.same_variables(&extended)) {
                    continue;
                }

                let mut neighbor = collection.to_vec();
                neighbor.push(extended);
                if self.fits_size_bound(&neighbor) {
                    neighbors.push(neighbor);
                }
            }
        }

        neighbors
    }

    fn compute_sample_heuristics(&mut self, collection: &[Pattern]) -> Vec<Distance> {
        self.stats.evaluated_collections += 1;
        self.stats.built_pdbs += collection.len();
        score(self.task, collection, &self.samples)
    }

    fn out_of_time(&self, start: Instant) -> bool {
        self.max_time.is_some_and(|limit| start.elapsed() >= limit)
    }

    #[instrument(
        skip_all,
        name = "hill_climbing",
        fields(size_bound = self.size_bound, samples = self.samples.len())
    )]
    pub fn run(&mut self) -> Vec<Pattern> {
        let start = Instant::now();
        self.stats = Stats::default();

        let mut current_collection = self.compute_initial_collection();
        if !self.fits_size_bound(&current_collection) {
            warn!(
                "initial collection of {} singletons already exceeds size bound {}",
                current_collection.len(),
                self.size_bound
            );
        }
        let mut current_sample_values = self.compute_sample_heuristics(&current_collection);

        'search: loop {
            if self
                .max_iterations
                .is_some_and(|limit| self.stats.iterations >= limit)
            {
                info!("iteration limit reached");
                break;
            }
            if self.out_of_time(start) {
                info!("time limit reached");
                break;
            }
            self.stats.iterations += 1;

            let neighbors = self.compute_neighbors(&current_collection);
            self.stats.generated_neighbors += neighbors.len();
            debug!(
                "iteration {}: {} neighbors",
                self.stats.iterations,
                neighbors.len()
            );

            // The first neighbour with the largest improvement wins.
            let mut best: Option<(usize, Vec<Pattern>, Vec<Distance>)> = None;
            for neighbor in neighbors {
                if self.out_of_time(start) {
                    info!("time limit reached");
                    break 'search;
                }
                let values = self.compute_sample_heuristics(&neighbor);
                let gain = improvement(&current_sample_values, &values);
                if gain > best.as_ref().map_or(0, |(best_gain, _, _)| *best_gain) {
                    best = Some((gain, neighbor, values));
                }
            }

            match best {
                Some((gain, collection, values)) => {
                    info!(
                        "improved {gain} of {} samples by adding {}",
                        self.samples.len(),
                        collection.last().map_or_else(String::new, Pattern::to_string)
                    );
                    current_collection = collection;
                    current_sample_values = values;
                }
                None => {
                    debug!("local optimum reached");
                    break;
                }
            }
        }

        self.stats.time_us = micros(start.elapsed());
        self.stats.print();
        current_collection
    }
}
