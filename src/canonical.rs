use crate::heuristic::Heuristic;
use crate::max_cliques::compute_max_cliques;
use crate::pdb::PatternDatabase;
use crate::task::{Distance, Pattern, TnfOperator, TnfState, TnfTask};

use tracing::{debug, instrument};

/// True if the operator changes the value of at least one pattern variable.
pub fn affects_pattern(operator: &TnfOperator, pattern: &Pattern) -> bool {
    operator
        .entries
        .iter()
        .any(|entry| entry.is_change() && pattern.contains(entry.variable_id))
}

/// Adjacency lists over pattern indices: `j` is in `graph[i]` iff no operator
/// affects both pattern `i` and pattern `j`. The pair `(i, i)` is included
/// when no operator affects pattern `i` at all.
pub fn build_compatibility_graph(patterns: &[Pattern], task: &TnfTask) -> Vec<Vec<usize>> {
    // affected[o][i]: operator o affects pattern i.
    let affected: Vec<Vec<bool>> = task
        .operators
        .iter()
        .map(|operator| {
            patterns
                .iter()
                .map(|pattern| affects_pattern(operator, pattern))
                .collect()
        })
        .collect();

    (0..patterns.len())
        .map(|i| {
            (0..patterns.len())
                .filter(|&j| !affected.iter().any(|row| row[i] && row[j]))
                .collect()
        })
        .collect()
}

/// Canonical combination of several pattern databases: the maximum over all
/// maximal additive sets of the summed PDB values.
#[derive(Debug, Clone)]
pub struct CanonicalPatternDatabases {
    pdbs: Vec<PatternDatabase>,
    maximal_additive_sets: Vec<Vec<usize>>,
}

impl CanonicalPatternDatabases {
    #[instrument(
        skip_all,
        name = "canonical_pdbs",
        fields(patterns = patterns.len()),
        level = "debug"
    )]
    pub fn new(task: &TnfTask, patterns: &[Pattern]) -> Self {
        let pdbs = patterns
            .iter()
            .map(|pattern| PatternDatabase::new(task, pattern))
            .collect();

        let compatibility_graph = build_compatibility_graph(patterns, task);
        let maximal_additive_sets = compute_max_cliques(&compatibility_graph);
        debug!("maximal additive sets: {maximal_additive_sets:?}");

        CanonicalPatternDatabases {
            pdbs,
            maximal_additive_sets,
        }
    }

    pub fn pdbs(&self) -> &[PatternDatabase] {
        &self.pdbs
    }

    pub fn maximal_additive_sets(&self) -> &[Vec<usize>] {
        &self.maximal_additive_sets
    }

    pub fn compute_heuristic(&self, original_state: &TnfState) -> Distance {
        // Look every PDB up once, even if it occurs in several additive sets.
        let mut heuristic_values = Vec::with_capacity(self.pdbs.len());
        for pdb in &self.pdbs {
            match pdb.lookup_distance(original_state) {
                // One dead abstraction makes the state a dead end.
                Distance::Infinite => return Distance::Infinite,
                Distance::Finite(value) => heuristic_values.push(value),
            }
        }

        let best = self
            .maximal_additive_sets
            .iter()
            .map(|set| set.iter().map(|&i| heuristic_values[i]).sum::<u64>())
            .max()
            .unwrap_or(0);
        Distance::Finite(best)
    }
}

impl Heuristic for CanonicalPatternDatabases {
    fn compute_heuristic(&self, state: &TnfState) -> Distance {
        CanonicalPatternDatabases::compute_heuristic(self, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::{chain_task, independent_task, pattern};
    use crate::task::TnfOperatorEntry;

    #[test]
    fn test_affects_pattern_ignores_noop_entries() {
        let task = chain_task();
        // Operator 1 changes variable 1 and only reads variable 0.
        assert!(affects_pattern(&task.operators[1], &pattern(&[1])));
        assert!(!affects_pattern(&task.operators[1], &pattern(&[0])));
        assert!(affects_pattern(&task.operators[1], &pattern(&[0, 1])));
        assert!(!affects_pattern(&task.operators[1], &pattern(&[2])));
    }

    #[test]
    fn test_compatibility_graph() {
        let task = chain_task();
        let patterns = [pattern(&[0]), pattern(&[1]), pattern(&[2]), pattern(&[0, 1])];
        let graph = build_compatibility_graph(&patterns, &task);
        assert_eq!(graph, vec![vec![1, 2], vec![0, 2], vec![0, 1, 3], vec![2]]);
    }

    #[test]
    fn test_unaffected_pattern_gets_self_loop() {
        let task = TnfTask::new(vec![2, 2], vec![], vec![0, 0]).unwrap();
        let graph = build_compatibility_graph(&[pattern(&[0]), pattern(&[1])], &task);
        assert_eq!(graph, vec![vec![0, 1], vec![0, 1]]);
    }

    #[test]
    fn test_additive_patterns_are_summed() {
        let task = independent_task();
        let cpdbs = CanonicalPatternDatabases::new(&task, &[pattern(&[0]), pattern(&[1])]);
        assert_eq!(cpdbs.maximal_additive_sets(), &[vec![0, 1]]);
        assert_eq!(cpdbs.compute_heuristic(&vec![0, 0]), Distance::Finite(6));
        assert_eq!(cpdbs.compute_heuristic(&vec![1, 0]), Distance::Finite(5));
        assert_eq!(cpdbs.compute_heuristic(&vec![2, 1]), Distance::ZERO);
    }

    #[test]
    fn test_dependent_patterns_take_maximum() {
        let task = TnfTask::new(
            vec![2, 2],
            vec![TnfOperator {
                cost: 5,
                entries: vec![TnfOperatorEntry::new(0, 0, 1), TnfOperatorEntry::new(1, 0, 1)],
            }],
            vec![1, 1],
        )
        .unwrap();
        let cpdbs = CanonicalPatternDatabases::new(&task, &[pattern(&[0]), pattern(&[1])]);
        assert_eq!(cpdbs.maximal_additive_sets().len(), 2);
        assert_eq!(cpdbs.compute_heuristic(&vec![0, 0]), Distance::Finite(5));
    }

    #[test]
    fn test_canonical_at_least_every_pdb() {
        let task = chain_task();
        let patterns = [pattern(&[0]), pattern(&[1]), pattern(&[2]), pattern(&[1, 2])];
        let cpdbs = CanonicalPatternDatabases::new(&task, &patterns);
        for index in 0..task.num_states().unwrap() {
            let state = vec![index & 1, (index >> 1) & 1, (index >> 2) & 1];
            let h = cpdbs.compute_heuristic(&state);
            for pdb in cpdbs.pdbs() {
                assert!(h >= pdb.lookup_distance(&state), "state {state:?}");
            }
        }
    }

    #[test]
    fn test_infinite_short_circuits() {
        let task = TnfTask::new(
            vec![3, 2],
            vec![
                TnfOperator {
                    cost: 1,
                    entries: vec![TnfOperatorEntry::new(0, 0, 1)],
                },
                TnfOperator {
                    cost: u32::MAX,
                    entries: vec![TnfOperatorEntry::new(1, 0, 1)],
                },
            ],
            vec![1, 1],
        )
        .unwrap();
        let cpdbs = CanonicalPatternDatabases::new(&task, &[pattern(&[1]), pattern(&[0])]);
        assert_eq!(
            cpdbs.compute_heuristic(&vec![0, 0]),
            Distance::Finite(u64::from(u32::MAX) + 1)
        );
        // Variable 0 cannot leave value 2.
        assert_eq!(cpdbs.compute_heuristic(&vec![2, 0]), Distance::Infinite);
    }

    #[test]
    fn test_usable_as_dyn_heuristic() {
        let task = independent_task();
        let cpdbs = CanonicalPatternDatabases::new(&task, &[pattern(&[0]), pattern(&[1])]);
        let single = PatternDatabase::new(&task, &pattern(&[0]));
        let heuristics: [&dyn Heuristic; 2] = [&cpdbs, &single];
        let values: Vec<Distance> = heuristics
            .iter()
            .map(|h| h.compute_heuristic(&vec![0, 0]))
            .collect();
        assert_eq!(values, vec![Distance::Finite(6), Distance::Finite(3)]);
    }

    #[test]
    fn test_empty_collection() {
        let task = chain_task();
        let cpdbs = CanonicalPatternDatabases::new(&task, &[]);
        assert!(cpdbs.maximal_additive_sets().is_empty());
        assert_eq!(cpdbs.compute_heuristic(&vec![0, 0, 0]), Distance::ZERO);
    }
}
