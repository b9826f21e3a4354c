use crate::heuristic::Heuristic;
use crate::projection::Projection;
use crate::task::{Distance, Pattern, TnfState, TnfTask};

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, instrument, trace};

/// Exact goal distances of every abstract state of one projection.
#[derive(Debug, Clone)]
pub struct PatternDatabase {
    projection: Projection,
    distances: Vec<Distance>,
}

impl PatternDatabase {
    #[instrument(skip_all, name = "pattern_database", fields(pattern = %pattern), level = "debug")]
    pub fn new(task: &TnfTask, pattern: &Pattern) -> Self {
        let projection = Projection::new(task, pattern);
        let distances = regression_search(&projection);
        debug!(
            "{} abstract states, {} dead",
            distances.len(),
            distances.iter().filter(|d| d.is_infinite()).count()
        );
        PatternDatabase {
            projection,
            distances,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        self.projection.pattern()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn distances(&self) -> &[Distance] {
        &self.distances
    }

    pub fn lookup_distance(&self, original_state: &TnfState) -> Distance {
        let abstract_state = self.projection.project_state(original_state);
        self.distances[self.projection.rank_state(&abstract_state)]
    }
}

impl Heuristic for PatternDatabase {
    fn compute_heuristic(&self, state: &TnfState) -> Distance {
        self.lookup_distance(state)
    }
}

/// Uniform cost search backwards from the abstract goal over state indices.
/// Operators are applied with precondition and effect swapped, which is a
/// regression because every operator is in TNF.
fn regression_search(projection: &Projection) -> Vec<Distance> {
    let projected_task = projection.projected_task();
    let mut distances = vec![Distance::Infinite; projection.num_abstract_states()];
    let mut heap = BinaryHeap::new();

    let goal_index = projection.rank_state(&projected_task.goal_state);
    distances[goal_index] = Distance::ZERO;
    heap.push((Reverse(Distance::ZERO), goal_index));

    while let Some((Reverse(cost), index)) = heap.pop() {
        if cost > distances[index] {
            continue;
        }
        let current_state = projection.unrank_state(index);
        trace!("expand {current_state:?} at {cost}");

        for operator in &projected_task.operators {
            // The operator could have produced the current state only if all
            // its effects hold in it.
            let produces_current = operator
                .entries
                .iter()
                .all(|entry| current_state[entry.variable_id] == entry.effect_value);
            if !produces_current {
                continue;
            }

            let mut predecessor = current_state.clone();
            for entry in &operator.entries {
                predecessor[entry.variable_id] = entry.precondition_value;
            }

            let next_cost = cost + operator.cost;
            let predecessor_index = projection.rank_state(&predecessor);
            if next_cost < distances[predecessor_index] {
                distances[predecessor_index] = next_cost;
                heap.push((Reverse(next_cost), predecessor_index));
            }
        }
    }

    distances
}
