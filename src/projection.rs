use crate::task::{Pattern, TnfOperator, TnfOperatorEntry, TnfState, TnfTask};

/// Abstraction of a task onto the variables of one pattern, together with a
/// perfect hash between abstract states and `0..num_abstract_states`.
#[derive(Debug, Clone)]
pub struct Projection {
    pattern: Pattern,
    projected_task: TnfTask,
    hash_multipliers: Vec<usize>,
    num_abstract_states: usize,
}

impl Projection {
    pub fn new(task: &TnfTask, pattern: &Pattern) -> Self {
        debug_assert!(task.validate_pattern(pattern).is_ok());

        // Variable `pattern.variables()[i]` becomes variable `i` of the projected task.
        let variable_domains: Vec<usize> = pattern
            .variables()
            .iter()
            .map(|&variable| task.variable_domains[variable])
            .collect();

        let mut hash_multipliers = Vec::with_capacity(variable_domains.len());
        let mut num_abstract_states = 1usize;
        for &domain_size in &variable_domains {
            hash_multipliers.push(num_abstract_states);
            num_abstract_states = num_abstract_states
                .checked_mul(domain_size)
                .unwrap_or_else(|| panic!("projection onto {pattern} is too large to rank"));
        }

        let operators = task
            .operators
            .iter()
            .filter_map(|operator| project_operator(operator, pattern))
            .collect();

        let projected_task = TnfTask {
            variable_domains,
            operators,
            goal_state: project(pattern, &task.goal_state),
        };

        Projection {
            pattern: pattern.clone(),
            projected_task,
            hash_multipliers,
            num_abstract_states,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn projected_task(&self) -> &TnfTask {
        &self.projected_task
    }

    pub fn num_abstract_states(&self) -> usize {
        self.num_abstract_states
    }

    /// Restricts a full task state to the pattern's variables, in pattern order.
    pub fn project_state(&self, original_state: &TnfState) -> TnfState {
        project(&self.pattern, original_state)
    }

    pub fn rank_state(&self, abstract_state: &TnfState) -> usize {
        debug_assert_eq!(abstract_state.len(), self.hash_multipliers.len());
        abstract_state
            .iter()
            .zip(&self.hash_multipliers)
            .map(|(value, multiplier)| value * multiplier)
            .sum()
    }

    pub fn unrank_state(&self, index: usize) -> TnfState {
        debug_assert!(index < self.num_abstract_states);
        self.hash_multipliers
            .iter()
            .zip(&self.projected_task.variable_domains)
            .map(|(multiplier, domain_size)| (index / multiplier) % domain_size)
            .collect()
    }
}

fn project(pattern: &Pattern, original_state: &TnfState) -> TnfState {
    pattern
        .variables()
        .iter()
        .map(|&variable| original_state[variable])
        .collect()
}

/// Restricts an operator to the pattern. Operators that change nothing on the
/// pattern are self-loops in the abstraction and are dropped.
fn project_operator(operator: &TnfOperator, pattern: &Pattern) -> Option<TnfOperator> {
    let entries: Vec<TnfOperatorEntry> = pattern
        .variables()
        .iter()
        .enumerate()
        .filter_map(|(abstract_variable, &variable)| {
            operator
                .entries
                .iter()
                .find(|entry| entry.variable_id == variable)
                .map(|entry| {
                    TnfOperatorEntry::new(
                        abstract_variable,
                        entry.precondition_value,
                        entry.effect_value,
                    )
                })
        })
        .collect();

    if entries.iter().any(TnfOperatorEntry::is_change) {
        Some(TnfOperator {
            cost: operator.cost,
            entries,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::{chain_task, independent_task, pattern};

    #[test]
    fn test_rank_unrank_round_trip() {
        let task = TnfTask::new(vec![3, 2, 4, 5], vec![], vec![0, 0, 0, 0]).unwrap();
        for variables in [vec![0], vec![3, 1], vec![2, 0, 3], vec![1, 2, 3, 0]] {
            let projection = Projection::new(&task, &pattern(&variables));
            for index in 0..projection.num_abstract_states() {
                let state = projection.unrank_state(index);
                assert_eq!(projection.rank_state(&state), index);
            }
        }
    }

    #[test]
    fn test_mixed_radix_order() {
        let task = independent_task();
        let projection = Projection::new(&task, &pattern(&[0, 1]));
        assert_eq!(projection.num_abstract_states(), 6);
        // The first pattern variable is the fastest-moving digit.
        assert_eq!(projection.rank_state(&vec![1, 0]), 1);
        assert_eq!(projection.rank_state(&vec![0, 1]), 3);
        assert_eq!(projection.unrank_state(5), vec![2, 1]);

        let reversed = Projection::new(&task, &pattern(&[1, 0]));
        assert_eq!(reversed.rank_state(&vec![1, 0]), 1);
        assert_eq!(reversed.unrank_state(5), vec![1, 2]);
    }

    #[test]
    fn test_project_state_follows_pattern_order() {
        let task = chain_task();
        let projection = Projection::new(&task, &pattern(&[2, 0]));
        assert_eq!(projection.project_state(&vec![0, 1, 1]), vec![1, 0]);
        assert_eq!(projection.projected_task().goal_state, vec![1, 1]);
        assert_eq!(projection.projected_task().variable_domains, vec![2, 2]);
    }

    #[test]
    fn test_projected_operators() {
        let task = chain_task();
        let projection = Projection::new(&task, &pattern(&[1]));
        let operators = &projection.projected_task().operators;
        // Only the operator changing variable 1 survives; the other two are
        // self-loops or do not mention variable 1.
        assert_eq!(operators.len(), 1);
        assert_eq!(operators[0].entries, vec![TnfOperatorEntry::new(0, 0, 1)]);

        let projection = Projection::new(&task, &pattern(&[1, 0]));
        let operators = &projection.projected_task().operators;
        assert_eq!(operators.len(), 2);
        assert_eq!(
            operators[1].entries,
            vec![
                TnfOperatorEntry::new(0, 0, 1),
                TnfOperatorEntry::new(1, 1, 1)
            ]
        );
    }
}
