use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Add;
use thiserror::Error;

pub type VariableId = usize;
pub type Cost = u32;

/// One value per task variable.
pub type TnfState = Vec<usize>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("pattern must contain at least one variable")]
    EmptyPattern,
    #[error("variable {0} occurs more than once in pattern")]
    DuplicateVariable(VariableId),
    #[error("unknown variable {variable} (task has {num_variables} variables)")]
    UnknownVariable {
        variable: VariableId,
        num_variables: usize,
    },
    #[error("variable {0} has an empty domain")]
    EmptyDomain(VariableId),
    #[error("value {value} is outside the domain of variable {variable} (size {domain_size})")]
    ValueOutOfDomain {
        variable: VariableId,
        value: usize,
        domain_size: usize,
    },
    #[error("state has {actual} values, expected {expected}")]
    StateLengthMismatch { expected: usize, actual: usize },
    #[error("operator {operator} mentions variable {variable} more than once")]
    RepeatedOperatorVariable {
        operator: usize,
        variable: VariableId,
    },
}

/// Goal distance of an (abstract) state. `Infinite` orders above every finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum Distance {
    Finite(u64),
    Infinite,
}

impl Distance {
    pub const ZERO: Distance = Distance::Finite(0);

    pub fn is_infinite(&self) -> bool {
        matches!(self, Distance::Infinite)
    }

    pub fn finite(&self) -> Option<u64> {
        match self {
            Distance::Finite(value) => Some(*value),
            Distance::Infinite => None,
        }
    }
}

impl From<Option<u64>> for Distance {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Distance::Infinite, Distance::Finite)
    }
}

impl From<Distance> for Option<u64> {
    fn from(distance: Distance) -> Self {
        distance.finite()
    }
}

impl Add<Cost> for Distance {
    type Output = Distance;

    fn add(self, cost: Cost) -> Distance {
        match self {
            Distance::Finite(value) => Distance::Finite(value + u64::from(cost)),
            Distance::Infinite => Distance::Infinite,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Finite(value) => write!(f, "{value}"),
            Distance::Infinite => write!(f, "infinity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TnfOperatorEntry {
    pub variable_id: VariableId,
    pub precondition_value: usize,
    pub effect_value: usize,
}

impl TnfOperatorEntry {
    pub fn new(variable_id: VariableId, precondition_value: usize, effect_value: usize) -> Self {
        TnfOperatorEntry {
            variable_id,
            precondition_value,
            effect_value,
        }
    }

    /// True if the entry actually changes the value of its variable.
    pub fn is_change(&self) -> bool {
        self.precondition_value != self.effect_value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TnfOperator {
    pub cost: Cost,
    pub entries: Vec<TnfOperatorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TnfTask {
    pub variable_domains: Vec<usize>,
    pub operators: Vec<TnfOperator>,
    pub goal_state: TnfState,
}

impl TnfTask {
    pub fn new(
        variable_domains: Vec<usize>,
        operators: Vec<TnfOperator>,
        goal_state: TnfState,
    ) -> Result<Self, TaskError> {
        let task = TnfTask {
            variable_domains,
            operators,
            goal_state,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn num_variables(&self) -> usize {
        self.variable_domains.len()
    }

    /// Number of states of the task, or `None` if it does not fit a `usize`.
    pub fn num_states(&self) -> Option<usize> {
        self.variable_domains
            .iter()
            .try_fold(1usize, |acc, &size| acc.checked_mul(size))
    }

    pub fn validate(&self) -> Result<(), TaskError> {
        for (variable, &size) in self.variable_domains.iter().enumerate() {
            if size == 0 {
                return Err(TaskError::EmptyDomain(variable));
            }
        }

        for (index, operator) in self.operators.iter().enumerate() {
            let mut seen = BTreeSet::new();
            for entry in &operator.entries {
                self.check_value(entry.variable_id, entry.precondition_value)?;
                self.check_value(entry.variable_id, entry.effect_value)?;
                if !seen.insert(entry.variable_id) {
                    return Err(TaskError::RepeatedOperatorVariable {
                        operator: index,
                        variable: entry.variable_id,
                    });
                }
            }
        }

        self.validate_state(&self.goal_state)
    }

    pub fn validate_state(&self, state: &TnfState) -> Result<(), TaskError> {
        if state.len() != self.num_variables() {
            return Err(TaskError::StateLengthMismatch {
                expected: self.num_variables(),
                actual: state.len(),
            });
        }
        for (variable, &value) in state.iter().enumerate() {
            self.check_value(variable, value)?;
        }
        Ok(())
    }

    pub fn validate_pattern(&self, pattern: &Pattern) -> Result<(), TaskError> {
        for &variable in pattern.variables() {
            if variable >= self.num_variables() {
                return Err(TaskError::UnknownVariable {
                    variable,
                    num_variables: self.num_variables(),
                });
            }
        }
        Ok(())
    }

    fn check_value(&self, variable: VariableId, value: usize) -> Result<(), TaskError> {
        let domain_size =
            *self
                .variable_domains
                .get(variable)
                .ok_or(TaskError::UnknownVariable {
                    variable,
                    num_variables: self.num_variables(),
                })?;
        if value >= domain_size {
            return Err(TaskError::ValueOutOfDomain {
                variable,
                value,
                domain_size,
            });
        }
        Ok(())
    }
}

/// A non-empty set of variables, iterated in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<VariableId>", into = "Vec<VariableId>")]
pub struct Pattern(Vec<VariableId>);

impl Pattern {
    pub fn new(variables: Vec<VariableId>) -> Result<Self, TaskError> {
        if variables.is_empty() {
            return Err(TaskError::EmptyPattern);
        }
        let mut seen = BTreeSet::new();
        for &variable in &variables {
            if !seen.insert(variable) {
                return Err(TaskError::DuplicateVariable(variable));
            }
        }
        Ok(Pattern(variables))
    }

    pub fn singleton(variable: VariableId) -> Self {
        Pattern(vec![variable])
    }

    pub fn variables(&self) -> &[VariableId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, variable: VariableId) -> bool {
        self.0.contains(&variable)
    }

    pub fn as_set(&self) -> BTreeSet<VariableId> {
        self.0.iter().copied().collect()
    }

    pub fn same_variables(&self, other: &Pattern) -> bool {
        self.len() == other.len() && self.as_set() == other.as_set()
    }

    /// The union `self ∪ {variable}`, in ascending variable order.
    pub fn extended_with(&self, variable: VariableId) -> Pattern {
        let mut set = self.as_set();
        set.insert(variable);
        Pattern(set.into_iter().collect())
    }

    /// Product of the domain sizes of the pattern's variables; `None` on overflow.
    pub fn num_abstract_states(&self, variable_domains: &[usize]) -> Option<usize> {
        self.0
            .iter()
            .try_fold(1usize, |acc, &variable| acc.checked_mul(variable_domains[variable]))
    }
}

impl TryFrom<Vec<VariableId>> for Pattern {
    type Error = TaskError;

    fn try_from(variables: Vec<VariableId>) -> Result<Self, Self::Error> {
        Pattern::new(variables)
    }
}

impl From<Pattern> for Vec<VariableId> {
    fn from(pattern: Pattern) -> Self {
        pattern.0
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
