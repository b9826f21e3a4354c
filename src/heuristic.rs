use crate::task::{Distance, TnfState};

/// Goal-distance estimate consumed by an outer search.
pub trait Heuristic {
    fn compute_heuristic(&self, state: &TnfState) -> Distance;
}
