use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub iterations: usize,
    pub generated_neighbors: usize,
    pub evaluated_collections: usize,
    pub built_pdbs: usize,
    pub time_us: u64,
}

impl Stats {
    pub(crate) fn print(&self) {
        info!(
            "Iterations {:?} Time(microseconds) {:?} Generated neighbors: {:?} Evaluated collections: {:?} Built PDBs: {:?}",
            self.iterations,
            self.time_us,
            self.generated_neighbors,
            self.evaluated_collections,
            self.built_pdbs
        );
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
pub(crate) fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
