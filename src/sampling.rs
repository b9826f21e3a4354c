use crate::task::{TnfState, TnfTask};

use rand::Rng;
use tracing::debug;

/// Draws `num_samples` states, each variable value uniform over its domain.
pub fn sample_states<R: Rng + ?Sized>(
    task: &TnfTask,
    num_samples: usize,
    rng: &mut R,
) -> Vec<TnfState> {
    let samples: Vec<TnfState> = (0..num_samples)
        .map(|_| {
            task.variable_domains
                .iter()
                .map(|&domain_size| rng.gen_range(0..domain_size))
                .collect()
        })
        .collect();
    debug!("drew {} sample states", samples.len());
    samples
}
