pub mod canonical;
pub mod config;
pub mod heuristic;
pub mod hillclimbing;
pub mod max_cliques;
pub mod pdb;
pub mod projection;
pub mod sampling;
pub mod stat;
pub mod task;
pub mod task_file;
