//! Four-channel voxel light propagation via two-phase flood fill.

pub mod solver;

pub use solver::{LightAccess, LightSolver, NEIGHBORS_6, SolveStats};
