//! Unsmoothed-aggregation algebraic multigrid
//!
//! Setup pipeline: strength-of-connection filtering ([`strength`]),
//! aggregation ([`aggregation`]), tentative prolongation
//! ([`interpolation`]) and the Galerkin coarse product, driven level by
//! level from [`hierarchy`]. The solve phase runs multigrid cycles with
//! Jacobi or additive Schwarz ([`schwarz`]) smoothing.

pub mod aggregation;
pub mod config;
pub mod hierarchy;
pub mod interpolation;
pub mod schwarz;
pub mod strength;

pub use aggregation::{
    Aggregation, MIN_AGGREGATES, VertexMark, aggregate_greedy, aggregate_heavy_edge,
};
pub use config::{
    AggregationType, AmgConfig, CoarseSolverType, CycleType, InterpolationType,
};
pub use hierarchy::{AmgDiagnostics, AmgHierarchy, SetupTermination};
pub use interpolation::{InterpolationWeights, tentative_prolongation};
pub use schwarz::SchwarzSmoother;
pub use strength::strength_graph;
