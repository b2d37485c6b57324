//! Configuration for the unsmoothed-aggregation AMG setup and solve phases.

use crate::error::AmgError;

/// Aggregation algorithm used to coarsen the strongly-coupled graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationType {
    /// Greedy breadth-first aggregation (Vanek-Mandel-Brezina style):
    /// three deterministic passes, aggregate size capped at
    /// `max_aggregation`.
    #[default]
    Greedy,

    /// Heavy-edge coarsening: each vertex, visited in a random order, pairs
    /// with its strongest strongly-coupled neighbor. Aggregates may grow
    /// beyond `max_aggregation` by chaining; the cap is not enforced.
    HeavyEdge,
}

/// How the tentative prolongation weights its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationType {
    /// One entry of value 1 per aggregated fine vertex
    Boolean,

    /// Entries taken from the near-kernel basis vector
    #[default]
    NearKernel,
}

/// Multigrid cycle type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleType {
    /// V-cycle: one visit to each level
    #[default]
    V,

    /// W-cycle: two visits to coarser levels (more expensive)
    W,

    /// AMLI cycle; cycled like a W-cycle with two coarse visits per level
    Amli,

    /// Nonlinear AMLI cycle; cycled like a W-cycle
    NonlinearAmli,
}

/// Direct solver applied to the coarsest-level matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoarseSolverType {
    /// Dense LU with partial pivoting on the densified coarse matrix
    #[default]
    DenseLu,

    /// No factorization; the coarsest level is handled by smoothing sweeps
    None,
}

/// Configuration for AMG hierarchy setup
#[derive(Debug, Clone)]
pub struct AmgConfig {
    /// Aggregation algorithm
    pub aggregation: AggregationType,

    /// Prolongation weighting
    pub interpolation: InterpolationType,

    /// Cycle type for the solve phase
    pub cycle: CycleType,

    /// Initial strength-of-connection threshold θ in (0, 1].
    /// An off-diagonal entry (i,j) is strong iff it is negative and
    /// a_ij² ≥ θ²·|d_i·d_j|. The driver adapts θ between levels.
    pub strength_threshold: f64,

    /// Maximum number of vertices per aggregate (≥ 1).
    /// Enforced by the greedy algorithm only.
    pub max_aggregation: usize,

    /// Coarsening stops once a level has at most this many rows
    pub min_coarse_size: usize,

    /// Maximum number of levels in the hierarchy
    pub max_levels: usize,

    /// Seed for the heavy-edge visit permutation. `None` draws a fresh
    /// generator per setup, so independent runs are not reproducible.
    pub seed: Option<u64>,

    /// Coarsest-level direct solver
    pub coarse_solver: CoarseSolverType,

    /// Number of fine levels that receive an additive Schwarz smoother
    /// (0 disables the hook)
    pub schwarz_levels: usize,

    /// Subdomain count for the Schwarz smoother
    pub schwarz_subdomains: usize,

    /// Overlap layers for the Schwarz smoother
    pub schwarz_overlap: usize,

    /// Jacobi damping parameter (ω) for the solve cycle
    pub jacobi_weight: f64,

    /// Number of pre-smoothing sweeps per cycle
    pub num_pre_smooth: usize,

    /// Number of post-smoothing sweeps per cycle
    pub num_post_smooth: usize,
}

impl Default for AmgConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationType::default(),
            interpolation: InterpolationType::default(),
            cycle: CycleType::default(),
            strength_threshold: 0.25,
            max_aggregation: 20,
            min_coarse_size: 50,
            max_levels: 20,
            seed: None,
            coarse_solver: CoarseSolverType::default(),
            schwarz_levels: 0,
            schwarz_subdomains: 4,
            schwarz_overlap: 1,
            jacobi_weight: 0.6667,
            num_pre_smooth: 1,
            num_post_smooth: 1,
        }
    }
}

impl AmgConfig {
    /// Check the configuration for values the setup phase cannot work with.
    pub fn validate(&self) -> Result<(), AmgError> {
        if self.max_aggregation < 1 {
            return Err(AmgError::InvalidMaxAggregation {
                got: self.max_aggregation,
            });
        }
        if !(self.strength_threshold > 0.0 && self.strength_threshold <= 1.0) {
            return Err(AmgError::InvalidStrengthThreshold {
                got: self.strength_threshold,
            });
        }
        if self.min_coarse_size < 1 {
            return Err(AmgError::InvalidMinCoarseSize {
                got: self.min_coarse_size,
            });
        }
        if self.max_levels < 1 {
            return Err(AmgError::InvalidMaxLevels {
                got: self.max_levels,
            });
        }
        Ok(())
    }
}
