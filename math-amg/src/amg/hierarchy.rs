//! Unsmoothed-aggregation AMG hierarchy
//!
//! Setup builds a multilevel hierarchy by repeated
//! strength-graph / aggregate / tentative-prolongation / Galerkin steps,
//! adapting the strength threshold between levels. Each level carries its
//! own right-hand-side, solution and cycle-scratch vectors, so the solve
//! phase runs multigrid cycles without allocating. Smoothing is damped
//! Jacobi, or additive Schwarz where configured, with a dense LU solve on
//! the coarsest level.
//!
//! Coarsening can stop early without failing setup: when aggregation
//! degenerates or the next coarse dimension would undershoot the configured
//! minimum, the driver keeps the levels built so far and records why it
//! stopped in [`SetupTermination`].

use crate::amg::aggregation::{aggregate_greedy, aggregate_heavy_edge};
use crate::amg::config::{
    AggregationType, AmgConfig, CoarseSolverType, CycleType, InterpolationType,
};
use crate::amg::interpolation::{InterpolationWeights, tentative_prolongation};
use crate::amg::schwarz::SchwarzSmoother;
use crate::amg::strength::strength_graph;
use crate::direct::{LuError, LuFactorization, lu_factorize};
use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::RealField;
use log::{debug, info, warn};
use ndarray::{Array1, s};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Single level in the AMG hierarchy
#[derive(Debug, Clone)]
struct AmgLevel<T: RealField> {
    /// System matrix A at this level
    matrix: CsrMatrix<T>,

    /// Prolongation operator P: coarse -> fine (None on the coarsest level)
    prolongation: Option<CsrMatrix<T>>,

    /// Restriction operator R = P^T (None on the coarsest level)
    restriction: Option<CsrMatrix<T>>,

    /// Inverse diagonal for Jacobi smoothing
    diag_inv: Array1<T>,

    /// Additive Schwarz smoother, when configured for this level
    schwarz: Option<SchwarzSmoother<T>>,

    /// Cycle right-hand side at this level
    rhs: Array1<T>,

    /// Cycle solution/correction at this level
    solution: Array1<T>,

    /// Cycle scratch: residual in the first n entries, prolongated
    /// correction in the next n (a third n is reserved for the nonlinear
    /// AMLI cycle)
    work: Array1<T>,

    /// Number of DOFs at this level
    num_dofs: usize,
}

impl<T: RealField> AmgLevel<T> {
    fn new(matrix: CsrMatrix<T>, work_factor: usize) -> Self {
        let n = matrix.num_rows;
        Self {
            diag_inv: compute_diag_inv(&matrix),
            num_dofs: n,
            rhs: Array1::from_elem(n, T::zero()),
            solution: Array1::from_elem(n, T::zero()),
            work: Array1::from_elem(work_factor * n, T::zero()),
            matrix,
            prolongation: None,
            restriction: None,
            schwarz: None,
        }
    }

    /// Residual of the level system into the first n entries of `work`
    fn residual_into_work(&mut self) {
        for i in 0..self.num_dofs {
            let mut sum = self.rhs[i];
            for (j, v) in self.matrix.row_entries(i) {
                sum -= v * self.solution[j];
            }
            self.work[i] = sum;
        }
    }
}

/// How hierarchy setup ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupTermination {
    /// Coarsening ran until the size or depth limit
    CoarsestReached,

    /// Aggregation degenerated on `level`; the hierarchy keeps the levels
    /// built before it
    AbortedCoarsening {
        /// Level on which aggregation failed
        level: usize,
    },

    /// The next coarse dimension would undershoot the configured minimum
    AbortedCoarseDim {
        /// Level on which coarsening stopped
        level: usize,
    },
}

/// Diagnostic information about AMG setup
#[derive(Debug, Clone)]
pub struct AmgDiagnostics {
    /// Number of levels
    pub num_levels: usize,
    /// Grid complexity (sum of DOFs / fine DOFs)
    pub grid_complexity: f64,
    /// Operator complexity (sum of nnz / fine nnz)
    pub operator_complexity: f64,
    /// Setup time in milliseconds
    pub setup_time_ms: f64,
    /// DOFs per level
    pub level_dofs: Vec<usize>,
    /// NNZ per level
    pub level_nnz: Vec<usize>,
}

/// Unsmoothed-aggregation AMG hierarchy
///
/// Built once with [`AmgHierarchy::setup`]; afterwards it solves systems
/// with [`AmgHierarchy::solve`] or serves as a preconditioner through
/// [`AmgHierarchy::precondition`], one multigrid cycle per application.
#[derive(Debug, Clone)]
pub struct AmgHierarchy<T: RealField> {
    /// Hierarchy levels, finest to coarsest
    levels: Vec<AmgLevel<T>>,

    /// Configuration used for setup and cycling
    config: AmgConfig,

    /// Why setup stopped coarsening
    termination: SetupTermination,

    /// Strength threshold after the last adaptation
    final_theta: f64,

    /// Dense LU factors of the coarsest matrix, when configured and
    /// nonsingular
    coarse_lu: Option<LuFactorization<T>>,

    setup_time_ms: f64,
    grid_complexity: f64,
    operator_complexity: f64,
}

impl<T: RealField> AmgHierarchy<T> {
    /// Build the hierarchy for `a` with the constant-one near-kernel vector.
    pub fn setup(a: &CsrMatrix<T>, config: &AmgConfig) -> Result<Self> {
        let ones = Array1::from_elem(a.num_rows, T::one());
        Self::setup_with_near_kernel(a, config, &[ones])
    }

    /// Build the hierarchy for `a` with a caller-supplied near-kernel basis.
    ///
    /// The first basis vector supplies the prolongation weights when the
    /// configuration selects [`InterpolationType::NearKernel`]; every vector
    /// must match the fine-grid dimension.
    pub fn setup_with_near_kernel(
        a: &CsrMatrix<T>,
        config: &AmgConfig,
        near_kernel: &[Array1<T>],
    ) -> Result<Self> {
        config.validate()?;
        if near_kernel.is_empty() {
            return Err(AmgError::EmptyNearKernel);
        }
        for v in near_kernel {
            if v.len() != a.num_rows {
                return Err(AmgError::NearKernelDimension {
                    expected: a.num_rows,
                    got: v.len(),
                });
            }
        }

        let start = std::time::Instant::now();
        let basis = &near_kernel[0];
        let work_factor = match config.cycle {
            CycleType::NonlinearAmli => 3,
            _ => 2,
        };

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };

        let mut theta = config.strength_threshold;
        let mut termination = SetupTermination::CoarsestReached;

        let mut levels = vec![AmgLevel::new(a.clone(), work_factor)];
        let mut current = a.clone();

        while current.num_rows > config.min_coarse_size && levels.len() < config.max_levels {
            let level = levels.len() - 1;
            let rows = current.num_rows;

            let graph = strength_graph(&current, theta);
            let aggregation = match config.aggregation {
                AggregationType::Greedy => {
                    aggregate_greedy(&graph, config.max_aggregation, level)
                }
                AggregationType::HeavyEdge => Ok(aggregate_heavy_edge(&graph, &mut rng)),
            };
            let aggregation = match aggregation {
                Ok(agg) => agg,
                Err(err) if err.is_recoverable() => {
                    warn!("stopping setup early: {err}");
                    termination = SetupTermination::AbortedCoarsening { level };
                    break;
                }
                Err(err) => return Err(err),
            };

            // Adapt the threshold for the next level from this level's
            // coarsening ratio: slow coarsening loosens, aggressive
            // coarsening tightens.
            if aggregation.num_aggregates * 4 > rows {
                theta *= 0.5;
            } else if (aggregation.num_aggregates as f64) * 1.25 < rows as f64 {
                theta *= 2.0;
            }

            let p = match config.interpolation {
                InterpolationType::Boolean => {
                    tentative_prolongation(&aggregation, InterpolationWeights::Boolean)
                }
                InterpolationType::NearKernel => tentative_prolongation(
                    &aggregation,
                    InterpolationWeights::NearKernel(basis.slice(s![..rows])),
                ),
            };

            if p.num_cols < config.min_coarse_size {
                debug!(
                    "level {level}: next coarse dimension {} below minimum {}, stopping",
                    p.num_cols, config.min_coarse_size
                );
                termination = SetupTermination::AbortedCoarseDim { level };
                break;
            }

            let r = p.transpose();
            let coarse = CsrMatrix::rap(&r, &current, &p);
            debug!(
                "level {level}: {} -> {} dofs ({} -> {} nnz), theta now {theta:.4}",
                rows,
                coarse.num_rows,
                current.nnz(),
                coarse.nnz()
            );

            if let Some(last) = levels.last_mut() {
                last.prolongation = Some(p);
                last.restriction = Some(r);
            }
            levels.push(AmgLevel::new(coarse.clone(), work_factor));
            current = coarse;
        }

        let coarse_lu = match config.coarse_solver {
            CoarseSolverType::DenseLu => {
                let coarsest = &levels[levels.len() - 1].matrix;
                match lu_factorize(&coarsest.to_dense()) {
                    Ok(factor) => Some(factor),
                    Err(LuError::SingularMatrix) => {
                        warn!("coarsest matrix is singular, falling back to smoothing sweeps");
                        None
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            CoarseSolverType::None => None,
        };

        // Schwarz smoothers on the finer levels; the coarsest keeps its
        // direct solve
        let num_schwarz = config.schwarz_levels.min(levels.len().saturating_sub(1));
        for level in levels.iter_mut().take(num_schwarz) {
            level.schwarz = Some(SchwarzSmoother::from_csr(
                &level.matrix,
                config.schwarz_subdomains,
                config.schwarz_overlap,
            )?);
        }

        let setup_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        let (grid_complexity, operator_complexity) = compute_complexities(&levels);
        info!(
            "AMG setup: {} levels, grid complexity {:.2}, operator complexity {:.2}, {:.1} ms",
            levels.len(),
            grid_complexity,
            operator_complexity,
            setup_time_ms
        );

        Ok(Self {
            levels,
            config: config.clone(),
            termination,
            final_theta: theta,
            coarse_lu,
            setup_time_ms,
            grid_complexity,
            operator_complexity,
        })
    }

    /// Number of levels in the hierarchy
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// How setup stopped coarsening
    pub fn termination(&self) -> SetupTermination {
        self.termination
    }

    /// Strength threshold after the last per-level adaptation
    pub fn final_strength_threshold(&self) -> f64 {
        self.final_theta
    }

    /// Configuration the hierarchy was built with
    pub fn config(&self) -> &AmgConfig {
        &self.config
    }

    /// DOF count per level, finest to coarsest
    pub fn level_dofs(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.num_dofs).collect()
    }

    /// Get diagnostic information
    pub fn diagnostics(&self) -> AmgDiagnostics {
        AmgDiagnostics {
            num_levels: self.levels.len(),
            grid_complexity: self.grid_complexity,
            operator_complexity: self.operator_complexity,
            setup_time_ms: self.setup_time_ms,
            level_dofs: self.level_dofs(),
            level_nnz: self.levels.iter().map(|l| l.matrix.nnz()).collect(),
        }
    }

    /// Solve A x = b by stationary iteration with one multigrid cycle per
    /// step, from a zero initial guess.
    ///
    /// Stops when the relative residual drops below `tol` or after
    /// `max_iters` cycles, returning the best iterate either way.
    pub fn solve(&mut self, b: &Array1<T>, tol: f64, max_iters: usize) -> Result<Array1<T>> {
        let n = self.levels[0].num_dofs;
        if b.len() != n {
            return Err(AmgError::DimensionMismatch {
                expected: n,
                got: b.len(),
            });
        }

        let mut x = Array1::from_elem(n, T::zero());
        let b_norm = l2_norm(b);
        if b_norm == T::zero() {
            return Ok(x);
        }
        let tol_t = T::from_f64(tol).unwrap_or_else(T::zero);

        for iter in 0..max_iters {
            let residual = b - &self.levels[0].matrix.matvec(&x);
            let res_norm = l2_norm(&residual);
            if res_norm <= tol_t * b_norm {
                debug!("converged in {iter} cycles");
                return Ok(x);
            }

            self.levels[0].rhs.assign(&residual);
            self.levels[0].solution.fill(T::zero());
            self.cycle(0);
            x = x + &self.levels[0].solution;
        }

        warn!("no convergence within {max_iters} cycles");
        Ok(x)
    }

    /// One preconditioner application: a single cycle of the configured
    /// type on residual `r` from a zero initial guess.
    pub fn precondition(&mut self, r: &Array1<T>) -> Result<Array1<T>> {
        let n = self.levels[0].num_dofs;
        if r.len() != n {
            return Err(AmgError::DimensionMismatch {
                expected: n,
                got: r.len(),
            });
        }

        self.levels[0].rhs.assign(r);
        self.levels[0].solution.fill(T::zero());
        self.cycle(0);
        Ok(self.levels[0].solution.clone())
    }

    /// Visits to the next-coarser level per cycle
    fn cycle_gamma(&self) -> usize {
        match self.config.cycle {
            CycleType::V => 1,
            CycleType::W | CycleType::Amli | CycleType::NonlinearAmli => 2,
        }
    }

    /// Recursive multigrid cycle on `level`, improving the level's stored
    /// solution for its stored right-hand side
    fn cycle(&mut self, level: usize) {
        if level + 1 == self.levels.len() || self.levels[level].prolongation.is_none() {
            self.coarse_solve(level);
            return;
        }

        self.smooth(level, self.config.num_pre_smooth);

        // residual down to the coarse level
        {
            let (fine, coarse) = self.levels.split_at_mut(level + 1);
            let f = &mut fine[level];
            let c = &mut coarse[0];
            f.residual_into_work();
            if let Some(restriction) = &f.restriction {
                restriction.matvec_into(f.work.slice(s![..f.num_dofs]), c.rhs.view_mut());
            }
            c.solution.fill(T::zero());
        }

        for _ in 0..self.cycle_gamma() {
            self.cycle(level + 1);
        }

        // prolongate the coarse correction and apply it
        {
            let (fine, coarse) = self.levels.split_at_mut(level + 1);
            let f = &mut fine[level];
            let c = &coarse[0];
            let n = f.num_dofs;
            if let Some(prolongation) = &f.prolongation {
                prolongation.matvec_into(c.solution.view(), f.work.slice_mut(s![n..2 * n]));
            }
            for i in 0..n {
                let correction = f.work[n + i];
                f.solution[i] += correction;
            }
        }

        self.smooth(level, self.config.num_post_smooth);
    }

    /// Coarsest-level solve: direct LU when available, smoothing otherwise
    fn coarse_solve(&mut self, level: usize) {
        if level == self.levels.len() - 1 {
            if let Some(lu) = &self.coarse_lu {
                if let Ok(solution) = lu.solve(&self.levels[level].rhs) {
                    self.levels[level].solution = solution;
                    return;
                }
            }
        }
        self.smooth(level, 20);
    }

    /// Smoothing sweeps on `level`: additive Schwarz where configured,
    /// damped Jacobi otherwise
    fn smooth(&mut self, level: usize, sweeps: usize) {
        let weight = T::from_f64(self.config.jacobi_weight).unwrap_or_else(T::one);
        let lvl = &mut self.levels[level];
        let n = lvl.num_dofs;

        for _ in 0..sweeps {
            lvl.residual_into_work();
            match &lvl.schwarz {
                Some(schwarz) => {
                    let r = lvl.work.slice(s![..n]).to_owned();
                    let correction = schwarz.apply(&r);
                    for i in 0..n {
                        lvl.solution[i] += correction[i];
                    }
                }
                None => {
                    for i in 0..n {
                        let update = weight * lvl.diag_inv[i] * lvl.work[i];
                        lvl.solution[i] += update;
                    }
                }
            }
        }
    }
}

/// Inverse diagonal for Jacobi smoothing, with zero diagonals left at 1
fn compute_diag_inv<T: RealField>(matrix: &CsrMatrix<T>) -> Array1<T> {
    let n = matrix.num_rows;
    let tol = T::from_f64(1e-30).unwrap_or_else(T::min_positive_value);
    let mut diag_inv = Array1::from_elem(n, T::one());
    for i in 0..n {
        let diag = matrix.get(i, i);
        if diag.abs() > tol {
            diag_inv[i] = diag.inv();
        }
    }
    diag_inv
}

fn compute_complexities<T: RealField>(levels: &[AmgLevel<T>]) -> (f64, f64) {
    let fine_dofs = levels[0].num_dofs.max(1) as f64;
    let fine_nnz = levels[0].matrix.nnz().max(1) as f64;
    let total_dofs: usize = levels.iter().map(|l| l.num_dofs).sum();
    let total_nnz: usize = levels.iter().map(|l| l.matrix.nnz()).sum();
    (total_dofs as f64 / fine_dofs, total_nnz as f64 / fine_nnz)
}

fn l2_norm<T: RealField>(v: &Array1<T>) -> T {
    v.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt()
}
