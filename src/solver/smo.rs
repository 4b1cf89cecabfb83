//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the generalized dual
//!
//! ```text
//! min  ½αᵀQα + pᵀα
//! s.t. yᵀα = Δ,  0 ≤ αᵢ ≤ Cᵢ
//! ```
//!
//! by repeatedly optimizing a pair of multipliers. The pair is chosen with
//! second-order working set selection (Fan, Chen and Lin, 2005). The ν
//! variant additionally keeps `Σαᵢ` fixed and therefore only pairs
//! multipliers with the same sign of `y`.

use crate::core::{OptimizationResult, OptimizerConfig, Result, SVMError};
use crate::solver::QMatrix;
use log::debug;

/// Substitute for a non-positive curvature along the chosen direction
const TAU: f64 = 1e-12;

/// Which dual the solver works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverVariant {
    /// Single equality constraint `yᵀα = Δ`
    Standard,
    /// Additional constraint on `Σαᵢ` for the ν formulations
    Nu,
}

/// Position of a multiplier relative to its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

/// A dual problem ready to be solved
pub struct DualProblem<'p> {
    /// Linear term
    pub p: &'p [f64],
    /// ±1 sign of every variable
    pub y: &'p [f64],
    /// Feasible starting point
    pub alpha: Vec<f64>,
    /// Upper bound for variables with `y = +1`
    pub cp: f64,
    /// Upper bound for variables with `y = -1`
    pub cn: f64,
}

/// Mutable optimization state
struct SolverState<'p> {
    y: &'p [f64],
    alpha: Vec<f64>,
    status: Vec<AlphaStatus>,
    grad: Vec<f64>,
    cp: f64,
    cn: f64,
}

impl SolverState<'_> {
    fn bound(&self, i: usize) -> f64 {
        if self.y[i] > 0.0 {
            self.cp
        } else {
            self.cn
        }
    }

    fn update_status(&mut self, i: usize) {
        self.status[i] = if self.alpha[i] >= self.bound(i) {
            AlphaStatus::UpperBound
        } else if self.alpha[i] <= 0.0 {
            AlphaStatus::LowerBound
        } else {
            AlphaStatus::Free
        };
    }

    fn is_upper(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::UpperBound
    }

    fn is_lower(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::LowerBound
    }

    fn is_free(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::Free
    }
}

/// SMO solver for SVM optimization
///
/// The solver only sees the dual through a [`QMatrix`], so the same code
/// serves classification, one-class and regression formulations.
pub struct SMOSolver {
    config: OptimizerConfig,
}

impl SMOSolver {
    /// Create a new SMO solver with the given configuration
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Solve a dual problem
    ///
    /// Hitting `max_iterations` is not an error: the current iterate is
    /// returned with `converged` set to false.
    pub fn solve<Q: QMatrix>(
        &self,
        q: &mut Q,
        problem: DualProblem<'_>,
        variant: SolverVariant,
    ) -> Result<OptimizationResult> {
        let l = q.len();
        if l == 0 {
            return Err(SVMError::EmptyDataset);
        }
        if problem.p.len() != l || problem.y.len() != l || problem.alpha.len() != l {
            return Err(SVMError::InvalidParameter(format!(
                "dual problem of size {l} got p/y/alpha of sizes {}/{}/{}",
                problem.p.len(),
                problem.y.len(),
                problem.alpha.len()
            )));
        }

        let mut state = SolverState {
            y: problem.y,
            alpha: problem.alpha,
            status: vec![AlphaStatus::LowerBound; l],
            grad: problem.p.to_vec(),
            cp: problem.cp,
            cn: problem.cn,
        };
        for i in 0..l {
            state.update_status(i);
        }

        // G = Qα + p
        for i in 0..l {
            if !state.is_lower(i) {
                let q_i = q.row(i);
                let alpha_i = state.alpha[i];
                for (g, q_ij) in state.grad.iter_mut().zip(q_i.iter()) {
                    *g += alpha_i * q_ij;
                }
            }
        }

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.config.max_iterations {
            let Some((i, j)) = self.select(q, &state, variant) else {
                converged = true;
                break;
            };
            iterations += 1;
            Self::update_pair(q, &mut state, i, j);
        }
        if !converged {
            converged = self.select(q, &state, variant).is_none();
        }

        let (rho, r) = match variant {
            SolverVariant::Standard => (Self::calculate_rho(&state), 0.0),
            SolverVariant::Nu => Self::calculate_rho_nu(&state),
        };

        let objective_value = state
            .alpha
            .iter()
            .zip(state.grad.iter().zip(problem.p))
            .map(|(a, (g, p))| a * (g + p))
            .sum::<f64>()
            / 2.0;

        let cache = q.cache_stats();
        debug!(
            "SMO: {l} variables, {iterations} iterations, converged: {converged}, cache hit rate {:.1}% ({} of {} rows cached)",
            cache.hit_rate() * 100.0,
            cache.size,
            cache.capacity
        );

        Ok(OptimizationResult {
            alpha: state.alpha,
            rho,
            r,
            iterations,
            objective_value,
            converged,
        })
    }

    fn select<Q: QMatrix>(
        &self,
        q: &mut Q,
        state: &SolverState<'_>,
        variant: SolverVariant,
    ) -> Option<(usize, usize)> {
        match variant {
            SolverVariant::Standard => self.select_working_set(q, state),
            SolverVariant::Nu => self.select_working_set_nu(q, state),
        }
    }

    /// Maximal violating pair with second-order choice of `j`
    ///
    /// Returns `None` once the KKT gap drops below `epsilon`.
    fn select_working_set<Q: QMatrix>(
        &self,
        q: &mut Q,
        state: &SolverState<'_>,
    ) -> Option<(usize, usize)> {
        let l = q.len();
        let (y, grad) = (state.y, &state.grad);

        let mut gmax = f64::NEG_INFINITY;
        let mut gmax_idx = None;
        for t in 0..l {
            if y[t] > 0.0 {
                if !state.is_upper(t) && -grad[t] >= gmax {
                    gmax = -grad[t];
                    gmax_idx = Some(t);
                }
            } else if !state.is_lower(t) && grad[t] >= gmax {
                gmax = grad[t];
                gmax_idx = Some(t);
            }
        }
        let i = gmax_idx?;

        let q_i = q.row(i);
        let qd = q.diagonal();
        let mut gmax2 = f64::NEG_INFINITY;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for j in 0..l {
            if y[j] > 0.0 {
                if state.is_lower(j) {
                    continue;
                }
                gmax2 = gmax2.max(grad[j]);
                let grad_diff = gmax + grad[j];
                if grad_diff > 0.0 {
                    let quad = qd[i] + qd[j] - 2.0 * y[i] * q_i[j];
                    let obj_diff = -(grad_diff * grad_diff) / positive_or_tau(quad);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            } else {
                if state.is_upper(j) {
                    continue;
                }
                gmax2 = gmax2.max(-grad[j]);
                let grad_diff = gmax - grad[j];
                if grad_diff > 0.0 {
                    let quad = qd[i] + qd[j] + 2.0 * y[i] * q_i[j];
                    let obj_diff = -(grad_diff * grad_diff) / positive_or_tau(quad);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        if gmax + gmax2 < self.config.epsilon {
            return None;
        }
        gmin_idx.map(|j| (i, j))
    }

    /// Working set selection restricted to pairs of equal sign
    fn select_working_set_nu<Q: QMatrix>(
        &self,
        q: &mut Q,
        state: &SolverState<'_>,
    ) -> Option<(usize, usize)> {
        let l = q.len();
        let (y, grad) = (state.y, &state.grad);

        let mut gmaxp = f64::NEG_INFINITY;
        let mut gmaxp_idx = None;
        let mut gmaxn = f64::NEG_INFINITY;
        let mut gmaxn_idx = None;
        for t in 0..l {
            if y[t] > 0.0 {
                if !state.is_upper(t) && -grad[t] >= gmaxp {
                    gmaxp = -grad[t];
                    gmaxp_idx = Some(t);
                }
            } else if !state.is_lower(t) && grad[t] >= gmaxn {
                gmaxn = grad[t];
                gmaxn_idx = Some(t);
            }
        }

        let q_ip = gmaxp_idx.map(|i| q.row(i));
        let q_in = gmaxn_idx.map(|i| q.row(i));
        let qd = q.diagonal();

        let mut gmaxp2 = f64::NEG_INFINITY;
        let mut gmaxn2 = f64::NEG_INFINITY;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for j in 0..l {
            if y[j] > 0.0 {
                if state.is_lower(j) {
                    continue;
                }
                gmaxp2 = gmaxp2.max(grad[j]);
                let grad_diff = gmaxp + grad[j];
                if let (Some(ip), Some(q_ip)) = (gmaxp_idx, q_ip.as_ref()) {
                    if grad_diff > 0.0 {
                        let quad = qd[ip] + qd[j] - 2.0 * q_ip[j];
                        let obj_diff = -(grad_diff * grad_diff) / positive_or_tau(quad);
                        if obj_diff <= obj_diff_min {
                            gmin_idx = Some(j);
                            obj_diff_min = obj_diff;
                        }
                    }
                }
            } else {
                if state.is_upper(j) {
                    continue;
                }
                gmaxn2 = gmaxn2.max(-grad[j]);
                let grad_diff = gmaxn - grad[j];
                if let (Some(in_), Some(q_in)) = (gmaxn_idx, q_in.as_ref()) {
                    if grad_diff > 0.0 {
                        let quad = qd[in_] + qd[j] - 2.0 * q_in[j];
                        let obj_diff = -(grad_diff * grad_diff) / positive_or_tau(quad);
                        if obj_diff <= obj_diff_min {
                            gmin_idx = Some(j);
                            obj_diff_min = obj_diff;
                        }
                    }
                }
            }
        }

        if (gmaxp + gmaxp2).max(gmaxn + gmaxn2) < self.config.epsilon {
            return None;
        }
        let j = gmin_idx?;
        let i = if y[j] > 0.0 { gmaxp_idx? } else { gmaxn_idx? };
        Some((i, j))
    }

    /// Analytic solution of the two-variable sub-problem
    fn update_pair<Q: QMatrix>(q: &mut Q, state: &mut SolverState<'_>, i: usize, j: usize) {
        let q_i = q.row(i);
        let q_j = q.row(j);
        let qd = q.diagonal();

        let c_i = state.bound(i);
        let c_j = state.bound(j);
        let old_alpha_i = state.alpha[i];
        let old_alpha_j = state.alpha[j];
        let (g_i, g_j) = (state.grad[i], state.grad[j]);
        let alpha = &mut state.alpha;

        if state.y[i] != state.y[j] {
            let quad = positive_or_tau(qd[i] + qd[j] + 2.0 * q_i[j]);
            let delta = (-g_i - g_j) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > c_i - c_j {
                if alpha[i] > c_i {
                    alpha[i] = c_i;
                    alpha[j] = c_i - diff;
                }
            } else if alpha[j] > c_j {
                alpha[j] = c_j;
                alpha[i] = c_j + diff;
            }
        } else {
            let quad = positive_or_tau(qd[i] + qd[j] - 2.0 * q_i[j]);
            let delta = (g_i - g_j) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;

            if sum > c_i {
                if alpha[i] > c_i {
                    alpha[i] = c_i;
                    alpha[j] = sum - c_i;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c_j {
                if alpha[j] > c_j {
                    alpha[j] = c_j;
                    alpha[i] = sum - c_j;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let delta_i = alpha[i] - old_alpha_i;
        let delta_j = alpha[j] - old_alpha_j;
        for (k, g) in state.grad.iter_mut().enumerate() {
            *g += q_i[k] * delta_i + q_j[k] * delta_j;
        }

        state.update_status(i);
        state.update_status(j);
    }

    /// Offset from free multipliers, or the middle of the feasible interval
    fn calculate_rho(state: &SolverState<'_>) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut sum_free = 0.0;
        let mut n_free = 0usize;

        for (i, &g) in state.grad.iter().enumerate() {
            let yg = state.y[i] * g;
            if state.is_free(i) {
                n_free += 1;
                sum_free += yg;
            } else if (state.is_upper(i) && state.y[i] < 0.0)
                || (state.is_lower(i) && state.y[i] > 0.0)
            {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            midpoint(ub, lb)
        }
    }

    /// Offsets for the ν dual, returned as `(rho, r)`
    fn calculate_rho_nu(state: &SolverState<'_>) -> (f64, f64) {
        let mut ub = [f64::INFINITY; 2];
        let mut lb = [f64::NEG_INFINITY; 2];
        let mut sum_free = [0.0; 2];
        let mut n_free = [0usize; 2];

        for (i, &g) in state.grad.iter().enumerate() {
            let side = usize::from(state.y[i] <= 0.0);
            if state.is_upper(i) {
                lb[side] = lb[side].max(g);
            } else if state.is_lower(i) {
                ub[side] = ub[side].min(g);
            } else {
                n_free[side] += 1;
                sum_free[side] += g;
            }
        }

        let side_rho = |s: usize| {
            if n_free[s] > 0 {
                sum_free[s] / n_free[s] as f64
            } else {
                midpoint(ub[s], lb[s])
            }
        };
        let r1 = side_rho(0);
        let r2 = side_rho(1);
        ((r1 - r2) / 2.0, (r1 + r2) / 2.0)
    }
}

fn positive_or_tau(quad: f64) -> f64 {
    if quad > 0.0 {
        quad
    } else {
        TAU
    }
}

/// Midpoint of `[lb, ub]`, falling back to whichever end is finite
fn midpoint(ub: f64, lb: f64) -> f64 {
    match (ub.is_finite(), lb.is_finite()) {
        (true, true) => (ub + lb) / 2.0,
        (true, false) => ub,
        (false, true) => lb,
        (false, false) => 0.0,
    }
}
