//! Search entry points
//!
//! [`solve`] answers the fixed-length question "is there a ruler of order n
//! with length exactly L?" in one of three modes. [`GolombSolver`] wraps it
//! in the minimization loop that climbs L from a lower bound until the
//! first satisfiable length, which is the optimum.

pub mod distance_bitset;

pub(crate) mod dfs;
pub(crate) mod parallel;
pub(crate) mod tasks;

use crate::config::EngineConfig;
use crate::error::{Result, SearchError};
use crate::reference;
use crate::simd::{self, ProbeBackend};
use crate::types::{Ruler, SolveMode, MAX_LENGTH, MAX_MARKS};
use std::sync::atomic::{AtomicU32, Ordering};

/// Search for a ruler of order `n` with length exactly `target_length`.
///
/// Returns `None` when no such ruler exists, when the search space is
/// exhausted, or when the arguments are out of range (`n` outside 2..=32,
/// `target_length` above 600). Callers wanting to distinguish misuse from
/// unsatisfiability pre-validate, as [`GolombSolver::solve_order`] does.
///
/// The returned ruler always has length exactly `target_length`; which of
/// several same-length optima comes back is unspecified in the parallel
/// modes.
pub fn solve(n: u32, target_length: u32, mode: SolveMode, config: &EngineConfig) -> Option<Ruler> {
    if n < 2 || n as usize > MAX_MARKS || target_length > MAX_LENGTH {
        return None;
    }
    match mode {
        SolveMode::SingleThread => dfs::solve_single(n, target_length, config),
        SolveMode::Parallel => parallel::solve_ordered(n, target_length, config),
        SolveMode::Tasks => tasks::solve_tasks(n, target_length, config),
    }
}

/// Combinatorial lower bound on the optimal length for order `n`.
///
/// A ruler with n marks measures n(n-1)/2 distinct distances, so its length
/// is at least that. The boosted variant adds the small correction the
/// original heuristic start used for orders above 3.
pub fn lower_bound(n: u32, boosted: bool) -> u32 {
    let base = n * (n - 1) / 2;
    if boosted && n > 3 {
        base + (n - 3) / 2
    } else {
        base
    }
}

/// Outcome of a minimization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// The shortest ruler found
    pub ruler: Ruler,
    /// Comparison against the reference table: `None` when the order is not
    /// covered, otherwise whether the found length matches the published
    /// optimum
    pub optimal: Option<bool>,
}

/// Minimizing solver for a fixed mode and configuration.
///
/// # Examples
///
/// ```rust
/// use golomb_engine::config::EngineConfig;
/// use golomb_engine::search::GolombSolver;
/// use golomb_engine::types::SolveMode;
///
/// let solver = GolombSolver::new(SolveMode::Parallel, EngineConfig::default()).unwrap();
/// let solution = solver.solve_order(5).unwrap().expect("order 5 is solvable");
/// assert_eq!(solution.ruler.length(), 11);
/// assert_eq!(solution.optimal, Some(true));
/// ```
pub struct GolombSolver {
    config: EngineConfig,
    mode: SolveMode,
}

impl GolombSolver {
    /// Create a solver after validating the configuration.
    pub fn new(mode: SolveMode, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, mode })
    }

    /// The configuration this solver runs with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The solve mode this solver runs with
    pub fn mode(&self) -> SolveMode {
        self.mode
    }

    /// The probe backend the dispatcher will bind for this configuration
    pub fn probe_backend(&self) -> ProbeBackend {
        simd::select_backend(&self.config.simd)
    }

    /// Find an optimal ruler of order `n`.
    ///
    /// Climbs the target length from the lower bound (or from the published
    /// optimum with heuristic start) until a length is satisfiable, capped
    /// at [`MAX_LENGTH`]. Returns `Ok(None)` only when the cap is reached.
    pub fn solve_order(&self, n: u32) -> Result<Option<Solution>> {
        self.solve_order_observed(n, None)
    }

    /// [`GolombSolver::solve_order`] that also publishes the length
    /// currently being searched, for progress reporting.
    pub fn solve_order_observed(
        &self,
        n: u32,
        current_length: Option<&AtomicU32>,
    ) -> Result<Option<Solution>> {
        if n < 2 || n as usize > MAX_MARKS {
            return Err(SearchError::invalid_order(n).into());
        }

        let reference = reference::lookup_by_marks(n);
        let start = if self.config.search.heuristic_start {
            reference.map_or(lower_bound(n, true), Ruler::length)
        } else {
            lower_bound(n, false)
        };

        // Try the published length first; when the table is right this
        // skips the climb through unsatisfiable lengths entirely.
        if let Some(r) = reference {
            if !self.config.search.heuristic_start {
                let length = r.length();
                observe(current_length, length);
                log::info!("order {}: trying reference length {}", n, length);
                if let Some(ruler) = solve(n, length, self.mode, &self.config) {
                    return Ok(Some(Solution { ruler, optimal: Some(true) }));
                }
            }
        }

        for length in start..=MAX_LENGTH {
            observe(current_length, length);
            log::info!("order {}: searching length {}", n, length);
            if let Some(ruler) = solve(n, length, self.mode, &self.config) {
                let optimal = reference.map(|r| ruler.length() == r.length());
                return Ok(Some(Solution { ruler, optimal }));
            }
        }
        Ok(None)
    }
}

fn observe(current_length: Option<&AtomicU32>, length: u32) {
    if let Some(slot) = current_length {
        slot.store(length, Ordering::Relaxed);
    }
}
