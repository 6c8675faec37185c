//! Optimal Golomb ruler search engine
//!
//! Exhaustive branch-and-bound search for Golomb rulers of minimum length,
//! with a vectorized duplicate-distance probe, two parallel drivers over
//! the top of the search tree, resumable checkpoints, and an embedded table
//! of published optima for hinting and verification.
//!
//! # Quick start
//!
//! ```rust
//! use golomb_engine::config::EngineConfig;
//! use golomb_engine::search::GolombSolver;
//! use golomb_engine::types::SolveMode;
//!
//! let solver = GolombSolver::new(SolveMode::Parallel, EngineConfig::default())?;
//! let solution = solver.solve_order(6)?.expect("order 6 is well within limits");
//! assert_eq!(solution.ruler.length(), 17);
//! # Ok::<(), golomb_engine::error::GolombError>(())
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod reference;
pub mod search;
pub mod simd;
pub mod types;

pub use config::EngineConfig;
pub use error::{GolombError, Result};
pub use search::{lower_bound, solve, GolombSolver, Solution};
pub use types::{Ruler, SolveMode, BITSET_WORDS, MAX_LENGTH, MAX_MARKS};
