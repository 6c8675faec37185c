//! Core types shared across the engine
//!
//! This module defines the `Ruler` value type together with the hard limits
//! of the search engine. All positions and distances are `u32`; the limits
//! keep every distance representable in the packed distance bitset.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of marks supported by the engine
pub const MAX_MARKS: usize = 32;

/// Upper search bound for ruler length
pub const MAX_LENGTH: u32 = 600;

/// Number of 64-bit words in the distance bitset, including a two-word guard
/// so that vectorized gathers indexed by `distance >> 6` never read past the
/// end of the allocation even for lanes that are masked out afterwards.
pub const BITSET_WORDS: usize = ((MAX_LENGTH as usize) >> 6) + 2;

/// Solver variants selectable at the search entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMode {
    /// Single-threaded depth-first search
    SingleThread,
    /// Multi-threaded search over a pre-ordered candidate list with dynamic
    /// scheduling (the default)
    Parallel,
    /// Multi-threaded search over a task queue with cooperative cancellation
    Tasks,
}

impl Default for SolveMode {
    fn default() -> Self {
        Self::Parallel
    }
}

impl fmt::Display for SolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleThread => write!(f, "single-threaded"),
            Self::Parallel => write!(f, "parallel (ordered candidates)"),
            Self::Tasks => write!(f, "parallel (task queue)"),
        }
    }
}

/// A Golomb ruler: an ascending sequence of marks whose pairwise differences
/// are all distinct.
///
/// Invariants (enforced by [`Ruler::new`] and preserved thereafter):
/// - the first mark is 0 and marks are strictly increasing,
/// - all `n * (n - 1) / 2` pairwise differences are distinct,
/// - the number of marks is at most [`MAX_MARKS`],
/// - the last mark (the ruler length) is at most [`MAX_LENGTH`].
///
/// # Examples
///
/// ```rust
/// use golomb_engine::types::Ruler;
///
/// let ruler = Ruler::new(vec![0, 1, 4, 6]).unwrap();
/// assert_eq!(ruler.order(), 4);
/// assert_eq!(ruler.length(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruler {
    positions: Vec<u32>,
}

impl Ruler {
    /// Create a ruler from ascending mark positions, validating all
    /// invariants.
    pub fn new(positions: Vec<u32>) -> Result<Self, SearchError> {
        if positions.len() < 2 || positions.len() > MAX_MARKS {
            return Err(SearchError::invalid_ruler(format!(
                "mark count {} outside 2-{}",
                positions.len(),
                MAX_MARKS
            )));
        }
        if positions[0] != 0 {
            return Err(SearchError::invalid_ruler("first mark must be 0"));
        }
        let length = positions[positions.len() - 1];
        if length > MAX_LENGTH {
            return Err(SearchError::invalid_ruler(format!(
                "length {} exceeds maximum {}",
                length, MAX_LENGTH
            )));
        }
        if !positions.windows(2).all(|w| w[0] < w[1]) {
            return Err(SearchError::invalid_ruler("marks must be strictly increasing"));
        }
        let mut seen = vec![false; length as usize + 1];
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let d = (positions[j] - positions[i]) as usize;
                if seen[d] {
                    return Err(SearchError::invalid_ruler(format!("duplicate distance {}", d)));
                }
                seen[d] = true;
            }
        }
        Ok(Self { positions })
    }

    /// Number of marks (the ruler order)
    #[inline]
    pub fn order(&self) -> usize {
        self.positions.len()
    }

    /// Position of the last mark (the ruler length)
    #[inline]
    pub fn length(&self) -> u32 {
        *self.positions.last().unwrap_or(&0)
    }

    /// Ascending mark positions
    #[inline]
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// All pairwise mark differences in ascending order
    pub fn distances(&self) -> Vec<u32> {
        let mut dist = Vec::with_capacity(self.order() * (self.order() - 1) / 2);
        for i in 0..self.positions.len() {
            for j in (i + 1)..self.positions.len() {
                dist.push(self.positions[j] - self.positions[i]);
            }
        }
        dist.sort_unstable();
        dist
    }

    /// Distances between 1 and the ruler length that are not measurable
    pub fn missing_distances(&self) -> Vec<u32> {
        let mut present = vec![false; self.length() as usize + 1];
        for d in self.distances() {
            present[d as usize] = true;
        }
        (1..=self.length()).filter(|&d| !present[d as usize]).collect()
    }
}

impl fmt::Display for Ruler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "length {} marks {}:", self.length(), self.order())?;
        for p in &self.positions {
            write!(f, " {}", p)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruler_accessors() {
        let ruler = Ruler::new(vec![0, 1, 4, 9, 11]).unwrap();
        assert_eq!(ruler.order(), 5);
        assert_eq!(ruler.length(), 11);
        assert_eq!(ruler.positions(), &[0, 1, 4, 9, 11]);
    }

    #[test]
    fn test_ruler_rejects_duplicate_distance() {
        // 1-0 == 2-1
        assert!(Ruler::new(vec![0, 1, 2]).is_err());
    }

    #[test]
    fn test_ruler_rejects_bad_shape() {
        assert!(Ruler::new(vec![0]).is_err());
        assert!(Ruler::new(vec![1, 3, 7]).is_err());
        assert!(Ruler::new(vec![0, 4, 4]).is_err());
        assert!(Ruler::new(vec![0, 1, MAX_LENGTH + 1]).is_err());
    }

    #[test]
    fn test_ruler_distances_sorted_and_complete() {
        let ruler = Ruler::new(vec![0, 1, 4, 6]).unwrap();
        assert_eq!(ruler.distances(), vec![1, 2, 3, 4, 5, 6]);
        assert!(ruler.missing_distances().is_empty());
    }

    #[test]
    fn test_ruler_missing_distances() {
        let ruler = Ruler::new(vec![0, 1, 3, 7]).unwrap();
        // distances: 1 2 3 4 6 7; missing: 5
        assert_eq!(ruler.missing_distances(), vec![5]);
    }

    #[test]
    fn test_bitset_word_count_covers_guard() {
        // One word past the live range on each side of a full-length gather.
        assert_eq!(BITSET_WORDS, (MAX_LENGTH as usize >> 6) + 2);
        assert!((MAX_LENGTH as usize >> 6) < BITSET_WORDS);
    }

    #[test]
    fn test_solve_mode_display() {
        assert_eq!(SolveMode::SingleThread.to_string(), "single-threaded");
        assert_eq!(SolveMode::default(), SolveMode::Parallel);
    }
}
