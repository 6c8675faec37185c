//! Duplicate-distance probe backends and runtime dispatch
//!
//! The inner loop of the backtracker asks one question over and over: "is
//! any of these eight distances already marked in the bitset?". This module
//! provides a scalar implementation plus two vectorized gathers, and a
//! dispatcher that picks the best backend once per solve based on detected
//! CPU features and configuration.
//!
//! # Dispatch rules
//!
//! 1. A backend forced by configuration wins if the CPU supports it.
//! 2. With SIMD enabled, the AVX-512 gather is used when available and
//!    explicitly opted in (`GOLOMB_USE_AVX512`).
//! 3. With SIMD enabled, the AVX2 gather is used when available.
//! 4. Otherwise the scalar loop.
//!
//! The selected backend is bound as a plain function pointer; the hot path
//! performs no per-call dispatch decisions.
//!
//! # Correctness contract
//!
//! All backends return the identical boolean for any `(bitset, distances)`
//! input. The vector backends may gather words beyond the last live bitset
//! word, but only inside the guard region, and never rely on the data read
//! there.

pub mod platform_detection;
pub mod scalar;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub mod avx2;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub mod avx512;

use crate::config::SimdConfig;
use crate::types::BITSET_WORDS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature shared by all probe backends
pub type ProbeFn = fn(&[u64; BITSET_WORDS], &[u32; 8]) -> bool;

/// Identifies a duplicate-distance probe implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeBackend {
    /// Scalar early-exit loop, always available
    Scalar,
    /// 256-bit gather (AVX2), two 4-wide gathers plus scalar bit test
    Avx2Gather,
    /// 512-bit gather (AVX-512F), fully vectorized
    Avx512Gather,
}

impl fmt::Display for ProbeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Avx2Gather => write!(f, "AVX2 gather"),
            Self::Avx512Gather => write!(f, "AVX-512 gather"),
        }
    }
}

impl ProbeBackend {
    /// Whether this backend can run in the current build on the current CPU
    pub fn is_available(self) -> bool {
        match self {
            Self::Scalar => true,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Avx2Gather => platform_detection::get_platform_capabilities().should_use_avx2(),
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Avx512Gather => {
                platform_detection::get_platform_capabilities().should_use_avx512()
            }
            #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
            _ => false,
        }
    }

    /// Resolve this backend to its implementation
    pub fn probe_fn(self) -> ProbeFn {
        match self {
            Self::Scalar => scalar::any_dup8,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Avx2Gather => avx2::any_dup8,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Avx512Gather => avx512::any_dup8,
            #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
            _ => scalar::any_dup8,
        }
    }
}

/// Select the probe backend for a solve, applying the dispatch rules above.
pub fn select_backend(config: &SimdConfig) -> ProbeBackend {
    if let Some(forced) = config.forced_backend {
        if forced.is_available() {
            return forced;
        }
        log::warn!("forced probe backend {} unavailable, falling back to automatic", forced);
    }
    if config.enable_simd {
        if config.prefer_avx512 && ProbeBackend::Avx512Gather.is_available() {
            return ProbeBackend::Avx512Gather;
        }
        if ProbeBackend::Avx2Gather.is_available() {
            return ProbeBackend::Avx2Gather;
        }
    }
    ProbeBackend::Scalar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_always_available() {
        assert!(ProbeBackend::Scalar.is_available());
    }

    #[test]
    fn test_simd_disabled_selects_scalar() {
        let config = SimdConfig {
            enable_simd: false,
            forced_backend: None,
            prefer_avx512: true,
        };
        assert_eq!(select_backend(&config), ProbeBackend::Scalar);
    }

    #[test]
    fn test_forced_scalar_wins_over_simd() {
        let config = SimdConfig {
            enable_simd: true,
            forced_backend: Some(ProbeBackend::Scalar),
            prefer_avx512: true,
        };
        assert_eq!(select_backend(&config), ProbeBackend::Scalar);
    }

    #[test]
    fn test_avx512_requires_opt_in() {
        let config = SimdConfig {
            enable_simd: true,
            forced_backend: None,
            prefer_avx512: false,
        };
        assert_ne!(select_backend(&config), ProbeBackend::Avx512Gather);
    }

    #[test]
    fn test_selected_backend_is_available() {
        let selected = select_backend(&SimdConfig::default());
        assert!(selected.is_available());
    }
}
