//! Unified Engine Configuration
//!
//! This module provides a unified configuration system for the engine,
//! nesting all module-specific configurations as fields. The configuration
//! is immutable once the search starts: it is built from CLI arguments and
//! environment toggles, validated, and then threaded through the search
//! entry point by reference.
//!
//! # Examples
//!
//! ## Creating a default configuration
//!
//! ```rust
//! use golomb_engine::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Loading from a file
//!
//! ```rust,no_run
//! use golomb_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_file("config.json")?;
//! config.validate()?;
//! # Ok::<(), golomb_engine::error::GolombError>(())
//! ```
//!
//! # Environment toggles
//!
//! [`EngineConfig::apply_env`] folds the recognized environment variables
//! into the configuration:
//!
//! | Variable | Effect |
//! |---|---|
//! | `GOLOMB_NO_HINTS` | Disable hint-based candidate ordering and the fast-lane seed |
//! | `GOLOMB_USE_AVX512` | Prefer the 512-bit gather probe when SIMD is enabled |

use crate::error::{ConfigError, Result};
use crate::simd::ProbeBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable disabling reference-ruler hints
pub const ENV_NO_HINTS: &str = "GOLOMB_NO_HINTS";

/// Environment variable opting in to the AVX-512 gather probe
pub const ENV_USE_AVX512: &str = "GOLOMB_USE_AVX512";

/// Search configuration
///
/// Worker pool sizing and search heuristics shared by all solver variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of worker threads for the parallel drivers
    pub threads: usize,

    /// Use the reference table to order candidates and seed the fast lane
    pub use_reference_hints: bool,

    /// Start the minimization loop at the best-known length instead of the
    /// combinatorial lower bound
    pub heuristic_start: bool,

    /// Enable debug logging of mark placements near the root of the search
    pub debug_logging: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get().clamp(1, 64),
            use_reference_hints: true,
            heuristic_start: false,
            debug_logging: false,
        }
    }
}

impl SearchConfig {
    /// Validate search configuration
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 || self.threads > 1024 {
            return Err(ConfigError::invalid_value(
                "search.threads",
                self.threads.to_string(),
                "1-1024",
            )
            .into());
        }
        Ok(())
    }
}

/// SIMD optimization configuration
///
/// Controls runtime selection of the duplicate-distance probe backend.
/// When the `simd` feature is disabled at compile time, only the scalar
/// backend exists and these flags have no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimdConfig {
    /// Enable vectorized probes where the CPU supports them
    pub enable_simd: bool,

    /// Force a specific probe backend; falls back to automatic selection
    /// when the forced backend is unavailable on this CPU
    pub forced_backend: Option<ProbeBackend>,

    /// Prefer the AVX-512 gather over the AVX2 gather when both are
    /// available (opt-in via `GOLOMB_USE_AVX512`)
    pub prefer_avx512: bool,
}

impl Default for SimdConfig {
    fn default() -> Self {
        Self {
            enable_simd: cfg!(feature = "simd"),
            forced_backend: None,
            prefer_avx512: false,
        }
    }
}

impl SimdConfig {
    /// Validate SIMD configuration
    ///
    /// Backend availability is checked at dispatch time, not here: forcing
    /// a backend the CPU lacks degrades to automatic selection.
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Checkpoint configuration
///
/// An absent path disables checkpointing entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Snapshot file path; `None` disables checkpointing
    pub path: Option<PathBuf>,

    /// Seconds between snapshot flushes (minimum 1)
    pub interval_secs: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self { path: None, interval_secs: 60 }
    }
}

impl CheckpointConfig {
    /// Validate checkpoint configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "checkpoint.interval_secs",
                self.interval_secs.to_string(),
                ">= 1",
            )
            .into());
        }
        Ok(())
    }
}

/// Unified engine configuration
///
/// Single place to configure all engine components. Built once before the
/// search starts and treated as immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Search configuration
    pub search: SearchConfig,

    /// SIMD probe configuration
    pub simd: SimdConfig,

    /// Checkpoint configuration
    pub checkpoint: CheckpointConfig,
}

impl EngineConfig {
    /// Fold recognized environment variables into the configuration
    pub fn apply_env(&mut self) {
        if std::env::var_os(ENV_NO_HINTS).is_some() {
            self.search.use_reference_hints = false;
        }
        if std::env::var_os(ENV_USE_AVX512).is_some() {
            self.simd.prefer_avx512 = true;
        }
    }

    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_e| {
            ConfigError::file_not_found(path.to_string_lossy().to_string())
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ConfigError::parse_error(path.to_string_lossy().to_string(), e.to_string())
        })?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::serialization_failed(e.to_string()))?;

        std::fs::write(path, json).map_err(|e| {
            ConfigError::serialization_failed(format!("Failed to write file: {}", e))
        })?;

        Ok(())
    }

    /// Validate the entire configuration
    ///
    /// Validates all nested configurations and returns the first error
    /// found, or Ok(()) if all configurations are valid.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.simd.validate()?;
        self.checkpoint.validate()?;
        Ok(())
    }
}
