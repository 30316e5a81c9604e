//! Engine Configuration - Settings and profiles for the mutation engine
//!
//! Provides the tunables for chain construction, feedback weighting,
//! backoff pacing and cache bounds, plus TOML loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::CacheConfig;
use crate::feedback::{BackoffConfig, PacingConfig, WeightingConfig};
use crate::mutation::MutationOperator;

/// Mutation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum operator applications attempted per fresh chain
    pub max_depth: usize,
    /// Operators kept in the reportable chain (most recent last)
    pub chain_retain: usize,
    /// Chance of replaying a remembered chain instead of building one
    pub replay_probability: f64,
    /// Chance of appending noise after each applied operator
    pub noise_probability: f64,
    /// Shortest noise block
    pub noise_min_len: usize,
    /// Longest noise block
    pub noise_max_len: usize,
    /// Chance of hex-obfuscating after each applied operator
    pub hex_probability: f64,
    /// Intermediate payloads longer than this are discarded
    pub max_payload_bytes: usize,
    /// Successful chains remembered for replay (oldest evicted first)
    pub success_chain_capacity: usize,
    /// Operators the selector may draw from
    pub operators: Vec<MutationOperator>,
    pub weighting: WeightingConfig,
    pub backoff: BackoffConfig,
    pub pacing: PacingConfig,
    pub cache: CacheConfig,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            chain_retain: 7,
            replay_probability: 0.3,
            noise_probability: 0.3,
            noise_min_len: 8,
            noise_max_len: 24,
            hex_probability: 0.2,
            max_payload_bytes: 256 * 1024,
            success_chain_capacity: 256,
            operators: MutationOperator::all(),
            weighting: WeightingConfig::default(),
            backoff: BackoffConfig::default(),
            pacing: PacingConfig::default(),
            cache: CacheConfig::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Create config with specific profile
    pub fn with_profile(profile: EngineProfile) -> Self {
        profile.default_config()
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set maximum chain depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set replay probability
    pub fn with_replay_probability(mut self, probability: f64) -> Self {
        self.replay_probability = probability;
        self
    }

    /// Set pacing
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Disable the pacing delay entirely
    pub fn without_pacing(mut self) -> Self {
        self.pacing = PacingConfig::disabled();
        self
    }

    /// Set cache capacities
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the success-chain memory capacity
    pub fn with_success_chain_capacity(mut self, capacity: usize) -> Self {
        self.success_chain_capacity = capacity;
        self
    }

    /// Restrict the operator registry
    pub fn with_operators(mut self, operators: Vec<MutationOperator>) -> Self {
        self.operators = operators;
        self
    }

    /// Clamp every field into a usable range
    pub fn validated(mut self) -> Self {
        self.replay_probability = clamp_probability(self.replay_probability);
        self.noise_probability = clamp_probability(self.noise_probability);
        self.hex_probability = clamp_probability(self.hex_probability);
        if self.noise_max_len < self.noise_min_len {
            std::mem::swap(&mut self.noise_min_len, &mut self.noise_max_len);
        }
        self.max_payload_bytes = self.max_payload_bytes.max(1);
        self.success_chain_capacity = self.success_chain_capacity.max(1);
        if self.operators.is_empty() {
            tracing::warn!("No operators enabled, using the full registry");
            self.operators = MutationOperator::all();
        }

        if !is_positive(self.backoff.min) {
            self.backoff.min = BackoffConfig::default().min;
        }
        if !self.backoff.max.is_finite() || self.backoff.max < self.backoff.min {
            self.backoff.max = self.backoff.min;
        }
        if !is_positive(self.weighting.decay_horizon_secs) {
            self.weighting.decay_horizon_secs = WeightingConfig::default().decay_horizon_secs;
        }

        let pacing = PacingConfig::default();
        if !is_non_negative(self.pacing.base_secs) {
            tracing::warn!(
                "Invalid pacing base {}, using {}",
                self.pacing.base_secs,
                pacing.base_secs
            );
            self.pacing.base_secs = pacing.base_secs;
        }
        if !is_non_negative(self.pacing.jitter_secs) {
            tracing::warn!(
                "Invalid pacing jitter {}, using {}",
                self.pacing.jitter_secs,
                pacing.jitter_secs
            );
            self.pacing.jitter_secs = pacing.jitter_secs;
        }
        self
    }

    /// Load the `[engine]` table from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigLoadError::NotFound,
            _ => ConfigLoadError::ReadError(e.to_string()),
        })?;
        Self::parse_toml(&content)
    }

    /// Parse engine config from TOML content
    pub fn parse_toml(content: &str) -> Result<Self, ConfigLoadError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigLoadError::ParseError(e.to_string()))?;
        Ok(file.engine.validated())
    }

    /// Load from an explicit path, or the first default location that
    /// exists, falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = match path {
            Some(p) => vec![p.to_path_buf()],
            None => default_config_paths(),
        };

        let Some(found) = candidates.iter().find(|p| p.exists()) else {
            if path.is_some() {
                tracing::warn!("Config file not found, using defaults");
            } else {
                tracing::debug!("No config file found, using defaults");
            }
            return Self::default();
        };

        match Self::load_from_path(found) {
            Ok(config) => {
                tracing::debug!("Loaded engine config from {}", found.display());
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn is_non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("abacus.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("abacus").join("config.toml"));
    }
    paths
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Config file not found")]
    NotFound,

    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),
}

/// Engine profiles trading throughput against stealth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineProfile {
    /// Slow pacing, shorter chains
    Stealth,
    /// Default behaviour
    #[default]
    Balanced,
    /// Minimal pacing, more replay of known-good chains
    Aggressive,
}

impl EngineProfile {
    /// Get default configuration for this profile
    pub fn default_config(&self) -> EngineConfig {
        match self {
            EngineProfile::Stealth => EngineConfig {
                max_depth: 6,
                pacing: PacingConfig {
                    enabled: true,
                    base_secs: 3.0,
                    jitter_secs: 2.0,
                },
                ..EngineConfig::default()
            },
            EngineProfile::Balanced => EngineConfig::default(),
            EngineProfile::Aggressive => EngineConfig {
                replay_probability: 0.5,
                pacing: PacingConfig {
                    enabled: true,
                    base_secs: 0.25,
                    jitter_secs: 0.25,
                },
                ..EngineConfig::default()
            },
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineProfile::Stealth => "stealth",
            EngineProfile::Balanced => "balanced",
            EngineProfile::Aggressive => "aggressive",
        }
    }
}

impl std::fmt::Display for EngineProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
