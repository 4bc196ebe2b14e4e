//! Configuration management for the follow ranker

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Largest fan-out accepted per sampling level
pub const MAX_FANOUT_LIMIT: usize = 1000;

/// Default configuration for directory access, caching and ranking
#[derive(Debug, Clone)]
pub struct Config {
    /// Damping factor used by the rank solver
    pub damping: f64,

    /// Number of power iterations run by the rank solver
    pub iterations: usize,

    /// Maximum number of follows fetched per account
    pub max_follows: usize,

    /// Page size requested from a follow source
    pub follows_page_size: usize,

    /// Number of identifiers sent to a profile source per request
    pub profile_batch_size: usize,

    /// Time after which a cached entry is considered stale
    pub cache_ttl: Duration,

    /// Root directory of the on-disk cache
    pub cache_dir: PathBuf,

    /// Schema version stamped into every cache entry
    pub cache_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            damping: 0.8,
            iterations: 100,
            max_follows: 1000,
            follows_page_size: 100,
            profile_batch_size: 25,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_dir: PathBuf::from(".cache"),
            cache_version: "1".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with a custom cache location
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("at least one seed identifier is required")]
    NoSeeds,
    #[error("result limit must be greater than zero")]
    ZeroResultLimit,
    #[error("per-level fan-out limit must be in 1..={max} (got {0})", max = MAX_FANOUT_LIMIT)]
    FanoutOutOfRange(usize),
}

/// Parameters of a single ranking run
#[derive(Debug, Clone)]
pub struct RankingParameters {
    /// Account of the caller; always excluded from the result
    pub self_id: String,

    /// Identifiers (ids or handles) of the seed accounts, in order
    pub seed_identifiers: Vec<String>,

    /// Maximum number of ranked accounts returned
    pub result_limit: usize,

    /// Maximum number of accounts admitted at each sampling level
    pub per_level_fanout_limit: usize,

    /// Keep accounts the caller already follows in the result
    pub include_own_follows: bool,

    /// Report every fetch at info level
    pub verbose: bool,
}

impl RankingParameters {
    pub fn new(
        self_id: impl Into<String>,
        seed_identifiers: Vec<String>,
        result_limit: usize,
        per_level_fanout_limit: usize,
        include_own_follows: bool,
        verbose: bool,
    ) -> Result<Self, ParameterError> {
        if seed_identifiers.is_empty() {
            return Err(ParameterError::NoSeeds);
        }
        if result_limit == 0 {
            return Err(ParameterError::ZeroResultLimit);
        }
        if !(1..=MAX_FANOUT_LIMIT).contains(&per_level_fanout_limit) {
            return Err(ParameterError::FanoutOutOfRange(per_level_fanout_limit));
        }

        Ok(Self {
            self_id: self_id.into(),
            seed_identifiers,
            result_limit,
            per_level_fanout_limit,
            include_own_follows,
            verbose,
        })
    }
}
