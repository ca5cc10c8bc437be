//! Configuration Module
//!
//! Every option a client recognizes, with defaults, environment overrides
//! and validation.

use std::env;
use std::time::Duration;

use crate::client::Strategy;
use crate::error::{CacheError, Result};

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Strategy used when a read does not choose one
    pub strategy: Strategy,
    /// Age after which an entry is stale
    pub max_age: Duration,
    /// Maximum number of entries the entry store can hold
    pub max_size: usize,
    /// Record network responses for time travel reads
    pub enable_time_travel: bool,
    /// How long history snapshots are kept
    pub history_retention: Duration,
    /// Record reads into the analytics log
    pub enable_intelligence_panel: bool,
    /// How long analytics log entries are kept
    pub analytics_retention: Duration,
    /// Interval between maintenance sweeps
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a new config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TIMECACHE_STRATEGY` - `cache-first`, `network-first` or `stale-while-revalidate`
    /// - `TIMECACHE_MAX_AGE_MS` - Max age in milliseconds (default: 300000)
    /// - `TIMECACHE_MAX_SIZE` - Maximum entries (default: 100)
    /// - `TIMECACHE_TIME_TRAVEL` - Enable history snapshots (default: false)
    /// - `TIMECACHE_HISTORY_RETENTION_SECS` - Snapshot retention (default: 7 days)
    /// - `TIMECACHE_INTELLIGENCE` - Enable the analytics log (default: false)
    /// - `TIMECACHE_ANALYTICS_RETENTION_SECS` - Log retention (default: 1 hour)
    /// - `TIMECACHE_SWEEP_INTERVAL_SECS` - Maintenance interval (default: 60)
    ///
    /// Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            strategy: env_parse("TIMECACHE_STRATEGY").unwrap_or(defaults.strategy),
            max_age: env_parse("TIMECACHE_MAX_AGE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_age),
            max_size: env_parse("TIMECACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            enable_time_travel: env_parse("TIMECACHE_TIME_TRAVEL")
                .unwrap_or(defaults.enable_time_travel),
            history_retention: env_parse("TIMECACHE_HISTORY_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.history_retention),
            enable_intelligence_panel: env_parse("TIMECACHE_INTELLIGENCE")
                .unwrap_or(defaults.enable_intelligence_panel),
            analytics_retention: env_parse("TIMECACHE_ANALYTICS_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.analytics_retention),
            sweep_interval: env_parse("TIMECACHE_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    // == Validate ==
    /// Rejects configurations the client cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig("max_size must be at least 1".into()));
        }
        if self.max_age.is_zero() {
            return Err(CacheError::InvalidConfig("max_age must be positive".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig("sweep_interval must be positive".into()));
        }
        Ok(())
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_time_travel(mut self, enabled: bool) -> Self {
        self.enable_time_travel = enabled;
        self
    }

    pub fn with_history_retention(mut self, retention: Duration) -> Self {
        self.history_retention = retention;
        self
    }

    pub fn with_intelligence(mut self, enabled: bool) -> Self {
        self.enable_intelligence_panel = enabled;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::CacheFirst,
            max_age: Duration::from_secs(5 * 60),
            max_size: 100,
            enable_time_travel: false,
            history_retention: Duration::from_secs(7 * 24 * 60 * 60),
            enable_intelligence_panel: false,
            analytics_retention: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
