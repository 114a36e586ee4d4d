//! Cache sizing and eviction settings.
//!
//! ```toml
//! [cache]
//! threshold = 100
//! eviction = "clear-all"   # or "oldest"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default number of distinct entries the cache holds before evicting.
pub const DEFAULT_THRESHOLD: usize = 100;

/// What happens once the cache grows past its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Eviction {
    /// Drop every entry in one step. No per-entry bookkeeping.
    #[default]
    ClearAll,
    /// Drop the oldest inserted entries until the cache is back at the threshold.
    Oldest,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown eviction policy '{0}', expected 'clear-all' or 'oldest'")]
pub struct UnknownEviction(pub String);

impl Eviction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eviction::ClearAll => "clear-all",
            Eviction::Oldest => "oldest",
        }
    }
}

impl fmt::Display for Eviction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Eviction {
    type Err = UnknownEviction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear-all" | "clear_all" | "all" => Ok(Eviction::ClearAll),
            "oldest" | "fifo" => Ok(Eviction::Oldest),
            other => Err(UnknownEviction(other.to_string())),
        }
    }
}

/// Configuration for [`ContentCache`](crate::cache::ContentCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Eviction runs once the number of distinct ids exceeds this.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    #[serde(default)]
    pub eviction: Eviction,
}

fn default_threshold() -> usize {
    DEFAULT_THRESHOLD
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            eviction: Eviction::ClearAll,
        }
    }
}

impl CacheConfig {
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_eviction(mut self, eviction: Eviction) -> Self {
        self.eviction = eviction;
        self
    }
}
