//! Configuration for the cache simulation engine.
//!
//! This module defines the configuration structures and enums used to
//! parameterize the engine. It provides:
//! 1. **Defaults:** Baseline constants for geometry and policy selection.
//! 2. **Structures:** `CacheConfig` for the cache proper and `RetryConfig`
//!    for the downstream repeat policy.
//! 3. **Enums:** The replacement policy selector.
//!
//! Configuration is supplied as JSON (see [`CacheConfig::from_json`]) or
//! constructed directly; `CacheConfig::default()` yields a small write-back
//! cache suitable for experiments. Validation happens when the engine (or a
//! [`Geometry`](crate::cache::geometry::Geometry)) is built from the config,
//! never silently.

use serde::Deserialize;

/// Default configuration constants for the engine.
mod defaults {
    /// Default total cache capacity (16 KiB).
    pub const SIZE_BYTES: usize = 16 * 1024;

    /// Default cache line width in bytes.
    pub const LINE_BYTES: usize = 16;

    /// Default associativity (2-way set-associative).
    pub const WAYS: usize = 2;

    /// Default processor access width in bytes (one 32-bit word).
    pub const ACCESS_BYTES: usize = 4;

    /// Default extra latency applied to bypassed (non-cacheable) accesses.
    pub const BYPASS_DELAY: u64 = 0;

    /// Default number of retries after a busy (NACC) downstream response.
    pub const REPEAT_COUNT: u32 = 0;

    /// Default simulated delay between busy retries, in cycles.
    pub const REPEAT_DELAY: u64 = 1;
}

/// Victim-selection algorithm for a full set.
///
/// Selected once at configuration time; the engine dispatches through a
/// trait object, so the choice has no per-access branching cost beyond the
/// virtual call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Pseudo-random selection. Intended for internal verification only;
    /// excluded from bit-exact regression comparisons.
    #[serde(alias = "Random")]
    Random,

    /// Round-robin: one eviction pointer per set, advanced on each
    /// replacement.
    #[serde(alias = "RoundRobin", alias = "Rr")]
    Rr,

    /// Least recently used: per-way recency stamps from a global access
    /// clock; ties broken toward the lowest way index.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
}

/// Repeat policy for downstream requests rejected as busy (NACC).
///
/// A rejected request is retried by the gateway itself; the dispatcher only
/// observes eventual success, a fatal fault, or (once the retry budget is
/// exhausted) the surfaced busy status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Number of retries before the busy status is surfaced upward.
    /// `0` means do not retry at all.
    #[serde(default = "RetryConfig::default_repeat_count")]
    pub repeat_count: u32,

    /// Retry indefinitely, ignoring `repeat_count`. Callers must not rely
    /// on bounded latency in this mode.
    #[serde(default)]
    pub repeat_forever: bool,

    /// Simulated delay in cycles between consecutive retries.
    #[serde(default = "RetryConfig::default_repeat_delay")]
    pub repeat_delay: u64,
}

impl RetryConfig {
    /// Returns the default retry count.
    fn default_repeat_count() -> u32 {
        defaults::REPEAT_COUNT
    }

    /// Returns the default delay between retries in cycles.
    fn default_repeat_delay() -> u64 {
        defaults::REPEAT_DELAY
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            repeat_count: defaults::REPEAT_COUNT,
            repeat_forever: false,
            repeat_delay: defaults::REPEAT_DELAY,
        }
    }
}

/// Cache engine configuration.
///
/// # Examples
///
/// Deserializing from JSON:
///
/// ```
/// use cachesim_core::config::{CacheConfig, ReplacementPolicy};
///
/// let json = r#"{
///     "size_bytes": 4096,
///     "line_bytes": 32,
///     "ways": 4,
///     "policy": "RR",
///     "write_back": true,
///     "write_allocate": true,
///     "profile_cache": true
/// }"#;
///
/// let config = CacheConfig::from_json(json).unwrap();
/// assert_eq!(config.size_bytes, 4096);
/// assert_eq!(config.policy, ReplacementPolicy::Rr);
/// assert!(config.read_allocate);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total cache capacity in bytes.
    #[serde(default = "CacheConfig::default_size", alias = "cache_byte_size")]
    pub size_bytes: usize,

    /// Cache line width in bytes; must be a power of two.
    #[serde(default = "CacheConfig::default_line", alias = "line_byte_width")]
    pub line_bytes: usize,

    /// Associativity: `0` = fully associative, `1` = direct-mapped,
    /// `N` = N-way set-associative.
    #[serde(default = "CacheConfig::default_ways", alias = "num_ways")]
    pub ways: usize,

    /// Processor access width in bytes. The line width must be 1, 2, 4, 8,
    /// or 16 access units.
    #[serde(default = "CacheConfig::default_access", alias = "access_byte_width")]
    pub access_bytes: usize,

    /// Victim-selection algorithm.
    #[serde(default, alias = "replacement_policy")]
    pub policy: ReplacementPolicy,

    /// Allocate a line on a read miss.
    #[serde(default = "CacheConfig::default_true")]
    pub read_allocate: bool,

    /// Allocate a line on a write miss.
    #[serde(default)]
    pub write_allocate: bool,

    /// Write policy: `true` defers dirty data to eviction time (write-back),
    /// `false` writes through synchronously. Write-through lines are never
    /// marked dirty.
    #[serde(default)]
    pub write_back: bool,

    /// Honor per-transaction protocol attribute bits instead of the static
    /// policy fields above.
    #[serde(default)]
    pub use_pif_attribute: bool,

    /// Extra latency in cycles applied to bypassed (non-cacheable) accesses.
    #[serde(default = "CacheConfig::default_bypass_delay")]
    pub bypass_delay: u64,

    /// Enable hit/miss profiling counters.
    #[serde(default)]
    pub profile_cache: bool,

    /// Issue line fills at the requested word's address so the downstream
    /// port can return the critical word first (beats wrap within the line).
    #[serde(default)]
    pub critical_word_first: bool,

    /// Repeat policy for busy downstream responses.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl CacheConfig {
    /// Returns the default total capacity in bytes.
    fn default_size() -> usize {
        defaults::SIZE_BYTES
    }

    /// Returns the default line width in bytes.
    fn default_line() -> usize {
        defaults::LINE_BYTES
    }

    /// Returns the default associativity.
    fn default_ways() -> usize {
        defaults::WAYS
    }

    /// Returns the default access width in bytes.
    fn default_access() -> usize {
        defaults::ACCESS_BYTES
    }

    /// Returns the default bypass delay in cycles.
    fn default_bypass_delay() -> u64 {
        defaults::BYPASS_DELAY
    }

    /// Serde helper for fields that default to `true`.
    fn default_true() -> bool {
        true
    }

    /// Deserializes a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error for malformed documents. Geometry
    /// constraints are checked later, when the engine is constructed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::SIZE_BYTES,
            line_bytes: defaults::LINE_BYTES,
            ways: defaults::WAYS,
            access_bytes: defaults::ACCESS_BYTES,
            policy: ReplacementPolicy::default(),
            read_allocate: true,
            write_allocate: false,
            write_back: false,
            use_pif_attribute: false,
            bypass_delay: defaults::BYPASS_DELAY,
            profile_cache: false,
            critical_word_first: false,
            retry: RetryConfig::default(),
        }
    }
}
