//! Profiling counters for the cache engine.
//!
//! Tracks hit/miss counts per access class plus allocation traffic
//! (evictions, write-backs, line fills) and bypass counts. Counting is
//! gated by the `profile_cache` configuration flag and can be toggled at
//! run time through the engine's administrative surface; disabled counters
//! cost one branch per event.

use std::fmt;

/// Access class for hit/miss accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessClass {
    /// Read-side accesses (READ, BLOCK_READ, BURST_READ beats).
    Read,
    /// Write-side accesses (WRITE, BLOCK_WRITE, BURST_WRITE beats).
    Write,
    /// Read-conditional-write accesses.
    Rcw,
}

/// Hit/miss profiling counters.
///
/// Counters stay consistent with the dispatcher's hit/miss decisions: every
/// cached beat increments exactly one hit or miss counter, bypassed
/// accesses increment only the bypass counter, and allocation traffic is
/// tracked separately.
#[derive(Debug, Clone, Default)]
pub struct ProfileCounters {
    enabled: bool,

    /// Read beats served from a resident line.
    pub read_hits: u64,
    /// Read beats that missed.
    pub read_misses: u64,
    /// Write beats merged into a resident line.
    pub write_hits: u64,
    /// Write beats that missed.
    pub write_misses: u64,
    /// Read-conditional-write accesses that hit.
    pub rcw_hits: u64,
    /// Read-conditional-write accesses that missed.
    pub rcw_misses: u64,
    /// Accesses decoded as non-cacheable and passed straight downstream.
    pub bypasses: u64,
    /// Valid lines replaced to make room for a fill.
    pub evictions: u64,
    /// Dirty lines written back downstream (evictions and flushes).
    pub write_backs: u64,
    /// Lines filled from downstream.
    pub line_fills: u64,
}

impl ProfileCounters {
    /// Creates counters, enabled or not.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Returns whether counting is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables counting; existing counts are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Zeroes every counter, leaving the enable flag untouched.
    pub fn clear(&mut self) {
        *self = Self {
            enabled: self.enabled,
            ..Self::default()
        };
    }

    pub(crate) fn hit(&mut self, class: AccessClass) {
        if !self.enabled {
            return;
        }
        match class {
            AccessClass::Read => self.read_hits += 1,
            AccessClass::Write => self.write_hits += 1,
            AccessClass::Rcw => self.rcw_hits += 1,
        }
    }

    pub(crate) fn miss(&mut self, class: AccessClass) {
        if !self.enabled {
            return;
        }
        match class {
            AccessClass::Read => self.read_misses += 1,
            AccessClass::Write => self.write_misses += 1,
            AccessClass::Rcw => self.rcw_misses += 1,
        }
    }

    pub(crate) fn bypass(&mut self) {
        if self.enabled {
            self.bypasses += 1;
        }
    }

    pub(crate) fn eviction(&mut self) {
        if self.enabled {
            self.evictions += 1;
        }
    }

    pub(crate) fn write_back(&mut self) {
        if self.enabled {
            self.write_backs += 1;
        }
    }

    pub(crate) fn fill(&mut self) {
        if self.enabled {
            self.line_fills += 1;
        }
    }

    /// Total hits across all access classes.
    pub fn total_hits(&self) -> u64 {
        self.read_hits + self.write_hits + self.rcw_hits
    }

    /// Total misses across all access classes.
    pub fn total_misses(&self) -> u64 {
        self.read_misses + self.write_misses + self.rcw_misses
    }

    /// Overall hit rate in percent; zero when nothing was counted.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_hits() + self.total_misses();
        if total == 0 {
            0.0
        } else {
            100.0 * self.total_hits() as f64 / total as f64
        }
    }
}

impl fmt::Display for ProfileCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = |hits: u64, misses: u64| {
            let total = hits + misses;
            if total == 0 {
                0.0
            } else {
                100.0 * hits as f64 / total as f64
            }
        };
        writeln!(f, "==========================================================")?;
        writeln!(f, "CACHE PROFILE RESULTS")?;
        writeln!(f, "==========================================================")?;
        if !self.enabled {
            writeln!(f, "(profiling disabled)")?;
        }
        writeln!(
            f,
            "  read.hits              {} ({:.2}%)",
            self.read_hits,
            rate(self.read_hits, self.read_misses)
        )?;
        writeln!(f, "  read.misses            {}", self.read_misses)?;
        writeln!(
            f,
            "  write.hits             {} ({:.2}%)",
            self.write_hits,
            rate(self.write_hits, self.write_misses)
        )?;
        writeln!(f, "  write.misses           {}", self.write_misses)?;
        writeln!(
            f,
            "  rcw.hits               {} ({:.2}%)",
            self.rcw_hits,
            rate(self.rcw_hits, self.rcw_misses)
        )?;
        writeln!(f, "  rcw.misses             {}", self.rcw_misses)?;
        writeln!(f, "  bypasses               {}", self.bypasses)?;
        writeln!(f, "  evictions              {}", self.evictions)?;
        writeln!(f, "  write_backs            {}", self.write_backs)?;
        writeln!(f, "  line_fills             {}", self.line_fills)?;
        write!(f, "  hit_rate               {:.2}%", self.hit_rate())
    }
}
