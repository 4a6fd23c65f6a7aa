//! Victim-selection policies.
//!
//! Implements the algorithms for choosing which way of a full set to evict.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used (recency stamps from a global clock).
//! - `RoundRobin`: cyclic eviction pointer per set.
//! - `Random`: pseudo-random selection.
//!
//! A policy is consulted only when every way of the set holds a valid line;
//! the dispatcher always prefers an invalid way first, at zero replacement
//! cost.

/// Least Recently Used replacement policy.
pub mod lru;

/// Pseudo-random replacement policy.
pub mod random;

/// Round-robin replacement policy.
pub mod round_robin;

pub use lru::LruPolicy;
pub use random::RandomPolicy;
pub use round_robin::RoundRobinPolicy;

/// Trait for victim-selection policies.
///
/// Defines the interface for recording accesses and selecting victim ways.
pub trait ReplacementPolicy: Send + Sync {
    /// Records an access (hit or fill) to `(set, way)`.
    ///
    /// Never called for the victim being evicted.
    fn update(&mut self, set: usize, way: usize);

    /// Selects the way to evict from a full set.
    ///
    /// Called only when no invalid way exists in the set. The returned
    /// index is always in `[0, ways)`.
    fn get_victim(&mut self, set: usize) -> usize;

    /// Returns all bookkeeping (pointers, stamps, clocks) to its
    /// post-construction state.
    fn reset(&mut self);
}
