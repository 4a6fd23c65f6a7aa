//! Set-associative cache simulation engine.
//!
//! This crate implements a configurable cache model that sits between a
//! processor's memory-transaction port and a downstream memory. It provides:
//! 1. **Geometry:** Direct-mapped, N-way, and fully-associative mappings
//!    with validated shift/mask address decomposition.
//! 2. **Policies:** Random, round-robin, and LRU victim selection, plus the
//!    write-back/write-through and read/write-allocate policy matrix driven
//!    by static configuration or per-transaction attribute bits.
//! 3. **Transactions:** Single, block, burst, and read-conditional-write
//!    requests with ordered multi-beat responses.
//! 4. **Downstream:** A port trait for the next memory level and a gateway
//!    that retries busy rejections per the configured repeat policy.
//! 5. **Profiling:** Hit/miss counters per access class with a console-style
//!    report.
//!
//! The engine is a single-threaded, event-driven simulation core; see the
//! [`cache`] module docs for the concurrency model.

/// Cache engine: dispatcher, geometry, line table, policies, attributes.
pub mod cache;
/// Engine configuration (defaults, enums, serde structures).
pub mod config;
/// Downstream port trait and retrying gateway.
pub mod downstream;
/// Configuration errors and downstream faults.
pub mod error;
/// Transaction request/response protocol types.
pub mod protocol;
/// Hit/miss profiling counters.
pub mod stats;

/// The cache engine; construct with `CacheEngine::new`.
pub use crate::cache::CacheEngine;
/// Root configuration type; use `CacheConfig::default()` or deserialize from JSON.
pub use crate::config::CacheConfig;
/// Downstream channel trait and its retrying gateway.
pub use crate::downstream::{DownstreamGateway, DownstreamPort};
/// Transaction protocol types.
pub use crate::protocol::{Beat, Request, Response, Status};
