//! Error taxonomy for the cache engine.
//!
//! This module defines the two error families of the engine:
//! 1. **Configuration errors:** Invalid geometry or policy combinations detected
//!    at construction time. The engine is never built in an invalid state.
//! 2. **Port faults:** Runtime conditions reported by the downstream port,
//!    split into transient (busy) and fatal (address/data) kinds.
//!
//! Internal invariant violations (an out-of-range set or way index) are
//! programming errors guarded by debug assertions, not recoverable values.

use thiserror::Error;

/// Construction-time configuration errors.
///
/// Every variant names the constraint it violates; none of these can occur
/// after the engine has been constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The line width was zero.
    #[error("line width must be non-zero")]
    ZeroLineWidth,

    /// The line width must be a power of two for shift/mask decomposition.
    #[error("line width {0} is not a power of two")]
    LineWidthNotPowerOfTwo(usize),

    /// The access width was zero.
    #[error("access width must be non-zero")]
    ZeroAccessWidth,

    /// The line width must be 1, 2, 4, 8, or 16 access units wide.
    #[error("line width {line_bytes} over access width {access_bytes} must be 1, 2, 4, 8 or 16")]
    UnsupportedAccessRatio {
        /// Configured line width in bytes.
        line_bytes: usize,
        /// Configured access width in bytes.
        access_bytes: usize,
    },

    /// The cache must hold at least one full set.
    #[error("cache size {size_bytes} is smaller than one set ({set_bytes} bytes)")]
    CapacityTooSmall {
        /// Configured total capacity in bytes.
        size_bytes: usize,
        /// Size of one set (line width times associativity) in bytes.
        set_bytes: usize,
    },

    /// The cache capacity must divide evenly into sets.
    #[error("cache size {size_bytes} is not a multiple of the set size ({set_bytes} bytes)")]
    CapacityNotMultiple {
        /// Configured total capacity in bytes.
        size_bytes: usize,
        /// Size of one set (line width times associativity) in bytes.
        set_bytes: usize,
    },

    /// The derived set count must be a power of two for index extraction.
    #[error("derived set count {0} is not a power of two")]
    SetsNotPowerOfTwo(usize),
}

/// A fault reported by the downstream port.
///
/// `Busy` is transient and is retried by the gateway according to the
/// configured repeat policy; the other kinds are fatal to the current access
/// and propagate upward verbatim as the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// The request address was rejected.
    #[error("address error at {addr:#x}")]
    Address {
        /// Faulting address.
        addr: u64,
    },

    /// The data phase of the request failed.
    #[error("data error at {addr:#x}")]
    Data {
        /// Faulting address.
        addr: u64,
    },

    /// Both the address and data phases failed.
    #[error("address and data error at {addr:#x}")]
    AddressData {
        /// Faulting address.
        addr: u64,
    },

    /// The request was not accepted (NACC); the port is busy.
    #[error("request not accepted (busy) at {addr:#x}")]
    Busy {
        /// Rejected address.
        addr: u64,
    },
}

impl Fault {
    /// Returns `true` for the transient busy fault, which the gateway retries.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}
