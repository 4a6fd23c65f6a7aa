//! Transaction protocol types.
//!
//! This module defines the messages exchanged with upstream callers. It
//! provides:
//! 1. **Requests:** Single, block, burst, and read-conditional-write
//!    transaction kinds with address, size, byte enables, and optional
//!    protocol attribute bits.
//! 2. **Responses:** Ordered beats carrying status, payload bytes, and the
//!    last-transfer flag, plus the access's accrued delay cycles.
//! 3. **Status codes:** OK, the fatal address/data errors, and busy (NACC).

use crate::error::Fault;

/// Byte-enable mask with every byte enabled.
pub const ALL_BYTES: u64 = u64::MAX;

/// Final status of a transaction or of one of its beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The transfer completed.
    Ok,
    /// The address was rejected downstream.
    AddressError,
    /// The data phase failed downstream.
    DataError,
    /// Both address and data phases failed.
    AddressDataError,
    /// The request was not accepted (busy) and the retry budget is spent.
    Busy,
}

impl From<Fault> for Status {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Address { .. } => Self::AddressError,
            Fault::Data { .. } => Self::DataError,
            Fault::AddressData { .. } => Self::AddressDataError,
            Fault::Busy { .. } => Self::Busy,
        }
    }
}

/// An inbound transaction request.
///
/// Addresses are byte addresses; sizes are in bytes. Byte-enable masks use
/// bit `i` for byte `i` of the payload. The optional `attrs` word carries
/// the protocol attribute bits decoded by
/// [`AccessPolicy`](crate::cache::attr::AccessPolicy) when the engine is
/// configured to honor them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Single read of `size` bytes.
    Read {
        /// Access address.
        addr: u64,
        /// Transfer size in bytes.
        size: usize,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
    /// Single write of `data` under `byte_enables`.
    Write {
        /// Access address.
        addr: u64,
        /// Payload bytes.
        data: Vec<u8>,
        /// Byte-enable mask; bit `i` enables byte `i`.
        byte_enables: u64,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
    /// Block read of `size` contiguous bytes, answered in access-width beats.
    BlockRead {
        /// Block base address.
        addr: u64,
        /// Total block size in bytes.
        size: usize,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
    /// Block write of contiguous bytes, acknowledged with a single beat.
    BlockWrite {
        /// Block base address.
        addr: u64,
        /// Payload bytes for the whole block.
        data: Vec<u8>,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
    /// Burst of `transfers` reads of `size` bytes at consecutive addresses.
    BurstRead {
        /// First transfer address.
        addr: u64,
        /// Size of each transfer in bytes.
        size: usize,
        /// Number of transfers.
        transfers: usize,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
    /// Burst of `transfers` writes of `size` bytes at consecutive addresses.
    BurstWrite {
        /// First transfer address.
        addr: u64,
        /// Concatenated payload, `size * transfers` bytes.
        data: Vec<u8>,
        /// Size of each transfer in bytes.
        size: usize,
        /// Number of transfers.
        transfers: usize,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
    /// Read-conditional-write: atomically read the current value, compare it
    /// with `compare`, and store `data` (under `byte_enables`) on a match.
    /// The response carries the old value.
    Rcw {
        /// Access address.
        addr: u64,
        /// Value the current contents are compared against.
        compare: Vec<u8>,
        /// Replacement value stored on a successful compare.
        data: Vec<u8>,
        /// Byte-enable mask for the conditional store.
        byte_enables: u64,
        /// Optional protocol attribute word.
        attrs: Option<u32>,
    },
}

impl Request {
    /// Returns the request's (first) address.
    pub fn addr(&self) -> u64 {
        match self {
            Self::Read { addr, .. }
            | Self::Write { addr, .. }
            | Self::BlockRead { addr, .. }
            | Self::BlockWrite { addr, .. }
            | Self::BurstRead { addr, .. }
            | Self::BurstWrite { addr, .. }
            | Self::Rcw { addr, .. } => *addr,
        }
    }

    /// Returns the request's protocol attribute word, if any.
    pub fn attrs(&self) -> Option<u32> {
        match self {
            Self::Read { attrs, .. }
            | Self::Write { attrs, .. }
            | Self::BlockRead { attrs, .. }
            | Self::BlockWrite { attrs, .. }
            | Self::BurstRead { attrs, .. }
            | Self::BurstWrite { attrs, .. }
            | Self::Rcw { attrs, .. } => *attrs,
        }
    }
}

/// One beat of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beat {
    /// Status of this transfer.
    pub status: Status,
    /// Payload bytes (empty for write acknowledgements).
    pub data: Vec<u8>,
    /// Set on the final beat of the transaction.
    pub last: bool,
}

impl Beat {
    /// A successful beat carrying `data`.
    pub fn ok(data: Vec<u8>, last: bool) -> Self {
        Self {
            status: Status::Ok,
            data,
            last,
        }
    }

    /// A failed beat carrying no payload. Always terminates the sequence.
    pub fn error(status: Status) -> Self {
        Self {
            status,
            data: Vec::new(),
            last: true,
        }
    }
}

/// A complete response: ordered beats plus the access's accrued delay.
///
/// `cycles` counts the extra simulated latency attributable to the cache
/// itself: the configured bypass delay and any busy-retry delay spent at
/// the downstream gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response beats, in request order; the final beat has `last` set.
    pub beats: Vec<Beat>,
    /// Accrued delay cycles (bypass delay plus downstream retries).
    pub cycles: u64,
}

impl Response {
    /// Overall status: the first non-OK beat status, or OK.
    pub fn status(&self) -> Status {
        self.beats
            .iter()
            .map(|beat| beat.status)
            .find(|status| *status != Status::Ok)
            .unwrap_or(Status::Ok)
    }

    /// Concatenated payload of all beats, in order.
    pub fn data(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for beat in &self.beats {
            bytes.extend_from_slice(&beat.data);
        }
        bytes
    }
}
