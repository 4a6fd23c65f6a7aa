//! Downstream port trait and retrying gateway.
//!
//! This module defines the engine's view of the next level of the memory
//! hierarchy. It provides:
//! 1. **`DownstreamPort`:** The opaque request/response channel implemented
//!    by a backing store or a lower cache level.
//! 2. **`DownstreamGateway`:** A wrapper that retries busy (NACC) responses
//!    according to the configured repeat policy and accounts the simulated
//!    delay those retries cost.
//!
//! Calls are blocking from the caller's perspective: the dispatcher's state
//! machine suspends on a gateway call and resumes when the response is
//! available. In the single-threaded cooperative model this is an ordinary
//! synchronous method call.

use tracing::trace;

use crate::config::RetryConfig;
use crate::error::Fault;

/// The channel to the downstream (lower-level) memory.
///
/// Implementations must return exactly the requested number of bytes from
/// the read operations; the gateway treats a short or long response as a
/// data fault. `block_read` may be issued at an address inside a block: the
/// port then returns `size` bytes starting at that address and wrapping
/// within the naturally-aligned `size`-byte block (critical word first).
///
/// Implementors are `Send` so an engine can be moved onto a worker thread.
pub trait DownstreamPort: Send {
    /// Reads `size` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] when the port rejects or fails the request.
    fn read(&mut self, addr: u64, size: usize) -> Result<Vec<u8>, Fault>;

    /// Writes `data` at `addr` under the byte-enable mask (bit `i` enables
    /// byte `i`).
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] when the port rejects or fails the request.
    fn write(&mut self, addr: u64, data: &[u8], byte_enables: u64) -> Result<(), Fault>;

    /// Reads a `size`-byte block; see the trait docs for the wrapping
    /// contract when `addr` is not block-aligned.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] when the port rejects or fails the request.
    fn block_read(&mut self, addr: u64, size: usize) -> Result<Vec<u8>, Fault>;

    /// Writes a full block at `addr` with every byte enabled.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] when the port rejects or fails the request.
    fn block_write(&mut self, addr: u64, data: &[u8]) -> Result<(), Fault>;
}

/// Retrying gateway in front of a [`DownstreamPort`].
///
/// Busy responses are retried per the [`RetryConfig`]; each retry accrues
/// `repeat_delay` simulated cycles, drained by the dispatcher through
/// [`take_retry_cycles`](Self::take_retry_cycles). Fatal faults pass through
/// verbatim, as does the busy fault itself once the retry budget is
/// exhausted.
pub struct DownstreamGateway {
    port: Box<dyn DownstreamPort>,
    retry: RetryConfig,
    retry_cycles: u64,
}

impl std::fmt::Debug for DownstreamGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownstreamGateway")
            .field("retry", &self.retry)
            .field("retry_cycles", &self.retry_cycles)
            .finish_non_exhaustive()
    }
}

impl DownstreamGateway {
    /// Creates a gateway over `port` with the given repeat policy.
    pub fn new(port: Box<dyn DownstreamPort>, retry: RetryConfig) -> Self {
        Self {
            port,
            retry,
            retry_cycles: 0,
        }
    }

    /// Drains the delay cycles accrued by busy retries since the last call.
    pub fn take_retry_cycles(&mut self) -> u64 {
        std::mem::take(&mut self.retry_cycles)
    }

    /// Runs `op`, retrying busy rejections per the repeat policy.
    fn run<T>(
        &mut self,
        mut op: impl FnMut(&mut dyn DownstreamPort) -> Result<T, Fault>,
    ) -> Result<T, Fault> {
        let mut attempts = 0u32;
        loop {
            match op(self.port.as_mut()) {
                Err(fault)
                    if fault.is_transient()
                        && (self.retry.repeat_forever || attempts < self.retry.repeat_count) =>
                {
                    attempts += 1;
                    self.retry_cycles += self.retry.repeat_delay;
                    trace!("downstream busy, retry {attempts}: {fault}");
                }
                other => return other,
            }
        }
    }

    /// Reads `size` bytes at `addr`, retrying busy rejections.
    ///
    /// # Errors
    ///
    /// Propagates fatal faults; a response of the wrong length is reported
    /// as a data fault.
    pub fn read(&mut self, addr: u64, size: usize) -> Result<Vec<u8>, Fault> {
        let data = self.run(|port| port.read(addr, size))?;
        if data.len() == size {
            Ok(data)
        } else {
            Err(Fault::Data { addr })
        }
    }

    /// Writes `data` at `addr` under `byte_enables`, retrying busy
    /// rejections.
    ///
    /// # Errors
    ///
    /// Propagates fatal faults from the port.
    pub fn write(&mut self, addr: u64, data: &[u8], byte_enables: u64) -> Result<(), Fault> {
        self.run(|port| port.write(addr, data, byte_enables))
    }

    /// Reads a `size`-byte block at `addr`, retrying busy rejections.
    ///
    /// Used for bypassed block reads; line fills go through
    /// [`fill_read`](Self::fill_read) instead.
    ///
    /// # Errors
    ///
    /// Propagates fatal faults; a response of the wrong length is reported
    /// as a data fault.
    pub fn block_read(&mut self, addr: u64, size: usize) -> Result<Vec<u8>, Fault> {
        let data = self.run(|port| port.block_read(addr, size))?;
        if data.len() == size {
            Ok(data)
        } else {
            Err(Fault::Data { addr })
        }
    }

    /// Writes back a full line at `addr`, retrying busy rejections.
    ///
    /// # Errors
    ///
    /// Propagates fatal faults from the port.
    pub fn block_write(&mut self, addr: u64, data: &[u8]) -> Result<(), Fault> {
        self.run(|port| port.block_write(addr, data))
    }

    /// Fills `buf` with the line at `line_base`.
    ///
    /// When `critical` carries the access-aligned address of the originally
    /// requested word, the block read is issued there so the port can serve
    /// the critical word first; the wrapped beats are rotated back into
    /// line order before they land in `buf`.
    ///
    /// # Errors
    ///
    /// Propagates fatal faults; a response of the wrong length is reported
    /// as a data fault.
    pub fn fill_read(
        &mut self,
        line_base: u64,
        buf: &mut [u8],
        critical: Option<u64>,
    ) -> Result<(), Fault> {
        let size = buf.len();
        let issue_addr = critical.unwrap_or(line_base);
        let mut data = self.run(|port| port.block_read(issue_addr, size))?;
        if data.len() != size {
            return Err(Fault::Data { addr: line_base });
        }
        // Undo the critical-word-first wrap: beat 0 of the response is the
        // word at issue_addr, not the base of the line.
        let offset = (issue_addr - line_base) as usize;
        data.rotate_right(offset);
        buf.copy_from_slice(&data);
        Ok(())
    }
}
