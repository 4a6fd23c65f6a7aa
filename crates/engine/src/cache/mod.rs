//! Set-associative cache engine.
//!
//! This module implements the per-access state machine sitting between the
//! processor's transaction port and the downstream memory. It provides:
//! 1. **Dispatch:** `DECODE → {BYPASS | LOOKUP} → {HIT | MISS} → [EVICT] →
//!    [FILL] → COMPLETE` for every transaction kind, including block, burst,
//!    and read-conditional-write transfers.
//! 2. **Policy matrix:** Write-back/write-through and read/write-allocate
//!    behavior from static configuration or per-transaction attributes.
//! 3. **Maintenance:** Flush, dirty-line write-back, and reset.
//! 4. **Administration:** Configuration and profile dumps, counter control.
//!
//! The engine is a single-threaded, event-driven simulation core: all
//! methods take `&mut self` and there is no internal locking. Gateway calls
//! are the state machine's suspension points; downstream requests issued by
//! one access are strictly ordered (a victim's write-back completes before
//! the fill is issued). Multi-port front ends that can race on the same set
//! must serialize their accesses externally.

/// Transaction attribute decoding.
pub mod attr;

/// Cache geometry and address decomposition.
pub mod geometry;

/// Line state table and line data storage.
pub mod lines;

/// Victim-selection policies (LRU, round-robin, random).
pub mod policies;

use tracing::{debug, trace};

use self::attr::{AccessPolicy, AttributeLayout};
use self::geometry::Geometry;
use self::lines::LineTable;
use self::policies::{
    LruPolicy, RandomPolicy, ReplacementPolicy, RoundRobinPolicy,
};
use crate::config::{CacheConfig, ReplacementPolicy as PolicyKind};
use crate::downstream::{DownstreamGateway, DownstreamPort};
use crate::error::{ConfigError, Fault};
use crate::protocol::{ALL_BYTES, Beat, Request, Response};
use crate::stats::{AccessClass, ProfileCounters};

/// The cache engine: line table, victim selection, attribute decoding, and
/// the downstream gateway behind one transaction interface.
///
/// Construct with [`CacheEngine::new`]; drive with [`CacheEngine::access`].
/// The engine assumes single-port or externally-serialized access (see the
/// module docs).
pub struct CacheEngine {
    config: CacheConfig,
    geom: Geometry,
    lines: LineTable,
    policy: Box<dyn ReplacementPolicy>,
    layout: AttributeLayout,
    gateway: DownstreamGateway,
    profile: ProfileCounters,
    /// Scratch buffer for block transfers, reused across accesses. Owned
    /// exclusively by the in-flight access for its evict/fill phase.
    line_buf: Vec<u8>,
}

impl std::fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("geom", &self.geom)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl CacheEngine {
    /// Creates an engine from a configuration and a downstream port, with
    /// the default attribute layout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the geometry constraints are violated;
    /// the engine is never constructed in an invalid state.
    pub fn new(config: CacheConfig, port: Box<dyn DownstreamPort>) -> Result<Self, ConfigError> {
        Self::with_layout(config, AttributeLayout::default(), port)
    }

    /// Creates an engine with an explicit protocol attribute layout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the geometry constraints are violated.
    pub fn with_layout(
        config: CacheConfig,
        layout: AttributeLayout,
        port: Box<dyn DownstreamPort>,
    ) -> Result<Self, ConfigError> {
        let geom = Geometry::from_config(&config)?;
        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            PolicyKind::Random => Box::new(RandomPolicy::new(geom.num_sets(), geom.ways())),
            PolicyKind::Rr => Box::new(RoundRobinPolicy::new(geom.num_sets(), geom.ways())),
            PolicyKind::Lru => Box::new(LruPolicy::new(geom.num_sets(), geom.ways())),
        };
        let gateway = DownstreamGateway::new(port, config.retry);
        let profile = ProfileCounters::new(config.profile_cache);
        Ok(Self {
            lines: LineTable::new(&geom),
            line_buf: vec![0; geom.line_bytes()],
            config,
            geom,
            policy,
            layout,
            gateway,
            profile,
        })
    }

    /// Processes one inbound transaction and produces its response.
    ///
    /// Non-cacheable accesses bypass the line table entirely and take the
    /// configured bypass delay; everything else runs the lookup/allocate
    /// state machine. Response beats are emitted in request order with the
    /// final beat flagged.
    pub fn access(&mut self, req: &Request) -> Response {
        let pol = AccessPolicy::decode(&self.config, &self.layout, req.attrs());
        let mut cycles = 0;
        let beats = if pol.cacheable {
            self.dispatch(req, pol)
        } else {
            self.profile.bypass();
            cycles += self.config.bypass_delay;
            self.bypass(req)
        };
        cycles += self.gateway.take_retry_cycles();
        Response { beats, cycles }
    }

    // ── per-kind dispatch ────────────────────────────────────────────

    fn dispatch(&mut self, req: &Request, pol: AccessPolicy) -> Vec<Beat> {
        match req {
            Request::Read { addr, size, .. } => {
                vec![
                    match self.cached_read(*addr, *size, pol, AccessClass::Read) {
                        Ok(data) => Beat::ok(data, true),
                        Err(fault) => Beat::error(fault.into()),
                    },
                ]
            }
            Request::Write {
                addr,
                data,
                byte_enables,
                ..
            } => vec![ack(self.cached_write(*addr, data, *byte_enables, pol))],
            Request::BlockRead { addr, size, .. } => {
                let beat_size = self.geom.access_bytes().min(*size).max(1);
                let transfers = size.div_ceil(beat_size);
                self.read_beats(*addr, beat_size, transfers, pol)
            }
            Request::BurstRead {
                addr,
                size,
                transfers,
                ..
            } => self.read_beats(*addr, *size, *transfers, pol),
            Request::BlockWrite { addr, data, .. } => {
                let beat_size = self.geom.access_bytes().min(data.len()).max(1);
                self.write_beats(*addr, data, beat_size, pol)
            }
            Request::BurstWrite {
                addr, data, size, ..
            } => self.write_beats(*addr, data, *size, pol),
            Request::Rcw {
                addr,
                compare,
                data,
                byte_enables,
                ..
            } => vec![
                match self.cached_rcw(*addr, compare, data, *byte_enables, pol) {
                    Ok(old) => Beat::ok(old, true),
                    Err(fault) => Beat::error(fault.into()),
                },
            ],
        }
    }

    /// Runs `transfers` cached reads of `size` bytes at consecutive
    /// addresses, one response beat per transfer. A fault terminates the
    /// sequence with an error beat.
    fn read_beats(
        &mut self,
        addr: u64,
        size: usize,
        transfers: usize,
        pol: AccessPolicy,
    ) -> Vec<Beat> {
        if transfers == 0 {
            return vec![Beat::ok(Vec::new(), true)];
        }
        let mut beats = Vec::with_capacity(transfers);
        for i in 0..transfers {
            let beat_addr = addr + (i * size) as u64;
            match self.cached_read(beat_addr, size, pol, AccessClass::Read) {
                Ok(data) => beats.push(Beat::ok(data, i + 1 == transfers)),
                Err(fault) => {
                    beats.push(Beat::error(fault.into()));
                    break;
                }
            }
        }
        beats
    }

    /// Runs the write path for each `size`-byte chunk of `data` at
    /// consecutive addresses; writes are acknowledged with a single beat.
    fn write_beats(&mut self, addr: u64, data: &[u8], size: usize, pol: AccessPolicy) -> Vec<Beat> {
        if size == 0 || data.is_empty() {
            return vec![Beat::ok(Vec::new(), true)];
        }
        for (i, chunk) in data.chunks(size).enumerate() {
            let beat_addr = addr + (i * size) as u64;
            if let Err(fault) = self.cached_write(beat_addr, chunk, ALL_BYTES, pol) {
                return vec![Beat::error(fault.into())];
            }
        }
        vec![Beat::ok(Vec::new(), true)]
    }

    // ── the cached access paths ──────────────────────────────────────

    fn cached_read(
        &mut self,
        addr: u64,
        size: usize,
        pol: AccessPolicy,
        class: AccessClass,
    ) -> Result<Vec<u8>, Fault> {
        let set = self.geom.set_index(addr);
        let tag = self.geom.tag(addr);
        if let Some(way) = self.find_hit(set, tag) {
            self.profile.hit(class);
            self.policy.update(set, way);
            return Ok(self.copy_from_line(set, way, addr, size));
        }
        self.profile.miss(class);
        if !pol.read_allocate {
            // No-allocate misses fetch straight downstream; the line table
            // is untouched.
            return self.gateway.read(addr, size);
        }
        let way = self.allocate(addr, set, tag)?;
        Ok(self.copy_from_line(set, way, addr, size))
    }

    fn cached_write(
        &mut self,
        addr: u64,
        data: &[u8],
        byte_enables: u64,
        pol: AccessPolicy,
    ) -> Result<(), Fault> {
        let set = self.geom.set_index(addr);
        let tag = self.geom.tag(addr);
        let way = if let Some(way) = self.find_hit(set, tag) {
            self.profile.hit(AccessClass::Write);
            self.policy.update(set, way);
            way
        } else {
            self.profile.miss(AccessClass::Write);
            if !pol.write_allocate {
                return self.gateway.write(addr, data, byte_enables);
            }
            self.allocate(addr, set, tag)?
        };
        if pol.write_back {
            self.merge_into_line(set, way, addr, data, byte_enables);
            self.lines.set_dirty(set, way);
        } else {
            // Write-through: the downstream write completes first, then the
            // line is updated and stays clean.
            self.gateway.write(addr, data, byte_enables)?;
            self.merge_into_line(set, way, addr, data, byte_enables);
        }
        Ok(())
    }

    /// One indivisible read-compare-conditional-write. The single-threaded
    /// dispatch guarantees no intervening eviction of the line.
    fn cached_rcw(
        &mut self,
        addr: u64,
        compare: &[u8],
        data: &[u8],
        byte_enables: u64,
        pol: AccessPolicy,
    ) -> Result<Vec<u8>, Fault> {
        let set = self.geom.set_index(addr);
        let tag = self.geom.tag(addr);
        let resident = match self.find_hit(set, tag) {
            Some(way) => {
                self.profile.hit(AccessClass::Rcw);
                self.policy.update(set, way);
                Some(way)
            }
            None => {
                self.profile.miss(AccessClass::Rcw);
                if pol.read_allocate {
                    Some(self.allocate(addr, set, tag)?)
                } else {
                    None
                }
            }
        };
        match resident {
            Some(way) => {
                let old = self.copy_from_line(set, way, addr, compare.len());
                if old == compare {
                    if pol.write_back {
                        self.merge_into_line(set, way, addr, data, byte_enables);
                        self.lines.set_dirty(set, way);
                    } else {
                        self.gateway.write(addr, data, byte_enables)?;
                        self.merge_into_line(set, way, addr, data, byte_enables);
                    }
                }
                Ok(old)
            }
            None => {
                // Not resident, not allocating: read-modify-write directly
                // against the downstream memory.
                let old = self.gateway.read(addr, compare.len())?;
                if old == compare {
                    self.gateway.write(addr, data, byte_enables)?;
                }
                Ok(old)
            }
        }
    }

    // ── eviction and fill ────────────────────────────────────────────

    /// Selects a way for `(tag, set)`, writing back a dirty victim first,
    /// and fills it from downstream. Returns the filled way.
    fn allocate(&mut self, addr: u64, set: usize, tag: u64) -> Result<usize, Fault> {
        let way = if let Some(way) = self.invalid_way(set) {
            // Invalid ways are free victims; the policy is not consulted.
            way
        } else {
            let victim = self.policy.get_victim(set);
            debug_assert!(victim < self.geom.ways(), "policy returned bad way");
            if self.lines.is_dirty(set, victim) {
                // The write-back must complete before the fill is issued.
                self.write_back_line(set, victim)?;
            }
            self.profile.eviction();
            victim
        };

        let line_base = self.geom.line_base(addr);
        let critical = if self.config.critical_word_first {
            Some(addr & !(self.geom.access_bytes() as u64 - 1))
        } else {
            None
        };
        trace!("fill: addr={line_base:#x} set={set} way={way}");
        // A failed fill must never leave the line valid.
        self.lines.clear_valid(set, way);
        self.lines.clear_dirty(set, way);
        self.gateway.fill_read(line_base, &mut self.line_buf, critical)?;
        self.lines.data_mut(set, way).copy_from_slice(&self.line_buf);
        self.lines.set_tag(set, way, tag);
        self.lines.set_valid(set, way);
        self.lines.toggle_lrf(set, way);
        self.policy.update(set, way);
        self.profile.fill();
        Ok(way)
    }

    /// Writes the line at `(set, way)` back downstream and marks it clean.
    fn write_back_line(&mut self, set: usize, way: usize) -> Result<(), Fault> {
        let addr = self.geom.line_addr(self.lines.tag(set, way), set);
        trace!("write-back: addr={addr:#x} set={set} way={way}");
        self.line_buf.copy_from_slice(self.lines.data(set, way));
        self.gateway.block_write(addr, &self.line_buf)?;
        self.lines.clear_dirty(set, way);
        self.profile.write_back();
        Ok(())
    }

    // ── the bypass path ──────────────────────────────────────────────

    /// Passes a non-cacheable request straight to the gateway, without any
    /// line-table interaction. Responses are returned verbatim.
    fn bypass(&mut self, req: &Request) -> Vec<Beat> {
        trace!("bypass: addr={:#x}", req.addr());
        match req {
            Request::Read { addr, size, .. } => vec![match self.gateway.read(*addr, *size) {
                Ok(data) => Beat::ok(data, true),
                Err(fault) => Beat::error(fault.into()),
            }],
            Request::Write {
                addr,
                data,
                byte_enables,
                ..
            } => vec![ack(self.gateway.write(*addr, data, *byte_enables))],
            Request::BlockRead { addr, size, .. } => {
                match self.gateway.block_read(*addr, *size) {
                    Ok(bytes) => split_into_beats(&bytes, self.geom.access_bytes()),
                    Err(fault) => vec![Beat::error(fault.into())],
                }
            }
            Request::BlockWrite { addr, data, .. } => {
                vec![ack(self.gateway.block_write(*addr, data))]
            }
            Request::BurstRead {
                addr,
                size,
                transfers,
                ..
            } => {
                if *transfers == 0 {
                    return vec![Beat::ok(Vec::new(), true)];
                }
                let mut beats = Vec::with_capacity(*transfers);
                for i in 0..*transfers {
                    let beat_addr = addr + (i * size) as u64;
                    match self.gateway.read(beat_addr, *size) {
                        Ok(data) => beats.push(Beat::ok(data, i + 1 == *transfers)),
                        Err(fault) => {
                            beats.push(Beat::error(fault.into()));
                            break;
                        }
                    }
                }
                beats
            }
            Request::BurstWrite {
                addr, data, size, ..
            } => {
                if *size == 0 || data.is_empty() {
                    return vec![Beat::ok(Vec::new(), true)];
                }
                for (i, chunk) in data.chunks(*size).enumerate() {
                    let beat_addr = addr + (i * size) as u64;
                    if let Err(fault) = self.gateway.write(beat_addr, chunk, ALL_BYTES) {
                        return vec![Beat::error(fault.into())];
                    }
                }
                vec![Beat::ok(Vec::new(), true)]
            }
            Request::Rcw {
                addr,
                compare,
                data,
                byte_enables,
                ..
            } => {
                let old = match self.gateway.read(*addr, compare.len()) {
                    Ok(old) => old,
                    Err(fault) => return vec![Beat::error(fault.into())],
                };
                if old == *compare {
                    if let Err(fault) = self.gateway.write(*addr, data, *byte_enables) {
                        return vec![Beat::error(fault.into())];
                    }
                }
                vec![Beat::ok(old, true)]
            }
        }
    }

    // ── lookup helpers ───────────────────────────────────────────────

    /// Scans the set for a valid line with the given tag. At most one line
    /// per set can hold a tag, so the first match is the only match.
    fn find_hit(&self, set: usize, tag: u64) -> Option<usize> {
        (0..self.geom.ways())
            .find(|&way| self.lines.is_valid(set, way) && self.lines.tag(set, way) == tag)
    }

    fn invalid_way(&self, set: usize) -> Option<usize> {
        (0..self.geom.ways()).find(|&way| !self.lines.is_valid(set, way))
    }

    fn copy_from_line(&self, set: usize, way: usize, addr: u64, size: usize) -> Vec<u8> {
        let offset = self.geom.offset_in_line(addr);
        debug_assert!(
            offset + size <= self.geom.line_bytes(),
            "access crosses a line boundary"
        );
        self.lines.data(set, way)[offset..offset + size].to_vec()
    }

    fn merge_into_line(
        &mut self,
        set: usize,
        way: usize,
        addr: u64,
        data: &[u8],
        byte_enables: u64,
    ) {
        debug_assert!(data.len() <= 64, "byte-enable mask covers 64 bytes");
        let offset = self.geom.offset_in_line(addr);
        let line = self.lines.data_mut(set, way);
        for (i, byte) in data.iter().enumerate() {
            if byte_enables >> i & 1 != 0 {
                line[offset + i] = *byte;
            }
        }
    }

    // ── maintenance operations ───────────────────────────────────────

    /// Writes back every dirty line, then invalidates all lines.
    ///
    /// Idempotent: a second call finds nothing valid or dirty and produces
    /// zero downstream traffic.
    ///
    /// # Errors
    ///
    /// Returns the first fault raised by a write-back; lines already
    /// processed stay invalid and clean.
    pub fn flush(&mut self) -> Result<(), Fault> {
        debug!("flush: write back dirty lines and invalidate");
        for set in 0..self.geom.num_sets() {
            for way in 0..self.geom.ways() {
                if !self.lines.is_valid(set, way) {
                    continue;
                }
                if self.lines.is_dirty(set, way) {
                    self.write_back_line(set, way)?;
                }
                self.lines.clear_valid(set, way);
            }
        }
        Ok(())
    }

    /// Writes back every dirty line, leaving it valid and clean. Returns
    /// the number of lines written back.
    ///
    /// # Errors
    ///
    /// Returns the first fault raised by a write-back.
    pub fn flush_dirty_lines(&mut self) -> Result<usize, Fault> {
        let mut count = 0;
        for set in 0..self.geom.num_sets() {
            for way in 0..self.geom.ways() {
                if self.lines.is_valid(set, way) && self.lines.is_dirty(set, way) {
                    self.write_back_line(set, way)?;
                    count += 1;
                }
            }
        }
        debug!("flush_dirty_lines: {count} lines written back");
        Ok(count)
    }

    /// Clears every line to invalid/clean and zeroes the replacement
    /// bookkeeping. Both reset forms behave identically; dirty data is
    /// discarded, not written back.
    pub fn reset(&mut self, hard: bool) {
        debug!("reset: hard={hard}");
        self.lines.invalidate_all();
        self.policy.reset();
    }

    // ── administrative surface ───────────────────────────────────────

    /// Returns whether the line covering `addr` is resident and valid.
    pub fn contains(&self, addr: u64) -> bool {
        self.find_hit(self.geom.set_index(addr), self.geom.tag(addr))
            .is_some()
    }

    /// Returns whether the line covering `addr` is resident and dirty.
    pub fn is_line_dirty(&self, addr: u64) -> bool {
        let set = self.geom.set_index(addr);
        match self.find_hit(set, self.geom.tag(addr)) {
            Some(way) => self.lines.is_dirty(set, way),
            None => false,
        }
    }

    /// Returns the derived geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geom
    }

    /// Returns the configuration the engine was built from.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the profiling counters.
    pub fn profile(&self) -> &ProfileCounters {
        &self.profile
    }

    /// Enables or disables hit/miss profiling.
    pub fn set_profile_cache(&mut self, enable: bool) {
        self.profile.set_enabled(enable);
    }

    /// Zeroes the profiling counters.
    pub fn clear_profile_results(&mut self) {
        self.profile.clear();
    }

    /// Renders the profiling counters as a console-style report.
    pub fn dump_profile_results(&self) -> String {
        self.profile.to_string()
    }

    /// Renders the effective configuration, including derived geometry, as
    /// console-style key/value lines.
    pub fn dump_config(&self) -> String {
        let retry = if self.config.retry.repeat_forever {
            "forever".to_string()
        } else {
            self.config.retry.repeat_count.to_string()
        };
        format!(
            "cache.size_bytes         {}\n\
             cache.line_bytes         {}\n\
             cache.ways               {}\n\
             cache.num_sets           {}\n\
             cache.access_bytes       {}\n\
             cache.policy             {:?}\n\
             cache.read_allocate      {}\n\
             cache.write_allocate     {}\n\
             cache.write_back         {}\n\
             cache.use_pif_attribute  {}\n\
             cache.bypass_delay       {}\n\
             cache.critical_word      {}\n\
             cache.repeat_count       {}\n\
             cache.repeat_delay       {}\n\
             cache.profile            {}",
            self.config.size_bytes,
            self.geom.line_bytes(),
            self.geom.ways(),
            self.geom.num_sets(),
            self.geom.access_bytes(),
            self.config.policy,
            self.config.read_allocate,
            self.config.write_allocate,
            self.config.write_back,
            self.config.use_pif_attribute,
            self.config.bypass_delay,
            self.config.critical_word_first,
            retry,
            self.config.retry.repeat_delay,
            self.profile.is_enabled(),
        )
    }
}

/// Folds a write result into a single acknowledgement beat.
fn ack(result: Result<(), Fault>) -> Beat {
    match result {
        Ok(()) => Beat::ok(Vec::new(), true),
        Err(fault) => Beat::error(fault.into()),
    }
}

/// Splits a contiguous payload into access-width beats, flagging the last.
fn split_into_beats(bytes: &[u8], beat_size: usize) -> Vec<Beat> {
    let beat_size = beat_size.min(bytes.len()).max(1);
    let transfers = bytes.len().div_ceil(beat_size).max(1);
    let mut beats = Vec::with_capacity(transfers);
    if bytes.is_empty() {
        beats.push(Beat::ok(Vec::new(), true));
        return beats;
    }
    for (i, chunk) in bytes.chunks(beat_size).enumerate() {
        beats.push(Beat::ok(chunk.to_vec(), i + 1 == transfers));
    }
    beats
}
