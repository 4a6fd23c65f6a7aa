//! Line state table and line data storage.
//!
//! The per-(set, way) state bits and the line contents live in two flat
//! arenas indexed by `set * ways + way`, mirroring the layout of the state
//! bits in a real tag RAM. Callers must pass indices validated against the
//! [`Geometry`](super::geometry::Geometry); out-of-range indices are
//! programming errors caught by debug assertions, not recoverable
//! conditions. All operations are purely in-memory.

use super::geometry::Geometry;

/// One cache line's state: tag, validity, dirty, and fill-recency bits.
#[derive(Debug, Clone, Copy, Default)]
struct CacheLine {
    tag: u64,
    valid: bool,
    dirty: bool,
    /// Alternating recency-of-fill bit, toggled on every fill of this way.
    lrf: bool,
}

/// Per-set, per-way line state plus the backing data array.
#[derive(Debug, Clone)]
pub struct LineTable {
    lines: Vec<CacheLine>,
    data: Vec<u8>,
    ways: usize,
    line_bytes: usize,
}

impl LineTable {
    /// Creates a table of invalid, clean lines sized for the geometry.
    pub fn new(geom: &Geometry) -> Self {
        let count = geom.num_sets() * geom.ways();
        Self {
            lines: vec![CacheLine::default(); count],
            data: vec![0; count * geom.line_bytes()],
            ways: geom.ways(),
            line_bytes: geom.line_bytes(),
        }
    }

    #[inline]
    fn idx(&self, set: usize, way: usize) -> usize {
        debug_assert!(way < self.ways, "way index out of range");
        set * self.ways + way
    }

    /// Returns the resident tag of `(set, way)`; meaningful only when valid.
    pub fn tag(&self, set: usize, way: usize) -> u64 {
        self.lines[self.idx(set, way)].tag
    }

    /// Records the resident tag of `(set, way)`.
    pub fn set_tag(&mut self, set: usize, way: usize, tag: u64) {
        let i = self.idx(set, way);
        self.lines[i].tag = tag;
    }

    /// Returns whether `(set, way)` holds a valid line.
    pub fn is_valid(&self, set: usize, way: usize) -> bool {
        self.lines[self.idx(set, way)].valid
    }

    /// Marks `(set, way)` valid.
    pub fn set_valid(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        self.lines[i].valid = true;
    }

    /// Marks `(set, way)` invalid.
    pub fn clear_valid(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        self.lines[i].valid = false;
    }

    /// Returns whether `(set, way)` is dirty; meaningful only when valid.
    pub fn is_dirty(&self, set: usize, way: usize) -> bool {
        self.lines[self.idx(set, way)].dirty
    }

    /// Marks `(set, way)` dirty. The line must already be valid.
    pub fn set_dirty(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        debug_assert!(self.lines[i].valid, "dirty bit set on an invalid line");
        self.lines[i].dirty = true;
    }

    /// Clears the dirty bit of `(set, way)`.
    pub fn clear_dirty(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        self.lines[i].dirty = false;
    }

    /// Returns the recency-of-fill bit of `(set, way)`.
    pub fn lrf(&self, set: usize, way: usize) -> bool {
        self.lines[self.idx(set, way)].lrf
    }

    /// Toggles the recency-of-fill bit of `(set, way)`.
    pub fn toggle_lrf(&mut self, set: usize, way: usize) {
        let i = self.idx(set, way);
        self.lines[i].lrf = !self.lines[i].lrf;
    }

    /// Returns the line contents of `(set, way)`.
    pub fn data(&self, set: usize, way: usize) -> &[u8] {
        let start = self.idx(set, way) * self.line_bytes;
        &self.data[start..start + self.line_bytes]
    }

    /// Returns the line contents of `(set, way)` mutably.
    pub fn data_mut(&mut self, set: usize, way: usize) -> &mut [u8] {
        let start = self.idx(set, way) * self.line_bytes;
        &mut self.data[start..start + self.line_bytes]
    }

    /// Resets every line to invalid and clean, clearing the fill bits.
    pub fn invalidate_all(&mut self) {
        for line in &mut self.lines {
            *line = CacheLine::default();
        }
    }
}
