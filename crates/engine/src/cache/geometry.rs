//! Cache geometry and address decomposition.
//!
//! Derives the set/way/line structure of the cache from the size parameters
//! in [`CacheConfig`] and provides the shift/mask constants used by every
//! address decomposition in the engine. All constraints are checked here,
//! once, at construction time; the rest of the engine indexes without
//! further validation.

use crate::config::CacheConfig;
use crate::error::ConfigError;

/// Line-to-access width ratios supported by the transfer path.
const SUPPORTED_RATIOS: [usize; 5] = [1, 2, 4, 8, 16];

/// Derived cache geometry: counts, shifts, and masks.
///
/// For an address `a`:
///
/// ```text
/// set = (a >> set_shift) & set_mask      set_shift = log2(line_bytes)
/// tag =  a >> tag_shift                  tag_shift = set_shift + log2(num_sets)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    num_sets: usize,
    ways: usize,
    line_bytes: usize,
    access_bytes: usize,
    set_shift: u32,
    tag_shift: u32,
    set_mask: u64,
}

impl Geometry {
    /// Derives the geometry from a configuration.
    ///
    /// `ways == 0` selects a fully-associative cache (one set spanning the
    /// whole capacity); `ways == 1` is direct-mapped.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when any constraint is violated: zero or
    /// non-power-of-two line width, zero access width, an unsupported
    /// line/access ratio, a capacity smaller than (or not a multiple of)
    /// one set, or a derived set count that is not a power of two.
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let line_bytes = config.line_bytes;
        if line_bytes == 0 {
            return Err(ConfigError::ZeroLineWidth);
        }
        if !line_bytes.is_power_of_two() {
            return Err(ConfigError::LineWidthNotPowerOfTwo(line_bytes));
        }
        if config.access_bytes == 0 {
            return Err(ConfigError::ZeroAccessWidth);
        }
        let ratio_err = ConfigError::UnsupportedAccessRatio {
            line_bytes,
            access_bytes: config.access_bytes,
        };
        if line_bytes % config.access_bytes != 0 {
            return Err(ratio_err);
        }
        if !SUPPORTED_RATIOS.contains(&(line_bytes / config.access_bytes)) {
            return Err(ratio_err);
        }

        let (num_sets, ways) = if config.ways == 0 {
            // Fully associative: one set holding every line in the cache.
            let ways = config.size_bytes / line_bytes;
            if ways == 0 {
                return Err(ConfigError::CapacityTooSmall {
                    size_bytes: config.size_bytes,
                    set_bytes: line_bytes,
                });
            }
            if config.size_bytes % line_bytes != 0 {
                return Err(ConfigError::CapacityNotMultiple {
                    size_bytes: config.size_bytes,
                    set_bytes: line_bytes,
                });
            }
            (1, ways)
        } else {
            let set_bytes = line_bytes * config.ways;
            if config.size_bytes < set_bytes {
                return Err(ConfigError::CapacityTooSmall {
                    size_bytes: config.size_bytes,
                    set_bytes,
                });
            }
            if config.size_bytes % set_bytes != 0 {
                return Err(ConfigError::CapacityNotMultiple {
                    size_bytes: config.size_bytes,
                    set_bytes,
                });
            }
            (config.size_bytes / set_bytes, config.ways)
        };

        if !num_sets.is_power_of_two() {
            return Err(ConfigError::SetsNotPowerOfTwo(num_sets));
        }

        let set_shift = line_bytes.trailing_zeros();
        let tag_shift = set_shift + num_sets.trailing_zeros();

        Ok(Self {
            num_sets,
            ways,
            line_bytes,
            access_bytes: config.access_bytes,
            set_shift,
            tag_shift,
            set_mask: (num_sets - 1) as u64,
        })
    }

    /// Number of sets; always a power of two.
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Number of ways per set; at least one.
    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Line width in bytes.
    pub fn line_bytes(&self) -> usize {
        self.line_bytes
    }

    /// Processor access width in bytes.
    pub fn access_bytes(&self) -> usize {
        self.access_bytes
    }

    /// Extracts the set index of an address; always in `[0, num_sets)`.
    #[inline]
    pub fn set_index(&self, addr: u64) -> usize {
        ((addr >> self.set_shift) & self.set_mask) as usize
    }

    /// Extracts the tag of an address.
    #[inline]
    pub fn tag(&self, addr: u64) -> u64 {
        addr >> self.tag_shift
    }

    /// Rounds an address down to the base of its line.
    #[inline]
    pub fn line_base(&self, addr: u64) -> u64 {
        addr & !(self.line_bytes as u64 - 1)
    }

    /// Byte offset of an address within its line.
    #[inline]
    pub fn offset_in_line(&self, addr: u64) -> usize {
        (addr as usize) & (self.line_bytes - 1)
    }

    /// Reconstructs the base address of the line identified by `(tag, set)`.
    ///
    /// Used when writing back a victim whose original address is no longer
    /// available.
    #[inline]
    pub fn line_addr(&self, tag: u64, set: usize) -> u64 {
        (tag << self.tag_shift) | ((set as u64) << self.set_shift)
    }
}
