//! Transaction attribute decoding.
//!
//! Maps a transaction's protocol attribute word (or, when attributes are
//! ignored, the static configuration) to the five booleans that govern one
//! access: cacheable, bufferable, read-allocate, write-allocate, and
//! write-back. The bit positions are carried by an explicit
//! [`AttributeLayout`] value rather than compile-time constants, so test
//! configurations can vary them.

use crate::config::CacheConfig;

/// Bit positions of the policy bits within a protocol attribute word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    /// Bit position of the bufferable attribute.
    pub bufferable: u32,
    /// Bit position of the cacheable attribute.
    pub cacheable: u32,
    /// Bit position of the write-back attribute.
    pub write_back: u32,
    /// Bit position of the read-allocate attribute.
    pub read_allocate: u32,
    /// Bit position of the write-allocate attribute.
    pub write_allocate: u32,
}

impl Default for AttributeLayout {
    /// The standard processor-interface layout: bufferable at bit 0,
    /// cacheable, write-back, read-allocate, and write-allocate following.
    fn default() -> Self {
        Self {
            bufferable: 0,
            cacheable: 1,
            write_back: 2,
            read_allocate: 3,
            write_allocate: 4,
        }
    }
}

/// The decoded policy governing a single access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    /// The access may be served from the cache; a clear bit forces a bypass
    /// regardless of static configuration.
    pub cacheable: bool,
    /// The downstream write may be posted (latency hint only).
    pub bufferable: bool,
    /// Allocate a line on a read miss.
    pub read_allocate: bool,
    /// Allocate a line on a write miss.
    pub write_allocate: bool,
    /// Defer dirty data to eviction (write-back) instead of writing through.
    pub write_back: bool,
}

impl AccessPolicy {
    /// Decodes the policy for one access.
    ///
    /// When `config.use_pif_attribute` is set and the request carries an
    /// attribute word, each boolean is a bit of that word at the position
    /// given by `layout`. Otherwise the booleans come verbatim from the
    /// static configuration, with `cacheable` always true and `bufferable`
    /// irrelevant.
    pub fn decode(config: &CacheConfig, layout: &AttributeLayout, attrs: Option<u32>) -> Self {
        match attrs {
            Some(word) if config.use_pif_attribute => Self {
                cacheable: bit(word, layout.cacheable),
                bufferable: bit(word, layout.bufferable),
                read_allocate: bit(word, layout.read_allocate),
                write_allocate: bit(word, layout.write_allocate),
                write_back: bit(word, layout.write_back),
            },
            _ => Self {
                cacheable: true,
                bufferable: false,
                read_allocate: config.read_allocate,
                write_allocate: config.write_allocate,
                write_back: config.write_back,
            },
        }
    }
}

#[inline]
fn bit(word: u32, pos: u32) -> bool {
    (word >> pos) & 1 != 0
}
